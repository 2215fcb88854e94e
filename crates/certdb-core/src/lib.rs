//! # certdb-core
//!
//! Core types shared by every certdb crate:
//! - Entity structs for states, certification tests, objectives and audits
//! - Draft structs carrying the fields for a single insert
//! - Status enums, including the per-state pipeline phase machine
//! - The U.S. jurisdiction table
//! - Exported record and read-projection response types
//! - Cross-cutting error types

pub mod drafts;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod jurisdictions;
pub mod records;
pub mod responses;
