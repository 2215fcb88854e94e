//! Entity structs for all certdb domain objects.
//!
//! Each entity maps to a table in the SQLite store. All structs derive
//! `Serialize`, `Deserialize`, and `JsonSchema`.

mod audit;
mod objective;
mod state;
mod test;

pub use audit::Audit;
pub use objective::Objective;
pub use state::State;
pub use test::CertTest;
