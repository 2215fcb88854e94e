//! Repository modules for the four certdb tables.
//!
//! Inserts and updates are methods on [`Writer`], which borrows either the
//! main connection or an open transaction. Lookups are methods on
//! [`CertDb`](crate::CertDb).

pub mod audit;
pub mod objective;
pub mod state;

/// Write access to the store through one connection or transaction.
#[derive(Clone, Copy)]
pub struct Writer<'a> {
    conn: &'a libsql::Connection,
}

impl<'a> Writer<'a> {
    pub(crate) const fn new(conn: &'a libsql::Connection) -> Self {
        Self { conn }
    }
}
