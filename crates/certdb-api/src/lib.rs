//! # certdb-api
//!
//! Read-only JSON API over the certdb store:
//!
//! | route | body |
//! |---|---|
//! | `GET /` | service banner |
//! | `GET /states` | state names |
//! | `GET /states/{name}` | test records of one state |
//! | `GET /states/{name}/summary` | per-state totals |
//! | `GET /search?q=&state=&subject=&min_confidence=` | matches grouped by test |
//! | `GET /stats/overview` | global totals and confidence histogram |
//!
//! Unknown routes and states answer 404, other methods 405, a search
//! without `q` 400. Every response carries the configured CORS origin.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::{ApiResponse, handle};
pub use server::ApiServer;
