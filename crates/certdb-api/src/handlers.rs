//! Route handlers. Each returns a status code and a JSON body.

use serde::Serialize;
use serde_json::{Value, json};

use certdb_db::CertDb;

use crate::error::ApiError;
use crate::router::{Route, parse_route};

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: impl Serialize) -> Result<Self, ApiError> {
        Ok(Self {
            status: 200,
            body: serde_json::to_value(body)?,
        })
    }

    /// Error body in the `{"detail": ...}` shape.
    #[must_use]
    pub fn error(status: u16, detail: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "detail": detail.into() }),
        }
    }

    fn state_not_found(name: &str) -> Self {
        Self::error(404, format!("State {name} not found"))
    }
}

/// Route and answer one request. Never fails: store errors become 500s.
pub async fn handle(db: &CertDb, method: &str, target: &str) -> ApiResponse {
    let route = match parse_route(method, target) {
        Ok(route) => route,
        Err(error) => return ApiResponse::error(error.status(), error.detail()),
    };
    match dispatch(db, route).await {
        Ok(response) => response,
        Err(error) => {
            tracing::error!(%error, path = %target, "request failed");
            ApiResponse::error(500, error.to_string())
        }
    }
}

async fn dispatch(db: &CertDb, route: Route) -> Result<ApiResponse, ApiError> {
    match route {
        Route::Root => ApiResponse::ok(json!({
            "message": "certdb API is running",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": [
                "/states",
                "/states/{name}",
                "/states/{name}/summary",
                "/search?q=&state=&subject=&min_confidence=",
                "/stats/overview",
            ],
        })),
        Route::States => {
            let names: Vec<String> = db.list_states().await?.into_iter().map(|s| s.name).collect();
            ApiResponse::ok(names)
        }
        Route::State(name) => match db.state_records_by_name(&name).await? {
            Some(records) => ApiResponse::ok(records),
            None => Ok(ApiResponse::state_not_found(&name)),
        },
        Route::StateSummary(name) => match db.state_summary(&name).await? {
            Some(summary) => ApiResponse::ok(summary),
            None => Ok(ApiResponse::state_not_found(&name)),
        },
        Route::Search { query, filters } => ApiResponse::ok(db.search(&query, &filters).await?),
        Route::Overview => ApiResponse::ok(db.overview().await?),
    }
}
