//! Request-line parsing. Pure: no I/O, no database.

use certdb_core::responses::SearchFilters;

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Root,
    States,
    /// All test records of one state.
    State(String),
    StateSummary(String),
    Search { query: String, filters: SearchFilters },
    Overview,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    NotFound,
    MethodNotAllowed,
    BadRequest(String),
}

impl RouteError {
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::BadRequest(_) => 400,
        }
    }

    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::NotFound => "Not Found".into(),
            Self::MethodNotAllowed => "Method Not Allowed".into(),
            Self::BadRequest(reason) => reason.clone(),
        }
    }
}

/// Map a method and request target (`/path?query`) to a route.
///
/// # Errors
///
/// `MethodNotAllowed` for anything but `GET`/`HEAD` on a known path,
/// `NotFound` for unknown paths, `BadRequest` for a missing or malformed
/// search parameter.
pub fn parse_route(method: &str, target: &str) -> Result<Route, RouteError> {
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let known = matches!(
        segments.as_slice(),
        [] | ["states"] | ["states", _] | ["states", _, "summary"] | ["search"] | ["stats", "overview"]
    );
    if !known {
        return Err(RouteError::NotFound);
    }
    if !(method.eq_ignore_ascii_case("GET") || method.eq_ignore_ascii_case("HEAD")) {
        return Err(RouteError::MethodNotAllowed);
    }

    match segments.as_slice() {
        [] => Ok(Route::Root),
        ["states"] => Ok(Route::States),
        ["states", name] => Ok(Route::State(state_segment(name)?)),
        ["states", name, "summary"] => Ok(Route::StateSummary(state_segment(name)?)),
        ["search"] => search(query),
        ["stats", "overview"] => Ok(Route::Overview),
        _ => Err(RouteError::NotFound),
    }
}

/// Decode a state path segment. `New_York` and `New%20York` both name
/// New York.
fn state_segment(raw: &str) -> Result<String, RouteError> {
    let decoded = decode(raw)?;
    let name = decoded.replace('_', " ").trim().to_string();
    if name.is_empty() {
        return Err(RouteError::NotFound);
    }
    Ok(name)
}

fn decode(raw: &str) -> Result<String, RouteError> {
    urlencoding::decode(&raw.replace('+', " "))
        .map(std::borrow::Cow::into_owned)
        .map_err(|_| RouteError::BadRequest(format!("invalid percent-encoding: {raw}")))
}

/// Split `a=1&b=2` into decoded pairs.
///
/// # Errors
///
/// `BadRequest` when a key or value is not valid percent-encoded UTF-8.
pub fn query_pairs(query: &str) -> Result<Vec<(String, String)>, RouteError> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            Ok((decode(key)?, decode(value)?))
        })
        .collect()
}

fn search(query: &str) -> Result<Route, RouteError> {
    let mut q = None;
    let mut filters = SearchFilters::default();
    for (key, value) in query_pairs(query)? {
        let value = value.trim().to_string();
        match key.as_str() {
            "q" if !value.is_empty() => q = Some(value),
            "state" if !value.is_empty() => filters.state = Some(value),
            "subject" if !value.is_empty() => filters.subject = Some(value),
            "min_confidence" if !value.is_empty() => {
                let min = value
                    .parse::<f64>()
                    .ok()
                    .filter(|min| (0.0..=1.0).contains(min))
                    .ok_or_else(|| {
                        RouteError::BadRequest(format!(
                            "min_confidence must be a number between 0 and 1, got {value:?}"
                        ))
                    })?;
                filters.min_confidence = Some(min);
            }
            _ => {}
        }
    }
    let query = q.ok_or_else(|| RouteError::BadRequest("missing required query parameter: q".into()))?;
    Ok(Route::Search { query, filters })
}
