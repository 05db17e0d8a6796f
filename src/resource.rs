//! Resource name normalization shared by the gateway and the backend.

use crate::{error::ApiError, API_PREFIX};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Character,
    Location,
    Episode,
}

impl ResourceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Location => "location",
            Self::Episode => "episode",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "character" => Some(Self::Character),
            "location" => Some(Self::Location),
            "episode" => Some(Self::Episode),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve a request path (or a bare resource name) into a collection.
///
/// The API prefix and any trailing identifier segment are ignored, and a single
/// trailing `s` is stripped so `/characters` and `/character` are the same thing.
///
/// # Errors
/// Returns `ApiError::InvalidEndpoint` if the name is not a known collection.
pub fn normalize_resource(path: &str) -> Result<ResourceKind, ApiError> {
    let trimmed = path.strip_prefix(API_PREFIX).unwrap_or(path);
    let name = trimmed
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default();
    let singular = name.strip_suffix('s').unwrap_or(name);

    ResourceKind::from_name(singular).ok_or(ApiError::InvalidEndpoint)
}

/// Pick the resource identifier from the path segment, falling back to the
/// `id` query parameter.
///
/// Identifiers are numeric; a comma separated list of numbers is accepted
/// because the data source supports fetching several records at once.
///
/// # Errors
/// Returns `ApiError::InvalidInput` if the identifier is not numeric.
pub fn resolve_id(
    path_id: Option<&str>,
    query_id: Option<&str>,
) -> Result<Option<String>, ApiError> {
    let Some(raw) = path_id.or(query_id).map(str::trim) else {
        return Ok(None);
    };
    if raw.is_empty() {
        return Ok(None);
    }

    let numeric = raw
        .split(',')
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
    if numeric {
        Ok(Some(raw.to_string()))
    } else {
        Err(ApiError::InvalidInput(format!(
            "invalid identifier: {raw}"
        )))
    }
}
