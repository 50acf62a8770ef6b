use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{ArtistId, ValidationError};

static HANDLE_RE: OnceLock<Regex> = OnceLock::new();

fn handle_regex() -> &'static Regex {
    HANDLE_RE.get_or_init(|| {
        Regex::new("^@?[A-Za-z0-9._]{1,30}$")
            .unwrap_or_else(|error| panic!("handle regex failed to compile: {error}"))
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: ArtistId,
    /// Unique across all artists.
    pub name: String,
    /// Social handle, stored without the leading `@`. Unique when present.
    pub handle: Option<String>,
}

impl Artist {
    pub fn new(
        name: &str,
        handle: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingField("artist name"));
        }

        let handle = match handle.map(str::trim).filter(|h| !h.is_empty()) {
            Some(h) if handle_regex().is_match(h) => Some(h.trim_start_matches('@').to_string()),
            Some(h) => return Err(ValidationError::InvalidHandle(h.to_string())),
            None => None,
        };

        Ok(Self {
            id: ArtistId::new(),
            name: name.to_string(),
            handle,
        })
    }
}
