use crate::errors::{Error, Result};

/// Environment variable holding the orchestrator API key.
pub const API_KEY_ENV: &str = "EMERGENCE_API_KEY";

/// A present, non-blank orchestrator API key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self> {
        let value = raw.as_ref().trim();
        if value.is_empty() {
            return Err(missing());
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Verifies the access token is present before any request is built.
pub fn check(token: Option<&str>) -> Result<ApiKey> {
    match token {
        Some(raw) => ApiKey::parse(raw),
        None => Err(missing()),
    }
}

fn missing() -> Error {
    Error::Config(format!(
        "no workflow service API key configured (set {API_KEY_ENV})"
    ))
}
