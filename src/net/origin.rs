//! Application scope URL and resolution of asset paths against it

use crate::error::{SwCacheError, SwCacheResult};
use std::fmt;
use url::Url;

/// The URL the app (and its cache) is scoped to
///
/// Always normalized to end with `/`, so relative asset paths resolve
/// beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppOrigin {
    scope: Url,
}

impl AppOrigin {
    /// Parse a scope URL; only http and https are accepted
    pub fn parse(url: &str) -> SwCacheResult<Self> {
        let parsed = Url::parse(url.trim()).map_err(|e| invalid(url, e))?;
        check_scheme(url, &parsed)?;
        if !parsed.has_host() {
            return Err(invalid(url, "missing host"));
        }

        // A trailing file name belongs to the scope directory
        let scope = parsed.join("./").map_err(|e| invalid(url, e))?;
        Ok(Self { scope })
    }

    /// Scope URL, always ending in `/`
    pub fn scope(&self) -> &str {
        self.scope.as_str()
    }

    /// Resolve an asset path into an absolute URL
    ///
    /// Follows standard URL reference resolution: absolute URLs are kept,
    /// `//host/x` takes the scope's scheme, `/x` resolves against the origin
    /// root and anything else against the scope, with dot segments removed.
    pub fn resolve(&self, path: &str) -> SwCacheResult<String> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(invalid(path, "empty path"));
        }
        let resolved = self.scope.join(trimmed).map_err(|e| invalid(trimmed, e))?;
        check_scheme(trimmed, &resolved)?;
        Ok(resolved.into())
    }
}

impl fmt::Display for AppOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.scope)
    }
}

fn check_scheme(input: &str, url: &Url) -> SwCacheResult<()> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(input, format!("unsupported scheme '{}'", other))),
    }
}

fn invalid(url: &str, reason: impl ToString) -> SwCacheError {
    SwCacheError::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}
