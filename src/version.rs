//! Version resolution from the published version descriptor
//!
//! The descriptor is fetched with cache bypass on every activation. Version
//! tokens are compared by plain string inequality: any difference means a
//! new build, there is no ordering between versions.

use crate::error::{SwCacheError, SwCacheResult};
use crate::net::{CacheMode, Network, Request};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Shape of the published `version.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDescriptor {
    pub version: String,
    #[serde(default)]
    pub build_number: Option<String>,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub package_name: Option<String>,
}

impl VersionDescriptor {
    /// Version token used to name the content store
    ///
    /// The published version is used verbatim. With `include_build_number`,
    /// a non-blank build number is appended as `<version>+<build>`.
    pub fn token(&self, include_build_number: bool) -> String {
        match (&self.build_number, include_build_number) {
            (Some(build), true) if !build.trim().is_empty() => {
                format!("{}+{}", self.version, build)
            }
            _ => self.version.clone(),
        }
    }
}

/// Fetches and parses the version descriptor
pub struct VersionResolver {
    network: Arc<dyn Network>,
    url: String,
    include_build_number: bool,
}

impl VersionResolver {
    /// Create a resolver for an absolute descriptor URL
    pub fn new(network: Arc<dyn Network>, url: impl Into<String>, include_build_number: bool) -> Self {
        Self {
            network,
            url: url.into(),
            include_build_number,
        }
    }

    /// Descriptor URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the descriptor and return the version token
    ///
    /// Every failure (transport, non-2xx status, unparseable body, empty
    /// version) is a `VersionFetch` error.
    pub async fn resolve(&self) -> SwCacheResult<String> {
        let descriptor = self.fetch_descriptor().await?;
        if descriptor.version.trim().is_empty() {
            return Err(self.failure("descriptor has an empty version"));
        }
        let token = descriptor.token(self.include_build_number);

        debug!("Resolved version {} from {}", token, self.url);
        Ok(token)
    }

    /// Fetch and parse the full descriptor
    pub async fn fetch_descriptor(&self) -> SwCacheResult<VersionDescriptor> {
        let response = self
            .network
            .fetch(&Request::get(&self.url), CacheMode::NoStore)
            .await
            .map_err(|e| self.failure(e))?;

        if !response.is_ok() {
            return Err(self.failure(format!("HTTP {}", response.status)));
        }

        response
            .json::<VersionDescriptor>()
            .map_err(|e| self.failure(e))
    }

    fn failure(&self, reason: impl ToString) -> SwCacheError {
        SwCacheError::VersionFetch {
            url: self.url.clone(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::Response;
    use crate::testing::FakeNetwork;

    const URL: &str = "http://localhost:8080/version.json";

    fn resolver(network: &Arc<FakeNetwork>, include_build: bool) -> VersionResolver {
        VersionResolver::new(network.clone(), URL, include_build)
    }

    #[tokio::test]
    async fn resolves_version_field() {
        let network = Arc::new(FakeNetwork::new());
        network.respond(
            URL,
            Response::new(
                URL,
                200,
                r#"{"app_name":"shop","version":"1.4.0","build_number":"17","package_name":"shop"}"#,
            ),
        );

        assert_eq!(resolver(&network, false).resolve().await.unwrap(), "1.4.0");
        assert_eq!(resolver(&network, true).resolve().await.unwrap(), "1.4.0+17");
    }

    #[tokio::test]
    async fn bypasses_http_cache() {
        let network = Arc::new(FakeNetwork::new());
        network.respond(URL, Response::new(URL, 200, r#"{"version":"1"}"#));

        resolver(&network, false).resolve().await.unwrap();
        assert_eq!(network.cache_modes(URL), vec![CacheMode::NoStore]);
    }

    #[tokio::test]
    async fn transport_failure_is_version_error() {
        let network = Arc::new(FakeNetwork::new());
        network.fail(URL);

        let err = resolver(&network, false).resolve().await.unwrap_err();
        assert!(matches!(err, SwCacheError::VersionFetch { .. }));
    }

    #[tokio::test]
    async fn non_success_status_is_version_error() {
        let network = Arc::new(FakeNetwork::new());
        network.respond(URL, Response::new(URL, 404, "not found"));

        let err = resolver(&network, false).resolve().await.unwrap_err();
        assert!(err.to_string().contains("HTTP 404"));
    }

    #[tokio::test]
    async fn unparseable_or_empty_is_version_error() {
        let network = Arc::new(FakeNetwork::new());
        network.respond(URL, Response::new(URL, 200, "<html>"));
        assert!(matches!(
            resolver(&network, false).resolve().await,
            Err(SwCacheError::VersionFetch { .. })
        ));

        network.respond(URL, Response::new(URL, 200, r#"{"version":"  "}"#));
        assert!(matches!(
            resolver(&network, false).resolve().await,
            Err(SwCacheError::VersionFetch { .. })
        ));

        network.respond(URL, Response::new(URL, 200, r#"{"build_number":"3"}"#));
        assert!(resolver(&network, false).resolve().await.is_err());
    }

    #[test]
    fn token_ignores_blank_build_number() {
        let descriptor = VersionDescriptor {
            version: "2.0.0".to_string(),
            build_number: Some(" ".to_string()),
            app_name: None,
            package_name: None,
        };
        assert_eq!(descriptor.token(true), "2.0.0");
    }

    #[tokio::test]
    async fn whitespace_is_part_of_the_version() {
        let network = Arc::new(FakeNetwork::new());
        network.respond(URL, Response::new(URL, 200, r#"{"version":"1.0 "}"#));

        let token = resolver(&network, false).resolve().await.unwrap();
        assert_eq!(token, "1.0 ");
        assert_ne!(token, "1.0");
    }
}
