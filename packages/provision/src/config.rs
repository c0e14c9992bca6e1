use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use resfs_vfs::LogicalPath;

use crate::manifest::MANIFEST_FILE_NAME;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/";
pub const DEFAULT_RESOURCE_PREFIX: &str = "res/";
pub const DEFAULT_DELAY_MS: u64 = 10;

/// Settings for one provisioning session.
///
/// ```json
/// {
///   "base_url": "http://localhost:3000/",
///   "manifest_path": "files.json",
///   "resource_prefix": "res/",
///   "project_base": "examples/blank",
///   "delay_ms": 10,
///   "status_lines": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Origin the manifest and derived resource URLs are resolved against.
    pub base_url: Url,
    /// Manifest location relative to `base_url`.
    pub manifest_path: String,
    /// Prepended to a descriptor's file path when it has no explicit source.
    pub resource_prefix: String,
    /// Every resource is written below this path.
    pub project_base: LogicalPath,
    /// Pause between consecutive downloads so progress stays visible.
    pub delay_ms: u64,
    /// Emit a status line per downloaded resource.
    pub status_lines: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            manifest_path: MANIFEST_FILE_NAME.to_string(),
            resource_prefix: DEFAULT_RESOURCE_PREFIX.to_string(),
            project_base: LogicalPath::root(),
            delay_ms: DEFAULT_DELAY_MS,
            status_lines: true,
        }
    }
}

impl PipelineConfig {
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            base_url,
            ..Default::default()
        }
    }

    /// `base_url` with a trailing slash, so relative joins append instead of
    /// replacing the last segment.
    pub fn base(&self) -> Url {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base
    }

    pub fn manifest_url(&self) -> Result<Url, url::ParseError> {
        self.base().join(&self.manifest_path)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resfs_vfs::lpath;

    #[test]
    fn defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.manifest_path, "files.json");
        assert_eq!(config.resource_prefix, "res/");
        assert!(config.project_base.is_root());
        assert_eq!(config.delay(), Duration::from_millis(10));
        assert!(config.status_lines);
        assert_eq!(
            config.manifest_url().unwrap().as_str(),
            "http://localhost:3000/files.json"
        );
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: PipelineConfig = serde_json::from_str(
            r#"{"base_url":"https://example.com/app","project_base":"examples/blank"}"#,
        )
        .unwrap();
        assert_eq!(config.project_base, lpath!("examples/blank"));
        assert_eq!(config.delay_ms, 10);
        assert_eq!(
            config.manifest_url().unwrap().as_str(),
            "https://example.com/app/files.json"
        );
    }

    #[test]
    fn invalid_project_base_is_rejected() {
        let result: Result<PipelineConfig, _> =
            serde_json::from_str(r#"{"project_base":"../outside"}"#);
        assert!(result.is_err());
    }
}
