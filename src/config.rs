use anyhow::{Context, Result};
use serde::Deserialize;

/// Fields binding this transform inside the pipeline configuration. Extra
/// envelope fields on the configuration document (apiVersion, kind, metadata)
/// are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformConfig {
    /// Key selecting one entry of the versions file's environments mapping.
    pub environment: String,
    /// Path of the versions file, relative to the pipeline root.
    pub versions_file_path: String,
}

pub fn parse_config(data: &[u8]) -> Result<TransformConfig> {
    let text = std::str::from_utf8(data).context("Transform configuration is not valid UTF-8")?;
    let config =
        serde_yaml_ng::from_str(text).context("Failed to parse transform configuration")?;
    Ok(config)
}
