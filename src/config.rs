use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::explore::graph::LabelStyle;

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct ExploreConfig {
    #[serde(default)]
    pub explore: ExploreSection,
    #[serde(default)]
    pub render: LabelStyle,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct ExploreSection {
    /// Upper bound on nodes per run. Unset means no bound.
    #[serde(default)]
    pub node_limit: Option<usize>,
}

impl ExploreConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: ExploreConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExploreConfig::load_from_file(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, ExploreConfig::default());
        assert_eq!(config.render.node_prefix, "m");
        assert!(config.explore.node_limit.is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pn.toml");
        fs::write(
            &path,
            "[explore]\nnode_limit = 500\n\n[render]\nnode_prefix = \"s\"\n",
        )
        .unwrap();

        let config = ExploreConfig::load_from_file(&path).unwrap();
        assert_eq!(config.explore.node_limit, Some(500));
        assert_eq!(config.render.node_prefix, "s");
        assert_eq!(config.render.label_separator, ", ");
        assert!(config.render.show_ancestors);
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pn.toml");
        fs::write(&path, "[explore]\nnode_limit = \"many\"\n").unwrap();
        let err = ExploreConfig::load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
