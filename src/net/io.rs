//! I/O 支持：网定义与探索结果的 JSON、RON 序列化.
use std::fs;
use std::path::Path;

use ron::ser::PrettyConfig;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::net::core::{NetDefinition, NetError, NetModel};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ron error: {0}")]
    Ron(#[from] ron::Error),
    #[error("ron parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid net: {0}")]
    Net(#[from] NetError),
}

/// File formats a net definition can be stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetFormat {
    Json,
    Ron,
}

impl NetFormat {
    /// Guesses from the extension; anything that is not `.ron` is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ron") => NetFormat::Ron,
            _ => NetFormat::Json,
        }
    }
}

pub fn to_json_string<T>(value: &T) -> Result<String, IoError>
where
    T: Serialize,
{
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn from_json_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(serde_json::from_str(s)?)
}

pub fn to_ron_string<T>(value: &T) -> Result<String, IoError>
where
    T: Serialize,
{
    let mut pretty = PrettyConfig::default();
    pretty.new_line = "\n".into();
    Ok(ron::ser::to_string_pretty(value, pretty)?)
}

pub fn from_ron_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(ron::from_str(s)?)
}

/// Parses and validates a net definition.
pub fn net_from_str(s: &str, format: NetFormat) -> Result<NetModel, IoError> {
    let definition: NetDefinition = match format {
        NetFormat::Json => from_json_str(s)?,
        NetFormat::Ron => from_ron_str(s)?,
    };
    Ok(NetModel::from_definition(definition)?)
}

pub fn read_net<P: AsRef<Path>>(path: P) -> Result<NetModel, IoError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let net = net_from_str(&content, NetFormat::from_path(path))?;
    log::debug!(
        "loaded net from {}: {} places, {} transitions, {} arcs",
        path.display(),
        net.places_len(),
        net.transitions_len(),
        net.arcs().len()
    );
    Ok(net)
}

pub fn write_net<P: AsRef<Path>>(path: P, net: &NetModel) -> Result<(), IoError> {
    let path = path.as_ref();
    let definition = net.to_definition();
    let content = match NetFormat::from_path(path) {
        NetFormat::Json => to_json_string(&definition)?,
        NetFormat::Ron => to_ron_string(&definition)?,
    };
    write_text(path, &content)
}

/// Writes `content`, creating parent directories as needed.
pub fn write_text<P: AsRef<Path>>(path: P, content: &str) -> Result<(), IoError> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, content)?;
    Ok(())
}
