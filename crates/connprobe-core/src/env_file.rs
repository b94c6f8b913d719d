use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{ProbeError, ProbeResult};

pub const DEFAULT_ENV_FILE: &str = ".env";

/// Flat `KEY=VALUE` mapping read from an env file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    vars: HashMap<String, String>,
}

impl EnvConfig {
    pub fn load(path: &Path) -> ProbeResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ProbeError::ConfigMissing(path.to_path_buf()),
            _ => ProbeError::ConfigUnreadable {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        let config = parse_env(&content);
        tracing::debug!(path = %path.display(), keys = config.len(), "Loaded env file");
        Ok(config)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Parse env-file content. Malformed lines are skipped, never reported.
pub fn parse_env(content: &str) -> EnvConfig {
    let mut vars = HashMap::new();

    for (lineno, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            tracing::trace!(line = lineno + 1, "Skipping line without '='");
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() {
            continue;
        }
        vars.insert(key.to_string(), value.to_string());
    }

    EnvConfig { vars }
}
