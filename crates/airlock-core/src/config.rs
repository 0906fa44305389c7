use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{TransferError, TransferResult, DEFAULT_CAPACITY, TRANSPORT_CEILING};

/// Top-level configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AirlockConfig {
    pub transfer: TransferConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Payload characters per frame (default: 1024, at most TRANSPORT_CEILING)
    pub capacity: usize,
    /// Directory received files are written into (default: current dir)
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl AirlockConfig {
    /// Check values that serde cannot: capacity bounds and log format.
    pub fn validate(&self) -> TransferResult<()> {
        validate_capacity(self.transfer.capacity)?;
        match self.log.format.as_str() {
            "json" | "text" => Ok(()),
            other => Err(TransferError::Config(format!(
                "log.format must be \"json\" or \"text\", got {other:?}"
            ))),
        }
    }
}

/// Reject capacities of zero or above the transport ceiling.
pub fn validate_capacity(capacity: usize) -> TransferResult<()> {
    if capacity == 0 || capacity > TRANSPORT_CEILING {
        return Err(TransferError::InvalidCapacity {
            requested: capacity,
            ceiling: TRANSPORT_CEILING,
        });
    }
    Ok(())
}
