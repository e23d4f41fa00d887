use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_temp_dir() -> PathBuf {
    env::temp_dir().join("kasane")
}

fn default_file_prefix() -> String {
    "capture".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Where capture artifacts are written before the worker reads them
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl CaptureConfig {
    pub fn new() -> Self {
        let temp_dir = env::var("KASANE_TEMP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_temp_dir());

        Self {
            temp_dir,
            file_prefix: default_file_prefix(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            file_prefix: default_file_prefix(),
        }
    }
}
