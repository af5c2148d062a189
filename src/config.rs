//! Parser configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! {
//!     "chunk_size": 4096,
//!     "extractor": { "program": "python3", "args": ["tools/extract_replay.py"] },
//!     "delete_input": true
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ParserError, Result};

/// Default read size for the streaming sections.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_true() -> bool {
    true
}

/// External command that unpacks a replay archive.
///
/// Invoked as `program [args..] <replay> <output dir>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Executable to run.
    pub program: String,
    /// Arguments placed before the replay and output paths.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            args: vec!["extract_replay.py".to_string()],
        }
    }
}

/// Settings for [`crate::pipeline::ReplayParser`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Bytes read per chunk from the streaming sections.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Parent of the per-replay working directories; the system temp dir
    /// when unset.
    #[serde(default)]
    pub work_root: Option<PathBuf>,
    /// Archive extraction command.
    #[serde(default)]
    pub extractor: ExtractorConfig,
    /// Remove the input replay once it has been extracted.
    #[serde(default)]
    pub delete_input: bool,
    /// Keep decoded game events in the final [`crate::replay::Replay`].
    #[serde(default = "default_true")]
    pub keep_game_events: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            work_root: None,
            extractor: ExtractorConfig::default(),
            delete_input: false,
            keep_game_events: true,
        }
    }
}

impl ParserConfig {
    /// Loads and validates a JSON config file.
    ///
    /// # Errors
    ///
    /// - `ParserError::IoError` if the file cannot be read
    /// - `ParserError::InvalidConfig` if it is not valid JSON or fails
    ///   [`Self::validate`]
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parses and validates a JSON config.
    ///
    /// # Errors
    ///
    /// `ParserError::InvalidConfig` if the JSON is malformed or invalid.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content).map_err(|e| ParserError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the values a run depends on.
    ///
    /// # Errors
    ///
    /// `ParserError::InvalidConfig` for a zero chunk size or an empty
    /// extractor program.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ParserError::InvalidConfig {
                reason: "chunk_size must be greater than 0".to_string(),
            });
        }
        if self.extractor.program.trim().is_empty() {
            return Err(ParserError::InvalidConfig {
                reason: "extractor program is empty".to_string(),
            });
        }
        Ok(())
    }
}
