//! Archive extraction boundary.
//!
//! A replay is an archive whose member files are the sections. Unpacking it
//! is left to an [`ArchiveExtractor`]; the pipeline only needs the five
//! section files to appear in the working directory afterwards.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use super::SECTION_FILES;
use crate::config::ExtractorConfig;
use crate::error::{ParserError, Result};

/// Writes the section files of a replay into a directory.
pub trait ArchiveExtractor: Sync {
    /// Extracts `replay` into `out_dir`.
    ///
    /// # Errors
    ///
    /// `ParserError::ExtractionFailed` (or an I/O error) if the member files
    /// could not be produced.
    fn extract(&self, replay: &Path, out_dir: &Path) -> Result<()>;
}

/// Runs an external program as `program [args..] <replay> <out_dir>`.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    config: ExtractorConfig,
}

impl CommandExtractor {
    /// Creates an extractor for the configured command.
    #[must_use]
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }
}

impl ArchiveExtractor for CommandExtractor {
    fn extract(&self, replay: &Path, out_dir: &Path) -> Result<()> {
        let output = Command::new(&self.config.program)
            .args(&self.config.args)
            .arg(replay)
            .arg(out_dir)
            .output()
            .map_err(|e| ParserError::ExtractionFailed {
                reason: format!("could not run {}: {e}", self.config.program),
            })?;

        if !output.stderr.is_empty() {
            debug!(
                stderr = %String::from_utf8_lossy(&output.stderr),
                "Extractor output"
            );
        }

        if !output.status.success() {
            return Err(ParserError::ExtractionFailed {
                reason: format!("{} exited with {}", self.config.program, output.status),
            });
        }
        Ok(())
    }
}

/// Copies already-extracted section files from a directory.
#[derive(Debug, Clone)]
pub struct DirectoryExtractor {
    source: PathBuf,
}

impl DirectoryExtractor {
    /// Creates an extractor reading from `source`.
    #[must_use]
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Returns the source directory.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl ArchiveExtractor for DirectoryExtractor {
    fn extract(&self, _replay: &Path, out_dir: &Path) -> Result<()> {
        for name in SECTION_FILES {
            let from = self.source.join(name);
            if !from.is_file() {
                continue;
            }
            fs::copy(&from, out_dir.join(name))?;
        }
        Ok(())
    }
}
