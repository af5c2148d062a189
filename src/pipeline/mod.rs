//! The replay parsing pipeline.
//!
//! [`ReplayParser`] turns one replay file into a [`Replay`]:
//!
//! ```text
//! extract ──> header ──> details ──┐           ┌──> messages ─────┐
//!                     └─> attributes ┴─ partial ┴──> game events ──┴─> done
//! ```
//!
//! 1. The archive is extracted into a fresh working directory and the five
//!    section files are checked for.
//! 2. The header is decoded first; its build selects the game-event decoder.
//! 3. Details and attributes decode in parallel. Once both are done the
//!    partial summary is available.
//! 4. The message and game-event sections stream in parallel in chunks of
//!    [`ParserConfig::chunk_size`] bytes.
//! 5. The working directory is removed whatever the outcome.
//!
//! Progress can be observed through [`PipelineEvent`]s on a
//! [`crossbeam_channel`] sender. The first failure of any stage ends the run:
//! exactly one [`PipelineEvent::Error`] is sent, no progress follows it, and
//! the error is returned.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use sc2_replay_parser::config::ParserConfig;
//! use sc2_replay_parser::pipeline::{DirectoryExtractor, ReplayParser};
//!
//! let parser = ReplayParser::new(
//!     ParserConfig::default(),
//!     DirectoryExtractor::new("extracted/"),
//! )?;
//! let replay = parser.parse(Path::new("game.SC2Replay"))?;
//! println!("{} players", replay.players.len());
//! # Ok::<(), sc2_replay_parser::error::ParserError>(())
//! ```

mod extract;
mod latch;

pub use extract::{ArchiveExtractor, CommandExtractor, DirectoryExtractor};
pub use latch::ErrorLatch;

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use crossbeam_channel::Sender;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::config::ParserConfig;
use crate::error::{ParserError, Result};
use crate::events::{GameEvent, GameEventDecoder, GAME_EVENTS_SECTION};
use crate::replay::Replay;
use crate::sections::{
    MessageDecoder, MessageEvent, ReplayAttributes, ReplayDetails, ReplayHeader,
    ATTRIBUTES_SECTION, DETAILS_SECTION, HEADER_SECTION, MESSAGES_SECTION,
};
use crate::stream::{RecordDecoder, StreamDecoder};

/// The archive members the pipeline reads.
pub const SECTION_FILES: [&str; 5] = [
    HEADER_SECTION,
    DETAILS_SECTION,
    ATTRIBUTES_SECTION,
    MESSAGES_SECTION,
    GAME_EVENTS_SECTION,
];

/// Progress notifications from a pipeline run.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// The header was decoded.
    Header(ReplayHeader),
    /// The details section was decoded.
    Details(Box<ReplayDetails>),
    /// The attributes section was decoded.
    Attributes(ReplayAttributes),
    /// Header, details and attributes are assembled.
    Partial(Box<Replay>),
    /// A batch of message records.
    Messages(Vec<MessageEvent>),
    /// The message section ended cleanly.
    MessagesDone,
    /// A batch of game events.
    GameEvents(Vec<GameEvent>),
    /// The game-event section ended cleanly.
    GameEventsDone,
    /// Every stage completed.
    Done,
    /// The run failed; sent at most once and always last.
    Error {
        /// Rendered error.
        message: String,
    },
}

/// Runs the pipeline with an [`ArchiveExtractor`].
#[derive(Debug, Clone)]
pub struct ReplayParser<E> {
    config: ParserConfig,
    extractor: E,
}

impl ReplayParser<CommandExtractor> {
    /// Creates a parser that runs the configured extraction command.
    ///
    /// # Errors
    ///
    /// `ParserError::InvalidConfig` if the config fails validation.
    pub fn from_config(config: ParserConfig) -> Result<Self> {
        let extractor = CommandExtractor::new(config.extractor.clone());
        Self::new(config, extractor)
    }
}

impl<E: ArchiveExtractor> ReplayParser<E> {
    /// Creates a parser.
    ///
    /// # Errors
    ///
    /// `ParserError::InvalidConfig` if the config fails validation.
    pub fn new(config: ParserConfig, extractor: E) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, extractor })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses a replay.
    ///
    /// # Errors
    ///
    /// The first error of any stage.
    pub fn parse(&self, replay: &Path) -> Result<Replay> {
        self.run(replay, None)
    }

    /// Parses a replay, sending progress to `events`.
    ///
    /// # Errors
    ///
    /// The first error of any stage, also sent as [`PipelineEvent::Error`].
    pub fn parse_with_events(
        &self,
        replay: &Path,
        events: &Sender<PipelineEvent>,
    ) -> Result<Replay> {
        self.run(replay, Some(events))
    }

    fn run(&self, replay: &Path, events: Option<&Sender<PipelineEvent>>) -> Result<Replay> {
        let latch = ErrorLatch::new(events);

        let work_dir = match self.work_dir() {
            Ok(dir) => dir,
            Err(err) => {
                latch.trip(err);
                return Err(latch_error(latch));
            }
        };

        let parsed = match self.prepare(replay, work_dir.path()) {
            Ok(()) => self.stages(work_dir.path(), &latch),
            Err(err) => {
                latch.trip(err);
                None
            }
        };

        let dir_path = work_dir.path().to_path_buf();
        if let Err(err) = work_dir.close() {
            warn!(path = %dir_path.display(), error = %err, "Failed to remove working directory");
        }

        match parsed {
            Some(parsed) if !latch.is_tripped() => {
                latch.emit(PipelineEvent::Done);
                info!(replay = %replay.display(), "Replay parsed");
                Ok(parsed)
            }
            _ => Err(latch_error(latch)),
        }
    }

    fn work_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("sc2replay-");
        let dir = match &self.config.work_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    /// Extracts the archive and checks that every section file exists.
    fn prepare(&self, replay: &Path, work_dir: &Path) -> Result<()> {
        self.extractor.extract(replay, work_dir)?;

        let missing: Vec<_> = SECTION_FILES
            .iter()
            .filter(|name| !work_dir.join(name).is_file())
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(ParserError::ExtractionFailed {
                reason: format!("missing section files: {}", missing.join(", ")),
            });
        }
        info!(replay = %replay.display(), "Extracted replay");

        if self.config.delete_input {
            match fs::remove_file(replay) {
                Ok(()) => debug!(replay = %replay.display(), "Deleted input replay"),
                Err(err) => {
                    warn!(replay = %replay.display(), error = %err, "Failed to delete input replay");
                }
            }
        }
        Ok(())
    }

    /// Runs the decode stages, reporting failures to the latch.
    fn stages(&self, dir: &Path, latch: &ErrorLatch<'_>) -> Option<Replay> {
        let header = read_section(dir, HEADER_SECTION).and_then(|d| ReplayHeader::parse(&d));
        let header = trip_on_err(latch, header)?;
        latch.emit(PipelineEvent::Header(header));

        let (details, attributes) = rayon::join(
            || {
                let details =
                    read_section(dir, DETAILS_SECTION).and_then(|d| ReplayDetails::parse(&d));
                let details = trip_on_err(latch, details)?;
                latch.emit(PipelineEvent::Details(Box::new(details.clone())));
                Some(details)
            },
            || {
                let attributes = read_section(dir, ATTRIBUTES_SECTION)
                    .and_then(|d| ReplayAttributes::parse(&d));
                let attributes = trip_on_err(latch, attributes)?;
                latch.emit(PipelineEvent::Attributes(attributes.clone()));
                Some(attributes)
            },
        );
        let (details, attributes) = (details?, attributes?);

        let mut replay = Replay::from_sections(&header, &details, &attributes);
        latch.emit(PipelineEvent::Partial(Box::new(replay.clone())));
        info!(players = replay.players.len(), "Partial replay ready");

        let chunk_size = self.config.chunk_size;
        let keep_events = self.config.keep_game_events;
        let (messages, game_events) = rayon::join(
            || {
                let mut messages = Vec::new();
                let result = stream_section(dir, MessageDecoder, chunk_size, latch, |batch| {
                    if latch.has_listener() {
                        latch.emit(PipelineEvent::Messages(batch.clone()));
                    }
                    messages.extend(batch);
                });
                trip_on_err(latch, result)?;
                latch.emit(PipelineEvent::MessagesDone);
                Some(messages)
            },
            || {
                let decoder = GameEventDecoder::for_build(header.version.build);
                let mut events = Vec::new();
                let result = stream_section(dir, decoder, chunk_size, latch, |batch| {
                    if latch.has_listener() {
                        latch.emit(PipelineEvent::GameEvents(batch.clone()));
                    }
                    if keep_events {
                        events.extend(batch);
                    }
                });
                trip_on_err(latch, result)?;
                latch.emit(PipelineEvent::GameEventsDone);
                Some(events)
            },
        );

        replay.apply_messages(&messages?);
        replay.finish_messages();
        replay.apply_game_events(game_events?);
        Some(replay)
    }
}

fn latch_error(latch: ErrorLatch<'_>) -> ParserError {
    latch.into_error().unwrap_or_else(|| ParserError::StreamAborted {
        section: "pipeline".to_string(),
    })
}

fn trip_on_err<T>(latch: &ErrorLatch<'_>, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            latch.trip(err);
            None
        }
    }
}

fn read_section(dir: &Path, section: &str) -> Result<Vec<u8>> {
    let data =
        fs::read(dir.join(section)).map_err(|e| ParserError::section_unreadable(section, e))?;
    debug!(section, bytes = data.len(), "Read section");
    Ok(data)
}

/// Feeds a section file through a stream decoder in `chunk_size` reads.
///
/// Stops early once another stage has tripped the latch.
fn stream_section<D: RecordDecoder>(
    dir: &Path,
    decoder: D,
    chunk_size: usize,
    latch: &ErrorLatch<'_>,
    mut on_batch: impl FnMut(Vec<D::Record>),
) -> Result<()> {
    let section = decoder.section();
    let mut file =
        File::open(dir.join(section)).map_err(|e| ParserError::section_unreadable(section, e))?;
    let mut stream = StreamDecoder::new(decoder);
    let mut buffer = vec![0u8; chunk_size];

    loop {
        if latch.is_tripped() {
            return Err(ParserError::StreamAborted {
                section: section.to_string(),
            });
        }

        let read = file
            .read(&mut buffer)
            .map_err(|e| ParserError::section_unreadable(section, e))?;
        if read == 0 {
            break;
        }

        let batch = stream.feed(&buffer[..read])?;
        if !batch.is_empty() {
            on_batch(batch);
        }
    }

    let records = stream.records();
    stream.finish()?;
    debug!(section, records, "Decoded stream");
    Ok(())
}
