//! # SC2 Replay Parser
//!
//! A StarCraft II replay (.SC2Replay) section decoder.
//!
//! A replay is an archive of member files ("sections"). Unpacking the archive
//! is delegated to an external extractor; this library decodes the sections:
//! - **Header, details** in the self-describing Blizzerial grammar
//! - **Attributes** as fixed 13-byte lobby entries
//! - **Messages and game events** as bit-packed event streams, decoded
//!   incrementally and dispatched by client build
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use sc2_replay_parser::config::ParserConfig;
//! use sc2_replay_parser::error::Result;
//! use sc2_replay_parser::pipeline::ReplayParser;
//!
//! fn parse_replay(path: &Path) -> Result<()> {
//!     let parser = ReplayParser::from_config(ParserConfig::default())?;
//!     let replay = parser.parse(path)?;
//!
//!     println!("Version: {}", replay.info.version);
//!     println!("Length: {} s", replay.info.game_length_seconds);
//!     for player in &replay.players {
//!         println!("  {player}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Sections can also be decoded on their own:
//!
//! ```no_run
//! use sc2_replay_parser::sections::ReplayHeader;
//!
//! let data = std::fs::read("replay.header")?;
//! let header = ReplayHeader::parse(&data)?;
//! println!("Build {}", header.version.build);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Module Overview
//!
//! - [`error`] - Error types and result alias
//! - [`binary`] - Byte and bit cursors
//! - [`format`] - Game version and game speed
//! - [`blizzerial`] - VarInts and the schema-driven grammar decoder
//! - [`sections`] - Header, details, attributes and message sections
//! - [`events`] - Game-event decoding with per-build opcode tables
//! - [`stream`] - Incremental decoding for the streaming sections
//! - [`replay`] - Match summary assembly
//! - [`pipeline`] - Extraction, staging and progress events
//! - [`config`] - Parser configuration
//!
//! ## Format Reference
//!
//! - **Blizzerial**: every value starts with a tag byte (2 string, 4 array,
//!   5 hash, 6 int8, 7 int32, 9 VarInt). Integers carry their sign in bit 0.
//! - **Event streams**: each record starts with a 1 to 4 byte frame delta;
//!   frames are the running sum of deltas.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod binary;
pub mod blizzerial;
pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod pipeline;
pub mod replay;
pub mod sections;
pub mod stream;

// Re-export commonly used types at the crate root
pub use config::ParserConfig;
pub use error::{ParserError, Result};
pub use events::{GameEvent, GameEventDecoder, GameEventKind, GameEventStream};
pub use format::{GameSpeed, GameVersion};
pub use pipeline::{
    ArchiveExtractor, CommandExtractor, DirectoryExtractor, PipelineEvent, ReplayParser,
};
pub use replay::{ChatMessage, Info, MapInfo, Player, Replay};
pub use sections::{MessageStream, ReplayAttributes, ReplayDetails, ReplayHeader};
