//! The `replay.header` section.
//!
//! # Schema
//!
//! ```text
//! header: Hash {
//!     0 unknown0: String (text)
//!     1 version: Hash { unknown0, major, minor, patch, build, unknown1 } (all VarInt)
//!     2 unknown1: VarInt
//!     3 gameLength: VarInt (frames)
//! }
//! ```

use std::sync::OnceLock;

use serde::Serialize;
use tracing::debug;

use super::{integer_field, record_field};
use crate::blizzerial::{Schema, TypeNode};
use crate::error::{ParserError, Result};
use crate::format::GameVersion;

/// Section file name.
pub const HEADER_SECTION: &str = "replay.header";

fn schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::new(vec![TypeNode::hash(
            "header",
            vec![
                TypeNode::text("unknown0"),
                TypeNode::hash(
                    "version",
                    vec![
                        TypeNode::varint("unknown0"),
                        TypeNode::varint("major"),
                        TypeNode::varint("minor"),
                        TypeNode::varint("patch"),
                        TypeNode::varint("build"),
                        TypeNode::varint("unknown1"),
                    ],
                ),
                TypeNode::varint("unknown1"),
                TypeNode::varint("gameLength"),
            ],
        )])
    })
}

/// The decoded header section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReplayHeader {
    /// Client version that recorded the replay.
    pub version: GameVersion,
    /// Game length in frames.
    pub game_length: u64,
}

impl ReplayHeader {
    /// Decodes the header section.
    ///
    /// # Errors
    ///
    /// - Any Blizzerial decode error
    /// - `ParserError::MissingField` if the version or game length is absent
    ///   or out of range
    pub fn parse(data: &[u8]) -> Result<Self> {
        let decoded = schema().decode(data)?;
        let header = record_field(&decoded, HEADER_SECTION, "", "header")?;
        let version = record_field(header, HEADER_SECTION, "header", "version")?;

        let component = |name: &str| -> Result<u32> {
            let value = integer_field(version, HEADER_SECTION, "header.version", name)?;
            u32::try_from(value).map_err(|_| ParserError::MissingField {
                section: HEADER_SECTION.to_string(),
                field: format!("header.version.{name}"),
            })
        };

        let version = GameVersion::new(
            component("major")?,
            component("minor")?,
            component("patch")?,
            component("build")?,
        );

        let game_length = integer_field(header, HEADER_SECTION, "header", "gameLength")?;
        let game_length = u64::try_from(game_length).map_err(|_| ParserError::MissingField {
            section: HEADER_SECTION.to_string(),
            field: "header.gameLength".to_string(),
        })?;

        debug!(%version, game_length, bytes = data.len(), "Decoded header");

        Ok(Self {
            version,
            game_length,
        })
    }
}
