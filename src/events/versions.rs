//! Build-versioned opcode tables.
//!
//! Each [`DecoderVersion`] owns a complete [`OpcodeTable`] and the lowest
//! build it applies to. A later version is built from the previous table by
//! overriding only the handlers whose wire layout changed.
//!
//! | Min build | Change |
//! |-----------|--------|
//! | 0 | base table |
//! | 16561 | selections use the 2-bit modify mode |

use std::fmt;
use std::sync::OnceLock;

use super::camera::decode_camera_move;
use super::handlers::{
    decode_ability, decode_alliance_change, decode_camera_unknown_08, decode_join,
    decode_leave, decode_speed_change, decode_start,
};
use super::header::EventHeader;
use super::hotkey::decode_hotkey;
use super::resources::{
    decode_cancel_resource_request, decode_resource_request, decode_resource_transfer,
};
use super::selection::{decode_selection, decode_selection_with_mode};
use super::types::GameEventKind;
use crate::binary::Cursor;
use crate::error::{ParserError, Result};

/// First build whose selections carry the 2-bit modify mode.
pub const SELECTION_MODE_BUILD: u32 = 16561;

/// Signature of a payload decoder.
pub type DecodeFn = fn(&EventHeader, &mut Cursor<'_>) -> Result<GameEventKind>;

/// What to do with an opcode's payload.
#[derive(Clone, Copy)]
pub enum Handler {
    /// Decode the payload.
    Decode(DecodeFn),
    /// Layout unknown: keep this many bytes as [`GameEventKind::Unknown`].
    Skip(usize),
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Decode(_) => f.write_str("Decode"),
            Handler::Skip(count) => write!(f, "Skip({count})"),
        }
    }
}

impl Handler {
    /// Runs the handler against the payload at the cursor.
    ///
    /// # Errors
    ///
    /// Whatever the decoder returns; `InsufficientData` for short payloads.
    pub fn run(&self, header: &EventHeader, cursor: &mut Cursor<'_>) -> Result<GameEventKind> {
        match self {
            Handler::Decode(decode) => decode(header, cursor),
            Handler::Skip(count) => Ok(GameEventKind::Unknown {
                data: cursor.read(*count)?.to_vec(),
            }),
        }
    }
}

/// One dispatch entry: an event type plus a predicate over the event code.
#[derive(Debug, Clone, Copy)]
pub struct Opcode {
    /// Name used to override the entry in later versions.
    pub name: &'static str,
    /// Event type (0-7) the entry applies to.
    pub event_type: u8,
    /// Predicate over the event code.
    pub matches: fn(u8) -> bool,
    /// Payload handler.
    pub handler: Handler,
}

/// Ordered dispatch entries; the first match wins.
#[derive(Debug, Clone)]
pub struct OpcodeTable {
    entries: Vec<Opcode>,
}

impl OpcodeTable {
    /// Creates a table from its entries.
    #[must_use]
    pub fn new(entries: Vec<Opcode>) -> Self {
        Self { entries }
    }

    /// Returns the entries in dispatch order.
    #[must_use]
    pub fn entries(&self) -> &[Opcode] {
        &self.entries
    }

    /// Returns a copy with the handler of the named entry replaced.
    #[must_use]
    pub fn with_override(&self, name: &str, handler: Handler) -> Self {
        let mut table = self.clone();
        for entry in table.entries.iter_mut().filter(|e| e.name == name) {
            entry.handler = handler;
        }
        table
    }

    /// Finds the entry for an event type and code.
    #[must_use]
    pub fn lookup(&self, event_type: u8, event_code: u8) -> Option<&Opcode> {
        self.entries
            .iter()
            .find(|e| e.event_type == event_type && (e.matches)(event_code))
    }

    /// Decodes the payload for a header.
    ///
    /// # Errors
    ///
    /// - `ParserError::UnrecognizedOpcode` if no entry matches
    /// - any error from the matching handler
    pub fn decode(&self, header: &EventHeader, cursor: &mut Cursor<'_>) -> Result<GameEventKind> {
        let opcode = self
            .lookup(header.event_type, header.event_code)
            .ok_or(ParserError::UnrecognizedOpcode {
                event_type: header.event_type,
                event_code: header.event_code,
            })?;
        opcode.handler.run(header, cursor)
    }
}

/// An opcode table and the lowest build it applies to.
#[derive(Debug, Clone)]
pub struct DecoderVersion {
    /// Lowest build decoded with this table.
    pub min_build: u32,
    /// The dispatch table.
    pub table: OpcodeTable,
}

impl DecoderVersion {
    /// Returns the version for a build: the greatest threshold not above it.
    #[must_use]
    pub fn for_build(build: u32) -> &'static DecoderVersion {
        let versions = registered_versions();
        versions
            .iter()
            .rev()
            .find(|v| v.min_build <= build)
            .unwrap_or(&versions[0])
    }
}

/// Returns every registered version in ascending build order.
pub fn registered_versions() -> &'static [DecoderVersion] {
    static VERSIONS: OnceLock<Vec<DecoderVersion>> = OnceLock::new();
    VERSIONS.get_or_init(|| {
        let base = base_table();
        let with_mode = base.with_override(
            "selection",
            Handler::Decode(decode_selection_with_mode),
        );
        vec![
            DecoderVersion {
                min_build: 0,
                table: base,
            },
            DecoderVersion {
                min_build: SELECTION_MODE_BUILD,
                table: with_mode,
            },
        ]
    })
}

fn lo(code: u8) -> u8 {
    code & 0x0F
}

fn hi(code: u8) -> u8 {
    code >> 4
}

fn entry(
    name: &'static str,
    event_type: u8,
    matches: fn(u8) -> bool,
    handler: Handler,
) -> Opcode {
    Opcode {
        name,
        event_type,
        matches,
        handler,
    }
}

/// The table for the earliest builds.
#[allow(clippy::too_many_lines)]
fn base_table() -> OpcodeTable {
    use Handler::{Decode, Skip};

    OpcodeTable::new(vec![
        // Initialization
        entry("join", 0, |c| matches!(c, 0x0B | 0x0C | 0x2B | 0x2C), Decode(decode_join)),
        entry("start", 0, |c| c == 0x05, Decode(decode_start)),
        // Player actions
        entry("ability", 1, |c| lo(c) == 0xB, Decode(decode_ability)),
        entry(
            "selection",
            1,
            |c| lo(c) == 0xC && hi(c) <= 0xA,
            Decode(decode_selection),
        ),
        entry("hotkey", 1, |c| lo(c) == 0xD && hi(c) <= 0x9, Decode(decode_hotkey)),
        entry(
            "resource_transfer",
            1,
            |c| lo(c) == 0xF && hi(c) <= 0x8,
            Decode(decode_resource_transfer),
        ),
        entry("leave", 1, |c| c == 0x09, Decode(decode_leave)),
        // Game state
        entry("alliance_change", 2, |c| c == 0x06, Decode(decode_alliance_change)),
        entry("speed_change", 2, |c| matches!(c, 0x73 | 0x83), Decode(decode_speed_change)),
        entry("game_state_unknown", 2, |c| matches!(c, 0x07 | 0x0E | 0x8F), Skip(4)),
        // Camera
        entry("camera_move", 3, |c| lo(c) == 0x1, Decode(decode_camera_move)),
        entry("camera_unknown_08", 3, |c| c == 0x08, Decode(decode_camera_unknown_08)),
        entry("camera_unknown_18", 3, |c| c == 0x18, Skip(250)),
        entry("camera_unknown_80", 3, |c| c == 0x80, Skip(4)),
        entry("camera_unknown_87", 3, |c| c == 0x87, Skip(8)),
        entry("camera_unknown_88", 3, |c| c == 0x88, Skip(514)),
        // Resource requests and friends
        entry(
            "cancel_resource_request",
            4,
            |c| lo(c) == 0x8 && (1..=8).contains(&hi(c)),
            Decode(decode_cancel_resource_request),
        ),
        entry("request_unknown_xc", 4, |c| lo(c) == 0xC, Skip(0)),
        entry("request_unknown_00", 4, |c| c == 0x00, Skip(4)),
        entry("request_unknown_82", 4, |c| c == 0x82, Skip(2)),
        entry("request_unknown_87", 4, |c| c == 0x87, Skip(4)),
        entry("resource_request", 4, |c| c == 0xC6, Decode(decode_resource_request)),
        // System
        entry("system_unknown_89", 5, |c| c == 0x89, Skip(4)),
    ])
}
