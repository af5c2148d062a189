//! Game event types.
//!
//! Every decoded event is a [`GameEvent`]: the [`EventHeader`] it was read
//! with plus a [`GameEventKind`] carrying the variant-specific payload.

use std::fmt;

use serde::Serialize;

use super::camera::CameraMove;
use super::header::EventHeader;
use super::hotkey::Hotkey;
use super::selection::Selection;

/// A decoded game event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameEvent {
    /// Header the event was read with.
    #[serde(flatten)]
    pub header: EventHeader,

    /// Event payload.
    pub kind: GameEventKind,
}

impl GameEvent {
    /// Creates a new event.
    #[must_use]
    pub fn new(header: EventHeader, kind: GameEventKind) -> Self {
        Self { header, kind }
    }

    /// Returns the absolute frame of the event.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.header.frame
    }

    /// Returns the player slot that issued the event.
    #[must_use]
    pub fn player_id(&self) -> u8 {
        self.header.player_id
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[P{} @{}] {}",
            self.header.player_id, self.header.frame, self.kind
        )
    }
}

/// Direction of a game speed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpeedDirection {
    /// Code 0x83.
    Increase,
    /// Code 0x73.
    Decrease,
}

/// Payload of a game event.
///
/// Opcodes whose layout is not understood decode to [`GameEventKind::Unknown`]
/// with the bytes they are known to occupy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum GameEventKind {
    /// A player joined (type 0).
    Join,
    /// A player left (type 1, code 0x09).
    Leave,
    /// The game started (type 0, code 0x05).
    Start,
    /// Alliance settings changed (type 2, code 0x06).
    AllianceChange {
        /// Undecoded payload.
        data: [u8; 8],
    },
    /// Game speed raised or lowered (type 2, codes 0x73/0x83).
    SpeedChange {
        /// Which way the speed moved.
        direction: SpeedDirection,
        /// Undecoded payload byte.
        data: u8,
    },
    /// Screen moved, with optional zoom or rotation (type 3).
    CameraMove(CameraMove),
    /// Unit selection changed (type 1, low nibble 0xC).
    Selection(Selection),
    /// An ability was used (type 1, low nibble 0xB).
    Ability {
        /// 24-bit ability code.
        ability_code: u32,
    },
    /// Control group operation (type 1, low nibble 0xD).
    Hotkey(Hotkey),
    /// Resources sent to an ally (type 1, low nibble 0xF).
    ResourceTransfer {
        /// Receiving player (high nibble of the code).
        target_player: u8,
        /// Minerals sent.
        minerals: u32,
        /// Vespene gas sent.
        gas: u32,
    },
    /// Resources requested from allies (type 4, code 0xC6).
    ResourceRequest {
        /// Minerals requested.
        minerals: u32,
        /// Vespene gas requested.
        gas: u32,
    },
    /// An earlier resource request was withdrawn (type 4, low nibble 0x8).
    CancelResourceRequest {
        /// Undecoded payload.
        data: [u8; 4],
    },
    /// An opcode with no known layout.
    Unknown {
        /// Bytes the opcode is known to occupy, if any.
        data: Vec<u8>,
    },
}

impl GameEventKind {
    /// Returns the name of this event kind.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            GameEventKind::Join => "Join",
            GameEventKind::Leave => "Leave",
            GameEventKind::Start => "Start",
            GameEventKind::AllianceChange { .. } => "AllianceChange",
            GameEventKind::SpeedChange { .. } => "SpeedChange",
            GameEventKind::CameraMove(_) => "CameraMove",
            GameEventKind::Selection(_) => "Selection",
            GameEventKind::Ability { .. } => "Ability",
            GameEventKind::Hotkey(_) => "Hotkey",
            GameEventKind::ResourceTransfer { .. } => "ResourceTransfer",
            GameEventKind::ResourceRequest { .. } => "ResourceRequest",
            GameEventKind::CancelResourceRequest { .. } => "CancelResourceRequest",
            GameEventKind::Unknown { .. } => "Unknown",
        }
    }

    /// Returns `true` for opcodes decoded as placeholders.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, GameEventKind::Unknown { .. })
    }
}

impl fmt::Display for GameEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEventKind::SpeedChange { direction, .. } => {
                write!(f, "SpeedChange: {direction:?}")
            }
            GameEventKind::CameraMove(camera) => write!(f, "{camera}"),
            GameEventKind::Selection(selection) => write!(f, "{selection}"),
            GameEventKind::Ability { ability_code } => {
                write!(f, "Ability: 0x{ability_code:06X}")
            }
            GameEventKind::Hotkey(hotkey) => write!(f, "{hotkey}"),
            GameEventKind::ResourceTransfer {
                target_player,
                minerals,
                gas,
            } => write!(
                f,
                "ResourceTransfer: {minerals} minerals, {gas} gas to P{target_player}"
            ),
            GameEventKind::ResourceRequest { minerals, gas } => {
                write!(f, "ResourceRequest: {minerals} minerals, {gas} gas")
            }
            GameEventKind::Unknown { data } => write!(f, "Unknown ({} bytes)", data.len()),
            other => f.write_str(other.type_name()),
        }
    }
}
