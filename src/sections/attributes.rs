//! The `replay.attributes.events` section.
//!
//! # Format
//!
//! ```text
//! [preamble: 4 or 5 bytes]     newer builds write 5, with byte 4 = 0
//! [count: u32 LE]
//! count x {
//!     [tag: E7 03 00 00]
//!     [id: u32 LE]
//!     [player: u8]             1-based; 16 is the global slot
//!     [value: 4 bytes]         reversed ASCII, NUL-padded
//! }
//! ```
//!
//! Entries are addressed by attribute id and 0-based slot. The raw values
//! are short codes like `Humn` or `Fasr`; [`interpret`] turns them into
//! readable names.

use serde::Serialize;
use tracing::{debug, warn};

use crate::binary::{read_u32_le, Cursor};
use crate::error::{ParserError, Result};
use crate::format::GameSpeed;

/// Section file name.
pub const ATTRIBUTES_SECTION: &str = "replay.attributes.events";

/// Marker that starts every attribute entry.
pub const ATTRIBUTE_TAG: [u8; 4] = [0xE7, 0x03, 0x00, 0x00];

/// 0-based slot holding game-wide attributes.
pub const GLOBAL_SLOT: u8 = 15;

/// Size of one attribute entry.
const ENTRY_SIZE: usize = 13;

/// Known attribute ids.
pub mod attribute_ids {
    /// `Humn`, `Comp`, `Open` or `Clsd`.
    pub const PLAYER_TYPE: u32 = 0x01F4;
    /// Game format, e.g. `4v4` or `Cust`.
    pub const FORMAT: u32 = 0x07D1;
    /// Game speed code.
    pub const GAME_SPEED: u32 = 0x0BB8;
    /// Race code.
    pub const PLAYER_RACE: u32 = 0x0BB9;
    /// Color code `tc01`..`tc15`.
    pub const PLAYER_COLOR: u32 = 0x0BBA;
    /// Handicap percentage.
    pub const HANDICAP: u32 = 0x0BBB;
    /// Computer difficulty.
    pub const DIFFICULTY: u32 = 0x0BBC;
    /// Lobby type.
    pub const GAME_TYPE: u32 = 0x0BC1;
    /// Team assignment for 1v1.
    pub const TEAMS_1V1: u32 = 0x07D2;
    /// Team assignment for 2v2.
    pub const TEAMS_2V2: u32 = 0x07D3;
    /// Team assignment for 3v3.
    pub const TEAMS_3V3: u32 = 0x07D4;
    /// Team assignment for 4v4.
    pub const TEAMS_4V4: u32 = 0x07D5;
    /// Team assignment for free-for-all.
    pub const TEAMS_FFA: u32 = 0x07D6;
    /// Team assignment for 6v6.
    pub const TEAMS_6V6: u32 = 0x07D8;

    /// Returns the team attribute id for a format value.
    #[must_use]
    pub fn teams_for_format(format: &str) -> Option<u32> {
        match format {
            "1v1" => Some(TEAMS_1V1),
            "2v2" => Some(TEAMS_2V2),
            "3v3" => Some(TEAMS_3V3),
            "4v4" => Some(TEAMS_4V4),
            "FFA" => Some(TEAMS_FFA),
            "6v6" => Some(TEAMS_6V6),
            _ => None,
        }
    }
}

/// One attribute entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    /// Attribute id.
    pub id: u32,
    /// 0-based slot; [`GLOBAL_SLOT`] for game-wide values.
    pub slot: u8,
    /// Raw value with the byte order restored, e.g. `Humn`.
    pub value: String,
}

/// All attribute entries of a replay, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayAttributes {
    entries: Vec<Attribute>,
}

impl ReplayAttributes {
    /// Decodes the attributes section.
    ///
    /// # Errors
    ///
    /// Returns `ParserError::InvalidAttributes` if the section is shorter than
    /// its count implies or an entry lacks the `E7 03 00 00` tag.
    ///
    /// # Example
    ///
    /// ```
    /// use sc2_replay_parser::sections::{attribute_ids, ReplayAttributes};
    ///
    /// let mut data = vec![0, 0, 0, 0, 0];
    /// data.extend_from_slice(&1u32.to_le_bytes());
    /// data.extend_from_slice(&[0xE7, 0x03, 0x00, 0x00]);
    /// data.extend_from_slice(&attribute_ids::PLAYER_TYPE.to_le_bytes());
    /// data.push(1);
    /// data.extend_from_slice(b"nmuH");
    ///
    /// let attributes = ReplayAttributes::parse(&data).unwrap();
    /// assert_eq!(attributes.get(attribute_ids::PLAYER_TYPE, 0), Some("Humn"));
    /// ```
    pub fn parse(data: &[u8]) -> Result<Self> {
        let preamble = if data.get(4) == Some(&0) { 5 } else { 4 };
        let mut cursor = Cursor::new(data);
        cursor
            .skip(preamble)
            .map_err(|_| invalid("section shorter than its preamble"))?;

        let count = cursor
            .read(4)
            .and_then(|bytes| read_u32_le(bytes, 0))
            .map_err(|_| invalid("missing attribute count"))?;

        let mut entries = Vec::new();
        for index in 0..count {
            let entry = cursor.read(ENTRY_SIZE).map_err(|_| {
                invalid(&format!("entry {index} of {count} is truncated"))
            })?;
            if entry[..4] != ATTRIBUTE_TAG {
                return Err(invalid(&format!(
                    "entry {index} has tag {:02X?}",
                    &entry[..4]
                )));
            }

            let id = read_u32_le(entry, 4)?;
            let Some(slot) = entry[8].checked_sub(1) else {
                warn!(id, "Attribute entry without a player slot");
                continue;
            };

            entries.push(Attribute {
                id,
                slot,
                value: attribute_value(&entry[9..13]),
            });
        }

        if !cursor.is_empty() {
            debug!(trailing = cursor.remaining(), "Bytes left after attributes");
        }
        debug!(entries = entries.len(), bytes = data.len(), "Decoded attributes");

        Ok(Self { entries })
    }

    /// Returns every entry in file order.
    #[must_use]
    pub fn entries(&self) -> &[Attribute] {
        &self.entries
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the value of `id` for `slot`. Later entries override earlier ones.
    #[must_use]
    pub fn get(&self, id: u32, slot: u8) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|a| a.id == id && a.slot == slot)
            .map(|a| a.value.as_str())
    }

    /// Returns the game-wide value of `id`.
    #[must_use]
    pub fn global(&self, id: u32) -> Option<&str> {
        self.get(id, GLOBAL_SLOT)
    }

    /// Returns the slots that carry `id`, ascending, excluding the global slot.
    #[must_use]
    pub fn slots(&self, id: u32) -> Vec<u8> {
        let mut slots: Vec<u8> = self
            .entries
            .iter()
            .filter(|a| a.id == id && a.slot != GLOBAL_SLOT)
            .map(|a| a.slot)
            .collect();
        slots.sort_unstable();
        slots.dedup();
        slots
    }
}

fn invalid(reason: &str) -> ParserError {
    ParserError::InvalidAttributes {
        reason: reason.to_string(),
    }
}

/// Cuts the value at the first NUL and restores the byte order.
fn attribute_value(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let mut bytes = raw[..end].to_vec();
    bytes.reverse();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Translates a raw attribute value into a readable name.
///
/// Ids without a translation return the raw value. Returns `None` for a
/// race or game type code that has no name.
///
/// | Id | Raw | Result |
/// |----|-----|--------|
/// | player type | `Humn` `Comp` `Open` `Clsd` | Human, Computer, Open, Closed, else Unknown |
/// | format | `Cust` | Custom, else unchanged |
/// | game speed | `Slor` .. `Fasr` | Slower .. Faster, else Unknown |
/// | race | `RAND` `Terr` `Prot` `Zerg` | Random, Terran, Protoss, Zerg |
/// | color | `tc01` .. `tc15` | Red .. Pink, else Unknown |
/// | difficulty | `VyEy` .. `Insa` | Very Easy .. Insane, else Unknown |
/// | game type | `Priv` `Amm` `Pub` | Private, AutoMM, Public |
#[must_use]
pub fn interpret(id: u32, value: &str) -> Option<String> {
    use attribute_ids as ids;

    let name = match id {
        ids::PLAYER_TYPE => match value {
            "Humn" => "Human",
            "Comp" => "Computer",
            "Open" => "Open",
            "Clsd" => "Closed",
            _ => "Unknown",
        },
        ids::FORMAT => match value {
            "Cust" => "Custom",
            _ => value,
        },
        ids::GAME_SPEED => GameSpeed::from_attribute(value).map_or("Unknown", |s| s.name()),
        ids::PLAYER_RACE => match value {
            "RAND" => "Random",
            "Terr" => "Terran",
            "Prot" => "Protoss",
            "Zerg" => "Zerg",
            _ => return None,
        },
        ids::PLAYER_COLOR => color_name(value).unwrap_or("Unknown"),
        ids::DIFFICULTY => match value {
            "VyEy" => "Very Easy",
            "Easy" => "Easy",
            "Medi" => "Medium",
            "Hard" => "Hard",
            "VyHd" => "Very Hard",
            "Insa" => "Insane",
            _ => "Unknown",
        },
        ids::GAME_TYPE => match value {
            "Priv" => "Private",
            "Amm" => "AutoMM",
            "Pub" => "Public",
            _ => return None,
        },
        _ => value,
    };

    Some(name.to_string())
}

fn color_name(code: &str) -> Option<&'static str> {
    const NAMES: [&str; 15] = [
        "Red",
        "Blue",
        "Teal",
        "Purple",
        "Yellow",
        "Orange",
        "Green",
        "Light Pink",
        "Violet",
        "Light Grey",
        "Dark Green",
        "Brown",
        "Light Green",
        "Dark Grey",
        "Pink",
    ];

    let number = code.strip_prefix("tc")?;
    if number.len() != 2 {
        return None;
    }
    let index: usize = number.parse().ok()?;
    NAMES.get(index.checked_sub(1)?).copied()
}
