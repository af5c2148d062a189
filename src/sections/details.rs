//! The `replay.details` section.
//!
//! # Schema
//!
//! ```text
//! details: Hash {
//!     players: Array [ details: Hash {
//!         name: String, idInfo: Hash { unknown0, s2: Int32, unknown1,
//!         skippedIndex: String (raw), realId }, race: String,
//!         color: Hash { alpha, red, green, blue }, unknown0, team, handicap,
//!         unknown1, outcome
//!     } ]
//!     mapName: String, unknown1: String (raw), mapInfo: Hash { minimap: String },
//!     unknown2: Int8, datetime: VarInt, timezoneOffset: VarInt,
//!     unknown3..5: String (raw), mapFiles: Array [ hash: String (raw) ],
//!     unknown6: Int8, unknown7: VarInt, unknown8: VarInt
//! }
//! ```
//!
//! `datetime` counts 100 ns ticks from 1601; `timezoneOffset` is in ticks too.
//! Map file entries look like `s2ma\0\0<region><hash>`.

use std::fmt::Write as _;
use std::sync::OnceLock;

use serde::Serialize;
use tracing::{debug, warn};

use super::{field, integer_field, optional_integer, optional_text, record_field};
use crate::blizzerial::{Record, Schema, TypeNode, Value};
use crate::error::{ParserError, Result};

/// Section file name.
pub const DETAILS_SECTION: &str = "replay.details";

/// Ticks between 1601-01-01 and the Unix epoch, as the format counts them.
pub const UNIX_EPOCH_TICKS: i64 = 116_444_735_995_904_000;

/// Ticks per second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Byte offset of the region code in a map file entry.
const MAP_REGION_OFFSET: usize = 6;

/// Byte offset of the content hash in a map file entry.
const MAP_HASH_OFFSET: usize = 8;

fn schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        let player = TypeNode::hash(
            "details",
            vec![
                TypeNode::text("name"),
                TypeNode::hash(
                    "idInfo",
                    vec![
                        TypeNode::varint("unknown0"),
                        TypeNode::int32("s2"),
                        TypeNode::varint("unknown1"),
                        TypeNode::bytes("skippedIndex"),
                        TypeNode::varint("realId"),
                    ],
                ),
                TypeNode::text("race"),
                TypeNode::hash(
                    "color",
                    vec![
                        TypeNode::varint("alpha"),
                        TypeNode::varint("red"),
                        TypeNode::varint("green"),
                        TypeNode::varint("blue"),
                    ],
                ),
                TypeNode::varint("unknown0"),
                TypeNode::varint("team"),
                TypeNode::varint("handicap"),
                TypeNode::varint("unknown1"),
                TypeNode::varint("outcome"),
            ],
        );

        Schema::new(vec![TypeNode::hash(
            "details",
            vec![
                TypeNode::array("players", vec![player]),
                TypeNode::text("mapName"),
                TypeNode::bytes("unknown1"),
                TypeNode::hash("mapInfo", vec![TypeNode::text("minimap")]),
                TypeNode::int8("unknown2"),
                TypeNode::varint("datetime"),
                TypeNode::varint("timezoneOffset"),
                TypeNode::bytes("unknown3"),
                TypeNode::bytes("unknown4"),
                TypeNode::bytes("unknown5"),
                TypeNode::array("mapFiles", vec![TypeNode::bytes("hash")]),
                TypeNode::int8("unknown6"),
                TypeNode::varint("unknown7"),
                TypeNode::varint("unknown8"),
            ],
        )])
    })
}

/// ARGB player color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlayerColor {
    /// Alpha.
    pub alpha: u8,
    /// Red.
    pub red: u8,
    /// Green.
    pub green: u8,
    /// Blue.
    pub blue: u8,
}

impl PlayerColor {
    /// Returns the color packed as `0xAARRGGBB`.
    #[must_use]
    pub fn argb(&self) -> u32 {
        u32::from_be_bytes([self.alpha, self.red, self.green, self.blue])
    }
}

/// One player entry of the details section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailsPlayer {
    /// Display name.
    pub name: Option<String>,
    /// Battle.net account id.
    pub bnet_id: Option<i64>,
    /// Region-scoped account number.
    pub s2: Option<i64>,
    /// Localized race name.
    pub race: Option<String>,
    /// Player color.
    pub color: PlayerColor,
    /// Team index as stored in details.
    pub team: Option<i64>,
    /// Handicap percentage.
    pub handicap: Option<i64>,
    /// 1 = win, 2 = loss, 0 = unknown.
    pub outcome: Option<i64>,
}

/// A map or dependency file referenced by the replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapFile {
    /// Upper-case region code, e.g. `US`.
    pub region: String,
    /// Lower-case hex content hash.
    pub filename: String,
}

impl MapFile {
    /// Parses an `s2ma\0\0<region><hash>` entry.
    ///
    /// Returns `None` when the entry is too short to hold a region.
    #[must_use]
    pub fn from_entry(entry: &[u8]) -> Option<Self> {
        let region = entry.get(MAP_REGION_OFFSET..MAP_HASH_OFFSET)?;
        let hash = &entry[MAP_HASH_OFFSET..];

        let mut filename = String::with_capacity(hash.len() * 2);
        for byte in hash {
            // Writing to a String cannot fail
            let _ = write!(filename, "{byte:02x}");
        }

        Some(Self {
            region: String::from_utf8_lossy(region).to_uppercase(),
            filename,
        })
    }
}

/// The decoded details section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayDetails {
    /// Players in details order.
    pub players: Vec<DetailsPlayer>,
    /// Localized map name.
    pub map_name: Option<String>,
    /// Minimap image file inside the map archive.
    pub minimap: Option<String>,
    /// Game start, seconds since the Unix epoch.
    pub datetime: i64,
    /// Local time zone offset in seconds.
    pub timezone_offset: i64,
    /// Referenced map and dependency files.
    pub map_files: Vec<MapFile>,
}

impl ReplayDetails {
    /// Decodes the details section.
    ///
    /// # Errors
    ///
    /// - Any Blizzerial decode error
    /// - `ParserError::MissingField` if players, date or time zone are absent
    pub fn parse(data: &[u8]) -> Result<Self> {
        let decoded = schema().decode(data)?;
        let details = record_field(&decoded, DETAILS_SECTION, "", "details")?;

        let players = field(details, DETAILS_SECTION, "details", "players")?
            .as_list()
            .ok_or_else(|| missing("details.players"))?
            .iter()
            .map(parse_player)
            .collect::<Result<Vec<_>>>()?;

        let ticks = integer_field(details, DETAILS_SECTION, "details", "datetime")?;
        let datetime = ticks
            .checked_sub(UNIX_EPOCH_TICKS)
            .map(|t| t / TICKS_PER_SECOND)
            .ok_or_else(|| missing("details.datetime"))?;
        let timezone_offset =
            integer_field(details, DETAILS_SECTION, "details", "timezoneOffset")? / TICKS_PER_SECOND;

        let minimap = details
            .get("mapInfo")
            .and_then(Value::as_record)
            .and_then(|info| optional_text(info, "minimap"));

        let map_files = details
            .get("mapFiles")
            .and_then(Value::as_list)
            .unwrap_or_default()
            .iter()
            .filter_map(|entry| {
                let bytes = entry.get("hash").and_then(Value::as_bytes)?;
                let file = MapFile::from_entry(bytes);
                if file.is_none() {
                    warn!(length = bytes.len(), "Map file entry too short");
                }
                file
            })
            .collect::<Vec<_>>();

        debug!(
            players = players.len(),
            map_files = map_files.len(),
            bytes = data.len(),
            "Decoded details"
        );

        Ok(Self {
            players,
            map_name: optional_text(details, "mapName"),
            minimap,
            datetime,
            timezone_offset,
            map_files,
        })
    }

    /// Returns the region of the first map file, if any.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.map_files.first().map(|f| f.region.as_str())
    }
}

fn missing(field: &str) -> ParserError {
    ParserError::MissingField {
        section: DETAILS_SECTION.to_string(),
        field: field.to_string(),
    }
}

fn parse_player(element: &Record) -> Result<DetailsPlayer> {
    let player = record_field(element, DETAILS_SECTION, "details.players", "details")?;

    let id_info = player.get("idInfo").and_then(Value::as_record);
    let color = player
        .get("color")
        .and_then(Value::as_record)
        .map(|c| {
            let channel = |name: &str| {
                optional_integer(c, name)
                    .and_then(|v| u8::try_from(v).ok())
                    .unwrap_or(0)
            };
            PlayerColor {
                alpha: channel("alpha"),
                red: channel("red"),
                green: channel("green"),
                blue: channel("blue"),
            }
        })
        .unwrap_or_default();

    Ok(DetailsPlayer {
        name: optional_text(player, "name"),
        bnet_id: id_info.and_then(|info| optional_integer(info, "realId")),
        s2: id_info.and_then(|info| optional_integer(info, "s2")),
        race: optional_text(player, "race"),
        color,
        team: optional_integer(player, "team"),
        handicap: optional_integer(player, "handicap"),
        outcome: optional_integer(player, "outcome"),
    })
}
