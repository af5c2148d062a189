//! Shared fixture builders for the integration tests.
//!
//! Replays are assembled byte by byte from small writers so that every
//! section can be produced without shipping binary files.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use num_bigint::BigInt;
use sc2_replay_parser::blizzerial::encode_varint;
use sc2_replay_parser::pipeline::SECTION_FILES;

// ============================================================================
// Blizzerial writers
// ============================================================================

/// A bare VarInt body, no tag.
pub fn raw_varint(value: i64) -> Vec<u8> {
    encode_varint(&BigInt::from(value))
}

/// Tag 9 VarInt.
pub fn varint(value: i64) -> Vec<u8> {
    let mut out = vec![0x09];
    out.extend(raw_varint(value));
    out
}

/// Tag 6 single-byte integer.
pub fn int8(value: i8) -> Vec<u8> {
    let magnitude = value.unsigned_abs();
    vec![0x06, (magnitude << 1) | u8::from(value < 0)]
}

/// Tag 7 four-byte integer.
pub fn int32(value: i32) -> Vec<u8> {
    let raw = (value.unsigned_abs() << 1) | u32::from(value < 0);
    let mut out = vec![0x07];
    out.extend_from_slice(&raw.to_le_bytes());
    out
}

/// Tag 2 string.
pub fn text(bytes: &[u8]) -> Vec<u8> {
    let mut out = vec![0x02];
    out.extend(raw_varint(len(bytes.len())));
    out.extend_from_slice(bytes);
    out
}

/// Tag 5 hash of `(index, encoded value)` pairs.
pub fn hash(entries: Vec<(i64, Vec<u8>)>) -> Vec<u8> {
    let mut out = vec![0x05];
    out.extend(raw_varint(len(entries.len())));
    for (index, value) in entries {
        out.extend(raw_varint(index));
        out.extend(value);
    }
    out
}

/// Tag 4 array; each item is the encoded chain of one element.
pub fn array(items: Vec<Vec<u8>>) -> Vec<u8> {
    let mut out = vec![0x04, 0x01, 0x00];
    out.extend(raw_varint(len(items.len())));
    for item in items {
        out.extend(item);
    }
    out
}

fn len(n: usize) -> i64 {
    i64::try_from(n).unwrap()
}

// ============================================================================
// Section writers
// ============================================================================

/// Header section for a version and game length in frames.
pub fn header_section(version: [i64; 4], game_length: i64) -> Vec<u8> {
    hash(vec![
        (
            1,
            hash(vec![
                (1, varint(version[0])),
                (2, varint(version[1])),
                (3, varint(version[2])),
                (4, varint(version[3])),
            ]),
        ),
        (3, varint(game_length)),
    ])
}

/// One player of the details section.
pub struct DetailsEntry {
    pub name: &'static str,
    pub race: &'static str,
    pub bnet_id: i64,
    pub color: [i64; 4],
    pub team: i64,
    pub outcome: i64,
}

fn details_player(player: &DetailsEntry) -> Vec<u8> {
    hash(vec![
        (0, text(player.name.as_bytes())),
        (
            1,
            hash(vec![
                (0, varint(1)),
                (1, int32(42)),
                (2, varint(1)),
                (3, text(&[])),
                (4, varint(player.bnet_id)),
            ]),
        ),
        (2, text(player.race.as_bytes())),
        (
            3,
            hash(vec![
                (0, varint(player.color[0])),
                (1, varint(player.color[1])),
                (2, varint(player.color[2])),
                (3, varint(player.color[3])),
            ]),
        ),
        (5, varint(player.team)),
        (6, varint(100)),
        (8, varint(player.outcome)),
    ])
}

/// Details section with the given players and map.
pub fn details_section(
    players: &[DetailsEntry],
    map_name: &str,
    ticks: i64,
    timezone_ticks: i64,
    map_files: &[Vec<u8>],
) -> Vec<u8> {
    hash(vec![
        (0, array(players.iter().map(details_player).collect())),
        (1, text(map_name.as_bytes())),
        (3, hash(vec![(0, text(b"Minimap.tga"))])),
        (4, int8(0)),
        (5, varint(ticks)),
        (6, varint(timezone_ticks)),
        (10, array(map_files.iter().map(|f| text(f)).collect())),
        (11, int8(0)),
    ])
}

/// A `s2ma\0\0<region><hash>` map file entry.
pub fn map_file(region: &[u8; 2], digest: &[u8]) -> Vec<u8> {
    let mut entry = b"s2ma\0\0".to_vec();
    entry.extend_from_slice(region);
    entry.extend_from_slice(digest);
    entry
}

/// Attributes section of `(id, player byte, value)` entries.
///
/// Values are given as read; they are stored reversed and NUL padded.
pub fn attributes_section(entries: &[(u32, u8, &str)]) -> Vec<u8> {
    let mut out = vec![0u8; 5];
    out.extend_from_slice(&u32::try_from(entries.len()).unwrap().to_le_bytes());
    for (id, player, value) in entries {
        out.extend_from_slice(&[0xE7, 0x03, 0x00, 0x00]);
        out.extend_from_slice(&id.to_le_bytes());
        out.push(*player);
        let mut stored = [0u8; 4];
        for (slot, byte) in stored.iter_mut().zip(value.bytes().rev()) {
            *slot = byte;
        }
        out.extend_from_slice(&stored);
    }
    out
}

// ============================================================================
// Event stream writers
// ============================================================================

/// Single-byte frame delta (`delta < 64`).
pub fn timestamp(delta: u8) -> u8 {
    assert!(delta < 64);
    delta << 2
}

/// A game event record: timestamp, player/type byte, code, payload.
pub fn game_event(delta: u8, player: u8, event_type: u8, code: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![timestamp(delta), (event_type << 5) | player, code];
    out.extend_from_slice(payload);
    out
}

/// Ability payload without the trailing switch byte.
pub fn ability_payload(code: u32) -> Vec<u8> {
    let mut payload = vec![0u8; 4];
    payload.extend_from_slice(&code.to_be_bytes()[1..]);
    payload.push(0x00);
    payload.extend_from_slice(&[0u8; 24]);
    payload
}

/// A chat message record; `text` must be shorter than 64 bytes.
pub fn chat_message(delta: u8, player: u8, channel: u8, text: &[u8]) -> Vec<u8> {
    let mut out = vec![timestamp(delta), player, channel & 0x03];
    out.push(u8::try_from(text.len()).unwrap());
    out.extend_from_slice(text);
    out
}

/// An observer-presence (0x80) message record.
pub fn presence_message(delta: u8, player: u8) -> Vec<u8> {
    vec![timestamp(delta), player, 0x80, 0, 0, 0, 0]
}

/// A ping (0x83) message record.
pub fn ping_message(delta: u8, player: u8) -> Vec<u8> {
    vec![timestamp(delta), player, 0x83, 1, 2, 3, 4, 5, 6, 7, 8]
}

// ============================================================================
// 4v4 fixture
// ============================================================================

/// Build the fixture was recorded with.
pub const FIXTURE_BUILD: i64 = 19776;

/// Game length in frames.
pub const FIXTURE_FRAMES: i64 = 14419;

/// Start time in ticks since 1601.
pub const FIXTURE_TICKS: i64 = 129_627_762_525_904_000;

/// Time zone offset in ticks.
pub const FIXTURE_TZ_TICKS: i64 = -144_000_000_000;

/// Player id (1-based) that never announces presence.
pub const FIXTURE_RECORDER_ID: u8 = 3;

const NAMES: [&str; 8] = [
    "Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot", "Golf", "Hotel",
];
const RACE_CODES: [&str; 4] = ["Terr", "Prot", "Zerg", "RAND"];

/// The five section files of an 8-player 4v4 ladder game.
pub struct Fixture {
    pub header: Vec<u8>,
    pub details: Vec<u8>,
    pub attributes: Vec<u8>,
    pub messages: Vec<u8>,
    pub game_events: Vec<u8>,
}

impl Fixture {
    /// Returns the section bytes in `SECTION_FILES` order.
    pub fn sections(&self) -> [&[u8]; 5] {
        [
            &self.header,
            &self.details,
            &self.attributes,
            &self.messages,
            &self.game_events,
        ]
    }

    /// Writes every section file into `dir`.
    pub fn write_to(&self, dir: &Path) {
        for (name, data) in SECTION_FILES.iter().zip(self.sections()) {
            fs::write(dir.join(name), data).unwrap();
        }
    }
}

pub fn four_vs_four() -> Fixture {
    let players: Vec<DetailsEntry> = NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| DetailsEntry {
            name: *name,
            race: "Localized",
            bnet_id: 1000 + i64::try_from(i).unwrap(),
            color: [255, 180, 20, 30],
            team: i64::from(i >= 4),
            // Only the first player carries a result; the team shares it
            outcome: if i == 0 { 1 } else { 0 },
        })
        .collect();

    let details = details_section(
        &players,
        "Megaton",
        FIXTURE_TICKS,
        FIXTURE_TZ_TICKS,
        &[map_file(b"us", &[0xDE, 0xAD, 0xBE, 0xEF])],
    );

    let mut attributes: Vec<(u32, u8, &str)> = vec![
        (0x07D1, 16, "4v4"),
        (0x0BB8, 16, "Fasr"),
        (0x0BC1, 16, "Amm"),
    ];
    let colors = ["tc01", "tc02", "tc03", "tc04", "tc05", "tc06", "tc07", "tc08"];
    for player in 1..=8u8 {
        let i = usize::from(player - 1);
        attributes.push((0x01F4, player, "Humn"));
        attributes.push((0x0BB9, player, RACE_CODES[i % 4]));
        attributes.push((0x0BBA, player, colors[i]));
        attributes.push((0x07D5, player, if player <= 4 { "T1" } else { "T2" }));
    }

    let mut messages = Vec::new();
    for player in (1..=8u8).filter(|p| *p != FIXTURE_RECORDER_ID) {
        messages.extend(presence_message(0, player));
    }
    messages.extend(chat_message(10, 1, 0, b"gl hf"));
    messages.extend(ping_message(3, 2));
    messages.extend(chat_message(40, 5, 2, b"gg"));

    let mut game_events = Vec::new();
    for player in 1..=8u8 {
        game_events.extend(game_event(0, player, 0, 0x0B, &[]));
    }
    game_events.extend(game_event(0, 0, 0, 0x05, &[]));
    game_events.extend(game_event(16, 1, 1, 0x0B, &ability_payload(0x02_0F00)));
    game_events.extend(game_event(2, 2, 2, 0x06, &[0u8; 8]));
    game_events.extend(game_event(1, 2, 2, 0x07, &[9, 9, 9, 9]));
    game_events.extend(game_event(4, 3, 3, 0x61, &[0x48, 0x30, 0x24, 0x00]));
    game_events.extend(game_event(1, 3, 3, 0x80, &[0, 0, 0, 0]));
    game_events.extend(game_event(
        5,
        4,
        4,
        0xC6,
        &[
            0x00, 0x00, 0x01, 0x12, // minerals
            0x00, 0x00, 0x00, 0x00, // gas
            0x00, 0x00, 0x00, 0x00, //
            0x00, 0x00, 0x00, 0x00,
        ],
    ));
    game_events.extend(game_event(30, 8, 1, 0x09, &[]));

    Fixture {
        header: header_section([1, 4, 1, FIXTURE_BUILD], FIXTURE_FRAMES),
        details,
        attributes: attributes_section(&attributes),
        messages,
        game_events,
    }
}

/// Number of game events in the fixture.
pub const FIXTURE_GAME_EVENTS: usize = 16;

/// Number of message records in the fixture.
pub const FIXTURE_MESSAGES: usize = 10;
