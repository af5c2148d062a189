//! Match summary assembled from the decoded sections.
//!
//! The [`Replay`] is built in three steps that follow the pipeline:
//!
//! 1. [`Replay::from_sections`] once header, details and attributes are decoded
//! 2. [`Replay::apply_messages`] and [`Replay::apply_game_events`] as the
//!    streaming sections deliver records
//! 3. [`Replay::finish_messages`] once the message stream ends, which decides
//!    who recorded the replay
//!
//! # Player Slots
//!
//! Details lists players without gaps, while attributes address lobby slots
//! and include `Open` ones. Players are moved onto the non-open slots in
//! order, so `Player::slot` matches attribute slots and message player ids
//! (`player_id - 1`).

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::events::GameEvent;
use crate::format::{GameSpeed, GameVersion};
use crate::sections::{
    attribute_ids as ids, interpret, ChatChannel, MapFile, MessageEvent, MessagePayload,
    ReplayAttributes, ReplayDetails, ReplayHeader,
};

/// Result of a match for one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// Not recorded.
    #[default]
    Unknown,
    /// Won.
    Win,
    /// Lost.
    Loss,
}

impl Outcome {
    /// Maps the details value: 1 win, 2 loss, anything else unknown.
    #[must_use]
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            1 => Outcome::Win,
            2 => Outcome::Loss,
            _ => Outcome::Unknown,
        }
    }
}

/// Player color from details (`argb`) and attributes (`name`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Color {
    /// Packed `0xAARRGGBB`.
    pub argb: Option<u32>,
    /// Lobby color name, e.g. `Red`.
    pub name: Option<String>,
}

/// One player of the match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Player {
    /// 0-based lobby slot.
    pub slot: u8,
    /// Display name.
    pub name: Option<String>,
    /// Battle.net account id.
    pub bnet_id: Option<i64>,
    /// Race; the lobby choice when known, else the localized details name.
    pub race: Option<String>,
    /// Color.
    pub color: Color,
    /// 0-based team index.
    pub team: Option<u8>,
    /// Handicap percentage.
    pub handicap: Option<i64>,
    /// Match outcome.
    pub outcome: Outcome,
    /// Human, Computer, Closed or Unknown.
    pub player_type: Option<String>,
    /// Computer difficulty.
    pub difficulty: Option<String>,
}

impl Player {
    /// Returns `true` if the player won.
    #[must_use]
    pub fn is_winner(&self) -> bool {
        self.outcome == Outcome::Win
    }

    /// Returns `true` if the player lost.
    #[must_use]
    pub fn is_loser(&self) -> bool {
        self.outcome == Outcome::Loss
    }

    /// Returns `true` for human or unrecognized player types.
    #[must_use]
    pub fn may_be_human(&self) -> bool {
        matches!(self.player_type.as_deref(), None | Some("Human" | "Unknown"))
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}",
            self.slot,
            self.name.as_deref().unwrap_or("<unnamed>")
        )?;
        if let Some(race) = &self.race {
            write!(f, " ({race})")?;
        }
        Ok(())
    }
}

/// Match start time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchDate {
    /// Seconds since the Unix epoch.
    pub unix: i64,
    /// Recorder's time zone offset in seconds.
    pub timezone_offset: i64,
}

/// Match metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Info {
    /// Client version.
    pub version: GameVersion,
    /// Length in frames.
    pub game_length: u64,
    /// Length in seconds at the game speed (Normal if unknown).
    pub game_length_seconds: u64,
    /// Region of the first map file.
    pub region: Option<String>,
    /// Start time.
    pub date: MatchDate,
    /// Format such as `1v1` or `Custom`.
    pub format: Option<String>,
    /// Game speed.
    pub speed: Option<GameSpeed>,
    /// Number of players listed in details.
    pub num_players: usize,
    /// Slots per team, indexed by team.
    pub teams: Vec<Vec<u8>>,
    /// Private, AutoMM or Public.
    pub game_type: Option<String>,
    /// Slot of the player who recorded the replay.
    pub recorded_by: Option<u8>,
}

/// Map metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MapInfo {
    /// Localized map name.
    pub name: Option<String>,
    /// Minimap file inside the map archive.
    pub minimap: Option<String>,
    /// Map and dependency files.
    pub files: Vec<MapFile>,
}

/// A chat line with its sender resolved to a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    /// Sender's slot.
    pub player: Option<u8>,
    /// Channel.
    pub channel: ChatChannel,
    /// Absolute frame.
    pub frame: u64,
    /// Text.
    pub text: String,
}

impl ChatMessage {
    /// Converts the frame to seconds at `speed`.
    #[must_use]
    pub fn seconds(&self, speed: GameSpeed) -> u64 {
        speed.frames_to_seconds(self.frame)
    }
}

/// The assembled replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Replay {
    /// Match metadata.
    pub info: Info,
    /// Players sorted by slot.
    pub players: Vec<Player>,
    /// Map metadata.
    pub map: MapInfo,
    /// Chat log.
    pub messages: Vec<ChatMessage>,
    /// Decoded game events, if kept.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<GameEvent>,
    #[serde(skip)]
    not_recorder: BTreeSet<u8>,
}

impl Replay {
    /// Builds the summary from the three Blizzerial sections.
    #[must_use]
    pub fn from_sections(
        header: &ReplayHeader,
        details: &ReplayDetails,
        attributes: &ReplayAttributes,
    ) -> Self {
        let players = assign_slots(details, attributes);

        let mut replay = Self {
            info: Info {
                version: header.version,
                game_length: header.game_length,
                game_length_seconds: 0,
                region: details.region().map(str::to_string),
                date: MatchDate {
                    unix: details.datetime,
                    timezone_offset: details.timezone_offset,
                },
                format: None,
                speed: None,
                num_players: details.players.len(),
                teams: Vec::new(),
                game_type: None,
                recorded_by: None,
            },
            players,
            map: MapInfo {
                name: details.map_name.clone(),
                minimap: details.minimap.clone(),
                files: details.map_files.clone(),
            },
            messages: Vec::new(),
            events: Vec::new(),
            not_recorder: BTreeSet::new(),
        };

        replay.apply_global_attributes(attributes);
        replay.info.game_length_seconds = replay
            .info
            .speed
            .unwrap_or(GameSpeed::Normal)
            .frames_to_seconds(replay.info.game_length);

        debug!(
            players = replay.players.len(),
            format = ?replay.info.format,
            speed = ?replay.info.speed,
            "Assembled partial replay"
        );

        replay
    }

    fn apply_global_attributes(&mut self, attributes: &ReplayAttributes) {
        let format = attributes
            .global(ids::FORMAT)
            .and_then(|raw| interpret(ids::FORMAT, raw));
        self.info.speed = attributes
            .global(ids::GAME_SPEED)
            .and_then(GameSpeed::from_attribute);
        self.info.game_type = attributes
            .global(ids::GAME_TYPE)
            .and_then(|raw| interpret(ids::GAME_TYPE, raw));

        let teams_id = format.as_deref().and_then(ids::teams_for_format);
        self.info.format = format;
        if let Some(teams_id) = teams_id {
            self.assign_teams(attributes, teams_id);
        }
    }

    fn assign_teams(&mut self, attributes: &ReplayAttributes, teams_id: u32) {
        let mut winning_team = None;

        for slot in attributes.slots(teams_id) {
            let Some(raw) = attributes.get(teams_id, slot) else {
                continue;
            };
            let Some(team) = parse_team(raw) else {
                warn!(slot, value = raw, "Unrecognized team attribute");
                continue;
            };
            let Some(player) = self.players.iter_mut().find(|p| p.slot == slot) else {
                debug!(slot, "Team attribute for an empty slot");
                continue;
            };

            player.team = Some(team);
            let index = usize::from(team);
            if self.info.teams.len() <= index {
                self.info.teams.resize_with(index + 1, Vec::new);
            }
            self.info.teams[index].push(slot);

            if player.is_winner() {
                winning_team = Some(team);
            }
        }

        if let Some(winner) = winning_team {
            for player in &mut self.players {
                player.outcome = if player.team == Some(winner) {
                    Outcome::Win
                } else {
                    Outcome::Loss
                };
            }
        }
    }

    /// Returns the player in `slot`.
    #[must_use]
    pub fn player(&self, slot: u8) -> Option<&Player> {
        self.players.iter().find(|p| p.slot == slot)
    }

    /// Returns the player who recorded the replay, once known.
    #[must_use]
    pub fn recorder(&self) -> Option<&Player> {
        self.info.recorded_by.and_then(|slot| self.player(slot))
    }

    /// Adds message records: chat lines join the log and presence records
    /// rule their sender out as the recorder.
    pub fn apply_messages(&mut self, records: &[MessageEvent]) {
        for record in records {
            let slot = record.player_id.checked_sub(1);
            match &record.payload {
                MessagePayload::Chat { channel, text } => self.messages.push(ChatMessage {
                    player: slot,
                    channel: *channel,
                    frame: record.frame,
                    text: text.clone(),
                }),
                MessagePayload::ObserverPresence { .. } => {
                    if let Some(slot) = slot {
                        self.not_recorder.insert(slot);
                    }
                }
                MessagePayload::Ping { .. } | MessagePayload::Other => {}
            }
        }
    }

    /// Decides the recorder once every message has been applied.
    ///
    /// The recorder is the only human (or unknown-type) player never ruled
    /// out; with zero or several candidates it stays unknown.
    pub fn finish_messages(&mut self) {
        let mut candidates = self
            .players
            .iter()
            .filter(|p| p.may_be_human() && !self.not_recorder.contains(&p.slot));

        self.info.recorded_by = match (candidates.next(), candidates.next()) {
            (Some(player), None) => Some(player.slot),
            _ => None,
        };
        debug!(recorded_by = ?self.info.recorded_by, "Resolved recorder");
    }

    /// Appends decoded game events.
    pub fn apply_game_events(&mut self, events: Vec<GameEvent>) {
        self.events.extend(events);
    }
}

/// Parses `T<n>` into a 0-based team index.
fn parse_team(raw: &str) -> Option<u8> {
    raw.strip_prefix('T')?.parse::<u8>().ok()?.checked_sub(1)
}

/// Moves details players onto the non-open attribute slots and fills in the
/// per-player attributes.
fn assign_slots(details: &ReplayDetails, attributes: &ReplayAttributes) -> Vec<Player> {
    let mut from_details = details.players.iter().map(|p| Player {
        slot: 0,
        name: p.name.clone(),
        bnet_id: p.bnet_id,
        race: p.race.clone(),
        color: Color {
            argb: Some(p.color.argb()),
            name: None,
        },
        team: None,
        handicap: p.handicap,
        outcome: p.outcome.map_or(Outcome::Unknown, Outcome::from_raw),
        player_type: None,
        difficulty: None,
    });

    let slots = attributes.slots(ids::PLAYER_TYPE);
    if slots.is_empty() {
        return (0u8..)
            .zip(from_details)
            .map(|(slot, player)| Player { slot, ..player })
            .collect();
    }

    let mut players = Vec::with_capacity(slots.len());
    for slot in slots {
        let raw_type = attributes.get(ids::PLAYER_TYPE, slot).unwrap_or_default();
        if raw_type == "Open" {
            continue;
        }

        let mut player = from_details.next().unwrap_or_default();
        player.slot = slot;
        player.player_type = interpret(ids::PLAYER_TYPE, raw_type);

        if let Some(race) = attributes
            .get(ids::PLAYER_RACE, slot)
            .and_then(|raw| interpret(ids::PLAYER_RACE, raw))
        {
            player.race = Some(race);
        }
        player.color.name = attributes
            .get(ids::PLAYER_COLOR, slot)
            .and_then(|raw| interpret(ids::PLAYER_COLOR, raw));
        player.difficulty = attributes
            .get(ids::DIFFICULTY, slot)
            .and_then(|raw| interpret(ids::DIFFICULTY, raw));

        players.push(player);
    }

    let dropped = from_details.count();
    if dropped > 0 {
        warn!(dropped, "More details players than occupied slots");
    }

    players
}
