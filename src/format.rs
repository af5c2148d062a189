//! Game version and game speed for SC2 replays.
//!
//! The header section carries the client version that wrote the replay. Its
//! build number selects the opcode table used for the game-event stream (see
//! [`crate::events::DecoderVersion`]).
//!
//! Game lengths are stored in frames. How many frames make a second depends
//! on the game speed chosen in the lobby, so converting a length to seconds
//! needs the speed from the attributes section.
//!
//! # Example
//!
//! ```
//! use sc2_replay_parser::format::GameSpeed;
//!
//! let speed = GameSpeed::from_attribute("Fasr").unwrap();
//! assert_eq!(speed, GameSpeed::Faster);
//! assert_eq!(speed.frames_to_seconds(14419), 653);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// The client version that recorded a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GameVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Patch level.
    pub patch: u32,
    /// Build number; selects the game-event decoder.
    pub build: u32,
}

impl GameVersion {
    /// Creates a version from its four components.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32, build: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            build,
        }
    }
}

impl fmt::Display for GameVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.patch, self.build
        )
    }
}

/// Lobby game speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameSpeed {
    /// "Slor"
    Slower,
    /// "Slow"
    Slow,
    /// "Norm"
    Normal,
    /// "Fast"
    Fast,
    /// "Fasr", the ladder default.
    Faster,
}

impl GameSpeed {
    /// Parses the four-character attribute value.
    #[must_use]
    pub fn from_attribute(value: &str) -> Option<Self> {
        match value {
            "Slor" => Some(GameSpeed::Slower),
            "Slow" => Some(GameSpeed::Slow),
            "Norm" => Some(GameSpeed::Normal),
            "Fast" => Some(GameSpeed::Fast),
            "Fasr" => Some(GameSpeed::Faster),
            _ => None,
        }
    }

    /// Returns the display name used in summaries.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            GameSpeed::Slower => "Slower",
            GameSpeed::Slow => "Slow",
            GameSpeed::Normal => "Normal",
            GameSpeed::Fast => "Fast",
            GameSpeed::Faster => "Faster",
        }
    }

    /// Returns the number of game frames per real second.
    #[must_use]
    pub const fn frames_per_second(&self) -> f64 {
        match self {
            GameSpeed::Slower => 9.638_55,
            GameSpeed::Slow => 12.8,
            GameSpeed::Normal => 16.0,
            GameSpeed::Fast => 19.335_34,
            GameSpeed::Faster => 22.068_97,
        }
    }

    /// Converts a frame count to whole seconds, rounding to nearest.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn frames_to_seconds(&self, frames: u64) -> u64 {
        #[allow(clippy::cast_precision_loss)]
        let seconds = frames as f64 / self.frames_per_second();
        seconds.round() as u64
    }
}

impl fmt::Display for GameSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
