//! Decoders for the individual replay sections.
//!
//! | File | Decoder | Format |
//! |------|---------|--------|
//! | `replay.header` | [`ReplayHeader`] | Blizzerial |
//! | `replay.details` | [`ReplayDetails`] | Blizzerial |
//! | `replay.attributes.events` | [`ReplayAttributes`] | fixed 13-byte entries |
//! | `replay.message.events` | [`MessageDecoder`] | streamed events |
//!
//! The game-event section has its own module, [`crate::events`].

mod attributes;
mod details;
mod header;
mod messages;

pub use attributes::{
    attribute_ids, interpret, Attribute, ReplayAttributes, ATTRIBUTES_SECTION, ATTRIBUTE_TAG,
    GLOBAL_SLOT,
};
pub use details::{DetailsPlayer, MapFile, PlayerColor, ReplayDetails, DETAILS_SECTION};
pub use header::{ReplayHeader, HEADER_SECTION};
pub use messages::{
    ChatChannel, MessageDecoder, MessageEvent, MessagePayload, MessageStream, MESSAGES_SECTION,
};

use crate::blizzerial::{Record, Value};
use crate::error::{ParserError, Result};

/// Looks up a field, failing with `MissingField` naming `path`.
fn field<'r>(record: &'r Record, section: &str, path: &str, name: &str) -> Result<&'r Value> {
    record.get(name).ok_or_else(|| missing(section, path, name))
}

/// Looks up a nested record.
fn record_field<'r>(record: &'r Record, section: &str, path: &str, name: &str) -> Result<&'r Record> {
    field(record, section, path, name)?
        .as_record()
        .ok_or_else(|| missing(section, path, name))
}

/// Looks up an integer field that fits `i64`.
fn integer_field(record: &Record, section: &str, path: &str, name: &str) -> Result<i64> {
    field(record, section, path, name)?
        .as_i64()
        .ok_or_else(|| missing(section, path, name))
}

/// Looks up an optional integer field; absent or non-integer is `None`.
fn optional_integer(record: &Record, name: &str) -> Option<i64> {
    record.get(name).and_then(Value::as_i64)
}

/// Looks up an optional text field; absent, missing or non-text is `None`.
fn optional_text(record: &Record, name: &str) -> Option<String> {
    record.get(name).and_then(Value::as_text).map(str::to_string)
}

fn missing(section: &str, path: &str, name: &str) -> ParserError {
    ParserError::MissingField {
        section: section.to_string(),
        field: if path.is_empty() {
            name.to_string()
        } else {
            format!("{path}.{name}")
        },
    }
}
