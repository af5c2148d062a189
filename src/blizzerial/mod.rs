//! The Blizzerial grammar decoder.
//!
//! The header, details and (in part) attributes sections are written in a
//! self-describing, tag-prefixed format. Each value starts with a tag byte:
//!
//! | Tag | Type   | Payload |
//! |-----|--------|---------|
//! | 2   | String | VarInt length, then bytes (length 0 = absent) |
//! | 4   | Array  | 2 marker bytes `01 00`, VarInt count, elements |
//! | 5   | Hash   | VarInt count, then (VarInt index, value) pairs |
//! | 6   | Int8   | 1 byte |
//! | 7   | Int32  | 4 bytes, little-endian |
//! | 9   | VarInt | continuation-coded integer |
//!
//! All integers carry their sign in bit 0 and their magnitude in the
//! remaining bits.
//!
//! A section grammar is a [`Schema`] of [`TypeNode`]s. Decoding produces a
//! [`Record`] of named [`Value`]s. Hashes are sparse: indices the writer left
//! out are simply missing from the record, while indices the schema does not
//! declare are an error.
//!
//! # Example
//!
//! ```
//! use sc2_replay_parser::blizzerial::{Schema, TypeNode};
//!
//! let schema = Schema::new(vec![TypeNode::text("name")]);
//! let record = schema.decode(&[0x02, 0x08, b'D', b'E', b'F', b'G']).unwrap();
//! assert_eq!(record["name"].as_text(), Some("DEFG"));
//! ```

mod schema;
mod value;
mod varint;

pub use schema::{NodeKind, Schema, Tag, TypeNode, ARRAY_MARKER};
pub use value::{Record, Value};
pub use varint::{encode_varint, read_varint, sign_and_shift, Integer, NATIVE_VARINT_BYTES};
