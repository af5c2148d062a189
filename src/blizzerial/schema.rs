//! Type nodes and schemas for the Blizzerial grammar.

use tracing::{debug, warn};

use super::value::{Record, Value};
use super::varint::{read_varint, sign_and_shift, Integer};
use crate::binary::{read_u32_le, Cursor};
use crate::error::{ParserError, Result};

/// Wire tag bytes that prefix every Blizzerial value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Tag {
    /// Length-prefixed byte string.
    String = 2,
    /// Marker, count, then repeated elements.
    Array = 4,
    /// Count, then index-keyed entries.
    Hash = 5,
    /// One byte, sign in bit 0.
    Int8 = 6,
    /// Four little-endian bytes, sign in bit 0.
    Int32 = 7,
    /// Continuation-coded integer.
    VarInt = 9,
}

/// The marker expected between an array tag and its element count.
pub const ARRAY_MARKER: [u8; 2] = [0x01, 0x00];

/// The shape of a [`TypeNode`].
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Entries keyed by a wire index; entries may be missing on the wire.
    Hash(Vec<(u64, TypeNode)>),
    /// Each element decodes every child node in order into one record.
    Array(Vec<TypeNode>),
    /// A signed byte.
    Int8,
    /// A signed 32-bit integer.
    Int32,
    /// A signed VarInt of any width.
    VarInt,
    /// A byte string, optionally decoded as UTF-8 text.
    String {
        /// Decode to text instead of keeping raw bytes.
        decode: bool,
    },
}

/// A named node of a Blizzerial schema tree.
///
/// Schemas are built once and shared read-only by every decode.
///
/// # Example
///
/// ```
/// use sc2_replay_parser::binary::Cursor;
/// use sc2_replay_parser::blizzerial::TypeNode;
///
/// let node = TypeNode::hash(
///     "version",
///     vec![TypeNode::varint("major"), TypeNode::varint("minor")],
/// );
///
/// // Hash with two entries: index 0 = 1, index 1 = 4
/// let data = [0x05, 0x04, 0x00, 0x09, 0x02, 0x02, 0x09, 0x08];
/// let value = node.decode(&mut Cursor::new(&data)).unwrap();
/// let record = value.as_record().unwrap();
/// assert_eq!(record["major"].as_i64(), Some(1));
/// assert_eq!(record["minor"].as_i64(), Some(4));
/// ```
#[derive(Debug, Clone)]
pub struct TypeNode {
    name: &'static str,
    kind: NodeKind,
}

impl TypeNode {
    /// Creates a node of any kind.
    #[must_use]
    pub fn new(name: &'static str, kind: NodeKind) -> Self {
        Self { name, kind }
    }

    /// Creates a hash whose children take wire indices 0, 1, 2, ... in order.
    #[must_use]
    pub fn hash(name: &'static str, children: Vec<TypeNode>) -> Self {
        let indexed = (0u64..).zip(children).collect();
        Self::new(name, NodeKind::Hash(indexed))
    }

    /// Creates a hash with explicit wire indices.
    #[must_use]
    pub fn sparse_hash(name: &'static str, children: Vec<(u64, TypeNode)>) -> Self {
        Self::new(name, NodeKind::Hash(children))
    }

    /// Creates an array whose elements decode `children` in order.
    #[must_use]
    pub fn array(name: &'static str, children: Vec<TypeNode>) -> Self {
        Self::new(name, NodeKind::Array(children))
    }

    /// Creates an Int8 node.
    #[must_use]
    pub fn int8(name: &'static str) -> Self {
        Self::new(name, NodeKind::Int8)
    }

    /// Creates an Int32 node.
    #[must_use]
    pub fn int32(name: &'static str) -> Self {
        Self::new(name, NodeKind::Int32)
    }

    /// Creates a VarInt node.
    #[must_use]
    pub fn varint(name: &'static str) -> Self {
        Self::new(name, NodeKind::VarInt)
    }

    /// Creates a string node decoded as UTF-8 text.
    #[must_use]
    pub fn text(name: &'static str) -> Self {
        Self::new(name, NodeKind::String { decode: true })
    }

    /// Creates a string node kept as raw bytes.
    #[must_use]
    pub fn bytes(name: &'static str) -> Self {
        Self::new(name, NodeKind::String { decode: false })
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the node's shape.
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns the tag this node expects on the wire.
    #[must_use]
    pub fn tag(&self) -> Tag {
        match self.kind {
            NodeKind::Hash(_) => Tag::Hash,
            NodeKind::Array(_) => Tag::Array,
            NodeKind::Int8 => Tag::Int8,
            NodeKind::Int32 => Tag::Int32,
            NodeKind::VarInt => Tag::VarInt,
            NodeKind::String { .. } => Tag::String,
        }
    }

    /// Decodes this node, tag byte included, from the cursor.
    ///
    /// # Errors
    ///
    /// - `ParserError::TypeMismatch` if the tag byte differs from [`Self::tag`]
    /// - `ParserError::MalformedLength` for negative or oversized lengths and counts
    /// - `ParserError::IndexNotInSchema` for hash indices this node does not declare
    /// - `ParserError::InsufficientData` if the data ends early
    pub fn decode(&self, cursor: &mut Cursor<'_>) -> Result<Value> {
        let found = cursor.read_u8()?;
        let expected = self.tag() as u8;
        if found != expected {
            return Err(ParserError::TypeMismatch {
                field: self.name.to_string(),
                expected,
                found,
            });
        }

        match &self.kind {
            NodeKind::Hash(children) => self.decode_hash(children, cursor),
            NodeKind::Array(children) => self.decode_array(children, cursor),
            NodeKind::Int8 => {
                let byte = cursor.read_u8()?;
                Ok(Value::Integer(Integer::Native(sign_and_shift(u64::from(byte)))))
            }
            NodeKind::Int32 => {
                let bytes = cursor.read(4)?;
                let raw = read_u32_le(bytes, 0)?;
                Ok(Value::Integer(Integer::Native(sign_and_shift(u64::from(raw)))))
            }
            NodeKind::VarInt => Ok(Value::Integer(read_varint(cursor)?)),
            NodeKind::String { decode } => {
                let length = self.read_length(cursor)?;
                if length == 0 {
                    return Ok(Value::Absent);
                }
                let bytes = cursor.read(length)?;
                if *decode {
                    Ok(Value::Text(String::from_utf8_lossy(bytes).into_owned()))
                } else {
                    Ok(Value::Bytes(bytes.to_vec()))
                }
            }
        }
    }

    fn decode_hash(&self, children: &[(u64, TypeNode)], cursor: &mut Cursor<'_>) -> Result<Value> {
        let count = self.read_length(cursor)?;
        let mut record = Record::with_capacity(count);

        for _ in 0..count {
            let index = read_varint(cursor)?;
            let child = index
                .to_i64()
                .and_then(|i| u64::try_from(i).ok())
                .and_then(|i| children.iter().find(|(idx, _)| *idx == i))
                .map(|(_, node)| node)
                .ok_or_else(|| ParserError::IndexNotInSchema {
                    field: self.name.to_string(),
                    index: index.to_string(),
                })?;
            record.insert(child.name, child.decode(cursor)?);
        }

        Ok(Value::Record(record))
    }

    fn decode_array(&self, children: &[TypeNode], cursor: &mut Cursor<'_>) -> Result<Value> {
        let marker = cursor.read(2)?;
        if marker != ARRAY_MARKER {
            warn!(
                field = self.name,
                marker = ?marker,
                "Unexpected array marker bytes"
            );
        }

        let count = self.read_length(cursor)?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(decode_chain(children, cursor)?);
        }

        Ok(Value::List(items))
    }

    /// Reads a bare VarInt used as a length or count and checks it against
    /// the unread data; every counted unit takes at least one byte.
    fn read_length(&self, cursor: &mut Cursor<'_>) -> Result<usize> {
        let raw = read_varint(cursor)?;
        raw.to_i64()
            .and_then(|n| usize::try_from(n).ok())
            .filter(|n| *n <= cursor.remaining())
            .ok_or_else(|| ParserError::MalformedLength {
                field: self.name.to_string(),
                length: raw.to_string(),
            })
    }
}

/// Decodes each node in order into one record keyed by node name.
fn decode_chain(nodes: &[TypeNode], cursor: &mut Cursor<'_>) -> Result<Record> {
    let mut record = Record::with_capacity(nodes.len());
    for node in nodes {
        record.insert(node.name, node.decode(cursor)?);
    }
    Ok(record)
}

/// A complete section grammar: a sequence of top-level nodes.
///
/// # Example
///
/// ```
/// use sc2_replay_parser::blizzerial::{Schema, TypeNode};
///
/// let schema = Schema::new(vec![TypeNode::int8("one"), TypeNode::int8("two")]);
/// let record = schema.decode(&[0x06, 0x0A, 0x06, 0x0B]).unwrap();
/// assert_eq!(record["one"].as_i64(), Some(5));
/// assert_eq!(record["two"].as_i64(), Some(-5));
/// ```
#[derive(Debug, Clone)]
pub struct Schema {
    nodes: Vec<TypeNode>,
}

impl Schema {
    /// Creates a schema from its top-level nodes.
    #[must_use]
    pub fn new(nodes: Vec<TypeNode>) -> Self {
        Self { nodes }
    }

    /// Returns the top-level nodes.
    #[must_use]
    pub fn nodes(&self) -> &[TypeNode] {
        &self.nodes
    }

    /// Decodes a whole section buffer.
    ///
    /// Errors abort the decode; no partial record is returned. The buffer is
    /// the complete section, so running out of bytes is fatal here.
    ///
    /// # Errors
    ///
    /// Any error of [`TypeNode::decode`], except that a short buffer becomes
    /// `ParserError::MalformedLength` naming the top-level node being read.
    pub fn decode(&self, data: &[u8]) -> Result<Record> {
        let mut cursor = Cursor::new(data);
        let mut record = Record::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let value = node.decode(&mut cursor).map_err(|e| match e {
                ParserError::InsufficientData {
                    requested,
                    available,
                } => ParserError::MalformedLength {
                    field: node.name.to_string(),
                    length: format!(
                        "section ends early: requested {requested} bytes, only {available} available"
                    ),
                },
                other => other,
            })?;
            record.insert(node.name, value);
        }
        if !cursor.is_empty() {
            debug!(trailing = cursor.remaining(), "Bytes left after schema decode");
        }
        Ok(record)
    }
}
