//! Walks a chunk's reference document and produces its ordered metric leaves.
//!
//! The traversal is pre-order in declared field order. Nested documents and
//! arrays are entered as soon as they are met, and array elements are addressed
//! by index (`a.0.b`). The payload was produced in exactly this order, so any
//! change here misaligns every value after the first divergence.
//!
//! The walk reads raw BSON, so a field name that appears twice in one document
//! yields two leaves.

use bson::{RawArray, RawBsonRef, RawDocument};

use crate::bridge::format::TIMESTAMP_INCREMENT_SUFFIX;
use crate::config::{CodecPolicy, LeafSlotPolicy, TimestampLayout};
use crate::error::FtdcError;

/// One scalar leaf of the reference document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    pub key: String,
    /// The leaf's value as an integer, or `None` for leaves with no numeric form
    /// (strings, binary, null, object ids, ...).
    pub initial: Option<i64>,
}

impl Leaf {
    pub fn is_numeric(&self) -> bool {
        self.initial.is_some()
    }
}

/// Every leaf of a reference document plus the slot policy it was flattened under.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenedReference {
    leaves: Vec<Leaf>,
    slot_policy: LeafSlotPolicy,
}

impl FlattenedReference {
    /// All leaves in traversal order, numeric or not.
    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    /// Dotted keys of the numeric leaves, in traversal order.
    pub fn metric_keys(&self) -> impl Iterator<Item = &str> {
        self.leaves
            .iter()
            .filter(|l| l.is_numeric())
            .map(|l| l.key.as_str())
    }

    /// `(key, initial value)` for every numeric leaf.
    pub fn metrics(&self) -> impl Iterator<Item = (&str, i64)> {
        self.leaves
            .iter()
            .filter_map(|l| l.initial.map(|v| (l.key.as_str(), v)))
    }

    pub fn numeric_len(&self) -> usize {
        self.leaves.iter().filter(|l| l.is_numeric()).count()
    }

    /// Number of payload slots the reference accounts for under its slot policy.
    pub fn slot_count(&self) -> usize {
        match self.slot_policy {
            LeafSlotPolicy::Skip => self.numeric_len(),
            LeafSlotPolicy::Positional => self.leaves.len(),
        }
    }

    /// Consumes the reference, yielding the leaves that occupy payload slots, in slot order.
    pub fn into_slots(self) -> impl Iterator<Item = Leaf> {
        let policy = self.slot_policy;
        self.leaves
            .into_iter()
            .filter(move |l| policy == LeafSlotPolicy::Positional || l.is_numeric())
    }
}

/// Flattens `reference` under the leaf and timestamp rules of `policy`.
pub fn flatten(reference: &RawDocument, policy: &CodecPolicy) -> Result<FlattenedReference, FtdcError> {
    let mut leaves = Vec::new();
    walk_document(reference, "", policy.timestamp_layout, &mut leaves)?;
    Ok(FlattenedReference {
        leaves,
        slot_policy: policy.leaf_slots,
    })
}

fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", prefix, segment)
    }
}

fn malformed(path: &str, error: bson::raw::Error) -> FtdcError {
    let at = if path.is_empty() { "<root>" } else { path };
    FtdcError::MalformedChunk(format!("reference document is not valid BSON under '{}': {}", at, error))
}

fn walk_document(
    doc: &RawDocument,
    prefix: &str,
    layout: TimestampLayout,
    out: &mut Vec<Leaf>,
) -> Result<(), FtdcError> {
    for element in doc {
        let (name, value) = element.map_err(|e| malformed(prefix, e))?;
        walk_value(value, join(prefix, name), layout, out)?;
    }
    Ok(())
}

fn walk_array(
    items: &RawArray,
    path: &str,
    layout: TimestampLayout,
    out: &mut Vec<Leaf>,
) -> Result<(), FtdcError> {
    for (index, item) in items.into_iter().enumerate() {
        let item = item.map_err(|e| malformed(path, e))?;
        walk_value(item, join(path, &index.to_string()), layout, out)?;
    }
    Ok(())
}

fn walk_value(
    value: RawBsonRef<'_>,
    path: String,
    layout: TimestampLayout,
    out: &mut Vec<Leaf>,
) -> Result<(), FtdcError> {
    match value {
        RawBsonRef::Document(nested) => walk_document(nested, &path, layout, out)?,
        RawBsonRef::Array(items) => walk_array(items, &path, layout, out)?,
        RawBsonRef::Timestamp(ts) => match layout {
            TimestampLayout::Epoch => out.push(Leaf {
                key: path,
                initial: Some(i64::from(ts.time)),
            }),
            TimestampLayout::SecondsAndIncrement => {
                let increment_key = join(&path, TIMESTAMP_INCREMENT_SUFFIX);
                out.push(Leaf {
                    key: path,
                    initial: Some(i64::from(ts.time)),
                });
                out.push(Leaf {
                    key: increment_key,
                    initial: Some(i64::from(ts.increment)),
                });
            }
        },
        scalar => out.push(Leaf {
            key: path,
            initial: numeric_value(scalar),
        }),
    }
    Ok(())
}

/// The integer form of a scalar, if it has one.
fn numeric_value(value: RawBsonRef<'_>) -> Option<i64> {
    match value {
        RawBsonRef::Boolean(b) => Some(i64::from(b)),
        RawBsonRef::Int32(v) => Some(i64::from(v)),
        RawBsonRef::Int64(v) => Some(v),
        // `as` truncates toward zero, saturates at the bounds and maps NaN to 0.
        RawBsonRef::Double(f) => Some(f as i64),
        RawBsonRef::DateTime(dt) => Some(dt.timestamp_millis()),
        _ => None,
    }
}
