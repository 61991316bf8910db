//! Incremental JSON walker.
//!
//! Drives `serde_json` over a byte stream with a path-tracking visitor and
//! reports every scalar as a [`RawPackageEvent`]. No document tree is built:
//! only the current field path and the scalar being reported are alive at
//! any point, so memory stays flat however large the upstream feed is.
//!
//! Paths join object keys with `.` and name every array element `item`,
//! e.g. `results.item.assets.item.version`.

use std::fmt;
use std::io::Read;

use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};

use crate::error::{CatalogError, Result};

/// Segment used for array elements in a field path.
pub const ARRAY_ITEM: &str = "item";

/// A scalar leaf value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar<'a> {
    Str(&'a str),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Null,
}

impl<'a> Scalar<'a> {
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Scalar::Str(s) => Some(*s),
            _ => None,
        }
    }
}

/// One (field-path, value) token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPackageEvent<'a> {
    pub path: &'a str,
    pub value: Scalar<'a>,
}

/// Walks the JSON document read from `reader`, calling `on_event` for every
/// scalar in document order.
///
/// Fails with [`CatalogError::Parse`] on malformed input, including trailing
/// garbage after the top-level value.
pub fn walk_document<R, F>(reader: R, mut on_event: F) -> Result<()>
where
    R: Read,
    F: FnMut(RawPackageEvent<'_>),
{
    let mut de = serde_json::Deserializer::from_reader(reader);
    let mut path = String::new();
    PathWalker {
        path: &mut path,
        sink: &mut on_event,
    }
    .deserialize(&mut de)
    .map_err(CatalogError::Parse)?;
    de.end().map_err(CatalogError::Parse)
}

struct PathWalker<'w, F> {
    path: &'w mut String,
    sink: &'w mut F,
}

impl<'w, F> PathWalker<'w, F>
where
    F: FnMut(RawPackageEvent<'_>),
{
    fn emit(self, value: Scalar<'_>) {
        let PathWalker { path, sink } = self;
        sink(RawPackageEvent {
            path: path.as_str(),
            value,
        });
    }
}

fn push_segment(path: &mut String, segment: &str) -> usize {
    let mark = path.len();
    if !path.is_empty() {
        path.push('.');
    }
    path.push_str(segment);
    mark
}

impl<'de, 'w, F> DeserializeSeed<'de> for PathWalker<'w, F>
where
    F: FnMut(RawPackageEvent<'_>),
{
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<(), D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de, 'w, F> Visitor<'de> for PathWalker<'w, F>
where
    F: FnMut(RawPackageEvent<'_>),
{
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<(), E> {
        self.emit(Scalar::Str(v));
        Ok(())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<(), E> {
        self.emit(Scalar::Int(v));
        Ok(())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<(), E> {
        self.emit(Scalar::UInt(v));
        Ok(())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<(), E> {
        self.emit(Scalar::Float(v));
        Ok(())
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<(), E> {
        self.emit(Scalar::Bool(v));
        Ok(())
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<(), E> {
        self.emit(Scalar::Null);
        Ok(())
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        let PathWalker { path, sink } = self;
        let mark = push_segment(path, ARRAY_ITEM);
        while seq
            .next_element_seed(PathWalker {
                path: &mut *path,
                sink: &mut *sink,
            })?
            .is_some()
        {}
        path.truncate(mark);
        Ok(())
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        let PathWalker { path, sink } = self;
        while let Some(key) = map.next_key::<String>()? {
            let mark = push_segment(path, &key);
            map.next_value_seed(PathWalker {
                path: &mut *path,
                sink: &mut *sink,
            })?;
            path.truncate(mark);
        }
        Ok(())
    }
}
