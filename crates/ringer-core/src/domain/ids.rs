//! Identifiers.
//!
//! - `Id<T>`: ULID ベースの ID。マーカー型 `T` でコンパイル時に種類を区別する
//!   （PhantomData なのでサイズは ULID と同じ 16 bytes）
//! - `CallRef`: バックエンドが払い出す通話参照。中身は解釈しない（opaque）

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// Display prefix per id kind.
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// Generic ULID-backed identifier.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// Batch のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Batch {}

impl IdMarker for Batch {
    fn prefix() -> &'static str {
        "batch-"
    }
}

/// Identifier of one `dispatch` invocation. Used for log correlation.
pub type BatchId = Id<Batch>;

/// Backend-assigned reference for a submitted call (e.g. a call SID).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallRef(String);

impl CallRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CallRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CallRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for CallRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_id_display_has_prefix() {
        let ulid = Ulid::new();
        let id = BatchId::from_ulid(ulid);
        assert_eq!(id.as_ulid(), ulid);
        assert_eq!(id.to_string(), format!("batch-{ulid}"));
    }

    #[test]
    fn phantom_marker_costs_nothing() {
        assert_eq!(std::mem::size_of::<BatchId>(), std::mem::size_of::<Ulid>());
    }

    #[test]
    fn call_ref_is_transparent_in_json() {
        let r = CallRef::new("CA0001");
        assert_eq!(serde_json::to_string(&r).unwrap(), "\"CA0001\"");
        let back: CallRef = serde_json::from_str("\"CA0001\"").unwrap();
        assert_eq!(back, r);
    }
}
