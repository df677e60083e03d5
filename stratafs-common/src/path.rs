//! Hierarchical addresses for stored entities.
//!
//! A [`StoragePath`] is an ordered, non-empty list of non-empty segments.
//! One segment addresses a container; two or more address a directory or
//! binary nested under one. Paths are immutable and say nothing about what
//! (if anything) exists at the address; resolving that requires a backend
//! round-trip.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, StorageError};

/// Separator used by the textual form. Segments may not contain it.
pub const SEPARATOR: char = '/';

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoragePath {
    segments: Vec<String>,
}

impl StoragePath {
    /// Build a path from segments, validating each one.
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(StorageError::RequestInvalid(
                "a storage path needs at least one segment".into(),
            ));
        }
        for segment in &segments {
            if segment.is_empty() {
                return Err(StorageError::RequestInvalid("empty path segment".into()));
            }
            if segment.contains(SEPARATOR) {
                return Err(StorageError::RequestInvalid(format!(
                    "segment {segment:?} contains the reserved separator {SEPARATOR:?}"
                )));
            }
        }
        Ok(Self { segments })
    }

    /// Parse the textual form produced by [`fmt::Display`].
    ///
    /// Round-trip law: `StoragePath::parse(&p.to_string()) == p` for every
    /// valid path `p`.
    pub fn parse(s: &str) -> Result<Self> {
        Self::new(s.split(SEPARATOR))
    }

    /// Derive a child path by appending one segment.
    pub fn child(&self, segment: impl Into<String>) -> Result<Self> {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self::new(segments)
    }

    /// The path one level up. A container has no parent.
    pub fn parent(&self) -> Result<Self> {
        if self.is_container() {
            return Err(StorageError::RequestInvalid(format!(
                "container path \"{self}\" has no parent"
            )));
        }
        Ok(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Whether this path addresses a container (exactly one segment).
    pub fn is_container(&self) -> bool {
        self.segments.len() == 1
    }

    /// First segment: the container this path belongs to.
    pub fn container_name(&self) -> &str {
        &self.segments[0]
    }

    /// Last segment: the addressed entity's own name.
    pub fn name(&self) -> &str {
        self.segments.last().expect("paths are non-empty")
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// True when `other` lies strictly below this path.
    pub fn is_ancestor_of(&self, other: &StoragePath) -> bool {
        other.segments.len() > self.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl FromStr for StoragePath {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// The textual form is the stable addressing format passed across process
// boundaries, so paths serialize as plain strings.
impl Serialize for StoragePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for StoragePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for raw in ["archive1", "archive1/unit-a", "archive1/unit-a/file.bin"] {
            let path = StoragePath::parse(raw).unwrap();
            assert_eq!(path.to_string(), raw);
            assert_eq!(StoragePath::parse(&path.to_string()).unwrap(), path);
        }
    }

    #[test]
    fn test_rejects_bad_segments() {
        assert!(matches!(
            StoragePath::new(Vec::<String>::new()),
            Err(StorageError::RequestInvalid(_))
        ));
        assert!(matches!(
            StoragePath::new(["a", ""]),
            Err(StorageError::RequestInvalid(_))
        ));
        assert!(matches!(
            StoragePath::new(["a", "b/c"]),
            Err(StorageError::RequestInvalid(_))
        ));
        assert!(matches!(
            StoragePath::parse("a//b"),
            Err(StorageError::RequestInvalid(_))
        ));
    }

    #[test]
    fn test_container_shape() {
        let container = StoragePath::parse("archive1").unwrap();
        assert!(container.is_container());
        assert!(matches!(
            container.parent(),
            Err(StorageError::RequestInvalid(_))
        ));

        let nested = container.child("unit-a").unwrap();
        assert!(!nested.is_container());
        assert_eq!(nested.parent().unwrap(), container);
        assert_eq!(nested.container_name(), "archive1");
        assert_eq!(nested.name(), "unit-a");
        assert_eq!(nested.depth(), 2);
    }

    #[test]
    fn test_ancestry() {
        let root = StoragePath::parse("a").unwrap();
        let deep = StoragePath::parse("a/b/c").unwrap();
        let other = StoragePath::parse("ab/c").unwrap();
        assert!(root.is_ancestor_of(&deep));
        assert!(!root.is_ancestor_of(&root));
        assert!(!root.is_ancestor_of(&other));
        assert!(!deep.is_ancestor_of(&root));
    }

    #[test]
    fn test_serde_as_string() {
        let path = StoragePath::parse("archive1/unit-a").unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"archive1/unit-a\"");
        let back: StoragePath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
