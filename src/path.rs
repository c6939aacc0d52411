//! Addressing nodes by position.
//!
//! A `FieldPath` is the chain of sibling indices from the root list down to
//! a node. The empty path names the root list itself, which is only a valid
//! target for `add_field`.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<usize>);

impl FieldPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Path of the `index`-th child of the node at `self`.
    pub fn child(&self, index: usize) -> Self {
        let mut out = self.0.clone();
        out.push(index);
        Self(out)
    }

    /// Split into (parent path, index within parent). `None` for the root.
    pub fn split_last(&self) -> Option<(FieldPath, usize)> {
        let (last, init) = self.0.split_last()?;
        Some((FieldPath(init.to_vec()), *last))
    }
}

impl From<Vec<usize>> for FieldPath {
    fn from(value: Vec<usize>) -> Self {
        Self(value)
    }
}

impl<const N: usize> From<[usize; N]> for FieldPath {
    fn from(value: [usize; N]) -> Self {
        Self(value.to_vec())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, ix) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{ix}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid field path `{0}` (expected dotted indices such as `0.2.1`)")]
pub struct InvalidFieldPath(pub String);

/// Dotted indices; the empty string and `<root>` both parse to the root.
impl FromStr for FieldPath {
    type Err = InvalidFieldPath;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "<root>" {
            return Ok(Self::root());
        }
        s.split('.')
            .map(|part| part.trim().parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
            .map_err(|_| InvalidFieldPath(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays_dotted_paths() {
        let p: FieldPath = "0.2.1".parse().unwrap();
        assert_eq!(p.indices(), &[0, 2, 1]);
        assert_eq!(p.to_string(), "0.2.1");
        assert_eq!("".parse::<FieldPath>().unwrap(), FieldPath::root());
        assert_eq!(FieldPath::root().to_string(), "<root>");
        assert!("0..1".parse::<FieldPath>().is_err());
        assert!("a".parse::<FieldPath>().is_err());
    }

    #[test]
    fn split_last_and_child_are_inverse() {
        let p = FieldPath::from([3, 4]);
        let (parent, ix) = p.split_last().unwrap();
        assert_eq!(parent, FieldPath::from([3]));
        assert_eq!(parent.child(ix), p);
        assert!(FieldPath::root().split_last().is_none());
    }

    #[test]
    fn serializes_as_index_array() {
        let p = FieldPath::from([1, 0]);
        assert_eq!(serde_json::to_value(&p).unwrap(), serde_json::json!([1, 0]));
    }
}
