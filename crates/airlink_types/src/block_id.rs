//! RFNoC block identifiers of the form `<device>/<Name>#<instance>`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Identifies one block on one motherboard, e.g. `0/Radio#1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlockId {
    device_no: usize,
    block_name: String,
    block_count: usize,
}

impl BlockId {
    pub fn new(device_no: usize, block_name: impl Into<String>, block_count: usize) -> Self {
        Self {
            device_no,
            block_name: block_name.into(),
            block_count,
        }
    }

    /// Motherboard index this block lives on.
    pub fn device_no(&self) -> usize {
        self.device_no
    }

    pub fn block_name(&self) -> &str {
        &self.block_name
    }

    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// True when `hint` names this block: a substring of the full ID.
    /// An empty hint matches everything.
    pub fn matches(&self, hint: &str) -> bool {
        hint.is_empty() || self.to_string().contains(hint)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.device_no, self.block_name, self.block_count)
    }
}

impl FromStr for BlockId {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GraphError::InvalidBlockId(s.to_string());
        let s_trim = s.trim();

        let (device_no, rest) = match s_trim.split_once('/') {
            Some((dev, rest)) => (dev.parse::<usize>().map_err(|_| invalid())?, rest),
            None => (0, s_trim),
        };
        let (name, block_count) = match rest.split_once('#') {
            Some((name, count)) => (name, count.parse::<usize>().map_err(|_| invalid())?),
            None => (rest, 0),
        };

        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid());
        }

        Ok(Self::new(device_no, name, block_count))
    }
}

impl TryFrom<String> for BlockId {
    type Error = GraphError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BlockId> for String {
    fn from(id: BlockId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_id() {
        let id: BlockId = "0/Radio#1".parse().unwrap();
        assert_eq!(id.device_no(), 0);
        assert_eq!(id.block_name(), "Radio");
        assert_eq!(id.block_count(), 1);
        assert_eq!(id.to_string(), "0/Radio#1");
    }

    #[test]
    fn test_parse_defaults() {
        let id: BlockId = "Shiftright".parse().unwrap();
        assert_eq!(id, BlockId::new(0, "Shiftright", 0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "x/Radio#0", "0/Radio#x", "0/#1", "0/Ra dio#1"] {
            assert!(
                matches!(bad.parse::<BlockId>(), Err(GraphError::InvalidBlockId(_))),
                "expected {:?} to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_matches_hint() {
        let id = BlockId::new(0, "Shiftright", 1);
        assert!(id.matches(""));
        assert!(id.matches("Shiftright"));
        assert!(id.matches("0/Shiftright#1"));
        assert!(!id.matches("FIR"));
    }
}
