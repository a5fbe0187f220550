//! Device address arguments (`key=value,key=value`).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use airlink_types::GraphError;

/// Parsed device address string, e.g. `type=sim,radios=2`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceArgs {
    pairs: BTreeMap<String, String>,
}

impl DeviceArgs {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(key).map(String::as_str)
    }

    /// Parse the value stored under `key`, falling back to `default` when absent.
    pub fn get_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, GraphError> {
        match self.get(key) {
            Some(raw) => raw
                .parse()
                .map_err(|_| GraphError::InvalidArgs(format!("{}={}", key, raw))),
            None => Ok(default),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromStr for DeviceArgs {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut pairs = BTreeMap::new();
        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let (key, value) = token
                .split_once('=')
                .ok_or_else(|| GraphError::InvalidArgs(s.to_string()))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(GraphError::InvalidArgs(s.to_string()));
            }
            pairs.insert(key.to_string(), value.trim().to_string());
        }
        Ok(Self { pairs })
    }
}

impl fmt::Display for DeviceArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.pairs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        f.write_str(&joined.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_args() {
        let args: DeviceArgs = "".parse().unwrap();
        assert!(args.is_empty());
    }

    #[test]
    fn test_pairs_and_defaults() {
        let args: DeviceArgs = "type=sim, radios=1".parse().unwrap();
        assert_eq!(args.get("type"), Some("sim"));
        assert_eq!(args.get_or("radios", 2usize).unwrap(), 1);
        assert_eq!(args.get_or("firs", 2usize).unwrap(), 2);
        assert_eq!(args.to_string(), "radios=1,type=sim");
    }

    #[test]
    fn test_malformed_args() {
        assert!(matches!("addr".parse::<DeviceArgs>(), Err(GraphError::InvalidArgs(_))));
        assert!(matches!("=x".parse::<DeviceArgs>(), Err(GraphError::InvalidArgs(_))));
        let args: DeviceArgs = "radios=two".parse().unwrap();
        assert!(args.get_or("radios", 2usize).is_err());
    }
}
