use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Maps attribute names to the numeric IDs stored in attribute records, and back. Supplied at
/// load time; only name-based attribute lookups need it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(from = "BTreeMap<String, u32>", into = "BTreeMap<String, u32>")]
pub struct AttrDictionary {
    by_name: BTreeMap<String, u32>,
    by_id: BTreeMap<u32, String>,
}

impl AttrDictionary {
    pub fn new() -> AttrDictionary {
        AttrDictionary::default()
    }

    /// The attributes every network understands.
    pub fn standard() -> AttrDictionary {
        let mut dict = AttrDictionary::new();
        for (name, id) in [
            ("SpeedLimit", 1),
            ("NoPassing", 2),
            ("Stop", 3),
            ("Yield", 4),
            ("Crosswalk", 5),
            ("SchoolZone", 6),
            ("Construction", 7),
            ("Shoulder", 8),
            ("Highway", 9),
            ("Ramp", 10),
        ] {
            dict.by_name.insert(name.to_string(), id);
            dict.by_id.insert(id, name.to_string());
        }
        dict
    }

    pub fn insert(&mut self, name: &str, id: u32) -> Result<()> {
        if let Some(old) = self.by_name.get(name) {
            bail!("{} is already attribute {}", name, old);
        }
        if let Some(old) = self.by_id.get(&id) {
            bail!("Attribute {} is already named {}", id, old);
        }
        self.by_name.insert(name.to_string(), id);
        self.by_id.insert(id, name.to_string());
        Ok(())
    }

    pub fn id(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).cloned()
    }

    pub fn name(&self, id: u32) -> Option<&str> {
        self.by_id.get(&id).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// A JSON object of name to ID.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<AttrDictionary> {
        let path = path.as_ref();
        let raw = fs_err::read_to_string(path)?;
        let dict: AttrDictionary = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", path.display()))?;
        if dict.by_name.len() != dict.by_id.len() {
            bail!("{} assigns the same ID to multiple names", path.display());
        }
        Ok(dict)
    }
}

impl From<BTreeMap<String, u32>> for AttrDictionary {
    fn from(by_name: BTreeMap<String, u32>) -> AttrDictionary {
        let by_id = by_name
            .iter()
            .map(|(name, id)| (*id, name.clone()))
            .collect();
        AttrDictionary { by_name, by_id }
    }
}

impl From<AttrDictionary> for BTreeMap<String, u32> {
    fn from(dict: AttrDictionary) -> BTreeMap<String, u32> {
        dict.by_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups() {
        let mut dict = AttrDictionary::standard();
        assert_eq!(dict.id("Highway"), Some(9));
        assert_eq!(dict.name(1), Some("SpeedLimit"));
        assert!(dict.insert("Highway", 50).is_err());
        assert!(dict.insert("Tunnel", 9).is_err());
        dict.insert("Tunnel", 50).unwrap();
        assert_eq!(dict.name(50), Some("Tunnel"));
    }

    #[test]
    fn json_round_trip() {
        let dict = AttrDictionary::standard();
        let json = serde_json::to_string(&dict).unwrap();
        let back: AttrDictionary = serde_json::from_str(&json).unwrap();
        assert_eq!(dict, back);
    }
}
