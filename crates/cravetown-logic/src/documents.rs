//! Versioned document containers and id bookkeeping.
//!
//! Each container keeps its `version` exactly as read and keeps item order.
//! Id uniqueness is checked on write (see [`Collection::check_unique_ids`]);
//! reads accept whatever the file holds.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::character_traits::CharacterTrait;
use crate::classes::CharacterClass;
use crate::rules::EnablementRule;

/// Container version, accepted as any JSON number or as a string label.
///
/// The arm is picked by the value as read (`1`, `-1`, `1.5`, `"1.0.0"`) and
/// the same JSON is written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentVersion {
    Number(u64),
    Signed(i64),
    Decimal(f64),
    Label(String),
}

impl Default for DocumentVersion {
    fn default() -> Self {
        DocumentVersion::Number(1)
    }
}

impl std::fmt::Display for DocumentVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentVersion::Number(n) => write!(f, "{n}"),
            DocumentVersion::Signed(n) => write!(f, "{n}"),
            DocumentVersion::Decimal(n) => write!(f, "{n}"),
            DocumentVersion::Label(s) => f.write_str(s),
        }
    }
}

/// Anything addressed by a string id.
pub trait Identified {
    fn id(&self) -> &str;
}

/// Two items in one container share an id.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("duplicate id '{id}' at positions {first} and {second}")]
pub struct DuplicateIdError {
    pub id: String,
    pub first: usize,
    pub second: usize,
}

/// Every repeated id, reported against its first occurrence.
pub fn find_duplicate_ids<T: Identified>(items: &[T]) -> Vec<DuplicateIdError> {
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    let mut dups = Vec::new();
    for (pos, item) in items.iter().enumerate() {
        match first_seen.get(item.id()) {
            Some(&first) => dups.push(DuplicateIdError {
                id: item.id().to_string(),
                first,
                second: pos,
            }),
            None => {
                first_seen.insert(item.id(), pos);
            }
        }
    }
    dups
}

/// Common editing operations over a versioned container.
pub trait Collection {
    type Item: Identified;

    /// JSON key holding the item list.
    const ITEMS_KEY: &'static str;

    fn version(&self) -> &DocumentVersion;
    fn items(&self) -> &[Self::Item];
    fn items_mut(&mut self) -> &mut Vec<Self::Item>;

    fn get(&self, id: &str) -> Option<&Self::Item> {
        self.items().iter().find(|i| i.id() == id)
    }

    /// Replace the item with the same id in place, or append.
    /// Returns `true` when an existing item was replaced.
    fn upsert(&mut self, item: Self::Item) -> bool {
        let items = self.items_mut();
        match items.iter().position(|i| i.id() == item.id()) {
            Some(pos) => {
                items[pos] = item;
                true
            }
            None => {
                items.push(item);
                false
            }
        }
    }

    /// Remove every item with `id`, returning the first removed.
    fn remove(&mut self, id: &str) -> Option<Self::Item> {
        let items = self.items_mut();
        let pos = items.iter().position(|i| i.id() == id)?;
        let removed = items.remove(pos);
        items.retain(|i| i.id() != id);
        Some(removed)
    }

    fn check_unique_ids(&self) -> Result<(), Vec<DuplicateIdError>> {
        let dups = find_duplicate_ids(self.items());
        if dups.is_empty() {
            Ok(())
        } else {
            Err(dups)
        }
    }
}

/// `character_classes.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterClassesData {
    #[serde(default)]
    pub version: DocumentVersion,
    #[serde(default)]
    pub classes: Vec<CharacterClass>,
}

/// `character_traits.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterTraitsData {
    #[serde(default)]
    pub version: DocumentVersion,
    #[serde(default)]
    pub traits: Vec<CharacterTrait>,
}

/// `enablement_rules.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnablementRulesData {
    #[serde(default)]
    pub version: DocumentVersion,
    #[serde(default)]
    pub rules: Vec<EnablementRule>,
}

impl Collection for CharacterClassesData {
    type Item = CharacterClass;
    const ITEMS_KEY: &'static str = "classes";

    fn version(&self) -> &DocumentVersion {
        &self.version
    }
    fn items(&self) -> &[CharacterClass] {
        &self.classes
    }
    fn items_mut(&mut self) -> &mut Vec<CharacterClass> {
        &mut self.classes
    }
}

impl Collection for CharacterTraitsData {
    type Item = CharacterTrait;
    const ITEMS_KEY: &'static str = "traits";

    fn version(&self) -> &DocumentVersion {
        &self.version
    }
    fn items(&self) -> &[CharacterTrait] {
        &self.traits
    }
    fn items_mut(&mut self) -> &mut Vec<CharacterTrait> {
        &mut self.traits
    }
}

impl Collection for EnablementRulesData {
    type Item = EnablementRule;
    const ITEMS_KEY: &'static str = "rules";

    fn version(&self) -> &DocumentVersion {
        &self.version
    }
    fn items(&self) -> &[EnablementRule] {
        &self.rules
    }
    fn items_mut(&mut self) -> &mut Vec<EnablementRule> {
        &mut self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(&'static str, u8);

    impl Identified for Item {
        fn id(&self) -> &str {
            self.0
        }
    }

    #[derive(Default)]
    struct Bag {
        version: DocumentVersion,
        items: Vec<Item>,
    }

    impl Collection for Bag {
        type Item = Item;
        const ITEMS_KEY: &'static str = "items";
        fn version(&self) -> &DocumentVersion {
            &self.version
        }
        fn items(&self) -> &[Item] {
            &self.items
        }
        fn items_mut(&mut self) -> &mut Vec<Item> {
            &mut self.items
        }
    }

    #[test]
    fn version_accepts_number_or_label() {
        let n: DocumentVersion = serde_json::from_str("3").unwrap();
        assert_eq!(n, DocumentVersion::Number(3));
        let s: DocumentVersion = serde_json::from_str("\"1.0.0\"").unwrap();
        assert_eq!(s, DocumentVersion::Label("1.0.0".into()));
        assert_eq!(serde_json::to_string(&s).unwrap(), "\"1.0.0\"");
        assert_eq!(n.to_string(), "3");
    }

    #[test]
    fn negative_and_fractional_versions_are_kept() {
        let neg: DocumentVersion = serde_json::from_str("-1").unwrap();
        assert_eq!(neg, DocumentVersion::Signed(-1));
        assert_eq!(serde_json::to_string(&neg).unwrap(), "-1");

        let frac: DocumentVersion = serde_json::from_str("1.5").unwrap();
        assert_eq!(frac, DocumentVersion::Decimal(1.5));
        assert_eq!(serde_json::to_string(&frac).unwrap(), "1.5");
        assert_eq!(frac.to_string(), "1.5");

        let doc: CharacterClassesData =
            serde_json::from_str(r#"{"version": -1, "classes": []}"#).unwrap();
        assert_eq!(doc.version, DocumentVersion::Signed(-1));
    }

    #[test]
    fn duplicates_reported_against_first() {
        let items = vec![Item("a", 0), Item("b", 0), Item("a", 1), Item("a", 2)];
        let dups = find_duplicate_ids(&items);
        assert_eq!(dups.len(), 2);
        assert_eq!(
            dups[0],
            DuplicateIdError {
                id: "a".into(),
                first: 0,
                second: 2
            }
        );
        assert_eq!(dups[1].second, 3);
    }

    #[test]
    fn upsert_replaces_in_place_or_appends() {
        let mut bag = Bag::default();
        assert!(!bag.upsert(Item("a", 0)));
        assert!(!bag.upsert(Item("b", 0)));
        assert!(bag.upsert(Item("a", 9)));
        assert_eq!(bag.items(), &[Item("a", 9), Item("b", 0)]);
        assert_eq!(bag.get("a"), Some(&Item("a", 9)));
    }

    #[test]
    fn remove_drops_all_copies() {
        let mut bag = Bag {
            items: vec![Item("a", 0), Item("b", 0), Item("a", 1)],
            ..Default::default()
        };
        assert_eq!(bag.remove("a"), Some(Item("a", 0)));
        assert_eq!(bag.items(), &[Item("b", 0)]);
        assert_eq!(bag.remove("zzz"), None);
        assert!(bag.check_unique_ids().is_ok());
        assert_eq!(bag.version(), &DocumentVersion::Number(1));
    }
}
