//! Dimension definitions and the validated registry snapshot.
//!
//! `DimensionDefinitions` is the persisted document shape. A
//! [`DimensionRegistry`] is built from it once per editing session and is
//! then passed explicitly to every vector operation; nothing in this crate
//! reads dimension data from global state.
//!
//! Fine dimensions are indexed `0..fine_count` without gaps and each one
//! belongs to exactly one coarse category. Coarse positions follow the
//! coarse `index` field when present, otherwise document order.

use std::collections::{HashMap, HashSet};

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A top-level craving category (e.g. "biological", "vice").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoarseDimension {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tier: String,
    #[serde(default)]
    pub critical_threshold: f64,
    #[serde(default)]
    pub emigration_weight: f64,
    #[serde(default)]
    pub productivity_impact: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decay_rate: Option<f64>,
}

/// One fine-grained craving axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FineDimension {
    pub id: String,
    pub index: usize,
    pub parent_coarse: String,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Stored for downstream simulation use; aggregation here is unweighted.
    #[serde(default = "default_weight")]
    pub aggregation_weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decay_rate: Option<f64>,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionCount {
    pub coarse: usize,
    pub fine: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub version: String,
    pub date: String,
    pub changes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedIndices {
    #[serde(default)]
    pub coarse: Vec<usize>,
    #[serde(default)]
    pub fine: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FutureExpansion {
    #[serde(default)]
    pub reserved_indices: ReservedIndices,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionMetadata {
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub change_log: Vec<ChangeLogEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub future_expansion: Option<FutureExpansion>,
}

/// The persisted `dimension_definitions.json` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionDefinitions {
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension_count: Option<DimensionCount>,
    pub coarse_dimensions: Vec<CoarseDimension>,
    pub fine_dimensions: Vec<FineDimension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DimensionMetadata>,
}

/// Reasons a definitions document cannot become a registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("dimension definitions list no coarse or no fine dimensions")]
    Empty,

    #[error("duplicate coarse dimension id '{0}'")]
    DuplicateCoarseId(String),

    #[error("duplicate fine dimension id '{0}'")]
    DuplicateFineId(String),

    #[error("coarse dimensions mix explicit and missing indices")]
    MixedCoarseIndexing,

    #[error("coarse index {found} out of place: expected contiguous index {expected}")]
    CoarseIndexGap { expected: usize, found: usize },

    #[error("fine index {found} out of place: expected contiguous index {expected}")]
    FineIndexGap { expected: usize, found: usize },

    #[error("fine dimension '{fine}' references unknown coarse dimension '{parent}'")]
    UnknownParent { fine: String, parent: String },
}

/// Immutable, validated snapshot of the dimension definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionRegistry {
    version: String,
    coarse: Vec<CoarseDimension>,
    fine: Vec<FineDimension>,
    /// Coarse position for each fine index.
    parent: Vec<usize>,
    coarse_lookup: HashMap<String, usize>,
    fine_lookup: HashMap<String, usize>,
}

impl DimensionRegistry {
    /// Validate `defs` and build the snapshot.
    pub fn from_definitions(defs: &DimensionDefinitions) -> Result<Self, RegistryError> {
        if defs.coarse_dimensions.is_empty() || defs.fine_dimensions.is_empty() {
            return Err(RegistryError::Empty);
        }
        let coarse = order_coarse(&defs.coarse_dimensions)?;

        let mut coarse_lookup = HashMap::with_capacity(coarse.len());
        for (pos, c) in coarse.iter().enumerate() {
            if coarse_lookup.insert(c.id.clone(), pos).is_some() {
                return Err(RegistryError::DuplicateCoarseId(c.id.clone()));
            }
        }

        let mut fine = defs.fine_dimensions.clone();
        fine.sort_by_key(|f| f.index);

        let mut fine_lookup = HashMap::with_capacity(fine.len());
        let mut parent = Vec::with_capacity(fine.len());
        for (expected, f) in fine.iter().enumerate() {
            if f.index != expected {
                return Err(RegistryError::FineIndexGap {
                    expected,
                    found: f.index,
                });
            }
            if fine_lookup.insert(f.id.clone(), expected).is_some() {
                return Err(RegistryError::DuplicateFineId(f.id.clone()));
            }
            let pos = coarse_lookup.get(&f.parent_coarse).copied().ok_or_else(|| {
                RegistryError::UnknownParent {
                    fine: f.id.clone(),
                    parent: f.parent_coarse.clone(),
                }
            })?;
            parent.push(pos);
        }

        if let Some(count) = defs.dimension_count {
            if count.coarse != coarse.len() || count.fine != fine.len() {
                warn!(
                    "dimensionCount says {}/{} coarse/fine but document lists {}/{}",
                    count.coarse,
                    count.fine,
                    coarse.len(),
                    fine.len()
                );
            }
        }

        Ok(Self {
            version: defs.version.clone(),
            coarse,
            fine,
            parent,
            coarse_lookup,
            fine_lookup,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Length of every fine vector (`max(index) + 1`).
    pub fn fine_count(&self) -> usize {
        self.fine.len()
    }

    /// Length of every coarse vector.
    pub fn coarse_count(&self) -> usize {
        self.coarse.len()
    }

    /// Fine dimensions in index order.
    pub fn fine(&self) -> &[FineDimension] {
        &self.fine
    }

    /// Coarse dimensions in position order.
    pub fn coarse(&self) -> &[CoarseDimension] {
        &self.coarse
    }

    pub fn coarse_position(&self, id: &str) -> Option<usize> {
        self.coarse_lookup.get(id).copied()
    }

    pub fn fine_index(&self, id: &str) -> Option<usize> {
        self.fine_lookup.get(id).copied()
    }

    /// Coarse position that fine index `fine` rolls up into.
    pub fn parent_of(&self, fine: usize) -> Option<usize> {
        self.parent.get(fine).copied()
    }

    /// Fine indices belonging to the coarse category at `coarse`.
    pub fn members(&self, coarse: usize) -> impl Iterator<Item = usize> + '_ {
        self.parent
            .iter()
            .enumerate()
            .filter(move |(_, p)| **p == coarse)
            .map(|(i, _)| i)
    }

    /// Fine dimensions carrying `tag`.
    pub fn fine_with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a FineDimension> {
        self.fine.iter().filter(move |f| f.tags.iter().any(|t| t == tag))
    }
}

fn order_coarse(list: &[CoarseDimension]) -> Result<Vec<CoarseDimension>, RegistryError> {
    let indexed = list.iter().filter(|c| c.index.is_some()).count();
    if indexed == 0 {
        return Ok(list.to_vec());
    }
    if indexed != list.len() {
        return Err(RegistryError::MixedCoarseIndexing);
    }

    let mut seen = HashSet::new();
    for c in list {
        if !seen.insert(c.id.as_str()) {
            return Err(RegistryError::DuplicateCoarseId(c.id.clone()));
        }
    }

    let mut ordered = list.to_vec();
    ordered.sort_by_key(|c| c.index);
    for (expected, c) in ordered.iter().enumerate() {
        let found = c.index.unwrap_or(expected);
        if found != expected {
            return Err(RegistryError::CoarseIndexGap { expected, found });
        }
    }
    Ok(ordered)
}

/// Registry fixtures shared by unit tests across modules.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Category ids and block sizes of the standard 9 x 50 layout.
    pub const STANDARD_BLOCKS: [(&str, usize); 9] = [
        ("biological", 8),
        ("safety", 5),
        ("touch", 5),
        ("psychological", 6),
        ("social_status", 5),
        ("social_connection", 5),
        ("exotic_goods", 6),
        ("shiny_objects", 5),
        ("vice", 5),
    ];

    /// Definitions with fine dimensions laid out in contiguous blocks.
    pub fn definitions(blocks: &[(&str, usize)]) -> DimensionDefinitions {
        let mut coarse = Vec::new();
        let mut fine = Vec::new();
        for (pos, (id, size)) in blocks.iter().enumerate() {
            coarse.push(CoarseDimension {
                id: id.to_string(),
                index: Some(pos),
                name: id.replace('_', " "),
                description: String::new(),
                tier: String::new(),
                critical_threshold: 0.0,
                emigration_weight: 0.0,
                productivity_impact: 0.0,
                decay_rate: None,
            });
            for n in 0..*size {
                let index = fine.len();
                fine.push(FineDimension {
                    id: format!("{id}_{n}"),
                    index,
                    parent_coarse: id.to_string(),
                    name: format!("{id} {n}"),
                    tags: vec![id.to_string()],
                    aggregation_weight: 1.0,
                    decay_rate: None,
                });
            }
        }
        DimensionDefinitions {
            version: "test".into(),
            dimension_count: None,
            coarse_dimensions: coarse,
            fine_dimensions: fine,
            metadata: None,
        }
    }

    pub fn registry(blocks: &[(&str, usize)]) -> DimensionRegistry {
        DimensionRegistry::from_definitions(&definitions(blocks)).unwrap()
    }

    pub fn standard() -> DimensionRegistry {
        registry(&STANDARD_BLOCKS)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn standard_layout_counts() {
        let reg = standard();
        assert_eq!(reg.fine_count(), 50);
        assert_eq!(reg.coarse_count(), 9);
        assert_eq!(reg.members(0).collect::<Vec<_>>(), (0..8).collect::<Vec<_>>());
        assert_eq!(reg.members(8).count(), 5);
        assert_eq!(reg.parent_of(8), Some(1));
        assert_eq!(reg.parent_of(50), None);
    }

    #[test]
    fn lookups_by_id() {
        let reg = standard();
        assert_eq!(reg.coarse_position("vice"), Some(8));
        assert_eq!(reg.fine_index("safety_0"), Some(8));
        assert_eq!(reg.fine_index("missing"), None);
        assert_eq!(reg.fine_with_tag("touch").count(), 5);
    }

    #[test]
    fn fine_order_follows_index_not_document_order() {
        let mut defs = definitions(&[("a", 2), ("b", 1)]);
        defs.fine_dimensions.reverse();
        let reg = DimensionRegistry::from_definitions(&defs).unwrap();
        assert_eq!(reg.fine()[0].id, "a_0");
        assert_eq!(reg.parent_of(2), Some(1));
    }

    #[test]
    fn empty_definitions_rejected() {
        assert_eq!(
            DimensionRegistry::from_definitions(&definitions(&[])),
            Err(RegistryError::Empty)
        );
        assert_eq!(
            DimensionRegistry::from_definitions(&definitions(&[("a", 0)])),
            Err(RegistryError::Empty)
        );
    }

    #[test]
    fn fine_index_gap_rejected() {
        let mut defs = definitions(&[("a", 3)]);
        defs.fine_dimensions[2].index = 5;
        assert_eq!(
            DimensionRegistry::from_definitions(&defs),
            Err(RegistryError::FineIndexGap {
                expected: 2,
                found: 5
            })
        );
    }

    #[test]
    fn duplicate_fine_index_rejected() {
        let mut defs = definitions(&[("a", 3)]);
        defs.fine_dimensions[2].index = 1;
        assert!(matches!(
            DimensionRegistry::from_definitions(&defs),
            Err(RegistryError::FineIndexGap { .. })
        ));
    }

    #[test]
    fn unknown_parent_rejected() {
        let mut defs = definitions(&[("a", 2)]);
        defs.fine_dimensions[1].parent_coarse = "nowhere".into();
        assert_eq!(
            DimensionRegistry::from_definitions(&defs),
            Err(RegistryError::UnknownParent {
                fine: "a_1".into(),
                parent: "nowhere".into()
            })
        );
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut defs = definitions(&[("a", 2), ("b", 1)]);
        defs.coarse_dimensions[1].id = "a".into();
        assert!(matches!(
            DimensionRegistry::from_definitions(&defs),
            Err(RegistryError::DuplicateCoarseId(_))
        ));

        let mut defs = definitions(&[("a", 2)]);
        defs.fine_dimensions[1].id = "a_0".into();
        assert_eq!(
            DimensionRegistry::from_definitions(&defs),
            Err(RegistryError::DuplicateFineId("a_0".into()))
        );
    }

    #[test]
    fn coarse_without_indices_uses_document_order() {
        let mut defs = definitions(&[("a", 1), ("b", 1)]);
        for c in &mut defs.coarse_dimensions {
            c.index = None;
        }
        let reg = DimensionRegistry::from_definitions(&defs).unwrap();
        assert_eq!(reg.coarse_position("b"), Some(1));

        defs.coarse_dimensions[0].index = Some(0);
        assert_eq!(
            DimensionRegistry::from_definitions(&defs),
            Err(RegistryError::MixedCoarseIndexing)
        );
    }

    #[test]
    fn coarse_with_empty_membership_is_allowed() {
        let reg = registry(&[("a", 2), ("empty", 0), ("c", 1)]);
        assert_eq!(reg.coarse_count(), 3);
        assert_eq!(reg.members(1).count(), 0);
    }

    #[test]
    fn parses_document_json() {
        let json = r#"{
            "version": "1.2.0",
            "dimensionCount": { "coarse": 1, "fine": 1 },
            "coarseDimensions": [
                { "id": "biological", "index": 0, "name": "Biological",
                  "description": "Survival", "tier": "survival",
                  "criticalThreshold": 20, "emigrationWeight": 1.5,
                  "productivityImpact": 0.8 }
            ],
            "fineDimensions": [
                { "id": "bio_grain", "index": 0, "parentCoarse": "biological",
                  "name": "Grain", "tags": ["food"], "aggregationWeight": 1.0 }
            ]
        }"#;
        let defs: DimensionDefinitions = serde_json::from_str(json).unwrap();
        let reg = DimensionRegistry::from_definitions(&defs).unwrap();
        assert_eq!(reg.version(), "1.2.0");
        assert_eq!(reg.coarse()[0].tier, "survival");
        assert_eq!(reg.fine()[0].tags, vec!["food".to_string()]);
    }
}
