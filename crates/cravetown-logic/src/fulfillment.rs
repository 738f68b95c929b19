//! Commodity fulfillment vectors: how much of each craving a commodity satisfies.
//!
//! Unlike the dense vectors on classes, traits and rules, a commodity stores
//! its fine values sparsely, keyed by fine dimension id, and an unlisted
//! dimension is worth 0. Dense views are built against a
//! [`DimensionRegistry`]; ids the registry does not know are reported and
//! kept on write so that a dimension rename never silently erases data.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::aggregate::aggregate;
use crate::classes::QUALITY_TIERS;
use crate::dimensions::DimensionRegistry;
use crate::documents::{Collection, DocumentVersion, Identified};
use crate::validation::{check_finite_values, check_range, ValidationIssue};
use crate::vector::{check_finite, ShapeError};

/// Upper bound of a commodity's `reusableValue`.
pub const MAX_REUSABLE_VALUE: f64 = 100.0;

/// Default quality multipliers for a new commodity, poorest tier first.
pub const DEFAULT_QUALITY_MULTIPLIERS: [(&str, f64); 5] = [
    ("poor", 0.6),
    ("basic", 1.0),
    ("good", 1.4),
    ("luxury", 2.0),
    ("masterwork", 3.0),
];

// ── Named values ───────────────────────────────────────────────────────

/// An ordered `id → number` map, written as a JSON object in the order held.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedValues(Vec<(String, f64)>);

impl NamedValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<f64> {
        self.0.iter().find(|(k, _)| k == id).map(|(_, v)| *v)
    }

    /// Replace the value for `id` in place, or append it.
    pub fn set(&mut self, id: &str, value: f64) {
        match self.0.iter_mut().find(|(k, _)| k == id) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((id.to_string(), value)),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<f64> {
        let pos = self.0.iter().position(|(k, _)| k == id)?;
        Some(self.0.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn values(&self) -> Vec<f64> {
        self.0.iter().map(|(_, v)| *v).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for NamedValues {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut out = NamedValues::new();
        for (k, v) in iter {
            out.set(&k.into(), v);
        }
        out
    }
}

impl Serialize for NamedValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

impl<'de> Deserialize<'de> for NamedValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        let mut out = NamedValues::new();
        for (id, value) in map {
            let number = value
                .as_f64()
                .ok_or_else(|| D::Error::custom(format!("'{id}' is not a number: {value}")))?;
            out.0.push((id, number));
        }
        Ok(out)
    }
}

// ── Fulfillment vector ─────────────────────────────────────────────────

/// A dense view of a sparse fine map against one registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Densified {
    /// One value per registry fine dimension, in index order.
    pub values: Vec<f64>,
    /// Sparse ids with no registry dimension, in stored order.
    pub unknown: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FulfillmentVector {
    /// Cache of `aggregate(dense fine)`.
    #[serde(default)]
    pub coarse: Vec<f64>,
    #[serde(default)]
    pub fine: NamedValues,
}

impl FulfillmentVector {
    /// Dense fine values in registry order; unlisted dimensions are 0.
    pub fn to_dense(&self, registry: &DimensionRegistry) -> Densified {
        let mut values = vec![0.0; registry.fine_count()];
        let mut unknown = Vec::new();
        for (id, value) in self.fine.iter() {
            match registry.fine_index(id) {
                Some(index) => values[index] = value,
                None => unknown.push(id.to_string()),
            }
        }
        Densified { values, unknown }
    }

    /// Sparse ids the registry does not define.
    pub fn unknown_dimensions(&self, registry: &DimensionRegistry) -> Vec<String> {
        self.fine
            .iter()
            .filter(|(id, _)| registry.fine_index(id).is_none())
            .map(|(id, _)| id.to_string())
            .collect()
    }

    /// Replace the fine values from a dense vector and refresh `coarse`.
    ///
    /// Non-zero entries are stored in registry order. Entries under ids the
    /// registry does not know are kept after them, untouched.
    pub fn set_dense(
        &mut self,
        values: &[f64],
        registry: &DimensionRegistry,
    ) -> Result<(), ShapeError> {
        if values.len() != registry.fine_count() {
            return Err(ShapeError::LengthMismatch {
                expected: registry.fine_count(),
                actual: values.len(),
            });
        }
        check_finite(values)?;

        let mut fine: NamedValues = registry
            .fine()
            .iter()
            .zip(values)
            .filter(|(_, v)| **v != 0.0)
            .map(|(dim, v)| (dim.id.as_str(), *v))
            .collect();
        for (id, value) in self.fine.iter() {
            if registry.fine_index(id).is_none() {
                fine.set(id, value);
            }
        }

        self.coarse = aggregate(values, registry)?;
        self.fine = fine;
        Ok(())
    }

    /// Set one fine entry by registry index.
    pub fn set_value(
        &mut self,
        index: usize,
        value: f64,
        registry: &DimensionRegistry,
    ) -> Result<(), ShapeError> {
        let mut dense = self.to_dense(registry).values;
        match dense.get_mut(index) {
            Some(slot) => *slot = value,
            None => {
                return Err(ShapeError::LengthMismatch {
                    expected: registry.fine_count(),
                    actual: dense.len(),
                })
            }
        }
        self.set_dense(&dense, registry)
    }

    /// Rebuild `coarse` from the dense fine values.
    pub fn refresh_coarse(&mut self, registry: &DimensionRegistry) -> Result<(), ShapeError> {
        let dense = self.to_dense(registry).values;
        check_finite(&dense)?;
        self.coarse = aggregate(&dense, registry)?;
        Ok(())
    }

    pub fn coarse_is_current(&self, registry: &DimensionRegistry) -> bool {
        match aggregate(&self.to_dense(registry).values, registry) {
            Ok(expected) => {
                expected.len() == self.coarse.len()
                    && expected
                        .iter()
                        .zip(&self.coarse)
                        .all(|(a, b)| (a - b).abs() < 1e-9)
            }
            Err(_) => false,
        }
    }
}

// ── Commodity ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Durability {
    #[default]
    SingleUse,
    Consumable,
    Durable,
    Permanent,
}

impl Durability {
    pub fn all() -> &'static [Durability] {
        &[
            Durability::SingleUse,
            Durability::Consumable,
            Durability::Durable,
            Durability::Permanent,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommodityFulfillment {
    pub id: String,
    #[serde(default)]
    pub fulfillment_vector: FulfillmentVector,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub durability: Durability,
    #[serde(default)]
    pub quality_multipliers: NamedValues,
    /// Value left after use, 0 to 100, for durable goods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reusable_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Identified for CommodityFulfillment {
    fn id(&self) -> &str {
        &self.id
    }
}

impl CommodityFulfillment {
    /// A single-use commodity that fulfills nothing, with default quality multipliers.
    pub fn template(id: &str, registry: &DimensionRegistry) -> Self {
        Self {
            id: id.to_string(),
            fulfillment_vector: FulfillmentVector {
                coarse: vec![0.0; registry.coarse_count()],
                fine: NamedValues::new(),
            },
            tags: Vec::new(),
            durability: Durability::SingleUse,
            quality_multipliers: DEFAULT_QUALITY_MULTIPLIERS.into_iter().collect(),
            reusable_value: None,
            notes: None,
        }
    }
}

/// Sparse ids on one commodity that the registry does not define.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDimensions {
    pub item_id: String,
    pub ids: Vec<String>,
}

impl std::fmt::Display for UnknownDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}': unknown fine dimension(s) {}", self.item_id, self.ids.join(", "))
    }
}

/// Re-derive `coarse` against `registry` and report ids it does not know.
pub fn normalize_commodity(
    commodity: &CommodityFulfillment,
    registry: &DimensionRegistry,
) -> Result<(CommodityFulfillment, Option<UnknownDimensions>), ShapeError> {
    let mut out = commodity.clone();
    out.fulfillment_vector.refresh_coarse(registry)?;
    let ids = out.fulfillment_vector.unknown_dimensions(registry);
    let unknown = (!ids.is_empty()).then(|| UnknownDimensions {
        item_id: commodity.id.clone(),
        ids,
    });
    Ok((out, unknown))
}

pub fn validate_commodity(
    commodity: &CommodityFulfillment,
    registry: &DimensionRegistry,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let id = commodity.id.as_str();
    if id.trim().is_empty() {
        issues.push(ValidationIssue::EmptyId);
    }

    let v = &commodity.fulfillment_vector;
    for dimension in v.unknown_dimensions(registry) {
        issues.push(ValidationIssue::UnknownDimension {
            item: id.to_string(),
            dimension,
        });
    }
    check_finite_values(&mut issues, id, "fulfillmentVector.fine", &v.fine.values());
    check_finite_values(&mut issues, id, "fulfillmentVector.coarse", &v.coarse);

    for (tier, value) in commodity.quality_multipliers.iter() {
        if !QUALITY_TIERS.contains(&tier) {
            issues.push(ValidationIssue::UnknownQualityTier {
                item: id.to_string(),
                tier: tier.to_string(),
            });
        }
        check_range(&mut issues, id, "qualityMultipliers", value, 0.0, f64::MAX);
    }

    if let Some(reusable) = commodity.reusable_value {
        check_range(&mut issues, id, "reusableValue", reusable, 0.0, MAX_REUSABLE_VALUE);
    }
    issues
}

// ── Document ───────────────────────────────────────────────────────────

/// `fulfillment_vectors.json`. Commodities are an object keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FulfillmentVectorsData {
    #[serde(default)]
    pub version: DocumentVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(
        default,
        serialize_with = "serialize_keyed",
        deserialize_with = "deserialize_keyed"
    )]
    pub commodities: Vec<CommodityFulfillment>,
}

impl Collection for FulfillmentVectorsData {
    type Item = CommodityFulfillment;
    const ITEMS_KEY: &'static str = "commodities";

    fn version(&self) -> &DocumentVersion {
        &self.version
    }
    fn items(&self) -> &[CommodityFulfillment] {
        &self.commodities
    }
    fn items_mut(&mut self) -> &mut Vec<CommodityFulfillment> {
        &mut self.commodities
    }
}

fn serialize_keyed<S: Serializer>(
    commodities: &[CommodityFulfillment],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(commodities.iter().map(|c| (&c.id, c)))
}

/// The object key names the commodity; an `id` field inside is overwritten.
fn deserialize_keyed<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<CommodityFulfillment>, D::Error> {
    let map = Map::<String, Value>::deserialize(deserializer)?;
    let mut out = Vec::with_capacity(map.len());
    for (key, mut value) in map {
        if let Value::Object(fields) = &mut value {
            fields.insert("id".to_string(), Value::String(key.clone()));
        }
        let commodity: CommodityFulfillment = serde_json::from_value(value)
            .map_err(|e| D::Error::custom(format!("commodity '{key}': {e}")))?;
        out.push(commodity);
    }
    Ok(out)
}
