//! Character traits and their per-dimension craving multipliers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::craving::{CravingCarrier, CravingVector};
use crate::dimensions::DimensionRegistry;
use crate::documents::Identified;
use crate::validation::{check_finite_values, ValidationIssue};
use crate::vector::VectorKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    VeryRare,
}

impl Rarity {
    pub fn all() -> &'static [Rarity] {
        &[Rarity::Common, Rarity::Uncommon, Rarity::Rare, Rarity::VeryRare]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterTrait {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default)]
    pub craving_multipliers: CravingVector,
    /// Free-form effects consumed by the simulation, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_effects: Option<Map<String, Value>>,
}

impl Identified for CharacterTrait {
    fn id(&self) -> &str {
        &self.id
    }
}

impl CravingCarrier for CharacterTrait {
    const KIND: VectorKind = VectorKind::Multiplicative;

    fn cravings(&self) -> &CravingVector {
        &self.craving_multipliers
    }
    fn cravings_mut(&mut self) -> &mut CravingVector {
        &mut self.craving_multipliers
    }
}

impl CharacterTrait {
    /// A neutral trait: every multiplier 1.0.
    pub fn template(id: &str, registry: &DimensionRegistry) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            rarity: Rarity::Common,
            craving_multipliers: CravingVector::identity(VectorKind::Multiplicative, registry),
            special_effects: None,
        }
    }
}

pub fn validate_trait(t: &CharacterTrait) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if t.id.trim().is_empty() {
        issues.push(ValidationIssue::EmptyId);
    }
    let v = &t.craving_multipliers;
    check_finite_values(&mut issues, &t.id, "cravingMultipliers.fine", &v.fine);
    check_finite_values(&mut issues, &t.id, "cravingMultipliers.coarse", &v.coarse);
    for (index, value) in v.fine.iter().enumerate() {
        if *value < 0.0 {
            issues.push(ValidationIssue::NegativeMultiplier {
                item: t.id.clone(),
                index,
                value: *value,
            });
        }
    }
    issues
}
