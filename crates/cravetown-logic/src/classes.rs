//! Character classes: the absolute base craving vector per social class.

use serde::{Deserialize, Serialize};

use crate::craving::{CravingCarrier, CravingVector};
use crate::dimensions::DimensionRegistry;
use crate::documents::Identified;
use crate::validation::{check_finite_values, check_range, ValidationIssue};
use crate::vector::VectorKind;

/// Quality tiers a class may accept or reject.
pub const QUALITY_TIERS: [&str; 5] = ["poor", "basic", "good", "luxury", "masterwork"];

/// Satisfaction thresholds that drive emigration and unrest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassThresholds {
    /// 0–100.
    pub emigration: f64,
    /// 0–5.
    pub riot_contribution: f64,
    /// 0–100.
    pub critical_satisfaction: f64,
}

impl Default for ClassThresholds {
    fn default() -> Self {
        Self {
            emigration: 50.0,
            riot_contribution: 1.0,
            critical_satisfaction: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterClass {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// 1 (first served) to 10.
    pub allocation_priority: u8,
    pub base_income: f64,
    #[serde(default)]
    pub thresholds: ClassThresholds,
    #[serde(default)]
    pub accepted_quality_tiers: Vec<String>,
    #[serde(default)]
    pub rejected_quality_tiers: Vec<String>,
    #[serde(default)]
    pub base_craving_vector: CravingVector,
}

impl Identified for CharacterClass {
    fn id(&self) -> &str {
        &self.id
    }
}

impl CravingCarrier for CharacterClass {
    const KIND: VectorKind = VectorKind::Absolute;

    fn cravings(&self) -> &CravingVector {
        &self.base_craving_vector
    }
    fn cravings_mut(&mut self) -> &mut CravingVector {
        &mut self.base_craving_vector
    }
}

impl CharacterClass {
    /// A blank class sized to `registry`: zero cravings, default thresholds.
    pub fn template(id: &str, registry: &DimensionRegistry) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            allocation_priority: 5,
            base_income: 0.0,
            thresholds: ClassThresholds::default(),
            accepted_quality_tiers: Vec::new(),
            rejected_quality_tiers: Vec::new(),
            base_craving_vector: CravingVector::identity(VectorKind::Absolute, registry),
        }
    }
}

/// Check a class against the authoring constraints, returning all issues.
pub fn validate_class(class: &CharacterClass) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let id = class.id.as_str();

    if id.trim().is_empty() {
        issues.push(ValidationIssue::EmptyId);
    }
    check_range(
        &mut issues,
        id,
        "allocationPriority",
        class.allocation_priority as f64,
        1.0,
        10.0,
    );
    check_range(&mut issues, id, "baseIncome", class.base_income, 0.0, f64::MAX);

    let t = &class.thresholds;
    check_range(&mut issues, id, "thresholds.emigration", t.emigration, 0.0, 100.0);
    check_range(
        &mut issues,
        id,
        "thresholds.riotContribution",
        t.riot_contribution,
        0.0,
        5.0,
    );
    check_range(
        &mut issues,
        id,
        "thresholds.criticalSatisfaction",
        t.critical_satisfaction,
        0.0,
        100.0,
    );

    for tier in &class.accepted_quality_tiers {
        if class.rejected_quality_tiers.contains(tier) {
            issues.push(ValidationIssue::ConflictingQualityTier {
                item: id.to_string(),
                tier: tier.clone(),
            });
        }
    }

    let v = &class.base_craving_vector;
    check_finite_values(&mut issues, id, "baseCravingVector.fine", &v.fine);
    check_finite_values(&mut issues, id, "baseCravingVector.coarse", &v.coarse);

    issues
}
