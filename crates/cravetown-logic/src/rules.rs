//! Enablement rules: a trigger plus an additive craving modifier.
//!
//! A rule whose trigger holds contributes its `craving_modifier` to the
//! composition for that pass. Permanent rules are folded into the base once
//! by [`crate::profile::CravingProfile`] and are not re-applied.

use serde::{Deserialize, Serialize};

use crate::craving::{CravingCarrier, CravingVector};
use crate::dimensions::DimensionRegistry;
use crate::documents::Identified;
use crate::triggers::{CharacterState, Trigger, TriggerCondition, TriggerReport};
use crate::validation::{check_finite_values, check_range, ValidationIssue};
use crate::vector::VectorKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEffect {
    #[serde(default)]
    pub craving_modifier: CravingVector,
    #[serde(default)]
    pub permanent: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnablementRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub trigger: Trigger,
    #[serde(default)]
    pub effect: RuleEffect,
}

impl Identified for EnablementRule {
    fn id(&self) -> &str {
        &self.id
    }
}

impl CravingCarrier for EnablementRule {
    const KIND: VectorKind = VectorKind::Additive;

    fn cravings(&self) -> &CravingVector {
        &self.effect.craving_modifier
    }
    fn cravings_mut(&mut self) -> &mut CravingVector {
        &mut self.effect.craving_modifier
    }
}

/// What one rule evaluation yields.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome<'a> {
    pub rule: &'a EnablementRule,
    pub triggered: bool,
    /// Present exactly when `triggered`.
    pub effect: Option<&'a RuleEffect>,
    pub report: Option<TriggerReport>,
}

impl EnablementRule {
    /// A non-permanent `owns_commodity_tag` rule with a zero modifier.
    pub fn template(id: &str, registry: &DimensionRegistry) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            trigger: TriggerCondition::OwnsCommodityTag {
                tag: String::new(),
                min_quantity: 1,
            }
            .into(),
            effect: RuleEffect {
                craving_modifier: CravingVector::identity(VectorKind::Additive, registry),
                permanent: false,
            },
        }
    }

    /// Evaluate the trigger and hand back the effect when it holds.
    pub fn evaluate<S: CharacterState + ?Sized>(&self, state: &S) -> RuleOutcome<'_> {
        let outcome = self.trigger.evaluate(&self.id, state);
        RuleOutcome {
            rule: self,
            triggered: outcome.fired,
            effect: outcome.fired.then_some(&self.effect),
            report: outcome.report,
        }
    }
}

/// Rules that fired in one pass, in document order, plus any reports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveRules<'a> {
    pub fired: Vec<&'a EnablementRule>,
    pub reports: Vec<TriggerReport>,
}

/// Evaluate every rule against `state`. Unknown triggers never abort the pass.
pub fn evaluate_rules<'a, S: CharacterState + ?Sized>(
    rules: &'a [EnablementRule],
    state: &S,
) -> ActiveRules<'a> {
    let mut active = ActiveRules::default();
    for rule in rules {
        let outcome = rule.evaluate(state);
        if outcome.triggered {
            active.fired.push(rule);
        }
        if let Some(report) = outcome.report {
            active.reports.push(report);
        }
    }
    active
}

pub fn validate_rule(rule: &EnablementRule) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let id = rule.id.as_str();
    if id.trim().is_empty() {
        issues.push(ValidationIssue::EmptyId);
    }

    match rule.trigger.condition() {
        Some(TriggerCondition::OwnsCommodityTag { tag, min_quantity }) => {
            if tag.trim().is_empty() {
                issues.push(ValidationIssue::MissingTriggerField {
                    item: id.to_string(),
                    field: "tag",
                });
            }
            check_range(
                &mut issues,
                id,
                "trigger.minQuantity",
                *min_quantity as f64,
                1.0,
                f64::MAX,
            );
        }
        Some(TriggerCondition::SatisfactionAbove {
            craving_type,
            threshold,
        })
        | Some(TriggerCondition::SatisfactionBelow {
            craving_type,
            threshold,
        }) => {
            if craving_type.trim().is_empty() {
                issues.push(ValidationIssue::MissingTriggerField {
                    item: id.to_string(),
                    field: "cravingType",
                });
            }
            check_range(&mut issues, id, "trigger.threshold", *threshold, 0.0, 100.0);
        }
        Some(TriggerCondition::ClassChange { new_class }) => {
            if new_class.trim().is_empty() {
                issues.push(ValidationIssue::MissingTriggerField {
                    item: id.to_string(),
                    field: "newClass",
                });
            }
        }
        Some(TriggerCondition::HasRelationship { .. }) => {}
        None => issues.push(ValidationIssue::UnrecognizedTrigger {
            item: id.to_string(),
            type_name: rule.trigger.type_name().to_string(),
        }),
    }

    let v = &rule.effect.craving_modifier;
    check_finite_values(&mut issues, id, "effect.cravingModifier.fine", &v.fine);
    check_finite_values(&mut issues, id, "effect.cravingModifier.coarse", &v.coarse);
    issues
}
