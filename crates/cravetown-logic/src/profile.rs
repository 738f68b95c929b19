//! Per-character craving profile, advanced one evaluation pass at a time.
//!
//! A profile starts from the class base vector. Each [`CravingProfile::tick`]:
//!
//! 1. evaluates every enablement rule against the character state,
//! 2. folds newly fired *permanent* rules into the base (once per rule id),
//! 3. collects the fired *non-permanent* modifiers for this pass only,
//! 4. composes base, modifiers and trait multipliers,
//! 5. aggregates the result to coarse.
//!
//! `tick` does not mutate; it returns the next profile alongside the
//! effective vector, so many characters can be advanced in parallel.

use std::collections::BTreeSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::aggregate::aggregate;
use crate::character_traits::CharacterTrait;
use crate::classes::CharacterClass;
use crate::compose::{compose, fold_additive};
use crate::craving::{CravingCarrier, CravingVector};
use crate::dimensions::DimensionRegistry;
use crate::rules::{evaluate_rules, EnablementRule};
use crate::triggers::{CharacterState, TriggerReport};
use crate::vector::{ShapeError, Vector, VectorKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CravingProfile {
    pub class_id: String,
    /// Absolute fine base, including every folded permanent modifier.
    base: Vec<f64>,
    /// Ids of permanent rules already folded into `base`.
    folded_rules: BTreeSet<String>,
}

/// Everything produced by one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    /// The profile to use for the next pass.
    pub profile: CravingProfile,
    /// Effective cravings for this pass; `coarse` is the aggregate of `fine`.
    pub effective: CravingVector,
    /// Ids of every rule whose trigger held, in document order.
    pub fired: Vec<String>,
    /// Ids of permanent rules folded into the base on this pass.
    pub newly_folded: Vec<String>,
    pub reports: Vec<TriggerReport>,
}

impl CravingProfile {
    /// Start a profile from a class whose vector is already normalized.
    pub fn for_class(
        class: &CharacterClass,
        registry: &DimensionRegistry,
    ) -> Result<Self, ShapeError> {
        let base = class.fine_vector()?;
        base.expect_len(registry.fine_count())?;
        Ok(Self {
            class_id: class.id.clone(),
            base: base.into_values(),
            folded_rules: BTreeSet::new(),
        })
    }

    pub fn base(&self) -> &[f64] {
        &self.base
    }

    pub fn folded_rules(&self) -> &BTreeSet<String> {
        &self.folded_rules
    }

    /// Run one evaluation pass.
    pub fn tick<S: CharacterState + ?Sized>(
        &self,
        registry: &DimensionRegistry,
        traits: &[&CharacterTrait],
        rules: &[EnablementRule],
        state: &S,
    ) -> Result<TickOutcome, ShapeError> {
        let fine_count = registry.fine_count();
        let active = evaluate_rules(rules, state);

        let mut base = Vector::new(VectorKind::Absolute, self.base.clone())?;
        base.expect_len(fine_count)?;

        let mut folded_rules = self.folded_rules.clone();
        let mut newly_folded = Vec::new();
        let mut transient = Vec::new();

        for rule in &active.fired {
            let modifier = rule.fine_vector()?;
            modifier.expect_len(fine_count)?;
            if !rule.effect.permanent {
                transient.push(modifier);
            } else if folded_rules.insert(rule.id.clone()) {
                debug!("folding permanent rule '{}' into '{}'", rule.id, self.class_id);
                base = fold_additive(&base, &modifier)?;
                newly_folded.push(rule.id.clone());
            }
        }

        let multipliers = traits
            .iter()
            .map(|t| {
                let v = t.fine_vector()?;
                v.expect_len(fine_count)?;
                Ok(v)
            })
            .collect::<Result<Vec<_>, ShapeError>>()?;

        let transient_refs: Vec<&Vector> = transient.iter().collect();
        let multiplier_refs: Vec<&Vector> = multipliers.iter().collect();
        let effective = compose(&base, &transient_refs, &multiplier_refs)?;
        let coarse = aggregate(effective.values(), registry)?;

        Ok(TickOutcome {
            profile: CravingProfile {
                class_id: self.class_id.clone(),
                base: base.into_values(),
                folded_rules,
            },
            effective: CravingVector {
                coarse,
                fine: effective.into_values(),
                coarse_override: false,
            },
            fired: active.fired.iter().map(|r| r.id.clone()).collect(),
            newly_folded,
            reports: active.reports,
        })
    }
}
