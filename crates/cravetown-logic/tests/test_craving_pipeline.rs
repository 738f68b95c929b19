//! Integration tests for the craving vector pipeline.
//!
//! Exercises: DimensionDefinitions → DimensionRegistry → resize → aggregate
//! → trigger evaluation → compose → CravingProfile
//!
//! All tests are pure logic; documents are built in memory.

use serde_json::json;

use cravetown_logic::aggregate::aggregate;
use cravetown_logic::character_traits::CharacterTrait;
use cravetown_logic::classes::CharacterClass;
use cravetown_logic::compose::compose;
use cravetown_logic::craving::{normalize_item, CravingCarrier};
use cravetown_logic::dimensions::{DimensionDefinitions, DimensionRegistry, RegistryError};
use cravetown_logic::profile::CravingProfile;
use cravetown_logic::resize::{resize, resize_with, TruncationPolicy};
use cravetown_logic::rules::{evaluate_rules, EnablementRule};
use cravetown_logic::triggers::{CharacterSnapshot, Relationship, Trigger, TriggerReport};
use cravetown_logic::vector::{ShapeError, Vector, VectorKind};
use cravetown_logic::view::{summarize, ValueRange};

// ── Helpers ────────────────────────────────────────────────────────────

const BLOCKS: [(&str, usize); 9] = [
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

/// Definitions document with the nine standard categories (50 fine).
fn definitions() -> DimensionDefinitions {
    let mut coarse = Vec::new();
    let mut fine = Vec::new();
    for (pos, (id, n)) in BLOCKS.iter().enumerate() {
        coarse.push(json!({ "id": id, "index": pos, "name": id }));
        for k in 0..*n {
            let index = fine.len();
            let tags = if *id == "safety" && k == 0 {
                vec!["shelter"]
            } else {
                vec![]
            };
            fine.push(json!({
                "id": format!("{id}_{k}"),
                "index": index,
                "parentCoarse": id,
                "name": format!("{id} {k}"),
                "tags": tags,
            }));
        }
    }
    serde_json::from_value(json!({
        "version": "1.0.0",
        "dimensionCount": { "coarse": 9, "fine": 50 },
        "coarseDimensions": coarse,
        "fineDimensions": fine,
    }))
    .unwrap()
}

fn registry() -> DimensionRegistry {
    DimensionRegistry::from_definitions(&definitions()).unwrap()
}

fn shelter_rule(reg: &DimensionRegistry) -> EnablementRule {
    let mut fine = vec![0.0; reg.fine_count()];
    fine[reg.fine_index("touch_1").unwrap()] = 1.5;
    serde_json::from_value(json!({
        "id": "homeowner",
        "name": "Homeowner",
        "trigger": { "type": "owns_commodity_tag", "tag": "shelter", "minQuantity": 1 },
        "effect": { "cravingModifier": { "coarse": [], "fine": fine }, "permanent": false }
    }))
    .unwrap()
}

// ── Registry ───────────────────────────────────────────────────────────

#[test]
fn standard_layout_builds() {
    let reg = registry();
    assert_eq!(reg.fine_count(), 50);
    assert_eq!(reg.coarse_count(), 9);
    assert_eq!(reg.members(0).collect::<Vec<_>>(), (0..8).collect::<Vec<_>>());
    assert_eq!(reg.members(8).collect::<Vec<_>>(), (45..50).collect::<Vec<_>>());
    assert_eq!(reg.parent_of(13), Some(2));
    assert_eq!(reg.fine_with_tag("shelter").count(), 1);
}

#[test]
fn unknown_parent_rejected() {
    let mut defs = definitions();
    defs.fine_dimensions[3].parent_coarse = "nowhere".into();
    assert!(matches!(
        DimensionRegistry::from_definitions(&defs),
        Err(RegistryError::UnknownParent { .. })
    ));
}

#[test]
fn fine_index_gap_rejected() {
    let mut defs = definitions();
    defs.fine_dimensions.remove(20);
    assert!(matches!(
        DimensionRegistry::from_definitions(&defs),
        Err(RegistryError::FineIndexGap {
            expected: 20,
            found: 21
        })
    ));
}

// ── Aggregation ────────────────────────────────────────────────────────

#[test]
fn biological_mean_of_first_eight() {
    let reg = registry();
    let mut fine = vec![0.0; 50];
    fine[..8].copy_from_slice(&[2.0, 4.0, 6.0, 8.0, 2.0, 4.0, 6.0, 8.0]);
    let coarse = aggregate(&fine, &reg).unwrap();
    assert_eq!(coarse.len(), 9);
    assert_eq!(coarse[0], 5.0);
    assert!(coarse[1..].iter().all(|c| *c == 0.0));
}

#[test]
fn aggregate_rejects_stale_length() {
    let reg = registry();
    assert_eq!(
        aggregate(&[1.0; 45], &reg),
        Err(ShapeError::LengthMismatch {
            expected: 50,
            actual: 45
        })
    );
}

#[test]
fn summary_agrees_with_aggregate() {
    let reg = registry();
    let fine: Vec<f64> = (0..50).map(|i| (i % 7) as f64).collect();
    let coarse = aggregate(&fine, &reg).unwrap();
    let summary = summarize(&fine, &reg, ValueRange::default()).unwrap();
    for (s, c) in summary.iter().zip(&coarse) {
        assert_eq!(s.average, *c);
    }
}

// ── Resizing ───────────────────────────────────────────────────────────

#[test]
fn coarse_padding_uses_kind_identity() {
    let old = [3.0; 9];
    let abs = resize(&old, VectorKind::Absolute, 12).unwrap();
    assert_eq!(&abs.values[9..], &[0.0, 0.0, 0.0]);
    assert!(abs.lossy.is_none());

    let mul = resize(&old, VectorKind::Multiplicative, 12).unwrap();
    assert_eq!(&mul.values[9..], &[1.0, 1.0, 1.0]);
}

#[test]
fn lossy_truncation_reported_or_rejected() {
    let values = [1.0, 2.0, 3.0, 4.0];
    let warned = resize(&values, VectorKind::Additive, 2).unwrap();
    assert_eq!(warned.values, vec![1.0, 2.0]);
    assert_eq!(warned.lossy.unwrap().dropped, vec![3.0, 4.0]);

    assert!(matches!(
        resize_with(&values, VectorKind::Additive, 2, TruncationPolicy::Reject),
        Err(ShapeError::LossyTruncation { dropped: 2, .. })
    ));
}

#[test]
fn stale_class_normalizes_to_registry() {
    let reg = registry();
    let class: CharacterClass = serde_json::from_value(json!({
        "id": "lower",
        "name": "Lower Class",
        "allocationPriority": 1,
        "baseIncome": 5,
        "baseCravingVector": { "coarse": [1.0, 1.0], "fine": vec![4.0; 45] }
    }))
    .unwrap();

    let (class, warnings) = normalize_item(&class, &reg, TruncationPolicy::Warn).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(class.base_craving_vector.fine.len(), 50);
    assert_eq!(class.base_craving_vector.coarse[0], 4.0);
    assert_eq!(class.base_craving_vector.coarse[8], 0.0);
    assert!(class.base_craving_vector.coarse_is_current(&reg));
}

// ── Triggers and rules ─────────────────────────────────────────────────

#[test]
fn shelter_trigger_fires_at_one() {
    let reg = registry();
    let rules = vec![shelter_rule(&reg)];
    let mut state = CharacterSnapshot {
        class_id: "lower".into(),
        ..Default::default()
    };

    assert!(evaluate_rules(&rules, &state).fired.is_empty());

    state.owned_tags.insert("shelter".into(), 1);
    let active = evaluate_rules(&rules, &state);
    assert_eq!(active.fired.len(), 1);
    assert!(active.reports.is_empty());
}

#[test]
fn unknown_trigger_is_false_with_report() {
    let trigger: Trigger = serde_json::from_value(json!({ "type": "foo", "x": 1 })).unwrap();
    let outcome = trigger.evaluate("odd", &CharacterSnapshot::default());
    assert!(!outcome.fired);
    assert_eq!(
        outcome.report,
        Some(TriggerReport::UnknownTriggerType {
            rule_id: "odd".into(),
            type_name: "foo".into()
        })
    );
    // Round-trips with its extra fields intact.
    assert_eq!(
        serde_json::to_value(&trigger).unwrap(),
        json!({ "type": "foo", "x": 1 })
    );
}

#[test]
fn relationship_and_satisfaction_triggers() {
    let married: Trigger =
        serde_json::from_value(json!({ "type": "has_relationship", "relationship": "spouse" }))
            .unwrap();
    let content: Trigger = serde_json::from_value(
        json!({ "type": "satisfaction_above", "cravingType": "biological", "threshold": 70 }),
    )
    .unwrap();

    let mut state = CharacterSnapshot::default();
    assert!(!married.evaluate("m", &state).fired);
    let missing = content.evaluate("c", &state);
    assert!(!missing.fired);
    assert!(matches!(
        missing.report,
        Some(TriggerReport::MissingSatisfaction { .. })
    ));

    state.relationships.push(Relationship::Spouse);
    state.satisfaction.insert("biological".into(), 70.0);
    assert!(married.evaluate("m", &state).fired);
    // Strictly greater.
    assert!(!content.evaluate("c", &state).fired);
    state.satisfaction.insert("biological".into(), 70.5);
    assert!(content.evaluate("c", &state).fired);
}

// ── Composition ────────────────────────────────────────────────────────

#[test]
fn compose_identities() {
    let reg = registry();
    let n = reg.fine_count();
    let base = Vector::new(VectorKind::Absolute, (0..n).map(|i| i as f64).collect()).unwrap();
    let zero = Vector::identity(VectorKind::Additive, n);
    let one = Vector::identity(VectorKind::Multiplicative, n);
    assert_eq!(compose(&base, &[&zero], &[&one]).unwrap(), base);
}

#[test]
fn compose_kind_mismatch_is_error() {
    let base = Vector::new(VectorKind::Absolute, vec![1.0, 2.0]).unwrap();
    let wrong = Vector::new(VectorKind::Multiplicative, vec![1.0, 1.0]).unwrap();
    assert!(matches!(
        compose(&base, &[&wrong], &[]),
        Err(ShapeError::KindMismatch { .. })
    ));
}

#[test]
fn triggered_modifier_flows_into_profile() {
    let reg = registry();
    let mut class = CharacterClass::template("lower", &reg);
    class.base_craving_vector.fill(2.0, &reg).unwrap();
    let mut scholar = CharacterTrait::template("scholar", &reg);
    let touch_1 = reg.fine_index("touch_1").unwrap();
    scholar
        .craving_multipliers
        .set_fine_value(touch_1, 2.0, &reg)
        .unwrap();
    let rules = vec![shelter_rule(&reg)];

    let mut state = CharacterSnapshot {
        class_id: "lower".into(),
        ..Default::default()
    };
    state.owned_tags.insert("shelter".into(), 1);

    let profile = CravingProfile::for_class(&class, &reg).unwrap();
    let out = profile.tick(&reg, &[&scholar], &rules, &state).unwrap();

    // (2.0 + 1.5) * 2.0
    assert_eq!(out.effective.fine[touch_1], 7.0);
    assert_eq!(out.effective.fine[0], 2.0);
    assert_eq!(out.effective.coarse, aggregate(&out.effective.fine, &reg).unwrap());
    assert_eq!(out.fired, vec!["homeowner".to_string()]);
    assert_eq!(scholar.fine_vector().unwrap().kind(), VectorKind::Multiplicative);
}
