//! Cravetown Headless Craving Data Harness
//!
//! Validates the craving vector model and the bundled balancing data
//! without any editor front-end. Runs entirely in-process.
//!
//! Usage:
//!   cargo run -p cravetown-simtest
//!   cargo run -p cravetown-simtest -- --verbose
//!   cargo run -p cravetown-simtest -- --data-dir ./data
//!
//! `--data-dir` additionally opens an editing session over that directory
//! (version and truncation policy from `CRAVETOWN_*` variables).

use std::collections::{BTreeMap, HashSet};
use std::io;

use cravetown_logic::aggregate::aggregate;
use cravetown_logic::character_traits::{validate_trait, CharacterTrait, Rarity};
use cravetown_logic::classes::{validate_class, CharacterClass, QUALITY_TIERS};
use cravetown_logic::compose::compose;
use cravetown_logic::craving::{normalize_item, CravingCarrier};
use cravetown_logic::dimensions::{DimensionDefinitions, DimensionRegistry};
use cravetown_logic::documents::{
    CharacterClassesData, CharacterTraitsData, Collection, EnablementRulesData, Identified,
};
use cravetown_logic::fulfillment::{validate_commodity, FulfillmentVectorsData};
use cravetown_logic::profile::CravingProfile;
use cravetown_logic::resize::{resize, TruncationPolicy};
use cravetown_logic::rules::{validate_rule, EnablementRule};
use cravetown_logic::triggers::{CharacterSnapshot, Relationship, Trigger, TriggerCondition};
use cravetown_logic::vector::{Vector, VectorKind};
use cravetown_logic::view::{summarize, ValueRange};
use cravetown_store::{CravingStore, EditingSession, StoreConfig};
use log::info;
use tracing_subscriber::{fmt, EnvFilter};

// ── Bundled craving data (same JSON the editor ships) ───────────────────
const DIMENSIONS_JSON: &str =
    include_str!("../../../data/base/craving_system/dimension_definitions.json");
const CLASSES_JSON: &str = include_str!("../../../data/base/craving_system/character_classes.json");
const TRAITS_JSON: &str = include_str!("../../../data/base/craving_system/character_traits.json");
const RULES_JSON: &str = include_str!("../../../data/base/craving_system/enablement_rules.json");
const FULFILLMENT_JSON: &str =
    include_str!("../../../data/base/craving_system/fulfillment_vectors.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed,
            detail: detail.into(),
        }
    }
}

struct Bundle {
    registry: DimensionRegistry,
    classes: CharacterClassesData,
    traits: CharacterTraitsData,
    rules: EnablementRulesData,
    fulfillment: FulfillmentVectorsData,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose");
    let data_dir = args
        .iter()
        .position(|a| a == "--data-dir")
        .and_then(|i| args.get(i + 1))
        .cloned();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_writer(io::stderr).with_env_filter(filter).init();

    println!("=== Cravetown Craving Data Harness ===\n");

    let mut results = Vec::new();

    // 1. Dimension definitions
    let (defs_results, registry) = validate_dimensions(verbose);
    results.extend(defs_results);

    if let Some(registry) = registry {
        // 2. Collections parse and normalize
        let (doc_results, bundle) = validate_documents(registry, verbose);
        results.extend(doc_results);

        if let Some(bundle) = bundle {
            // 3. Field validation and cross references
            results.extend(validate_fields(&bundle, verbose));

            // 4. Aggregation and resize properties
            results.extend(validate_vector_properties(&bundle, verbose));

            // 5. Trigger evaluation and profile passes
            results.extend(validate_profiles(&bundle, verbose));
        }
    }

    // 6. On-disk session (optional)
    if let Some(dir) = data_dir {
        results.extend(validate_data_dir(&dir, verbose));
    }

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Dimension Definitions ────────────────────────────────────────────

fn validate_dimensions(verbose: bool) -> (Vec<TestResult>, Option<DimensionRegistry>) {
    println!("--- Dimension Definitions ---");
    let mut results = Vec::new();

    let defs: DimensionDefinitions = match serde_json::from_str(DIMENSIONS_JSON) {
        Ok(d) => d,
        Err(e) => {
            results.push(TestResult::new(
                "dimensions_parse",
                false,
                format!("JSON parse error: {}", e),
            ));
            return (results, None);
        }
    };

    let registry = match DimensionRegistry::from_definitions(&defs) {
        Ok(r) => r,
        Err(e) => {
            results.push(TestResult::new("dimensions_registry", false, e.to_string()));
            return (results, None);
        }
    };
    results.push(TestResult::new(
        "dimensions_registry",
        true,
        format!(
            "version {}: {} coarse / {} fine",
            registry.version(),
            registry.coarse_count(),
            registry.fine_count()
        ),
    ));

    // Declared counts agree with the lists
    let declared = defs.dimension_count;
    let counts_match = declared.map_or(true, |c| {
        c.coarse == registry.coarse_count() && c.fine == registry.fine_count()
    });
    results.push(TestResult::new(
        "dimensions_count_declared",
        counts_match,
        format!("dimensionCount {:?}", declared),
    ));

    // Every coarse category has members
    let empty: Vec<&str> = registry
        .coarse()
        .iter()
        .enumerate()
        .filter(|(pos, _)| registry.members(*pos).next().is_none())
        .map(|(_, c)| c.id.as_str())
        .collect();
    results.push(TestResult::new(
        "dimensions_no_empty_category",
        empty.is_empty(),
        format!("empty categories: {:?}", empty),
    ));

    if verbose {
        for (pos, c) in registry.coarse().iter().enumerate() {
            println!("  {:<18} {} fine", c.id, registry.members(pos).count());
        }
    }

    // Reserved indices are really free
    let reserved = defs
        .metadata
        .as_ref()
        .and_then(|m| m.future_expansion.as_ref())
        .map(|f| f.reserved_indices.clone())
        .unwrap_or_default();
    let collisions = reserved
        .fine
        .iter()
        .filter(|i| **i < registry.fine_count())
        .count()
        + reserved
            .coarse
            .iter()
            .filter(|i| **i < registry.coarse_count())
            .count();
    results.push(TestResult::new(
        "dimensions_reserved_free",
        collisions == 0,
        format!(
            "{} reserved fine / {} reserved coarse, {} in use",
            reserved.fine.len(),
            reserved.coarse.len(),
            collisions
        ),
    ));

    (results, Some(registry))
}

// ── 2. Documents ────────────────────────────────────────────────────────

fn parse<T: serde::de::DeserializeOwned>(
    name: &str,
    json: &str,
    results: &mut Vec<TestResult>,
) -> Option<T> {
    match serde_json::from_str(json) {
        Ok(doc) => {
            results.push(TestResult::new(name, true, "parsed"));
            Some(doc)
        }
        Err(e) => {
            results.push(TestResult::new(name, false, format!("JSON parse error: {}", e)));
            None
        }
    }
}

fn check_collection<C>(name: &str, data: &C, registry: &DimensionRegistry) -> Vec<TestResult>
where
    C: Collection,
    C::Item: CravingCarrier,
{
    let mut results = Vec::new();

    let unique = data.check_unique_ids();
    results.push(TestResult::new(
        &format!("{name}_unique_ids"),
        unique.is_ok(),
        match unique {
            Ok(()) => format!("{} {}", data.items().len(), C::ITEMS_KEY),
            Err(dups) => format!("{} duplicate(s), first '{}'", dups.len(), dups[0].id),
        },
    ));

    let mut lossy = Vec::new();
    let mut stale = Vec::new();
    for item in data.items() {
        match normalize_item(item, registry, TruncationPolicy::Warn) {
            Ok((_, warnings)) => lossy.extend(warnings.iter().map(ToString::to_string)),
            Err(e) => lossy.push(format!("'{}': {}", item.id(), e)),
        }
        let v = item.cravings();
        if v.fine.len() != registry.fine_count() || !v.coarse_is_current(registry) {
            stale.push(item.id().to_string());
        }
    }
    results.push(TestResult::new(
        &format!("{name}_resize_lossless"),
        lossy.is_empty(),
        if lossy.is_empty() {
            "no lossy truncation".to_string()
        } else {
            lossy.join("; ")
        },
    ));
    results.push(TestResult::new(
        &format!("{name}_coarse_current"),
        stale.is_empty(),
        format!("stale vectors: {:?}", stale),
    ));

    results
}

fn validate_documents(
    registry: DimensionRegistry,
    _verbose: bool,
) -> (Vec<TestResult>, Option<Bundle>) {
    println!("--- Documents ---");
    let mut results = Vec::new();

    let classes: Option<CharacterClassesData> = parse("classes_parse", CLASSES_JSON, &mut results);
    let traits: Option<CharacterTraitsData> = parse("traits_parse", TRAITS_JSON, &mut results);
    let rules: Option<EnablementRulesData> = parse("rules_parse", RULES_JSON, &mut results);
    let fulfillment: Option<FulfillmentVectorsData> =
        parse("commodities_parse", FULFILLMENT_JSON, &mut results);

    let (Some(classes), Some(traits), Some(rules), Some(fulfillment)) =
        (classes, traits, rules, fulfillment)
    else {
        return (results, None);
    };

    results.extend(check_collection("classes", &classes, &registry));
    results.extend(check_collection("traits", &traits, &registry));
    results.extend(check_collection("rules", &rules, &registry));
    results.extend(check_commodities(&fulfillment, &registry));

    info!(
        "bundle: {} classes, {} traits, {} rules, {} commodities",
        classes.classes.len(),
        traits.traits.len(),
        rules.rules.len(),
        fulfillment.commodities.len()
    );

    (
        results,
        Some(Bundle {
            registry,
            classes,
            traits,
            rules,
            fulfillment,
        }),
    )
}

fn check_commodities(data: &FulfillmentVectorsData, registry: &DimensionRegistry) -> Vec<TestResult> {
    let mut results = Vec::new();

    let unique = data.check_unique_ids();
    results.push(TestResult::new(
        "commodities_unique_ids",
        unique.is_ok(),
        format!("{} {}", data.items().len(), FulfillmentVectorsData::ITEMS_KEY),
    ));

    let mut unknown = Vec::new();
    let mut stale = Vec::new();
    for c in data.items() {
        let v = &c.fulfillment_vector;
        let ids = v.unknown_dimensions(registry);
        if !ids.is_empty() {
            unknown.push(format!("{}: {}", c.id, ids.join(", ")));
        }
        if !v.coarse_is_current(registry) {
            stale.push(c.id.as_str());
        }
    }
    results.push(TestResult::new(
        "commodities_dimensions_known",
        unknown.is_empty(),
        if unknown.is_empty() {
            "every sparse id resolves".to_string()
        } else {
            unknown.join("; ")
        },
    ));
    results.push(TestResult::new(
        "commodities_coarse_current",
        stale.is_empty(),
        format!("stale vectors: {:?}", stale),
    ));

    results
}

// ── 3. Fields & Cross References ────────────────────────────────────────

fn validate_fields(bundle: &Bundle, verbose: bool) -> Vec<TestResult> {
    println!("--- Fields ---");
    let mut results = Vec::new();

    let mut issues = Vec::new();
    issues.extend(bundle.classes.classes.iter().flat_map(validate_class));
    issues.extend(bundle.traits.traits.iter().flat_map(validate_trait));
    issues.extend(bundle.rules.rules.iter().flat_map(validate_rule));
    issues.extend(
        bundle
            .fulfillment
            .commodities
            .iter()
            .flat_map(|c| validate_commodity(c, &bundle.registry)),
    );
    if verbose {
        for issue in &issues {
            println!("  issue: {}", issue);
        }
    }
    results.push(TestResult::new(
        "fields_valid",
        issues.is_empty(),
        format!("{} validation issue(s)", issues.len()),
    ));

    // Quality tiers come from the known list
    let unknown_tiers: Vec<String> = bundle
        .classes
        .classes
        .iter()
        .flat_map(|c| c.accepted_quality_tiers.iter().chain(&c.rejected_quality_tiers))
        .filter(|t| !QUALITY_TIERS.contains(&t.as_str()))
        .cloned()
        .collect();
    results.push(TestResult::new(
        "fields_quality_tiers",
        unknown_tiers.is_empty(),
        format!("unknown tiers: {:?}", unknown_tiers),
    ));

    // Every trigger is recognized
    let unrecognized: Vec<&str> = bundle
        .rules
        .rules
        .iter()
        .filter(|r| matches!(r.trigger, Trigger::Unrecognized(_)))
        .map(|r| r.id.as_str())
        .collect();
    results.push(TestResult::new(
        "rules_triggers_recognized",
        unrecognized.is_empty(),
        format!("unrecognized: {:?}", unrecognized),
    ));

    // Triggers reference things that exist
    let class_ids: HashSet<&str> = bundle.classes.classes.iter().map(|c| c.id.as_str()).collect();
    let mut dangling = Vec::new();
    for rule in &bundle.rules.rules {
        match rule.trigger.condition() {
            Some(TriggerCondition::ClassChange { new_class })
                if !class_ids.contains(new_class.as_str()) =>
            {
                dangling.push(format!("{} → class '{}'", rule.id, new_class));
            }
            Some(TriggerCondition::SatisfactionAbove { craving_type, .. })
            | Some(TriggerCondition::SatisfactionBelow { craving_type, .. })
                if bundle.registry.coarse_position(craving_type).is_none()
                    && bundle.registry.fine_index(craving_type).is_none() =>
            {
                dangling.push(format!("{} → craving '{}'", rule.id, craving_type));
            }
            _ => {}
        }
    }
    results.push(TestResult::new(
        "rules_references_resolve",
        dangling.is_empty(),
        if dangling.is_empty() {
            "all class and craving references resolve".to_string()
        } else {
            dangling.join("; ")
        },
    ));

    // Commodity tags that rules test for are carried by some commodity
    let supplied: HashSet<&str> = bundle
        .fulfillment
        .commodities
        .iter()
        .flat_map(|c| c.tags.iter().map(String::as_str))
        .collect();
    let unsupplied: Vec<String> = bundle
        .rules
        .rules
        .iter()
        .filter_map(|r| match r.trigger.condition() {
            Some(TriggerCondition::OwnsCommodityTag { tag, .. })
                if !supplied.contains(tag.as_str()) =>
            {
                Some(format!("{} → tag '{}'", r.id, tag))
            }
            _ => None,
        })
        .collect();
    results.push(TestResult::new(
        "rules_tags_supplied",
        unsupplied.is_empty(),
        if unsupplied.is_empty() {
            "every owned tag has a commodity".to_string()
        } else {
            unsupplied.join("; ")
        },
    ));

    // Every rarity appears among the bundled traits
    let mut rarities: BTreeMap<Rarity, usize> = Rarity::all().iter().map(|r| (*r, 0)).collect();
    for t in &bundle.traits.traits {
        *rarities.entry(t.rarity).or_default() += 1;
    }
    let missing: Vec<Rarity> = rarities
        .iter()
        .filter(|(_, n)| **n == 0)
        .map(|(r, _)| *r)
        .collect();
    results.push(TestResult::new(
        "traits_rarity_spread",
        missing.is_empty(),
        format!("{:?}", rarities),
    ));

    if verbose {
        for rule in &bundle.rules.rules {
            let kind = if rule.effect.permanent { "permanent" } else { "per-pass" };
            println!("  {:<12} {} ({})", rule.id, rule.trigger, kind);
        }
    }

    results
}

// ── 4. Vector Properties ────────────────────────────────────────────────

fn validate_vector_properties(bundle: &Bundle, verbose: bool) -> Vec<TestResult> {
    println!("--- Vector Properties ---");
    let mut results = Vec::new();
    let registry = &bundle.registry;

    // Coarse aggregate lies within member bounds
    let mut out_of_bounds = Vec::new();
    for class in &bundle.classes.classes {
        let fine = &class.base_craving_vector.fine;
        let Ok(coarse) = aggregate(fine, registry) else {
            out_of_bounds.push(class.id.clone());
            continue;
        };
        for (pos, value) in coarse.iter().enumerate() {
            let members: Vec<f64> = registry.members(pos).map(|i| fine[i]).collect();
            let lo = members.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = members.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if !members.is_empty() && (*value < lo || *value > hi) {
                out_of_bounds.push(format!("{}[{}]", class.id, pos));
            }
        }
    }
    results.push(TestResult::new(
        "aggregate_within_bounds",
        out_of_bounds.is_empty(),
        format!("violations: {:?}", out_of_bounds),
    ));

    // Padding uses the kind's identity
    let nine = [3.0; 9];
    let padded_abs = resize(&nine, VectorKind::Absolute, 12).map(|r| r.values);
    let padded_mul = resize(&nine, VectorKind::Multiplicative, 12).map(|r| r.values);
    let padding_ok = matches!(&padded_abs, Ok(v) if v[9..] == [0.0, 0.0, 0.0])
        && matches!(&padded_mul, Ok(v) if v[9..] == [1.0, 1.0, 1.0]);
    results.push(TestResult::new(
        "resize_identity_padding",
        padding_ok,
        "absolute pads 0, multiplicative pads 1",
    ));

    // Resize is idempotent at a fixed length
    let mut idempotent = true;
    for t in &bundle.traits.traits {
        let fine = &t.craving_multipliers.fine;
        for target in [registry.fine_count() - 5, registry.fine_count() + 5] {
            let once = resize(fine, VectorKind::Multiplicative, target);
            let twice = once
                .as_ref()
                .ok()
                .map(|r| resize(&r.values, VectorKind::Multiplicative, target));
            match (once, twice) {
                (Ok(a), Some(Ok(b))) if a.values == b.values && b.lossy.is_none() => {}
                _ => idempotent = false,
            }
        }
    }
    results.push(TestResult::new(
        "resize_idempotent",
        idempotent,
        "resize(resize(v, n), n) == resize(v, n) for every trait",
    ));

    // Identity modifiers leave the base unchanged
    let mut identity_ok = true;
    for class in &bundle.classes.classes {
        let Ok(base) = class.fine_vector() else {
            identity_ok = false;
            continue;
        };
        let zero = Vector::identity(VectorKind::Additive, base.len());
        let one = Vector::identity(VectorKind::Multiplicative, base.len());
        if compose(&base, &[&zero], &[&one]).ok().as_ref() != Some(&base) {
            identity_ok = false;
        }
    }
    results.push(TestResult::new(
        "compose_identity",
        identity_ok,
        "(base + 0) * 1 == base for every class",
    ));

    // Display summaries agree with the aggregator
    let mut summary_ok = true;
    for class in &bundle.classes.classes {
        let fine = &class.base_craving_vector.fine;
        match (summarize(fine, registry, ValueRange::default()), aggregate(fine, registry)) {
            (Ok(summary), Ok(coarse)) => {
                if verbose {
                    let line: Vec<String> = summary
                        .iter()
                        .map(|s| format!("{}={:.1}", s.id, s.average))
                        .collect();
                    println!("  {:<8} {}", class.id, line.join(" "));
                }
                summary_ok &= summary.iter().zip(&coarse).all(|(s, c)| s.average == *c);
            }
            _ => summary_ok = false,
        }
    }
    results.push(TestResult::new(
        "summary_matches_aggregate",
        summary_ok,
        "display averages come from the aggregator",
    ));

    results
}

// ── 5. Profiles ─────────────────────────────────────────────────────────

fn validate_profiles(bundle: &Bundle, verbose: bool) -> Vec<TestResult> {
    println!("--- Profiles ---");
    let mut results = Vec::new();
    let registry = &bundle.registry;
    let rules = &bundle.rules.rules;

    // With nothing owned and no relationships, no rule fires
    let mut quiet = true;
    for class in &bundle.classes.classes {
        let state = CharacterSnapshot {
            class_id: class.id.clone(),
            ..Default::default()
        };
        match CravingProfile::for_class(class, registry)
            .and_then(|p| p.tick(registry, &[], rules, &state))
        {
            Ok(out) => {
                quiet &= out.fired.is_empty()
                    && out.effective.fine == class.base_craving_vector.fine;
            }
            Err(_) => quiet = false,
        }
    }
    results.push(TestResult::new(
        "profile_idle_equals_base",
        quiet,
        "empty state leaves every class at its base",
    ));

    // Shelter trigger: 0 → off, 1 → on, permanent fold happens once
    let shelter = rules.iter().find(|r| {
        matches!(
            r.trigger.condition(),
            Some(TriggerCondition::OwnsCommodityTag {
                tag,
                min_quantity: 1
            }) if tag == "shelter"
        )
    });
    let fold_detail = match (shelter, bundle.classes.classes.first()) {
        (Some(rule), Some(class)) => check_shelter_fold(rule, class, registry, rules),
        _ => Err("no shelter rule or no class in bundle".to_string()),
    };
    results.push(TestResult::new(
        "profile_shelter_fold",
        fold_detail.is_ok(),
        fold_detail.unwrap_or_else(|e| e),
    ));

    // Trait multipliers apply after modifiers
    let trait_detail = match (bundle.traits.traits.first(), bundle.classes.classes.first()) {
        (Some(t), Some(class)) => check_trait_multiplies(t, class, registry),
        _ => Err("no trait or no class in bundle".to_string()),
    };
    results.push(TestResult::new(
        "profile_trait_multiplies",
        trait_detail.is_ok(),
        trait_detail.unwrap_or_else(|e| e),
    ));

    // Each relationship kind satisfies only its own trigger
    let mut crossed = Vec::new();
    for &held in Relationship::all() {
        let state = CharacterSnapshot {
            relationships: vec![held],
            ..Default::default()
        };
        for &wanted in Relationship::all() {
            let trigger: Trigger = TriggerCondition::HasRelationship {
                relationship: wanted,
            }
            .into();
            let fired = trigger.evaluate("relationship", &state).fired;
            if fired != (held == wanted) {
                crossed.push(format!("{} held, {} wanted", held.name(), wanted.name()));
            }
        }
    }
    results.push(TestResult::new(
        "triggers_relationship_kinds",
        crossed.is_empty(),
        if crossed.is_empty() {
            format!("{} kinds checked", Relationship::all().len())
        } else {
            crossed.join("; ")
        },
    ));

    // Unknown trigger fails closed
    let unknown: Result<Trigger, _> = serde_json::from_str(r#"{"type":"foo"}"#);
    let fails_closed = match unknown {
        Ok(trigger) => {
            let outcome = trigger.evaluate("unknown_rule", &CharacterSnapshot::default());
            !outcome.fired && outcome.report.is_some()
        }
        Err(_) => false,
    };
    results.push(TestResult::new(
        "trigger_unknown_fails_closed",
        fails_closed,
        "unknown 'foo' evaluates false with a report",
    ));

    if verbose {
        println!("  {} rules evaluated per pass", rules.len());
    }

    results
}

fn check_shelter_fold(
    rule: &EnablementRule,
    class: &CharacterClass,
    registry: &DimensionRegistry,
    rules: &[EnablementRule],
) -> Result<String, String> {
    let mut state = CharacterSnapshot {
        class_id: class.id.clone(),
        ..Default::default()
    };
    let err = |e: cravetown_logic::vector::ShapeError| e.to_string();

    let p0 = CravingProfile::for_class(class, registry).map_err(err)?;
    let off = p0.tick(registry, &[], rules, &state).map_err(err)?;
    if off.fired.contains(&rule.id) {
        return Err(format!("'{}' fired with 0 shelter", rule.id));
    }

    state.owned_tags.insert("shelter".into(), 1);
    let on = p0.tick(registry, &[], rules, &state).map_err(err)?;
    if !on.fired.contains(&rule.id) {
        return Err(format!("'{}' did not fire with 1 shelter", rule.id));
    }
    let expected = compose(
        &class.fine_vector().map_err(err)?,
        &[&rule.fine_vector().map_err(err)?],
        &[],
    )
    .map_err(err)?;
    if on.effective.fine != expected.values() {
        return Err("modifier not reflected in effective vector".into());
    }

    if rule.effect.permanent {
        let again = on.profile.tick(registry, &[], rules, &state).map_err(err)?;
        if !again.newly_folded.is_empty() || again.effective.fine != on.effective.fine {
            return Err("permanent modifier folded twice".into());
        }
        state.owned_tags.clear();
        let gone = again.profile.tick(registry, &[], rules, &state).map_err(err)?;
        if gone.effective.fine != on.effective.fine {
            return Err("permanent modifier lost when trigger cleared".into());
        }
    }

    Ok(format!("'{}' off at 0, on at 1", rule.id))
}

fn check_trait_multiplies(
    t: &CharacterTrait,
    class: &CharacterClass,
    registry: &DimensionRegistry,
) -> Result<String, String> {
    let err = |e: cravetown_logic::vector::ShapeError| e.to_string();
    let state = CharacterSnapshot {
        class_id: class.id.clone(),
        ..Default::default()
    };
    let p0 = CravingProfile::for_class(class, registry).map_err(err)?;
    let out = p0.tick(registry, &[t], &[], &state).map_err(err)?;
    let expected = compose(
        &class.fine_vector().map_err(err)?,
        &[],
        &[&t.fine_vector().map_err(err)?],
    )
    .map_err(err)?;
    if out.effective.fine != expected.values() {
        return Err(format!("'{}' × '{}' mismatch", t.id, class.id));
    }
    let coarse = aggregate(&out.effective.fine, registry).map_err(err)?;
    if out.effective.coarse != coarse {
        return Err("effective coarse is not the aggregate of fine".into());
    }
    Ok(format!("'{}' applied to '{}'", t.id, class.id))
}

// ── 6. Data Directory ───────────────────────────────────────────────────

fn validate_data_dir(dir: &str, verbose: bool) -> Vec<TestResult> {
    println!("--- Data Directory ---");
    let mut results = Vec::new();

    let config = match StoreConfig::from_env() {
        Ok(c) => c.with_data_dir(dir),
        Err(e) => {
            results.push(TestResult::new("store_config", false, e.to_string()));
            return results;
        }
    };
    let session = CravingStore::open(config).and_then(EditingSession::open);
    let session = match session {
        Ok(s) => s,
        Err(e) => {
            results.push(TestResult::new("store_open", false, e.to_string()));
            return results;
        }
    };
    results.push(TestResult::new(
        "store_open",
        true,
        format!(
            "{}: {} classes, {} traits, {} rules, {} commodities",
            session.store().config().craving_dir().display(),
            session.classes().classes.len(),
            session.traits().traits.len(),
            session.rules().rules.len(),
            session.fulfillment().commodities.len()
        ),
    ));

    if verbose {
        for w in session.warnings() {
            println!("  resize: {}", w);
        }
    }
    results.push(TestResult::new(
        "store_resize_lossless",
        session.warnings().is_empty(),
        format!("{} lossy resize(s)", session.warnings().len()),
    ));

    let unknown = session.unknown_dimensions();
    if verbose {
        for u in &unknown {
            println!("  unknown: {}", u);
        }
    }
    results.push(TestResult::new(
        "store_dimensions_known",
        unknown.is_empty(),
        format!("{} commodity(ies) with unknown fine ids", unknown.len()),
    ));

    let unsaved: Vec<String> = session.unsaved().map(|d| d.to_string()).collect();
    results.push(TestResult::new(
        "store_documents_current",
        unsaved.is_empty(),
        format!("documents needing resize: {:?}", unsaved),
    ));

    let issues = session.validate();
    results.push(TestResult::new(
        "store_fields_valid",
        issues.is_empty(),
        format!("{} validation issue(s)", issues.len()),
    ));

    results
}
