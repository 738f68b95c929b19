//! An editing session over one data version.
//!
//! The session loads the dimension registry once and every collection,
//! resizes every stored vector to the registry, and then serves as the
//! single mutable owner of the documents until they are saved. Every edit
//! goes through the registry held here, so coarse caches stay consistent
//! with fine values at all times.

use std::collections::BTreeSet;

use cravetown_logic::character_traits::{validate_trait, CharacterTrait};
use cravetown_logic::classes::{validate_class, CharacterClass};
use cravetown_logic::craving::{normalize_item, CravingCarrier, CravingVector, ResizeWarning};
use cravetown_logic::dimensions::{DimensionDefinitions, DimensionRegistry};
use cravetown_logic::documents::{
    CharacterClassesData, CharacterTraitsData, Collection, EnablementRulesData, Identified,
};
use cravetown_logic::fulfillment::{
    normalize_commodity, validate_commodity, CommodityFulfillment, FulfillmentVectorsData,
    UnknownDimensions,
};
use cravetown_logic::profile::CravingProfile;
use cravetown_logic::resize::TruncationPolicy;
use cravetown_logic::rules::{validate_rule, EnablementRule};
use cravetown_logic::validation::ValidationIssue;
use cravetown_logic::vector::{ShapeError, VectorKind};
use log::{info, warn};
use serde::de::DeserializeOwned;

use crate::config::DocumentKind;
use crate::error::StoreError;
use crate::store::CravingStore;

/// Addresses the craving vector of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRef<'a> {
    Class(&'a str),
    Trait(&'a str),
    Rule(&'a str),
}

impl ItemRef<'_> {
    pub fn id(&self) -> &str {
        match self {
            ItemRef::Class(id) | ItemRef::Trait(id) | ItemRef::Rule(id) => *id,
        }
    }

    pub fn document(&self) -> DocumentKind {
        match self {
            ItemRef::Class(_) => DocumentKind::CharacterClasses,
            ItemRef::Trait(_) => DocumentKind::CharacterTraits,
            ItemRef::Rule(_) => DocumentKind::EnablementRules,
        }
    }
}

pub struct EditingSession {
    store: CravingStore,
    registry: DimensionRegistry,
    classes: CharacterClassesData,
    traits: CharacterTraitsData,
    rules: EnablementRulesData,
    fulfillment: FulfillmentVectorsData,
    warnings: Vec<ResizeWarning>,
    dirty: BTreeSet<DocumentKind>,
}

impl EditingSession {
    /// Load the registry and every collection, normalizing all items.
    ///
    /// A missing collection file starts as an empty container. Items whose
    /// vectors had to be resized mark their document as unsaved.
    pub fn open(store: CravingStore) -> Result<Self, StoreError> {
        let registry = store.load_registry()?;
        let policy = store.config().truncation;

        let mut session = Self {
            classes: load_or_default(&store, DocumentKind::CharacterClasses, |s| {
                s.load_character_classes()
            })?,
            traits: load_or_default(&store, DocumentKind::CharacterTraits, |s| {
                s.load_character_traits()
            })?,
            rules: load_or_default(&store, DocumentKind::EnablementRules, |s| {
                s.load_enablement_rules()
            })?,
            fulfillment: load_or_default(&store, DocumentKind::FulfillmentVectors, |s| {
                s.load_fulfillment_vectors()
            })?,
            store,
            registry,
            warnings: Vec::new(),
            dirty: BTreeSet::new(),
        };
        session.normalize_all(policy)?;
        Ok(session)
    }

    pub fn store(&self) -> &CravingStore {
        &self.store
    }

    pub fn registry(&self) -> &DimensionRegistry {
        &self.registry
    }

    pub fn classes(&self) -> &CharacterClassesData {
        &self.classes
    }

    pub fn traits(&self) -> &CharacterTraitsData {
        &self.traits
    }

    pub fn rules(&self) -> &EnablementRulesData {
        &self.rules
    }

    pub fn fulfillment(&self) -> &FulfillmentVectorsData {
        &self.fulfillment
    }

    /// Commodities whose sparse fine ids the current registry does not define.
    pub fn unknown_dimensions(&self) -> Vec<UnknownDimensions> {
        self.fulfillment
            .items()
            .iter()
            .filter_map(|c| {
                let ids = c.fulfillment_vector.unknown_dimensions(&self.registry);
                (!ids.is_empty()).then(|| UnknownDimensions {
                    item_id: c.id.clone(),
                    ids,
                })
            })
            .collect()
    }

    /// Lossy resizes seen since the session opened, oldest first.
    pub fn warnings(&self) -> &[ResizeWarning] {
        &self.warnings
    }

    /// Hand over the collected warnings, leaving none behind.
    pub fn take_warnings(&mut self) -> Vec<ResizeWarning> {
        std::mem::take(&mut self.warnings)
    }

    /// Documents with edits not yet written.
    pub fn unsaved(&self) -> impl Iterator<Item = DocumentKind> + '_ {
        self.dirty.iter().copied()
    }

    pub fn is_unsaved(&self, document: DocumentKind) -> bool {
        self.dirty.contains(&document)
    }

    fn policy(&self) -> TruncationPolicy {
        self.store.config().truncation
    }

    fn normalize_all(&mut self, policy: TruncationPolicy) -> Result<(), StoreError> {
        let registry = &self.registry;
        let mut changed = Vec::new();

        if normalize_collection(&mut self.classes, registry, policy, &mut self.warnings)? {
            changed.push(DocumentKind::CharacterClasses);
        }
        if normalize_collection(&mut self.traits, registry, policy, &mut self.warnings)? {
            changed.push(DocumentKind::CharacterTraits);
        }
        if normalize_collection(&mut self.rules, registry, policy, &mut self.warnings)? {
            changed.push(DocumentKind::EnablementRules);
        }
        if normalize_fulfillment(&mut self.fulfillment, registry)? {
            changed.push(DocumentKind::FulfillmentVectors);
        }

        for document in changed {
            info!("{document} resized to {} fine dimensions", registry.fine_count());
            self.dirty.insert(document);
        }
        Ok(())
    }

    // ── Item editing ───────────────────────────────────────────────────

    pub fn class_template(&self, id: &str) -> CharacterClass {
        CharacterClass::template(id, &self.registry)
    }

    pub fn trait_template(&self, id: &str) -> CharacterTrait {
        CharacterTrait::template(id, &self.registry)
    }

    pub fn rule_template(&self, id: &str) -> EnablementRule {
        EnablementRule::template(id, &self.registry)
    }

    pub fn commodity_template(&self, id: &str) -> CommodityFulfillment {
        CommodityFulfillment::template(id, &self.registry)
    }

    /// Insert or replace a class by id. Returns `true` when replaced.
    pub fn upsert_class(&mut self, class: CharacterClass) -> Result<bool, StoreError> {
        let policy = self.policy();
        let replaced = upsert_item(
            &mut self.classes,
            class,
            &self.registry,
            policy,
            &mut self.warnings,
        )?;
        self.dirty.insert(DocumentKind::CharacterClasses);
        Ok(replaced)
    }

    pub fn upsert_trait(&mut self, t: CharacterTrait) -> Result<bool, StoreError> {
        let policy = self.policy();
        let replaced = upsert_item(
            &mut self.traits,
            t,
            &self.registry,
            policy,
            &mut self.warnings,
        )?;
        self.dirty.insert(DocumentKind::CharacterTraits);
        Ok(replaced)
    }

    pub fn upsert_rule(&mut self, rule: EnablementRule) -> Result<bool, StoreError> {
        let policy = self.policy();
        let replaced = upsert_item(
            &mut self.rules,
            rule,
            &self.registry,
            policy,
            &mut self.warnings,
        )?;
        self.dirty.insert(DocumentKind::EnablementRules);
        Ok(replaced)
    }

    /// Insert or replace a commodity by id, re-deriving its coarse values.
    ///
    /// Fine ids the registry does not define are kept and logged.
    pub fn upsert_commodity(
        &mut self,
        commodity: CommodityFulfillment,
    ) -> Result<bool, StoreError> {
        let (commodity, unknown) = normalize_commodity(&commodity, &self.registry)?;
        if let Some(unknown) = unknown {
            warn!("{unknown}");
        }
        let replaced = self.fulfillment.upsert(commodity);
        self.dirty.insert(DocumentKind::FulfillmentVectors);
        Ok(replaced)
    }

    pub fn remove_class(&mut self, id: &str) -> Option<CharacterClass> {
        let removed = self.classes.remove(id);
        if removed.is_some() {
            self.dirty.insert(DocumentKind::CharacterClasses);
        }
        removed
    }

    pub fn remove_trait(&mut self, id: &str) -> Option<CharacterTrait> {
        let removed = self.traits.remove(id);
        if removed.is_some() {
            self.dirty.insert(DocumentKind::CharacterTraits);
        }
        removed
    }

    pub fn remove_rule(&mut self, id: &str) -> Option<EnablementRule> {
        let removed = self.rules.remove(id);
        if removed.is_some() {
            self.dirty.insert(DocumentKind::EnablementRules);
        }
        removed
    }

    pub fn remove_commodity(&mut self, id: &str) -> Option<CommodityFulfillment> {
        let removed = self.fulfillment.remove(id);
        if removed.is_some() {
            self.dirty.insert(DocumentKind::FulfillmentVectors);
        }
        removed
    }

    // ── Vector editing ─────────────────────────────────────────────────

    pub fn cravings(&self, item: ItemRef<'_>) -> Option<&CravingVector> {
        let id = item.id();
        match item {
            ItemRef::Class(_) => self.classes.get(id).map(|c| c.cravings()),
            ItemRef::Trait(_) => self.traits.get(id).map(|t| t.cravings()),
            ItemRef::Rule(_) => self.rules.get(id).map(|r| r.cravings()),
        }
    }

    /// Set one fine value by dimension id.
    pub fn set_value(
        &mut self,
        item: ItemRef<'_>,
        dimension: &str,
        value: f64,
    ) -> Result<(), StoreError> {
        let index = self
            .registry
            .fine_index(dimension)
            .ok_or_else(|| StoreError::UnknownItem {
                document: DocumentKind::DimensionDefinitions,
                id: dimension.to_string(),
            })?;
        self.edit_vector(item, |v, _, reg| v.set_fine_value(index, value, reg))
    }

    /// Set how much of one fine dimension a commodity fulfills.
    ///
    /// A value of 0 drops the dimension from the sparse map.
    pub fn set_fulfillment_value(
        &mut self,
        commodity_id: &str,
        dimension: &str,
        value: f64,
    ) -> Result<(), StoreError> {
        let index = self
            .registry
            .fine_index(dimension)
            .ok_or_else(|| StoreError::UnknownItem {
                document: DocumentKind::DimensionDefinitions,
                id: dimension.to_string(),
            })?;
        let commodity = self
            .fulfillment
            .items_mut()
            .iter_mut()
            .find(|c| c.id == commodity_id)
            .ok_or_else(|| StoreError::UnknownItem {
                document: DocumentKind::FulfillmentVectors,
                id: commodity_id.to_string(),
            })?;
        commodity
            .fulfillment_vector
            .set_value(index, value, &self.registry)?;
        self.dirty.insert(DocumentKind::FulfillmentVectors);
        Ok(())
    }

    pub fn fill(&mut self, item: ItemRef<'_>, value: f64) -> Result<(), StoreError> {
        self.edit_vector(item, |v, _, reg| v.fill(value, reg))
    }

    /// Reset to the identity of the item's vector kind.
    pub fn reset(&mut self, item: ItemRef<'_>) -> Result<(), StoreError> {
        self.edit_vector(item, |v, kind, reg| v.reset(kind, reg))
    }

    pub fn override_coarse(
        &mut self,
        item: ItemRef<'_>,
        coarse: Vec<f64>,
    ) -> Result<(), StoreError> {
        self.edit_vector(item, |v, _, reg| v.override_coarse(coarse, reg))
    }

    pub fn clear_override(&mut self, item: ItemRef<'_>) -> Result<(), StoreError> {
        self.edit_vector(item, |v, _, reg| v.clear_override(reg))
    }

    fn edit_vector<F>(&mut self, item: ItemRef<'_>, edit: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut CravingVector, VectorKind, &DimensionRegistry) -> Result<(), ShapeError>,
    {
        let id = item.id();
        let (vector, kind) = match item {
            ItemRef::Class(_) => (
                find_cravings_mut(&mut self.classes, id),
                CharacterClass::KIND,
            ),
            ItemRef::Trait(_) => (
                find_cravings_mut(&mut self.traits, id),
                CharacterTrait::KIND,
            ),
            ItemRef::Rule(_) => (
                find_cravings_mut(&mut self.rules, id),
                EnablementRule::KIND,
            ),
        };
        let vector = vector.ok_or_else(|| StoreError::UnknownItem {
            document: item.document(),
            id: id.to_string(),
        })?;
        edit(vector, kind, &self.registry)?;
        self.dirty.insert(item.document());
        Ok(())
    }

    // ── Dimensions ─────────────────────────────────────────────────────

    /// Save new dimension definitions and resize every item to them.
    ///
    /// The new registry and every resized collection are built before
    /// anything is written; on error the session is unchanged.
    pub fn apply_dimension_definitions(
        &mut self,
        defs: &DimensionDefinitions,
    ) -> Result<(), StoreError> {
        let registry = DimensionRegistry::from_definitions(defs)?;
        let policy = self.policy();

        let mut classes = self.classes.clone();
        let mut traits = self.traits.clone();
        let mut rules = self.rules.clone();
        let mut fulfillment = self.fulfillment.clone();
        let mut warnings = Vec::new();
        normalize_collection(&mut classes, &registry, policy, &mut warnings)?;
        normalize_collection(&mut traits, &registry, policy, &mut warnings)?;
        normalize_collection(&mut rules, &registry, policy, &mut warnings)?;
        normalize_fulfillment(&mut fulfillment, &registry)?;

        self.store.save_dimension_definitions(defs)?;

        info!(
            "dimensions now {} coarse / {} fine (was {} / {})",
            registry.coarse_count(),
            registry.fine_count(),
            self.registry.coarse_count(),
            self.registry.fine_count()
        );
        self.registry = registry;
        self.classes = classes;
        self.traits = traits;
        self.rules = rules;
        self.fulfillment = fulfillment;
        self.warnings.extend(warnings);
        self.dirty.extend([
            DocumentKind::CharacterClasses,
            DocumentKind::CharacterTraits,
            DocumentKind::EnablementRules,
            DocumentKind::FulfillmentVectors,
        ]);
        Ok(())
    }

    // ── Validation and evaluation ──────────────────────────────────────

    /// Field-level issues across every collection.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        issues.extend(self.classes.items().iter().flat_map(validate_class));
        issues.extend(self.traits.items().iter().flat_map(validate_trait));
        issues.extend(self.rules.items().iter().flat_map(validate_rule));
        issues.extend(
            self.fulfillment
                .items()
                .iter()
                .flat_map(|c| validate_commodity(c, &self.registry)),
        );
        issues
    }

    /// A fresh craving profile for `class_id`.
    pub fn profile_for(&self, class_id: &str) -> Result<CravingProfile, StoreError> {
        let class = self
            .classes
            .get(class_id)
            .ok_or_else(|| StoreError::UnknownItem {
                document: DocumentKind::CharacterClasses,
                id: class_id.to_string(),
            })?;
        Ok(CravingProfile::for_class(class, &self.registry)?)
    }

    /// Look traits up by id, in the order given.
    pub fn traits_by_id(&self, ids: &[&str]) -> Result<Vec<&CharacterTrait>, StoreError> {
        ids.iter()
            .map(|id| {
                self.traits.get(id).ok_or_else(|| StoreError::UnknownItem {
                    document: DocumentKind::CharacterTraits,
                    id: id.to_string(),
                })
            })
            .collect()
    }

    // ── Saving ─────────────────────────────────────────────────────────

    /// Write every unsaved collection.
    ///
    /// All documents are checked for duplicate ids first; if any fails,
    /// nothing is written and the documents stay unsaved.
    pub fn save(&mut self) -> Result<Vec<DocumentKind>, StoreError> {
        for document in &self.dirty {
            let check = match document {
                DocumentKind::CharacterClasses => self.classes.check_unique_ids(),
                DocumentKind::CharacterTraits => self.traits.check_unique_ids(),
                DocumentKind::EnablementRules => self.rules.check_unique_ids(),
                DocumentKind::FulfillmentVectors => self.fulfillment.check_unique_ids(),
                DocumentKind::DimensionDefinitions => Ok(()),
            };
            if let Err(duplicates) = check {
                warn!("save aborted: {document} has {} duplicate id(s)", duplicates.len());
                return Err(StoreError::DuplicateIds {
                    document: *document,
                    duplicates,
                });
            }
        }

        let mut saved = Vec::new();
        while let Some(document) = self.dirty.pop_first() {
            let result = match document {
                DocumentKind::CharacterClasses => self.store.save_character_classes(&self.classes),
                DocumentKind::CharacterTraits => self.store.save_character_traits(&self.traits),
                DocumentKind::EnablementRules => self.store.save_enablement_rules(&self.rules),
                DocumentKind::FulfillmentVectors => {
                    self.store.save_fulfillment_vectors(&self.fulfillment)
                }
                DocumentKind::DimensionDefinitions => Ok(()),
            };
            if let Err(e) = result {
                self.dirty.insert(document);
                return Err(e);
            }
            saved.push(document);
        }
        Ok(saved)
    }
}

fn load_or_default<C, F>(store: &CravingStore, kind: DocumentKind, load: F) -> Result<C, StoreError>
where
    C: Collection + DeserializeOwned + Default,
    F: FnOnce(&CravingStore) -> Result<C, StoreError>,
{
    if store.exists(kind) {
        load(store)
    } else {
        warn!("{kind} not found, starting empty");
        Ok(C::default())
    }
}

/// Resize every item in place. Returns whether any item changed.
fn normalize_collection<C>(
    data: &mut C,
    registry: &DimensionRegistry,
    policy: TruncationPolicy,
    warnings: &mut Vec<ResizeWarning>,
) -> Result<bool, ShapeError>
where
    C: Collection,
    C::Item: CravingCarrier,
{
    let mut changed = false;
    for item in data.items_mut().iter_mut() {
        let (normalized, mut w) = normalize_item(item, registry, policy)?;
        warnings.append(&mut w);
        let before = item.cravings();
        let after = normalized.cravings();
        changed |= before.fine.len() != after.fine.len()
            || before.coarse.len() != after.coarse.len()
            || !before.coarse_is_current(registry);
        *item = normalized;
    }
    Ok(changed)
}

/// Re-derive every commodity's coarse values. Returns whether any changed.
fn normalize_fulfillment(
    data: &mut FulfillmentVectorsData,
    registry: &DimensionRegistry,
) -> Result<bool, ShapeError> {
    let mut changed = false;
    for commodity in data.commodities.iter_mut() {
        let (normalized, unknown) = normalize_commodity(commodity, registry)?;
        if let Some(unknown) = unknown {
            warn!("{unknown}");
        }
        changed |= !commodity.fulfillment_vector.coarse_is_current(registry);
        *commodity = normalized;
    }
    Ok(changed)
}

fn upsert_item<C>(
    data: &mut C,
    item: C::Item,
    registry: &DimensionRegistry,
    policy: TruncationPolicy,
    warnings: &mut Vec<ResizeWarning>,
) -> Result<bool, ShapeError>
where
    C: Collection,
    C::Item: CravingCarrier,
{
    let (item, mut w) = normalize_item(&item, registry, policy)?;
    warnings.append(&mut w);
    Ok(data.upsert(item))
}

fn find_cravings_mut<'a, C>(data: &'a mut C, id: &str) -> Option<&'a mut CravingVector>
where
    C: Collection,
    C::Item: CravingCarrier,
{
    data.items_mut()
        .iter_mut()
        .find(|i| i.id() == id)
        .map(|i| i.cravings_mut())
}
