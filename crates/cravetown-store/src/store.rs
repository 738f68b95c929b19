//! JSON document store for the craving system.
//!
//! Reads accept whatever the file holds; writes refuse containers with
//! duplicate ids and dimension definitions that would not build a registry.
//! Documents are written pretty-printed with two-space indentation.

use std::fs;
use std::path::{Path, PathBuf};

use cravetown_logic::dimensions::{DimensionDefinitions, DimensionRegistry};
use cravetown_logic::documents::{
    CharacterClassesData, CharacterTraitsData, Collection, EnablementRulesData,
};
use cravetown_logic::fulfillment::FulfillmentVectorsData;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{validate_config, DocumentKind, StoreConfig};
use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct CravingStore {
    config: StoreConfig,
}

impl CravingStore {
    /// Open a store after validating `config`.
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        let errors = validate_config(&config);
        if !errors.is_empty() {
            return Err(StoreError::InvalidConfig(errors));
        }
        debug!("craving store rooted at {}", config.craving_dir().display());
        Ok(Self { config })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn path(&self, kind: DocumentKind) -> PathBuf {
        self.config.document_path(kind)
    }

    pub fn exists(&self, kind: DocumentKind) -> bool {
        self.path(kind).is_file()
    }

    // ── Dimension definitions ──────────────────────────────────────────

    pub fn load_dimension_definitions(&self) -> Result<DimensionDefinitions, StoreError> {
        self.read(DocumentKind::DimensionDefinitions)
    }

    /// Load the definitions and build the registry snapshot.
    pub fn load_registry(&self) -> Result<DimensionRegistry, StoreError> {
        let defs = self.load_dimension_definitions()?;
        let registry = DimensionRegistry::from_definitions(&defs)?;
        info!(
            "dimension registry {}: {} coarse / {} fine",
            registry.version(),
            registry.coarse_count(),
            registry.fine_count()
        );
        Ok(registry)
    }

    /// Save definitions, refusing any that would not build a registry.
    pub fn save_dimension_definitions(
        &self,
        defs: &DimensionDefinitions,
    ) -> Result<(), StoreError> {
        if let Err(e) = DimensionRegistry::from_definitions(defs) {
            warn!("refusing to save dimension definitions: {e}");
            return Err(e.into());
        }
        self.write(DocumentKind::DimensionDefinitions, defs)
    }

    // ── Collections ────────────────────────────────────────────────────

    pub fn load_character_classes(&self) -> Result<CharacterClassesData, StoreError> {
        self.load_collection(DocumentKind::CharacterClasses)
    }

    pub fn save_character_classes(&self, data: &CharacterClassesData) -> Result<(), StoreError> {
        self.save_collection(DocumentKind::CharacterClasses, data)
    }

    pub fn load_character_traits(&self) -> Result<CharacterTraitsData, StoreError> {
        self.load_collection(DocumentKind::CharacterTraits)
    }

    pub fn save_character_traits(&self, data: &CharacterTraitsData) -> Result<(), StoreError> {
        self.save_collection(DocumentKind::CharacterTraits, data)
    }

    pub fn load_enablement_rules(&self) -> Result<EnablementRulesData, StoreError> {
        self.load_collection(DocumentKind::EnablementRules)
    }

    pub fn save_enablement_rules(&self, data: &EnablementRulesData) -> Result<(), StoreError> {
        self.save_collection(DocumentKind::EnablementRules, data)
    }

    pub fn load_fulfillment_vectors(&self) -> Result<FulfillmentVectorsData, StoreError> {
        self.load_collection(DocumentKind::FulfillmentVectors)
    }

    pub fn save_fulfillment_vectors(&self, data: &FulfillmentVectorsData) -> Result<(), StoreError> {
        self.save_collection(DocumentKind::FulfillmentVectors, data)
    }

    fn load_collection<C>(&self, kind: DocumentKind) -> Result<C, StoreError>
    where
        C: Collection + DeserializeOwned,
    {
        let data: C = self.read(kind)?;
        info!(
            "loaded {} {} (version {}) from {kind}",
            data.items().len(),
            C::ITEMS_KEY,
            data.version()
        );
        Ok(data)
    }

    fn save_collection<C>(&self, kind: DocumentKind, data: &C) -> Result<(), StoreError>
    where
        C: Collection + Serialize,
    {
        if let Err(duplicates) = data.check_unique_ids() {
            warn!("refusing to save {kind}: {} duplicate id(s)", duplicates.len());
            return Err(StoreError::DuplicateIds {
                document: kind,
                duplicates,
            });
        }
        self.write(kind, data)?;
        info!("saved {} {} to {kind}", data.items().len(), C::ITEMS_KEY);
        Ok(())
    }

    // ── Raw I/O ────────────────────────────────────────────────────────

    fn read<T: DeserializeOwned>(&self, kind: DocumentKind) -> Result<T, StoreError> {
        let path = self.path(kind);
        let text = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| StoreError::Json { path, source })
    }

    fn write<T: Serialize>(&self, kind: DocumentKind, value: &T) -> Result<(), StoreError> {
        let path = self.path(kind);
        let text = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        if let Some(dir) = path.parent() {
            create_dir(dir)?;
        }
        fs::write(&path, text).map_err(|source| StoreError::Io { path, source })
    }
}

fn create_dir(dir: &Path) -> Result<(), StoreError> {
    fs::create_dir_all(dir).map_err(|source| StoreError::Io {
        path: dir.to_path_buf(),
        source,
    })
}
