//! Two-resolution craving vectors as stored on classes, traits and rules.
//!
//! `fine` is the source of truth. `coarse` is a cache of
//! [`aggregate`](crate::aggregate::aggregate)`(fine)`, rebuilt on every fine
//! write, unless `coarse_override` is set, in which case the authored
//! coarse values are kept as-is.

use serde::{Deserialize, Serialize};

use crate::aggregate::aggregate;
use crate::dimensions::DimensionRegistry;
use crate::documents::Identified;
use crate::resize::{resize_with, LossyResize, TruncationPolicy};
use crate::vector::{check_finite, ShapeError, Vector, VectorKind};

fn is_false(b: &bool) -> bool {
    !*b
}

/// Fine values plus their cached coarse aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CravingVector {
    #[serde(default)]
    pub coarse: Vec<f64>,
    #[serde(default)]
    pub fine: Vec<f64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub coarse_override: bool,
}

/// Which half of a [`CravingVector`] a warning refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorPart {
    Fine,
    Coarse,
}

/// A lossy resize attributed to an item and vector part.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeWarning {
    pub item_id: String,
    pub part: VectorPart,
    pub lossy: LossyResize,
}

impl std::fmt::Display for ResizeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let part = match self.part {
            VectorPart::Fine => "fine",
            VectorPart::Coarse => "coarse",
        };
        write!(f, "'{}' {part}: {}", self.item_id, self.lossy)
    }
}

impl CravingVector {
    /// All-identity vector sized to `registry`.
    pub fn identity(kind: VectorKind, registry: &DimensionRegistry) -> Self {
        Self {
            coarse: vec![kind.identity(); registry.coarse_count()],
            fine: vec![kind.identity(); registry.fine_count()],
            coarse_override: false,
        }
    }

    /// The fine half as a kind-tagged [`Vector`].
    pub fn fine_vector(&self, kind: VectorKind) -> Result<Vector, ShapeError> {
        Vector::new(kind, self.fine.clone())
    }

    /// Rebuild `coarse` from `fine` unless overridden.
    pub fn refresh_coarse(&mut self, registry: &DimensionRegistry) -> Result<(), ShapeError> {
        if !self.coarse_override {
            self.coarse = aggregate(&self.fine, registry)?;
        }
        Ok(())
    }

    /// Replace the fine values (already sized) and refresh the cache.
    pub fn set_fine(
        &mut self,
        fine: Vec<f64>,
        registry: &DimensionRegistry,
    ) -> Result<(), ShapeError> {
        if fine.len() != registry.fine_count() {
            return Err(ShapeError::LengthMismatch {
                expected: registry.fine_count(),
                actual: fine.len(),
            });
        }
        check_finite(&fine)?;
        self.fine = fine;
        self.refresh_coarse(registry)
    }

    /// Set a single fine entry and refresh the cache.
    pub fn set_fine_value(
        &mut self,
        index: usize,
        value: f64,
        registry: &DimensionRegistry,
    ) -> Result<(), ShapeError> {
        let mut fine = self.fine.clone();
        match fine.get_mut(index) {
            Some(slot) => *slot = value,
            None => {
                return Err(ShapeError::LengthMismatch {
                    expected: registry.fine_count(),
                    actual: self.fine.len(),
                })
            }
        }
        self.set_fine(fine, registry)
    }

    /// Author coarse values directly, decoupling them from `fine`.
    pub fn override_coarse(
        &mut self,
        coarse: Vec<f64>,
        registry: &DimensionRegistry,
    ) -> Result<(), ShapeError> {
        if coarse.len() != registry.coarse_count() {
            return Err(ShapeError::LengthMismatch {
                expected: registry.coarse_count(),
                actual: coarse.len(),
            });
        }
        check_finite(&coarse)?;
        self.coarse = coarse;
        self.coarse_override = true;
        Ok(())
    }

    /// Drop a coarse override and go back to the derived aggregate.
    pub fn clear_override(&mut self, registry: &DimensionRegistry) -> Result<(), ShapeError> {
        self.coarse_override = false;
        self.refresh_coarse(registry)
    }

    /// Set every fine entry to `value`.
    pub fn fill(&mut self, value: f64, registry: &DimensionRegistry) -> Result<(), ShapeError> {
        self.set_fine(vec![value; registry.fine_count()], registry)
    }

    /// Reset every fine entry to the kind's identity.
    pub fn reset(&mut self, kind: VectorKind, registry: &DimensionRegistry) -> Result<(), ShapeError> {
        self.fill(kind.identity(), registry)
    }

    /// Resize both halves to the registry and re-derive `coarse`.
    pub fn normalized(
        &self,
        kind: VectorKind,
        registry: &DimensionRegistry,
        policy: TruncationPolicy,
        item_id: &str,
    ) -> Result<(CravingVector, Vec<ResizeWarning>), ShapeError> {
        let mut warnings = Vec::new();

        let fine = resize_with(&self.fine, kind, registry.fine_count(), policy)?;
        if let Some(lossy) = fine.lossy {
            warnings.push(ResizeWarning {
                item_id: item_id.to_string(),
                part: VectorPart::Fine,
                lossy,
            });
        }

        let mut out = CravingVector {
            coarse: Vec::new(),
            fine: fine.values,
            coarse_override: self.coarse_override,
        };

        if self.coarse_override {
            let coarse = resize_with(&self.coarse, kind, registry.coarse_count(), policy)?;
            if let Some(lossy) = coarse.lossy {
                warnings.push(ResizeWarning {
                    item_id: item_id.to_string(),
                    part: VectorPart::Coarse,
                    lossy,
                });
            }
            out.coarse = coarse.values;
        } else {
            out.refresh_coarse(registry)?;
        }

        Ok((out, warnings))
    }

    /// Whether `coarse` matches a fresh aggregate of `fine`.
    pub fn coarse_is_current(&self, registry: &DimensionRegistry) -> bool {
        if self.coarse_override {
            return true;
        }
        match aggregate(&self.fine, registry) {
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

/// An entity that owns one craving vector of a fixed kind.
pub trait CravingCarrier: Identified + Clone {
    const KIND: VectorKind;

    fn cravings(&self) -> &CravingVector;
    fn cravings_mut(&mut self) -> &mut CravingVector;

    /// The fine half tagged with this carrier's kind.
    fn fine_vector(&self) -> Result<Vector, ShapeError> {
        self.cravings().fine_vector(Self::KIND)
    }
}

/// Resize an item's vector to the registry, re-deriving coarse.
pub fn normalize_item<T: CravingCarrier>(
    item: &T,
    registry: &DimensionRegistry,
    policy: TruncationPolicy,
) -> Result<(T, Vec<ResizeWarning>), ShapeError> {
    let (cravings, warnings) = item
        .cravings()
        .normalized(T::KIND, registry, policy, item.id())?;
    let mut out = item.clone();
    *out.cravings_mut() = cravings;
    Ok((out, warnings))
}
