//! Pure craving-vector logic for Cravetown.
//!
//! This crate holds the dimensional vector model behind the craving
//! balancing data: how fine dimensions roll up into coarse categories, how
//! stored vectors are resized when dimension definitions change, how rule
//! modifiers and trait multipliers compose onto a class base, and how rule
//! triggers are evaluated. Functions take plain data and a registry
//! snapshot and return results; there is no I/O and no global state.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`dimensions`] | Dimension definitions document and validated registry snapshot |
//! | [`vector`] | Kind-tagged vectors (absolute / additive / multiplicative), shape errors |
//! | [`resize`] | Identity padding and reported truncation against the registry |
//! | [`aggregate`] | Fine → coarse unweighted per-category mean |
//! | [`compose`] | `(base + Σ additive) * Π multiplicative` |
//! | [`triggers`] | Trigger conditions, character state, fail-closed evaluation |
//! | [`craving`] | Fine/coarse pairs with coarse cache and normalization |
//! | [`classes`] | Character classes and their validation |
//! | [`character_traits`] | Character traits (multipliers) and rarity |
//! | [`rules`] | Enablement rules, per-pass rule evaluation |
//! | [`fulfillment`] | Commodity fulfillment vectors stored sparsely by dimension id |
//! | [`documents`] | Versioned containers, id uniqueness, upsert/remove |
//! | [`profile`] | Per-character pass-by-pass evaluation with permanent folds |
//! | [`validation`] | Field-level validation issues |
//! | [`view`] | Display summaries grouped by coarse category |
//!
//! ```
//! use cravetown_logic::compose::compose;
//! use cravetown_logic::vector::{Vector, VectorKind};
//!
//! let base = Vector::new(VectorKind::Absolute, vec![1.0, 2.0]).unwrap();
//! let bonus = Vector::new(VectorKind::Additive, vec![0.5, 0.0]).unwrap();
//! let trait_mul = Vector::new(VectorKind::Multiplicative, vec![2.0, 1.0]).unwrap();
//! let effective = compose(&base, &[&bonus], &[&trait_mul]).unwrap();
//! assert_eq!(effective.values(), &[3.0, 2.0]);
//! ```

pub mod aggregate;
pub mod character_traits;
pub mod classes;
pub mod compose;
pub mod craving;
pub mod dimensions;
pub mod documents;
pub mod fulfillment;
pub mod profile;
pub mod resize;
pub mod rules;
pub mod triggers;
pub mod validation;
pub mod vector;
pub mod view;
