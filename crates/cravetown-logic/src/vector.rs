//! Kind-tagged craving vectors.
//!
//! Every vector carries its [`VectorKind`], which fixes the identity
//! element used for padding and for "no effect" entries. Absolute and
//! additive vectors pad with `0.0`; multiplicative vectors pad with `1.0`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Semantic kind of a vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorKind {
    /// A base craving level (character class vectors).
    Absolute,
    /// Added onto a base (enablement rule modifiers).
    Additive,
    /// Multiplied into a composed result (trait multipliers).
    Multiplicative,
}

impl VectorKind {
    /// The no-op element for this kind.
    pub fn identity(self) -> f64 {
        match self {
            VectorKind::Absolute | VectorKind::Additive => 0.0,
            VectorKind::Multiplicative => 1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            VectorKind::Absolute => "absolute",
            VectorKind::Additive => "additive",
            VectorKind::Multiplicative => "multiplicative",
        }
    }
}

impl std::fmt::Display for VectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Shape violations that make a single vector operation fail.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ShapeError {
    #[error("vector length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("non-finite value {value} at index {index}")]
    NonFinite { index: usize, value: f64 },

    #[error("vector kind mismatch: expected {expected}, got {actual}")]
    KindMismatch {
        expected: VectorKind,
        actual: VectorKind,
    },

    #[error("truncating {kind} vector from {from_len} to {to_len} would drop {dropped} non-identity value(s)")]
    LossyTruncation {
        kind: VectorKind,
        from_len: usize,
        to_len: usize,
        dropped: usize,
    },
}

/// A fixed-length sequence of values paired with its kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    kind: VectorKind,
    values: Vec<f64>,
}

impl Vector {
    /// Build a vector, rejecting NaN and infinite entries.
    pub fn new(kind: VectorKind, values: Vec<f64>) -> Result<Self, ShapeError> {
        check_finite(&values)?;
        Ok(Self { kind, values })
    }

    /// A vector of `len` identity elements.
    pub fn identity(kind: VectorKind, len: usize) -> Self {
        Self {
            kind,
            values: vec![kind.identity(); len],
        }
    }

    pub fn kind(&self) -> VectorKind {
        self.kind
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Fail unless this vector has the expected kind.
    pub fn expect_kind(&self, expected: VectorKind) -> Result<(), ShapeError> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(ShapeError::KindMismatch {
                expected,
                actual: self.kind,
            })
        }
    }

    /// Fail unless this vector has exactly `expected` entries.
    pub fn expect_len(&self, expected: usize) -> Result<(), ShapeError> {
        if self.values.len() == expected {
            Ok(())
        } else {
            Err(ShapeError::LengthMismatch {
                expected,
                actual: self.values.len(),
            })
        }
    }

    /// Whether every entry equals the kind's identity element.
    pub fn is_identity(&self) -> bool {
        let id = self.kind.identity();
        self.values.iter().all(|v| *v == id)
    }
}

/// Reject NaN and infinite values.
pub fn check_finite(values: &[f64]) -> Result<(), ShapeError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(ShapeError::NonFinite {
            index,
            value: values[index],
        }),
        None => Ok(()),
    }
}
