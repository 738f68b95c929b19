//! Vector resizing against the registry's dimension counts.
//!
//! Authored content predates newer dimensions, so stored vectors are
//! routinely shorter (or, after a dimension was removed, longer) than the
//! current registry. Padding appends the kind's identity element and never
//! shifts existing values, so appending dimensions leaves every existing
//! aggregate unchanged.
//!
//! Truncation that drops non-identity data is reported through
//! [`LossyResize`]. Under [`TruncationPolicy::Reject`] it fails instead.
//!
//! ```
//! use cravetown_logic::resize::resize;
//! use cravetown_logic::vector::VectorKind;
//!
//! let out = resize(&[0.5, 2.0], VectorKind::Multiplicative, 4).unwrap();
//! assert_eq!(out.values, vec![0.5, 2.0, 1.0, 1.0]);
//! assert!(out.lossy.is_none());
//! ```

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::vector::{check_finite, ShapeError, Vector, VectorKind};

/// What to do when truncation would drop non-identity values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationPolicy {
    /// Truncate and return a [`LossyResize`] warning.
    #[default]
    Warn,
    /// Refuse with [`ShapeError::LossyTruncation`].
    Reject,
}

/// Warning: a truncation dropped values that were not the identity element.
#[derive(Debug, Clone, PartialEq)]
pub struct LossyResize {
    pub kind: VectorKind,
    pub from_len: usize,
    pub to_len: usize,
    /// The dropped tail, in original order.
    pub dropped: Vec<f64>,
}

impl std::fmt::Display for LossyResize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id = self.kind.identity();
        let non_identity = self.dropped.iter().filter(|v| **v != id).count();
        write!(
            f,
            "{} vector truncated from {} to {}, dropping {} non-identity value(s)",
            self.kind, self.from_len, self.to_len, non_identity
        )
    }
}

/// Output of a resize: the values plus an optional lossy-truncation warning.
#[derive(Debug, Clone, PartialEq)]
pub struct Resized {
    pub values: Vec<f64>,
    pub lossy: Option<LossyResize>,
}

/// Resize under the default [`TruncationPolicy::Warn`].
pub fn resize(values: &[f64], kind: VectorKind, target_len: usize) -> Result<Resized, ShapeError> {
    resize_with(values, kind, target_len, TruncationPolicy::Warn)
}

/// Resize `values` to `target_len` using `kind`'s identity as padding.
pub fn resize_with(
    values: &[f64],
    kind: VectorKind,
    target_len: usize,
    policy: TruncationPolicy,
) -> Result<Resized, ShapeError> {
    check_finite(values)?;

    let len = values.len();
    if len == target_len {
        return Ok(Resized {
            values: values.to_vec(),
            lossy: None,
        });
    }

    if len < target_len {
        debug!("padding {kind} vector from {len} to {target_len}");
        let mut out = Vec::with_capacity(target_len);
        out.extend_from_slice(values);
        out.resize(target_len, kind.identity());
        return Ok(Resized {
            values: out,
            lossy: None,
        });
    }

    let tail = &values[target_len..];
    let id = kind.identity();
    let non_identity = tail.iter().filter(|v| **v != id).count();

    if non_identity == 0 {
        debug!("trimming identity tail of {kind} vector from {len} to {target_len}");
        return Ok(Resized {
            values: values[..target_len].to_vec(),
            lossy: None,
        });
    }

    if policy == TruncationPolicy::Reject {
        return Err(ShapeError::LossyTruncation {
            kind,
            from_len: len,
            to_len: target_len,
            dropped: non_identity,
        });
    }

    let lossy = LossyResize {
        kind,
        from_len: len,
        to_len: target_len,
        dropped: tail.to_vec(),
    };
    warn!("{lossy}");
    Ok(Resized {
        values: values[..target_len].to_vec(),
        lossy: Some(lossy),
    })
}

impl Vector {
    /// Resize this vector, keeping its kind.
    pub fn resized(
        &self,
        target_len: usize,
        policy: TruncationPolicy,
    ) -> Result<(Vector, Option<LossyResize>), ShapeError> {
        let out = resize_with(self.values(), self.kind(), target_len, policy)?;
        Ok((Vector::new(self.kind(), out.values)?, out.lossy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NINE: [f64; 9] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];

    #[test]
    fn pads_absolute_with_zero() {
        let out = resize(&NINE, VectorKind::Absolute, 12).unwrap();
        let mut expected = NINE.to_vec();
        expected.extend([0.0, 0.0, 0.0]);
        assert_eq!(out.values, expected);
        assert!(out.lossy.is_none());
    }

    #[test]
    fn pads_multiplicative_with_one() {
        let out = resize(&NINE, VectorKind::Multiplicative, 12).unwrap();
        let mut expected = NINE.to_vec();
        expected.extend([1.0, 1.0, 1.0]);
        assert_eq!(out.values, expected);
    }

    #[test]
    fn same_length_is_noop() {
        let out = resize(&NINE, VectorKind::Additive, 9).unwrap();
        assert_eq!(out.values, NINE.to_vec());
        assert!(out.lossy.is_none());
    }

    #[test]
    fn truncating_absolute_data_is_flagged() {
        let out = resize(&NINE, VectorKind::Absolute, 7).unwrap();
        assert_eq!(out.values, NINE[..7].to_vec());
        let lossy = out.lossy.expect("dropping 8.0 and 9.0 must be reported");
        assert_eq!(lossy.from_len, 9);
        assert_eq!(lossy.to_len, 7);
        assert_eq!(lossy.dropped, vec![8.0, 9.0]);
        assert!(lossy.to_string().contains("2 non-identity"));
    }

    #[test]
    fn truncating_additive_data_is_flagged() {
        let out = resize(&[0.0, 0.5, -0.5], VectorKind::Additive, 2).unwrap();
        assert!(out.lossy.is_some());
    }

    #[test]
    fn truncating_identity_tail_is_lossless() {
        let out = resize(&[0.8, 1.2, 1.0, 1.0], VectorKind::Multiplicative, 2).unwrap();
        assert_eq!(out.values, vec![0.8, 1.2]);
        assert!(out.lossy.is_none());

        let out = resize(&[3.0, 0.0, 0.0], VectorKind::Absolute, 1).unwrap();
        assert!(out.lossy.is_none());
    }

    #[test]
    fn truncating_non_identity_multiplier_is_flagged() {
        let out = resize(&[1.0, 1.0, 1.5], VectorKind::Multiplicative, 2).unwrap();
        assert!(out.lossy.is_some());
    }

    #[test]
    fn reject_policy_fails_lossy_truncation() {
        let err = resize_with(&NINE, VectorKind::Absolute, 8, TruncationPolicy::Reject).unwrap_err();
        assert_eq!(
            err,
            ShapeError::LossyTruncation {
                kind: VectorKind::Absolute,
                from_len: 9,
                to_len: 8,
                dropped: 1,
            }
        );
        // Lossless truncation is still allowed.
        let ok = resize_with(&[2.0, 0.0], VectorKind::Absolute, 1, TruncationPolicy::Reject);
        assert!(ok.is_ok());
    }

    #[test]
    fn non_finite_input_is_shape_error() {
        let err = resize(&[1.0, f64::NAN], VectorKind::Absolute, 4).unwrap_err();
        assert!(matches!(err, ShapeError::NonFinite { index: 1, .. }));
    }

    #[test]
    fn resize_is_idempotent_at_fixed_length() {
        let kinds = [
            VectorKind::Absolute,
            VectorKind::Additive,
            VectorKind::Multiplicative,
        ];
        for kind in kinds {
            for target in [0, 3, 9, 15] {
                let once = resize(&NINE, kind, target).unwrap();
                let twice = resize(&once.values, kind, target).unwrap();
                assert_eq!(once.values, twice.values, "{kind} to {target}");
                assert!(twice.lossy.is_none());
            }
        }
    }

    #[test]
    fn vector_resized_keeps_kind() {
        let v = Vector::new(VectorKind::Multiplicative, vec![2.0]).unwrap();
        let (out, lossy) = v.resized(3, TruncationPolicy::Warn).unwrap();
        assert_eq!(out.kind(), VectorKind::Multiplicative);
        assert_eq!(out.values(), &[2.0, 1.0, 1.0]);
        assert!(lossy.is_none());
    }
}
