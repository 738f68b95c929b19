//! Modifier composition.
//!
//! `effective[i] = (base[i] + Σ additive[i]) * Π multiplicative[i]`
//!
//! The order is fixed: all additive modifiers are summed onto the base
//! before any multiplier is applied. Modifiers must already be resized to
//! the base length (see [`crate::resize`]); a mismatch is a
//! [`ShapeError`], never silently padded here.

use crate::vector::{ShapeError, Vector, VectorKind};

/// Compose an absolute base with additive and multiplicative modifiers.
pub fn compose(
    base: &Vector,
    additive: &[&Vector],
    multiplicative: &[&Vector],
) -> Result<Vector, ShapeError> {
    base.expect_kind(VectorKind::Absolute)?;
    let len = base.len();

    for m in additive {
        m.expect_kind(VectorKind::Additive)?;
        m.expect_len(len)?;
    }
    for m in multiplicative {
        m.expect_kind(VectorKind::Multiplicative)?;
        m.expect_len(len)?;
    }

    let values = (0..len)
        .map(|i| {
            let sum: f64 = additive.iter().map(|m| m.values()[i]).sum();
            let product: f64 = multiplicative.iter().map(|m| m.values()[i]).product();
            (base.values()[i] + sum) * product
        })
        .collect();

    Vector::new(VectorKind::Absolute, values)
}

/// Fold an additive modifier permanently into an absolute base.
pub fn fold_additive(base: &Vector, modifier: &Vector) -> Result<Vector, ShapeError> {
    compose(base, &[modifier], &[])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abs(v: &[f64]) -> Vector {
        Vector::new(VectorKind::Absolute, v.to_vec()).unwrap()
    }
    fn add(v: &[f64]) -> Vector {
        Vector::new(VectorKind::Additive, v.to_vec()).unwrap()
    }
    fn mul(v: &[f64]) -> Vector {
        Vector::new(VectorKind::Multiplicative, v.to_vec()).unwrap()
    }

    #[test]
    fn no_modifiers_leaves_base() {
        let base = abs(&[1.0, 2.5, 0.0]);
        assert_eq!(compose(&base, &[], &[]).unwrap(), base);
    }

    #[test]
    fn single_additive() {
        let base = abs(&[1.0, 2.0, 3.0]);
        let m = add(&[0.5, -1.0, 0.0]);
        let out = compose(&base, &[&m], &[]).unwrap();
        assert_eq!(out.values(), &[1.5, 1.0, 3.0]);
    }

    #[test]
    fn single_multiplicative() {
        let base = abs(&[1.0, 2.0, 3.0]);
        let m = mul(&[2.0, 0.5, 1.0]);
        let out = compose(&base, &[], &[&m]).unwrap();
        assert_eq!(out.values(), &[2.0, 1.0, 3.0]);
    }

    #[test]
    fn adds_before_multiplying() {
        let base = abs(&[1.0, 4.0]);
        let a1 = add(&[1.0, 0.0]);
        let a2 = add(&[2.0, -2.0]);
        let m1 = mul(&[2.0, 0.5]);
        let m2 = mul(&[1.5, 3.0]);
        let out = compose(&base, &[&a1, &a2], &[&m1, &m2]).unwrap();
        // (1 + 1 + 2) * 2 * 1.5 = 12; (4 + 0 - 2) * 0.5 * 3 = 3
        assert_eq!(out.values(), &[12.0, 3.0]);
        assert_eq!(out.kind(), VectorKind::Absolute);
    }

    #[test]
    fn length_mismatch_is_error() {
        let base = abs(&[1.0, 2.0]);
        let m = add(&[1.0]);
        assert_eq!(
            compose(&base, &[&m], &[]),
            Err(ShapeError::LengthMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn kind_mismatch_is_error() {
        let base = abs(&[1.0]);
        let wrong = mul(&[2.0]);
        assert!(matches!(
            compose(&base, &[&wrong], &[]),
            Err(ShapeError::KindMismatch { .. })
        ));
        let not_absolute = add(&[1.0]);
        assert!(compose(&not_absolute, &[], &[]).is_err());
    }

    #[test]
    fn fold_adds_into_base() {
        let base = abs(&[1.0, 1.0]);
        let m = add(&[0.0, 2.0]);
        assert_eq!(fold_additive(&base, &m).unwrap().values(), &[1.0, 3.0]);
    }
}
