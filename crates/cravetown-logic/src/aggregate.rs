//! Fine → coarse aggregation.
//!
//! Each coarse entry is the unweighted arithmetic mean of its member fine
//! entries. A category with no members aggregates to `0.0`.

use crate::dimensions::DimensionRegistry;
use crate::vector::{check_finite, ShapeError};

/// Aggregate a fine vector into a coarse vector of `registry.coarse_count()`.
///
/// `fine` must already be sized to `registry.fine_count()`.
pub fn aggregate(fine: &[f64], registry: &DimensionRegistry) -> Result<Vec<f64>, ShapeError> {
    if fine.len() != registry.fine_count() {
        return Err(ShapeError::LengthMismatch {
            expected: registry.fine_count(),
            actual: fine.len(),
        });
    }
    check_finite(fine)?;

    let mut sums = vec![0.0; registry.coarse_count()];
    let mut counts = vec![0usize; registry.coarse_count()];
    for (i, value) in fine.iter().enumerate() {
        if let Some(c) = registry.parent_of(i) {
            sums[c] += value;
            counts[c] += 1;
        }
    }

    Ok(sums
        .into_iter()
        .zip(counts)
        .map(|(sum, n)| if n == 0 { 0.0 } else { sum / n as f64 })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimensions::testing::{registry, standard};

    #[test]
    fn first_block_averages_to_five() {
        let reg = standard();
        let mut fine = vec![0.0; 50];
        fine[..8].copy_from_slice(&[2.0, 4.0, 6.0, 8.0, 2.0, 4.0, 6.0, 8.0]);
        let coarse = aggregate(&fine, &reg).unwrap();
        assert_eq!(coarse.len(), 9);
        assert_eq!(coarse[0], 5.0);
        assert!(coarse[1..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn empty_category_is_zero_not_nan() {
        let reg = registry(&[("a", 2), ("empty", 0)]);
        let coarse = aggregate(&[3.0, 5.0], &reg).unwrap();
        assert_eq!(coarse, vec![4.0, 0.0]);
    }

    #[test]
    fn mean_lies_within_member_range() {
        let reg = standard();
        let fine: Vec<f64> = (0..50).map(|i| ((i * 37) % 11) as f64 - 3.5).collect();
        let coarse = aggregate(&fine, &reg).unwrap();
        for (c, value) in coarse.iter().enumerate() {
            let members: Vec<f64> = reg.members(c).map(|i| fine[i]).collect();
            let lo = members.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = members.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            assert!(*value >= lo && *value <= hi, "coarse {c} = {value} outside [{lo}, {hi}]");
        }
    }

    #[test]
    fn wrong_length_is_shape_error() {
        let reg = standard();
        assert_eq!(
            aggregate(&[1.0; 45], &reg),
            Err(ShapeError::LengthMismatch {
                expected: 50,
                actual: 45
            })
        );
    }

    #[test]
    fn pure_and_repeatable() {
        let reg = standard();
        let fine: Vec<f64> = (0..50).map(|i| i as f64 * 0.1).collect();
        assert_eq!(aggregate(&fine, &reg), aggregate(&fine, &reg));
    }
}
