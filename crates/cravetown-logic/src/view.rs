//! Display-ready summaries of a fine vector, grouped by coarse category.
//!
//! Renderers consume these instead of re-deriving anything: averages come
//! straight from [`aggregate`], so a chart and the stored coarse cache can
//! never disagree.

use serde::Serialize;

use crate::aggregate::aggregate;
use crate::dimensions::DimensionRegistry;
use crate::vector::ShapeError;

/// Values at or below this count as inactive.
pub const ACTIVE_EPSILON: f64 = 0.01;

/// Value range used to scale cell intensity into `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ValueRange {
    fn default() -> Self {
        Self { min: 0.0, max: 10.0 }
    }
}

impl ValueRange {
    pub fn intensity(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FineCell {
    pub id: String,
    pub name: String,
    pub index: usize,
    pub value: f64,
    pub intensity: f64,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoarseSummary {
    pub id: String,
    pub name: String,
    pub average: f64,
    pub total: f64,
    pub active_count: usize,
    pub cells: Vec<FineCell>,
}

/// Number of entries above [`ACTIVE_EPSILON`].
pub fn active_count(values: &[f64]) -> usize {
    values.iter().filter(|v| **v > ACTIVE_EPSILON).count()
}

/// Group `fine` by coarse category with averages, totals and cells.
pub fn summarize(
    fine: &[f64],
    registry: &DimensionRegistry,
    range: ValueRange,
) -> Result<Vec<CoarseSummary>, ShapeError> {
    let averages = aggregate(fine, registry)?;

    Ok(registry
        .coarse()
        .iter()
        .enumerate()
        .map(|(pos, coarse)| {
            let cells: Vec<FineCell> = registry
                .members(pos)
                .map(|i| {
                    let dim = &registry.fine()[i];
                    let value = fine[i];
                    FineCell {
                        id: dim.id.clone(),
                        name: dim.name.clone(),
                        index: i,
                        value,
                        intensity: range.intensity(value),
                        active: value > ACTIVE_EPSILON,
                    }
                })
                .collect();
            CoarseSummary {
                id: coarse.id.clone(),
                name: coarse.name.clone(),
                average: averages[pos],
                total: cells.iter().map(|c| c.value).sum(),
                active_count: cells.iter().filter(|c| c.active).count(),
                cells,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimensions::testing::{registry, standard};

    #[test]
    fn summary_matches_aggregate() {
        let reg = standard();
        let mut fine = vec![0.0; 50];
        fine[..8].copy_from_slice(&[2.0, 4.0, 6.0, 8.0, 2.0, 4.0, 6.0, 8.0]);
        let summary = summarize(&fine, &reg, ValueRange::default()).unwrap();
        assert_eq!(summary.len(), 9);
        assert_eq!(summary[0].id, "biological");
        assert_eq!(summary[0].average, 5.0);
        assert_eq!(summary[0].total, 40.0);
        assert_eq!(summary[0].active_count, 8);
        assert_eq!(summary[0].cells.len(), 8);
        assert_eq!(summary[1].active_count, 0);
    }

    #[test]
    fn intensity_is_clamped() {
        let range = ValueRange::default();
        assert_eq!(range.intensity(-3.0), 0.0);
        assert_eq!(range.intensity(5.0), 0.5);
        assert_eq!(range.intensity(25.0), 1.0);
        let flat = ValueRange { min: 1.0, max: 1.0 };
        assert_eq!(flat.intensity(1.0), 0.0);
    }

    #[test]
    fn active_threshold() {
        assert_eq!(active_count(&[0.0, 0.01, 0.011, 3.0]), 2);
    }

    #[test]
    fn empty_category_summarizes_to_zero() {
        let reg = registry(&[("a", 1), ("empty", 0)]);
        let summary = summarize(&[4.0], &reg, ValueRange::default()).unwrap();
        assert_eq!(summary[1].average, 0.0);
        assert_eq!(summary[1].total, 0.0);
        assert!(summary[1].cells.is_empty());
    }
}
