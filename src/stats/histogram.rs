use ndarray::{Array1, Array2};

use crate::core::Histogram;

/// Scale a non-negative array to sum to one. An array without mass is mapped to zeros.
pub fn normalize(values: &Array2<f64>) -> Array2<f64> {
    let total = values.sum();
    if total > 0. {
        values / total
    } else {
        Array2::zeros(values.raw_dim())
    }
}

/// Trait extension to aggregate an occupancy histogram over group sizes
pub trait HistogramAggregates {
    fn group_size_distribution(&self) -> Array1<f64>;
    fn fraction_of_programmers_by_group_size(&self) -> Array1<f64>;
    fn mean_programmer_fraction(&self) -> f64;
}

impl HistogramAggregates for Histogram {
    /// Share of groups of each size `p + n`, indexed by size.
    fn group_size_distribution(&self) -> Array1<f64> {
        let (rows, cols) = self.dims();
        let distribution = self.normalized();
        let mut sizes = Array1::zeros(rows + cols - 1);
        for ((p, n), share) in distribution.indexed_iter() {
            sizes[p + n] += share;
        }
        sizes
    }

    /// Programmer fraction of the groups of each size, weighted by how often each composition
    /// occurs, rescaled so that the sizes sum to one.
    fn fraction_of_programmers_by_group_size(&self) -> Array1<f64> {
        let (rows, cols) = self.dims();
        let distribution = self.normalized();
        let mut programmers = Array1::<f64>::zeros(rows + cols - 1);
        let mut groups = Array1::<f64>::zeros(rows + cols - 1);
        for ((p, n), share) in distribution.indexed_iter() {
            let size = p + n;
            if size > 0 {
                programmers[size] += p as f64 / size as f64 * share;
            }
            groups[size] += share;
        }

        let fractions = ndarray::Zip::from(&programmers)
            .and(&groups)
            .map_collect(|&programmers, &groups| {
                if groups > 0. {
                    programmers / groups
                } else {
                    0.
                }
            });
        let total = fractions.sum();
        if total > 0. { fractions / total } else { fractions }
    }

    /// Average of `p / (p + n)` over all groups. Empty groups contribute zero.
    fn mean_programmer_fraction(&self) -> f64 {
        let distribution = self.normalized();
        distribution
            .indexed_iter()
            .filter(|((p, n), _)| p + n > 0)
            .map(|((p, n), share)| p as f64 / (p + n) as f64 * share)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn normalize_is_idempotent() {
        let values = array![[1., 2.], [3., 4.]];
        let once = normalize(&values);
        let twice = normalize(&once);
        assert!((once.sum() - 1.).abs() < 1e-12);
        assert!(
            once.iter()
                .zip(twice.iter())
                .all(|(a, b)| (a - b).abs() < 1e-12)
        );
        assert_eq!(once[(1, 1)], 0.4);
    }

    #[test]
    fn normalize_empty() {
        let values = Array2::<f64>::zeros((3, 3));
        assert_eq!(normalize(&values), values);
    }

    #[test]
    fn group_sizes() {
        let store = population![(0, 1), (1, 0), (1, 1), (0, 0)];
        let histogram = Histogram::from_store(&store, 1);
        let sizes = histogram.group_size_distribution();
        assert_eq!(sizes.len(), 3);
        assert_eq!(sizes.to_vec(), vec![0.25, 0.5, 0.25]);
    }

    #[test]
    fn fraction_by_group_size() {
        let store = population![(0, 1), (1, 0), (1, 1), (2, 0)];
        let histogram = Histogram::from_store(&store, 2);
        let fractions = histogram.fraction_of_programmers_by_group_size();
        // size 1: half of the groups are programmers, size 2: (0.5 + 1) / 2
        let expected = [0., 0.5, 0.75];
        let total: f64 = expected.iter().sum();
        for (size, value) in expected.iter().enumerate() {
            assert!((fractions[size] - value / total).abs() < 1e-12);
        }
        assert!((fractions.sum() - 1.).abs() < 1e-12);
    }

    #[test]
    fn mean_fraction() {
        let store = population![(1, 1), (2, 0), (0, 3), (0, 0)];
        let histogram = Histogram::from_store(&store, 3);
        assert!((histogram.mean_programmer_fraction() - 0.375).abs() < 1e-12);
        assert_eq!(Histogram::new(2).mean_programmer_fraction(), 0.);
    }
}
