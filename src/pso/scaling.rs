//! Dynamic linear fitness scaling.
//!
//! Maps raw objectives to non-negative fitness with `f = |a * o + b|`,
//! choosing `a` and `b` from the generation's min, max and mean
//! (Goldberg 1989, linear scaling with a fixed multiple). When the swarm
//! has collapsed onto one value the coefficients are not finite and the
//! raw objectives are used unchanged.

use super::population::PopulationStats;
use crate::candidate::Candidate;

/// Default ratio between the best scaled fitness and the mean.
pub const DEFAULT_MULTIPLE: f64 = 2.0;

/// Linear scaling with a fixed multiple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessScaler {
    multiple: f64,
}

impl Default for FitnessScaler {
    fn default() -> Self {
        Self {
            multiple: DEFAULT_MULTIPLE,
        }
    }
}

impl FitnessScaler {
    /// Scaler with a custom multiple (must exceed 1).
    pub fn with_multiple(multiple: f64) -> Self {
        Self { multiple }
    }

    /// Scaling coefficients `(a, b)` for the given statistics.
    pub fn coefficients(&self, stats: &PopulationStats) -> (f64, f64) {
        let m = self.multiple;
        let PopulationStats { min, max, mean, .. } = *stats;
        if min > (m * mean - max) / (m - 1.0) {
            let delta = max - mean;
            ((m - 1.0) * mean / delta, mean * (max - m * mean) / delta)
        } else {
            let delta = mean - min;
            (mean / delta, -min * mean / delta)
        }
    }

    /// Writes the scaled fitness of every candidate and returns their sum.
    ///
    /// Non-finite coefficients fall back to `fitness = objective`.
    pub fn scale(&self, candidates: &mut [Candidate], stats: &PopulationStats) -> f64 {
        let (a, b) = self.coefficients(stats);
        let degenerate = !a.is_finite() || !b.is_finite();
        if degenerate {
            log::debug!("degenerate scaling (a={a}, b={b}); using raw objectives");
        }
        let mut sum = 0.0;
        for c in candidates.iter_mut() {
            c.fitness = if degenerate {
                c.objective
            } else {
                (a * c.objective + b).abs()
            };
            sum += c.fitness;
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitset::BitVector;

    fn swarm(objectives: &[f64]) -> Vec<Candidate> {
        objectives
            .iter()
            .enumerate()
            .map(|(i, &o)| {
                let mut c = Candidate::from_bits(BitVector::from_indices(8, &[i % 8]));
                c.objective = o;
                c
            })
            .collect()
    }

    #[test]
    fn test_flat_population_falls_back() {
        let mut pop = swarm(&[0.5; 6]);
        let stats = PopulationStats::from_candidates(&pop);
        let sum = FitnessScaler::default().scale(&mut pop, &stats);
        for c in &pop {
            assert!(c.fitness.is_finite());
            assert_eq!(c.fitness, 0.5);
        }
        assert!((sum - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_all_zero_does_not_produce_nan() {
        let mut pop = swarm(&[0.0; 4]);
        let stats = PopulationStats::from_candidates(&pop);
        FitnessScaler::default().scale(&mut pop, &stats);
        assert!(pop.iter().all(|c| c.fitness == 0.0));
    }

    #[test]
    fn test_prescale_branch() {
        // min=0.4 > 2*0.5 - 0.7 = 0.3 -> prescale
        let mut pop = swarm(&[0.4, 0.4, 0.5, 0.7, 0.5]);
        let stats = PopulationStats::from_candidates(&pop);
        let scaler = FitnessScaler::default();
        let (a, b) = scaler.coefficients(&stats);
        assert!((a - 0.5 / 0.2).abs() < 1e-9);
        assert!((b - 0.5 * (0.7 - 1.0) / 0.2).abs() < 1e-9);

        scaler.scale(&mut pop, &stats);
        // best maps to multiple * mean, mean maps to itself
        assert!((pop[3].fitness - 1.0).abs() < 1e-9);
        assert!((pop[2].fitness - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_stretch_branch() {
        // min=0.1 <= 2*mean - max = 1/3 -> map min to 0
        let mut pop = swarm(&[0.1, 0.9, 1.0]);
        let stats = PopulationStats::from_candidates(&pop);
        let scaler = FitnessScaler::default();
        let (a, b) = scaler.coefficients(&stats);
        let mean = 2.0 / 3.0;
        assert!((a - mean / (mean - 0.1)).abs() < 1e-9);
        assert!((b + 0.1 * mean / (mean - 0.1)).abs() < 1e-9);

        scaler.scale(&mut pop, &stats);
        assert!(pop[0].fitness.abs() < 1e-12);
        assert!((pop[2].fitness - mean * 0.9 / (mean - 0.1)).abs() < 1e-9);
    }

    #[test]
    fn test_scaling_preserves_order() {
        let mut pop = swarm(&[0.62, 0.71, 0.55, 0.9, 0.68]);
        let stats = PopulationStats::from_candidates(&pop);
        FitnessScaler::default().scale(&mut pop, &stats);
        let mut by_obj: Vec<usize> = (0..pop.len()).collect();
        by_obj.sort_by(|&i, &j| pop[i].objective.total_cmp(&pop[j].objective));
        let mut by_fit = by_obj.clone();
        by_fit.sort_by(|&i, &j| pop[i].fitness.total_cmp(&pop[j].fitness));
        assert_eq!(by_obj, by_fit);
    }
}
