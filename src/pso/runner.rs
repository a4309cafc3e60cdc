//! PSO search loop execution.
//!
//! [`PsoRunner`] orchestrates the complete run:
//! validation → initialization → evaluation → scaling → best tracking →
//! recombination + mutation → repeat, for a fixed number of generations.

use super::config::PsoConfig;
use super::operators::{mutate, three_parent_crossover, Weights};
use super::population::Population;
use super::report::{GenerationReport, TraceLog};
use super::scaling::FitnessScaler;
use super::tracker::{BestTracker, TrackOutcome};
use super::types::{DatasetShape, SubsetEvaluator};
use crate::bitset::{parse_ranges, BitVector};
use crate::cache::EvaluationCache;
use crate::candidate::Candidate;
use crate::error::{Result, SearchError};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Result of a PSO subset search.
#[derive(Debug, Clone)]
pub struct PsoResult {
    /// Selected attribute indices, ascending, zero-based.
    pub selected: Vec<usize>,

    /// The best particle found during the entire run.
    pub best: Candidate,

    /// Merit of the best particle (same as `best.objective`).
    pub best_objective: f64,

    /// Number of attributes in the best subset.
    pub best_feature_count: usize,

    /// First generation at which `best_objective` was reached.
    pub first_best_generation: usize,

    /// Number of generations executed after the initial one.
    pub generations: usize,

    /// Whether the run was cancelled externally.
    pub cancelled: bool,

    /// Total-best merit after each generation, initial generation first.
    pub fitness_history: Vec<f64>,

    /// Generations in which every particle had the same merit.
    pub flat_generations: Vec<usize>,

    /// Number of evaluator calls (distinct subsets scored).
    pub evaluations: usize,

    /// Number of evaluations served from the cache.
    pub cache_hits: usize,

    /// Population reports emitted during the run.
    pub reports: Vec<GenerationReport>,

    /// Settings the run was made with.
    pub config: PsoConfig,
}

impl fmt::Display for PsoResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.config)?;
        for report in &self.reports {
            write!(f, "{report}")?;
        }
        writeln!(
            f,
            "\nBest merit: {} with {} features ({}) first reached at generation {}",
            self.best_objective,
            self.best_feature_count,
            self.best.bits.to_attribute_string().trim_end(),
            self.first_best_generation
        )
    }
}

/// Executes the PSO subset search.
///
/// # Usage
///
/// ```ignore
/// let shape = DatasetShape::with_class(data.num_attributes(), data.class_index());
/// let config = PsoConfig::default().with_iterations(50);
/// let selected = PsoRunner::search(&evaluator, &shape, &config)?;
/// ```
pub struct PsoRunner;

impl PsoRunner {
    /// Runs the search and returns only the selected attribute indices.
    pub fn search<E: SubsetEvaluator + ?Sized>(
        evaluator: &E,
        shape: &DatasetShape,
        config: &PsoConfig,
    ) -> Result<Vec<usize>> {
        Self::run(evaluator, shape, config).map(|r| r.selected)
    }

    /// Runs the search.
    ///
    /// # Errors
    /// Configuration and evaluator capability problems are reported before
    /// any random draw. Any evaluator failure aborts the run.
    pub fn run<E: SubsetEvaluator + ?Sized>(
        evaluator: &E,
        shape: &DatasetShape,
        config: &PsoConfig,
    ) -> Result<PsoResult> {
        Self::run_with_cancel(evaluator, shape, config, None)
    }

    /// Runs the search with an optional cancellation token.
    ///
    /// If `cancel` is `Some` and the flag is set to `true`, the search stops
    /// at the next generation boundary and returns the best found so far.
    pub fn run_with_cancel<E: SubsetEvaluator + ?Sized>(
        evaluator: &E,
        shape: &DatasetShape,
        config: &PsoConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<PsoResult> {
        let mut state = SearchState::prepare(evaluator, shape, config)?;
        log::info!(
            "PSO search: {} particles, {} iterations, {} attributes, seed {}",
            config.swarm_size,
            config.iterations,
            shape.num_attributes,
            config.seed
        );

        state.evaluate(evaluator)?;
        state.finish_generation(0)?;

        let frequency = config.effective_report_frequency();
        let mut generations = 0;
        let mut cancelled = false;
        for gen in 1..=config.iterations {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    log::info!("search cancelled before generation {gen}");
                    cancelled = true;
                    break;
                }
            }
            state.advance();
            state.evaluate(evaluator)?;
            state.finish_generation(gen)?;
            if gen == config.iterations || gen % frequency == 0 {
                state.report(gen);
            }
            generations = gen;
        }

        state.into_result(generations, cancelled)
    }
}

/// Everything one search invocation mutates.
struct SearchState<'a> {
    config: &'a PsoConfig,
    reserved: Option<usize>,
    weights: Weights,
    rng: ChaCha8Rng,
    population: Population,
    cache: EvaluationCache,
    scaler: FitnessScaler,
    tracker: BestTracker,
    social_best: BitVector,
    trace: Option<TraceLog>,
    reports: Vec<GenerationReport>,
}

impl<'a> SearchState<'a> {
    /// Validates inputs, seeds the stream and builds the initial swarm.
    fn prepare<E: SubsetEvaluator + ?Sized>(
        evaluator: &E,
        shape: &DatasetShape,
        config: &'a PsoConfig,
    ) -> Result<Self> {
        if !evaluator.scores_subsets() {
            return Err(SearchError::UnsupportedEvaluator(evaluator.name().to_string()));
        }
        config.validate()?;

        let n = shape.num_attributes;
        if n == 0 {
            return Err(SearchError::config("dataset has no attributes"));
        }
        let shape = if evaluator.is_supervised() {
            *shape
        } else {
            DatasetShape::new(n)
        };
        if let Some(class) = shape.class_index {
            if class >= n {
                return Err(SearchError::config(format!(
                    "class index {class} outside 0..{n}"
                )));
            }
        }
        if shape.selectable() == 0 {
            return Err(SearchError::config(
                "the class is the only attribute; nothing to select",
            ));
        }
        let reserved = shape.class_index;
        let start = config
            .start_set
            .as_deref()
            .map(|ranges| parse_ranges(ranges, n))
            .transpose()?;

        let trace = config
            .log_file
            .as_deref()
            .map(TraceLog::open)
            .transpose()?;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let population = Population::initialize(
            config.swarm_size,
            n,
            reserved,
            start.as_deref(),
            &mut rng,
        )?;

        Ok(Self {
            config,
            reserved,
            weights: Weights {
                inertia: config.inertia_weight,
                social: config.social_weight,
                individual: config.individual_weight,
            },
            rng,
            population,
            cache: EvaluationCache::with_capacity(config.cache_capacity),
            scaler: FitnessScaler::default(),
            tracker: BestTracker::new(),
            social_best: BitVector::new(n),
            trace,
            reports: Vec::new(),
        })
    }

    /// Moves every particle: recombination toward the generation best and
    /// its personal best, then mutation.
    fn advance(&mut self) {
        for i in 0..self.population.len() {
            let (particle, personal) = self.population.slot_mut(i);
            three_parent_crossover(
                &mut particle.bits,
                &self.social_best,
                &personal.bits,
                &self.weights,
                self.reserved,
                &mut self.rng,
            );
            mutate(
                &mut particle.bits,
                self.config.mutation,
                self.config.mutation_probability,
                self.reserved,
                &mut self.rng,
            );
        }
    }

    /// Scores the swarm through the cache and refreshes personal bests.
    #[cfg(not(feature = "parallel"))]
    fn evaluate<E: SubsetEvaluator + ?Sized>(&mut self, evaluator: &E) -> Result<()> {
        for i in 0..self.population.len() {
            self.cache
                .evaluate(&mut self.population.current_mut()[i], evaluator)?;
            self.population.update_personal_best(i);
        }
        Ok(())
    }

    /// Scores the swarm through the cache and refreshes personal bests.
    ///
    /// Distinct uncached subsets are scored concurrently; results are merged
    /// in slot order so the run matches the sequential one.
    #[cfg(feature = "parallel")]
    fn evaluate<E: SubsetEvaluator + ?Sized>(&mut self, evaluator: &E) -> Result<()> {
        use rayon::prelude::*;
        use std::collections::HashMap;

        let mut pending: Vec<BitVector> = Vec::new();
        for c in self.population.current() {
            if !self.cache.contains(&c.bits) && !pending.contains(&c.bits) {
                pending.push(c.bits.clone());
            }
        }
        let scored: Vec<Result<f64>> = pending
            .par_iter()
            .map(|bits| crate::cache::score(evaluator, bits))
            .collect();
        let mut fresh: HashMap<BitVector, f64> = HashMap::with_capacity(pending.len());
        for (bits, objective) in pending.into_iter().zip(scored) {
            fresh.insert(bits, objective?);
        }

        for i in 0..self.population.len() {
            let particle = &mut self.population.current_mut()[i];
            match self.cache.objective(&particle.bits) {
                Some(objective) => {
                    particle.objective = objective;
                    self.cache.record(true);
                }
                None => {
                    if let Some(&objective) = fresh.get(&particle.bits) {
                        particle.objective = objective;
                    }
                    self.cache.insert(particle);
                    self.cache.record(false);
                }
            }
            self.population.update_personal_best(i);
        }
        Ok(())
    }

    /// Statistics, scaling, best tracking and tracing for one generation.
    fn finish_generation(&mut self, gen: usize) -> Result<TrackOutcome> {
        let stats = self.population.stats();
        self.scaler.scale(self.population.current_mut(), &stats);
        let outcome = self.tracker.track(self.population.current(), &stats);
        if let Some(partial) = self.tracker.partial_best() {
            self.social_best = partial.candidate.bits.clone();
        }
        if outcome.flat {
            log::debug!("generation {gen}: all particles share merit {}", stats.max);
        }
        log::debug!(
            "generation {gen}: best {:.6} (generation {:.6}, mean {:.6}), {} subsets cached",
            self.tracker.total_objective(),
            stats.max,
            stats.mean,
            self.cache.len()
        );
        if let Some(trace) = self.trace.as_mut() {
            trace.record(self.tracker.total_objective(), outcome.flat)?;
        }
        if gen == 0 {
            self.report(0);
        }
        Ok(outcome)
    }

    fn report(&mut self, gen: usize) {
        let report = GenerationReport::capture(gen, self.population.current());
        log::debug!("{report}");
        self.reports.push(report);
    }

    fn into_result(mut self, generations: usize, cancelled: bool) -> Result<PsoResult> {
        let first_best_generation = self.tracker.first_best_generation();
        let best = self
            .tracker
            .total_best()
            .map(|b| b.candidate.clone())
            .ok_or_else(|| SearchError::Initialization("no generation was evaluated".into()))?;

        if let Some(trace) = self.trace.as_mut() {
            trace.summary(&best, first_best_generation)?;
        }

        let selected = best.bits.to_index_list();
        log::info!(
            "PSO search finished: merit {} with {} features after {} generations ({} evaluations, {} cache hits)",
            best.objective,
            selected.len(),
            generations,
            self.cache.misses(),
            self.cache.hits()
        );

        Ok(PsoResult {
            best_objective: best.objective,
            best_feature_count: selected.len(),
            selected,
            best,
            first_best_generation,
            generations,
            cancelled,
            fitness_history: self.tracker.history().to_vec(),
            flat_generations: self.tracker.flat_generations().to_vec(),
            evaluations: self.cache.misses(),
            cache_hits: self.cache.hits(),
            reports: self.reports,
            config: self.config.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, EvaluatorError};
    use crate::pso::MutationStrategy;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    /// Merit = number of selected attributes.
    struct CountBits;

    impl SubsetEvaluator for CountBits {
        fn evaluate_subset(&self, subset: &BitVector) -> std::result::Result<f64, EvaluatorError> {
            Ok(subset.count_set() as f64)
        }
    }

    /// Rewards a hidden target subset, penalizes extras.
    struct Target {
        wanted: Vec<usize>,
        calls: AtomicUsize,
        seen: Mutex<Vec<BitVector>>,
    }

    impl Target {
        fn new(wanted: &[usize]) -> Self {
            Self {
                wanted: wanted.to_vec(),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl SubsetEvaluator for Target {
        fn evaluate_subset(&self, subset: &BitVector) -> std::result::Result<f64, EvaluatorError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.seen.lock().unwrap().push(subset.clone());
            let hits = self.wanted.iter().filter(|&&i| subset.get(i)).count() as f64;
            let extras = subset.count_set() as f64 - hits;
            Ok(hits - 0.1 * extras)
        }
    }

    struct Constant(f64);

    impl SubsetEvaluator for Constant {
        fn evaluate_subset(&self, _: &BitVector) -> std::result::Result<f64, EvaluatorError> {
            Ok(self.0)
        }
    }

    struct FailAfter {
        remaining: AtomicUsize,
    }

    impl SubsetEvaluator for FailAfter {
        fn evaluate_subset(&self, _: &BitVector) -> std::result::Result<f64, EvaluatorError> {
            if self.remaining.fetch_sub(1, Ordering::Relaxed) == 0 {
                Err("evaluator lost its training data".into())
            } else {
                Ok(1.0)
            }
        }
    }

    struct AttributeRanker;

    impl SubsetEvaluator for AttributeRanker {
        fn evaluate_subset(&self, _: &BitVector) -> std::result::Result<f64, EvaluatorError> {
            Ok(0.0)
        }
        fn scores_subsets(&self) -> bool {
            false
        }
        fn name(&self) -> &str {
            "InfoGainAttributeEval"
        }
    }

    struct Unsupervised;

    impl SubsetEvaluator for Unsupervised {
        fn evaluate_subset(&self, subset: &BitVector) -> std::result::Result<f64, EvaluatorError> {
            Ok(if subset.get(0) { 1.0 } else { 0.0 })
        }
        fn is_supervised(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_trivial_convergence() {
        let shape = DatasetShape::with_class(4, 3);
        let config = PsoConfig::default()
            .with_swarm_size(5)
            .with_iterations(10)
            .with_seed(1);
        let result = PsoRunner::run(&CountBits, &shape, &config).unwrap();
        assert_eq!(result.selected, vec![0, 1, 2]);
        assert_eq!(result.best_objective, 3.0);
        assert_eq!(result.best_feature_count, 3);
        assert_eq!(result.generations, 10);
        assert_eq!(result.fitness_history.len(), 11);
        assert!(!result.cancelled);
    }

    #[test]
    fn test_finds_target_subset() {
        let eval = Target::new(&[1, 4, 7]);
        let shape = DatasetShape::with_class(12, 11);
        let config = PsoConfig::default()
            .with_swarm_size(30)
            .with_iterations(60)
            .with_mutation_probability(0.05)
            .with_seed(42);
        let result = PsoRunner::run(&eval, &shape, &config).unwrap();
        assert!(
            result.best_objective >= 2.0,
            "expected at least two target attributes, got {}",
            result.best_objective
        );
        assert!(!result.selected.contains(&11));
    }

    #[test]
    fn test_deterministic_given_seed() {
        let shape = DatasetShape::with_class(15, 14);
        let config = PsoConfig::default()
            .with_swarm_size(12)
            .with_iterations(25)
            .with_report_frequency(5)
            .with_mutation_probability(0.05)
            .with_seed(77);
        let a_eval = Target::new(&[0, 3, 9, 12]);
        let b_eval = Target::new(&[0, 3, 9, 12]);
        let a = PsoRunner::run(&a_eval, &shape, &config).unwrap();
        let b = PsoRunner::run(&b_eval, &shape, &config).unwrap();

        assert_eq!(a.selected, b.selected);
        assert_eq!(a.best_objective, b.best_objective);
        assert_eq!(a.fitness_history, b.fitness_history);
        assert_eq!(a.reports, b.reports);
        let mut a_seen = a_eval.seen.lock().unwrap().clone();
        let mut b_seen = b_eval.seen.lock().unwrap().clone();
        a_seen.sort();
        b_seen.sort();
        assert_eq!(a_seen, b_seen);
    }

    #[test]
    fn test_evaluator_called_once_per_subset() {
        let eval = Target::new(&[2, 5]);
        let shape = DatasetShape::with_class(8, 7);
        let config = PsoConfig::default()
            .with_swarm_size(10)
            .with_iterations(30)
            .with_seed(3);
        let result = PsoRunner::run(&eval, &shape, &config).unwrap();

        let seen = eval.seen.lock().unwrap();
        let distinct: HashSet<&BitVector> = seen.iter().collect();
        assert_eq!(distinct.len(), seen.len(), "a subset was scored twice");
        assert_eq!(eval.calls.load(Ordering::Relaxed), result.evaluations);
        assert_eq!(result.evaluations + result.cache_hits, 10 * 31);
    }

    #[test]
    fn test_history_and_reports() {
        let shape = DatasetShape::with_class(10, 9);
        let config = PsoConfig::default()
            .with_swarm_size(6)
            .with_iterations(12)
            .with_report_frequency(5)
            .with_seed(8);
        let result = PsoRunner::run(&Target::new(&[1, 2]), &shape, &config).unwrap();

        assert_eq!(result.fitness_history.len(), 13);
        for w in result.fitness_history.windows(2) {
            assert!(w[1] >= w[0], "total best must never decrease");
        }
        let gens: Vec<usize> = result.reports.iter().map(|r| r.generation).collect();
        assert_eq!(gens, vec![0, 5, 10, 12]);
        assert_eq!(
            result.fitness_history[result.first_best_generation],
            result.best_objective
        );
        assert!(result.fitness_history[..result.first_best_generation]
            .iter()
            .all(|&v| v != result.best_objective));
    }

    #[test]
    fn test_flat_fitness_prefers_sparse() {
        let shape = DatasetShape::with_class(10, 9);
        let config = PsoConfig::default()
            .with_swarm_size(8)
            .with_iterations(5)
            .with_seed(2);
        let result = PsoRunner::run(&Constant(0.5), &shape, &config).unwrap();
        assert_eq!(result.flat_generations, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(result.best_objective, 0.5);
        let min_in_start = result.reports[0]
            .rows
            .iter()
            .map(|r| r.bits.count_set())
            .min()
            .unwrap();
        assert!(result.best_feature_count <= min_in_start);
        for row in &result.reports[0].rows {
            assert_eq!(row.fitness, 0.5);
        }
    }

    #[test]
    fn test_start_set_seeds_first_particle() {
        let shape = DatasetShape::with_class(5, 4);
        let config = PsoConfig::default()
            .with_swarm_size(4)
            .with_iterations(1)
            .with_start_set("1,3");
        let result = PsoRunner::run(&CountBits, &shape, &config).unwrap();
        assert_eq!(result.reports[0].rows[0].bits.to_index_list(), vec![0, 2]);
    }

    #[test]
    fn test_class_bit_never_selected() {
        let shape = DatasetShape::with_class(9, 8);
        for mutation in [MutationStrategy::BitFlip, MutationStrategy::BitOff] {
            let config = PsoConfig::default()
                .with_swarm_size(10)
                .with_iterations(15)
                .with_report_frequency(1)
                .with_mutation(mutation)
                .with_mutation_probability(0.3);
            let result = PsoRunner::run(&CountBits, &shape, &config).unwrap();
            for report in &result.reports {
                assert!(report.rows.iter().all(|r| !r.bits.get(8)));
            }
        }
    }

    #[test]
    fn test_class_in_the_middle_is_protected() {
        let shape = DatasetShape::with_class(9, 3);
        let config = PsoConfig::default()
            .with_swarm_size(10)
            .with_iterations(15)
            .with_report_frequency(1)
            .with_mutation_probability(0.5);
        let result = PsoRunner::run(&CountBits, &shape, &config).unwrap();
        for report in &result.reports {
            assert!(report.rows.iter().all(|r| !r.bits.get(3)));
        }
        assert!(!result.selected.contains(&3));
    }

    #[test]
    fn test_unsupervised_ignores_class_index() {
        let shape = DatasetShape::with_class(1, 0);
        let config = PsoConfig::default().with_swarm_size(3).with_iterations(2);
        let result = PsoRunner::run(&Unsupervised, &shape, &config).unwrap();
        assert_eq!(result.selected, vec![0]);
    }

    #[test]
    fn test_invalid_weights_fail_before_evaluation() {
        let eval = Target::new(&[0]);
        let config = PsoConfig::default().with_weights(0.3, 0.3, 0.3);
        let err = PsoRunner::run(&eval, &DatasetShape::with_class(5, 4), &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(eval.calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_rejects_non_subset_evaluator() {
        let err = PsoRunner::search(
            &AttributeRanker,
            &DatasetShape::with_class(5, 4),
            &PsoConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedEvaluator);
        assert!(err.to_string().contains("InfoGainAttributeEval"));
    }

    #[test]
    fn test_rejects_bad_shape_and_start_set() {
        let config = PsoConfig::default();
        for shape in [
            DatasetShape::new(0),
            DatasetShape::with_class(4, 4),
            DatasetShape::with_class(1, 0),
        ] {
            let err = PsoRunner::run(&CountBits, &shape, &config).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Config, "{shape:?}");
        }
        let config = PsoConfig::default().with_start_set("2,9");
        let err = PsoRunner::run(&CountBits, &DatasetShape::with_class(5, 4), &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_evaluator_failure_aborts() {
        let eval = FailAfter {
            remaining: AtomicUsize::new(3),
        };
        let config = PsoConfig::default().with_swarm_size(10).with_iterations(5);
        let err = PsoRunner::run(&eval, &DatasetShape::with_class(30, 29), &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Evaluation);
        assert!(err.to_string().contains("lost its training data"));
    }

    #[test]
    fn test_cancellation_before_first_generation() {
        let cancel = Arc::new(AtomicBool::new(true));
        let config = PsoConfig::default().with_iterations(1000);
        let result = PsoRunner::run_with_cancel(
            &CountBits,
            &DatasetShape::with_class(6, 5),
            &config,
            Some(cancel),
        )
        .unwrap();
        assert!(result.cancelled);
        assert_eq!(result.generations, 0);
        assert_eq!(result.fitness_history.len(), 1);
        assert!(!result.selected.is_empty());
    }

    #[test]
    fn test_dyn_evaluator() {
        let eval: Box<dyn SubsetEvaluator> = Box::new(CountBits);
        let selected = PsoRunner::search(
            eval.as_ref(),
            &DatasetShape::with_class(4, 3),
            &PsoConfig::default(),
        )
        .unwrap();
        assert!(selected.iter().all(|&i| i < 3));
    }
}
