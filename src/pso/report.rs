//! Human-readable search output.
//!
//! - [`GenerationReport`]: a snapshot of the swarm's merit, scaled fitness
//!   and subsets for one generation.
//! - [`TraceLog`]: an append-only text file with one `bf:`/`bfe:` line per
//!   generation and a closing summary block.

use crate::bitset::BitVector;
use crate::candidate::Candidate;
use crate::error::Result;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// One particle's line in a [`GenerationReport`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    /// Raw merit.
    pub objective: f64,
    /// Scaled fitness.
    pub fitness: f64,
    /// Selected attributes.
    pub bits: BitVector,
}

/// Swarm snapshot for one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    /// Generation number, `0` for the initial swarm.
    pub generation: usize,
    /// One row per particle, in slot order.
    pub rows: Vec<ReportRow>,
}

impl GenerationReport {
    /// Captures the current particles.
    pub fn capture(generation: usize, candidates: &[Candidate]) -> Self {
        Self {
            generation,
            rows: candidates
                .iter()
                .map(|c| ReportRow {
                    objective: c.objective,
                    fitness: c.fitness,
                    bits: c.bits.clone(),
                })
                .collect(),
        }
    }
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generation == 0 {
            writeln!(f, "\nInitial population")?;
        } else {
            writeln!(f, "\nGeneration: {}", self.generation)?;
        }
        writeln!(f, "merit   \tscaled  \tsubset")?;
        for row in &self.rows {
            writeln!(
                f,
                "{:8.5}\t{:8.5}\t{}",
                row.objective,
                row.fitness,
                row.bits.to_attribute_string()
            )?;
        }
        Ok(())
    }
}

/// Append-only best-merit trace.
#[derive(Debug)]
pub struct TraceLog {
    out: BufWriter<File>,
}

impl TraceLog {
    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            out: BufWriter::new(file),
        })
    }

    /// Records the total-best merit after a generation.
    ///
    /// `bfe` marks a generation in which every particle had the same merit.
    pub fn record(&mut self, total_best: f64, flat: bool) -> Result<()> {
        let tag = if flat { "bfe" } else { "bf" };
        writeln!(self.out, "{tag}: {total_best:?}")?;
        Ok(())
    }

    /// Writes the closing summary and flushes.
    pub fn summary(&mut self, best: &Candidate, first_generation: usize) -> Result<()> {
        writeln!(
            self.out,
            "\nBest fitness found: {:?}, with {} features selected.",
            best.objective,
            best.feature_count()
        )?;
        writeln!(self.out, "Best iteration found: {first_generation}")?;
        writeln!(
            self.out,
            "Selected features are: {}",
            best.bits.to_attribute_string()
        )?;
        self.out.flush()?;
        Ok(())
    }
}
