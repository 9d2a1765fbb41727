//! Reporting utilities for evolution and evaluation results.
//!
//! Provides formatted console output and JSON export capabilities.

use crate::application::optimization::parallel_evaluator::{PopulationTestSummary, UnitOutcome};
use crate::domain::evolution::organism::Organism;
use crate::domain::evolution::report::{FamilyOutcome, GenerationStats};
use crate::domain::performance::metrics::PerformanceRecord;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

/// Reporter for evolution output.
pub struct EvolutionReporter {
    output_dir: String,
}

impl EvolutionReporter {
    /// Creates a new reporter with the given output directory.
    pub fn new(output_dir: &str) -> Self {
        Self {
            output_dir: output_dir.to_string(),
        }
    }

    /// Prints the header banner for a run.
    pub fn print_header(&self, title: &str, symbol: &str, period: &str, details: &str) {
        println!("{}", "=".repeat(80));
        println!("🧬 {}", title);
        println!("{}", "=".repeat(80));
        println!("Symbol:       {}", symbol);
        println!("Period:       {}", period);
        println!("Settings:     {}", details);
        println!("{}", "=".repeat(80));
    }

    /// Prints one row per generation.
    pub fn print_generations_table(&self, history: &[GenerationStats]) {
        println!(
            "{:<5} | {:>8} | {:>8} | {:>8} | {:>6} | {:<36}",
            "Gen", "Best", "Avg", "Worst", "Failed", "Best organism"
        );
        println!("{}", "-".repeat(80));
        for stats in history {
            println!(
                "{:<5} | {:>8.4} | {:>8.4} | {:>8.4} | {:>6} | {:<36}",
                stats.generation,
                stats.best_fitness,
                stats.avg_fitness,
                stats.worst_fitness,
                stats.failed_evaluations,
                stats.best_organism_id
            );
        }
        println!("{}\n", "=".repeat(80));
    }

    /// Prints the genome and lineage of an organism.
    pub fn print_organism(&self, organism: &Organism) {
        println!("🏆 BEST ORGANISM: {}", organism.id);
        println!("  Generation:       {}", organism.generation);
        println!("  Fitness:          {:.4}", organism.fitness);
        if let Some([a, b]) = &organism.parents {
            println!("  Parents:          {} x {}", a, b);
        }
        for (gene, value) in organism.dna.genes() {
            println!("  {:<25} {}", gene, value);
        }
        println!("{}\n", "=".repeat(80));
    }

    /// Prints the metrics of a single backtest.
    pub fn print_record(&self, label: &str, record: &PerformanceRecord) {
        println!("📈 {}", label);
        println!("  Final Equity:     {}", record.final_equity.round_dp(2));
        println!("  Total Return:     {:.2}%", record.total_return_pct);
        println!("  Max Drawdown:     {:.2}%", record.max_drawdown_pct);
        println!("  Sharpe Ratio:     {:.2}", record.sharpe_ratio);
        println!("  Sortino Ratio:    {:.2}", record.sortino_ratio);
        println!("  Win Rate:         {:.1}%", record.win_rate_pct);
        println!("  Trades:           {}", record.total_trades);
    }

    /// Prints a ranked table of a population test.
    pub fn print_test_summary(&self, summary: &PopulationTestSummary, top_n: usize) {
        println!("\n{}", "=".repeat(80));
        println!(
            "✅ EVALUATION COMPLETE - {} completed, {} timed out, {} failed",
            summary.completed, summary.timed_out, summary.failed
        );
        println!("{}", "=".repeat(80));

        println!(
            "{:<4} | {:<36} | {:>8} | {:>4} | {:>6}",
            "#", "Organism", "AvgFit", "OK", "Failed"
        );
        println!("{}", "-".repeat(80));
        for (i, report) in summary.ranked().into_iter().take(top_n).enumerate() {
            println!(
                "{:<4} | {:<36} | {:>8.4} | {:>4} | {:>6}",
                i + 1,
                report.organism_id,
                report.average_fitness,
                report.succeeded,
                report.failed
            );
            if let Some((family, fitness)) = report.best_family() {
                println!("       best family: {} ({:.4})", family, fitness);
            }
            for family in &report.families {
                match family {
                    FamilyOutcome::Succeeded {
                        family, fitness, record, ..
                    } => println!(
                        "       {:<16} fitness {:.4}  return {:>7.2}%  trades {}",
                        family.name(),
                        fitness,
                        record.total_return_pct,
                        record.total_trades
                    ),
                    FamilyOutcome::Failed { family, error } => {
                        println!("       {:<16} FAILED: {}", family.name(), error)
                    }
                }
            }
        }

        for outcome in &summary.outcomes {
            match outcome {
                UnitOutcome::TimedOut {
                    organism_id,
                    timeout_secs,
                } => println!("⏱️  {} timed out after {}s", organism_id, timeout_secs),
                UnitOutcome::Failed { organism_id, error } => {
                    println!("❌ {} failed: {}", organism_id, error)
                }
                UnitOutcome::Completed(_) => {}
            }
        }
        println!("{}\n", "=".repeat(80));
    }

    /// Exports any serializable result to a JSON file.
    pub fn export_json<T: Serialize + ?Sized>(&self, value: &T, filename: &str) -> Result<String> {
        let output_path = if filename.contains('/') || filename.contains('\\') {
            filename.to_string()
        } else {
            format!("{}/{}", self.output_dir, filename)
        };

        // Ensure directory exists
        if let Some(parent) = Path::new(&output_path).parent() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create directory: {:?}", parent))?;
        }

        let json_output =
            serde_json::to_string_pretty(value).context("Failed to serialize results to JSON")?;

        std::fs::write(&output_path, json_output)
            .context(format!("Failed to write results to {}", output_path))?;

        println!("💾 Results saved to: {}", output_path);
        Ok(output_path)
    }
}

impl Default for EvolutionReporter {
    fn default() -> Self {
        Self::new(".")
    }
}
