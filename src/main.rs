//! evotrade CLI
//!
//! Evolves strategy genomes, stress-tests them across strategy families and
//! replays single strategies against historical bars.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use evotrade::application::optimization::engine::EvolutionEngine;
use evotrade::application::optimization::parallel_evaluator::ParallelEvaluator;
use evotrade::application::optimization::population::Population;
use evotrade::application::optimization::reporting::EvolutionReporter;
use evotrade::application::optimization::simulator::Backtester;
use evotrade::application::risk_management::safety_gate::SafetyGate;
use evotrade::config::Config;
use evotrade::domain::evolution::organism::{Organism, new_id};
use evotrade::domain::market::strategy_config::{
    BacktestPeriod, RsiParams, SmaCrossoverParams, StrategyKind, StrategyName,
};
use evotrade::domain::ports::ResultsSink;
use evotrade::domain::trading::types::TradeProposal;
use evotrade::infrastructure::InMemoryResultsSink;
use evotrade::infrastructure::observability::Metrics;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Genetic strategy optimizer", long_about = None)]
struct Cli {
    /// Print Prometheus metrics when the command finishes
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evolve a population of strategy genomes
    Evolve {
        /// Generations to run (default: until Ctrl-C, or EVO_MAX_GENERATIONS)
        #[arg(short, long)]
        generations: Option<usize>,

        /// Population size
        #[arg(short, long)]
        population: Option<usize>,

        /// RNG seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        /// Symbol to evolve against
        #[arg(short, long)]
        symbol: Option<String>,

        /// Backtest period (1mo, 3mo, 6mo, 1y, 2y, 5y)
        #[arg(long)]
        period: Option<String>,

        /// TOML file with evolution settings
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output JSON file for the run summary
        #[arg(short, long, default_value = "evolution_results.json")]
        output: String,

        /// Also save the final population (input for `evaluate`)
        #[arg(long)]
        save_population: Option<String>,
    },
    /// Test organisms under every strategy family with bounded parallelism
    Evaluate {
        /// JSON file with a list of organisms; random organisms when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Random organisms to generate when no input is given
        #[arg(short, long, default_value = "6")]
        count: usize,

        /// RNG seed for generated organisms
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Symbol to test against
        #[arg(short, long)]
        symbol: Option<String>,

        /// Concurrent units (default: EVALUATOR_MAX_WORKERS)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Number of top results to display
        #[arg(short, long, default_value = "10")]
        top_n: usize,

        /// Output JSON file for results
        #[arg(short, long, default_value = "evaluation_results.json")]
        output: String,
    },
    /// Replay one strategy over historical bars
    Backtest {
        /// SMA_CROSSOVER, RSI_STRATEGY or EVOLUTION_DNA
        #[arg(long, default_value = "SMA_CROSSOVER")]
        strategy: String,

        #[arg(short, long)]
        symbol: Option<String>,

        #[arg(long)]
        period: Option<String>,

        #[arg(long)]
        capital: Option<Decimal>,

        /// SMA fast period / RSI period
        #[arg(long)]
        fast: Option<u32>,

        /// SMA slow period
        #[arg(long)]
        slow: Option<u32>,
    },
    /// Run one trade proposal through the safety gate
    CheckTrade {
        #[arg(long)]
        entry: Decimal,

        #[arg(long)]
        stop: Decimal,

        #[arg(long)]
        qty: Decimal,

        /// Account capital (default: INITIAL_CAPITAL)
        #[arg(long)]
        capital: Option<Decimal>,
    },
}

#[derive(Serialize)]
struct EvolutionExport<'a> {
    symbol: &'a str,
    period: BacktestPeriod,
    summary: &'a evotrade::application::optimization::engine::EvolutionSummary,
    history: &'a [evotrade::domain::evolution::report::GenerationStats],
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    let metrics = Metrics::new()?;
    let reporter = EvolutionReporter::default();

    match cli.command {
        Commands::Evolve {
            generations,
            population,
            seed,
            symbol,
            period,
            config: config_file,
            output,
            save_population,
        } => {
            let mut evolution = config.evolution.clone();
            if let Some(path) = config_file {
                info!("Loading evolution settings from: {:?}", path);
                evolution.apply_file(&path)?;
            }
            if let Some(size) = population {
                evolution.population_size = size;
            }
            if seed.is_some() {
                evolution.seed = seed;
            }
            if let Some(symbol) = symbol {
                evolution.symbol = symbol;
            }
            if let Some(period) = period {
                evolution.period = BacktestPeriod::from_str(&period)?;
            }
            let max_generations = generations.or(evolution.max_generations);

            let target = evolution.to_target();
            reporter.print_header(
                "EVOLUTION",
                &target.symbol,
                target.period.as_str(),
                &format!(
                    "population {}, mutation {:.2}, generations {}",
                    evolution.population_size,
                    evolution.mutation_rate,
                    max_generations.map_or_else(|| "until Ctrl-C".to_string(), |g| g.to_string())
                ),
            );

            let backtester = Backtester::new(config.data.build_market_data());
            let population = Population::new(evolution.to_population_config(), target.clone(), backtester)?;
            let sink = InMemoryResultsSink::new();

            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Ctrl-C received, finishing current generation");
                    let _ = shutdown_tx.send(true);
                }
            });

            let mut engine = EvolutionEngine::new(population, Arc::new(sink.clone()))
                .with_metrics(metrics.clone())
                .with_shutdown(shutdown_rx);
            let summary = engine.run(max_generations).await;

            let history = sink.generations().await;
            reporter.print_generations_table(&history);
            if let Some(best) = &summary.best_ever {
                reporter.print_organism(best);
            }

            reporter.export_json(
                &EvolutionExport {
                    symbol: &target.symbol,
                    period: target.period,
                    summary: &summary,
                    history: &history,
                },
                &output,
            )?;
            if let Some(path) = save_population {
                reporter.export_json(engine.population().organisms(), &path)?;
            }
        }
        Commands::Evaluate {
            input,
            count,
            seed,
            symbol,
            workers,
            top_n,
            output,
        } => {
            let organisms = match input {
                Some(path) => load_organisms(&path)?,
                None => {
                    let mut rng = StdRng::seed_from_u64(seed);
                    (0..count)
                        .map(|_| {
                            let id = new_id(&mut rng);
                            Organism::create_random(0, id, &mut rng)
                        })
                        .collect()
                }
            };

            let symbol = symbol.unwrap_or_else(|| config.evolution.symbol.clone());
            let evaluator_config = config
                .evaluator
                .to_evaluator_config(&symbol, config.evolution.initial_capital);
            let workers = workers.unwrap_or(evaluator_config.max_workers);

            reporter.print_header(
                "POPULATION TEST",
                &evaluator_config.symbol,
                "per family",
                &format!(
                    "{} organisms, {} workers, timeout {}s",
                    organisms.len(),
                    workers,
                    evaluator_config.unit_timeout.as_secs()
                ),
            );

            let sink: Arc<dyn ResultsSink> = Arc::new(InMemoryResultsSink::new());
            let evaluator = ParallelEvaluator::new(
                Backtester::new(config.data.build_market_data()),
                evaluator_config,
            )
            .with_sink(sink)
            .with_metrics(metrics.clone());

            let summary = evaluator.test_population(&organisms, workers).await;
            reporter.print_test_summary(&summary, top_n);
            reporter.export_json(&summary, &output)?;
        }
        Commands::Backtest {
            strategy,
            symbol,
            period,
            capital,
            fast,
            slow,
        } => {
            let name = StrategyName::from_str(&strategy)?;
            let kind = match StrategyKind::from_name(name) {
                StrategyKind::SmaCrossover(defaults) => StrategyKind::SmaCrossover(SmaCrossoverParams {
                    fast_period: fast.unwrap_or(defaults.fast_period),
                    slow_period: slow.unwrap_or(defaults.slow_period),
                }),
                StrategyKind::RsiStrategy(defaults) => StrategyKind::RsiStrategy(RsiParams {
                    period: fast.unwrap_or(defaults.period),
                    ..defaults
                }),
                other => other,
            };
            let symbol = symbol
                .unwrap_or_else(|| config.evolution.symbol.clone())
                .to_uppercase();
            let period = match period {
                Some(p) => BacktestPeriod::from_str(&p)?,
                None => config.evolution.period,
            };
            let capital = capital.unwrap_or(config.evolution.initial_capital);

            reporter.print_header("BACKTEST", &symbol, period.as_str(), &name.to_string());

            let backtester = Backtester::new(config.data.build_market_data());
            let record = backtester
                .run_backtest(&symbol, &kind, period, capital)
                .await
                .with_context(|| format!("Backtest of {} on {} failed", name, symbol))?;
            reporter.print_record(&name.to_string(), &record);
        }
        Commands::CheckTrade {
            entry,
            stop,
            qty,
            capital,
        } => {
            let capital = capital.unwrap_or(config.evolution.initial_capital);
            let mut gate = SafetyGate::new(config.safety.to_safety_config(), capital)
                .with_metrics(metrics.clone());
            let result = gate.validate_proposal(&TradeProposal {
                symbol: config.evolution.symbol.clone(),
                entry_price: entry,
                stop_loss: stop,
                quantity: qty,
                reason: "cli".to_string(),
            });
            match result.rejection_reason() {
                None => println!("✅ ALLOWED: entry {} stop {} qty {}", entry, stop, qty),
                Some(reason) => println!("⛔ DENIED: {}", reason),
            }
        }
    }

    if cli.metrics {
        println!("{}", metrics.render());
    }
    Ok(())
}

fn load_organisms(path: &Path) -> Result<Vec<Organism>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read organisms from {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse organisms in {:?}", path))
}
