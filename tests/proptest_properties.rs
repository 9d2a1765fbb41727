//! Property-based tests for fitness scoring, genome invariants and safety limits

use evotrade::application::risk_management::safety_gate::{GateStatus, SafetyGate};
use evotrade::domain::evolution::dna::Dna;
use evotrade::domain::performance::fitness::{MIN_TRADES, calculate_fitness};
use evotrade::domain::performance::metrics::PerformanceRecord;
use evotrade::domain::performance::stats::Stats;
use evotrade::domain::risk::risk_config::SafetyConfig;
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn record(sharpe: f64, sortino: f64, win_rate: f64, drawdown: f64, trades: usize) -> PerformanceRecord {
    PerformanceRecord {
        initial_capital: dec!(10000),
        final_equity: dec!(10000),
        total_return_pct: 0.0,
        max_drawdown_pct: drawdown,
        sharpe_ratio: sharpe,
        sortino_ratio: sortino,
        win_rate_pct: win_rate,
        total_trades: trades,
        trade_log: Vec::new(),
    }
}

proptest! {
    /// Fitness stays in [0, 1] whatever the metrics look like
    #[test]
    fn fitness_is_bounded(
        sharpe in -20.0f64..20.0,
        sortino in -20.0f64..20.0,
        win_rate in 0.0f64..100.0,
        drawdown in -100.0f64..0.0,
        trades in MIN_TRADES..500usize
    ) {
        let fitness = calculate_fitness(&record(sharpe, sortino, win_rate, drawdown, trades));
        prop_assert!((0.0..=1.0).contains(&fitness), "fitness out of range: {}", fitness);
    }

    /// Too few trades always scores zero
    #[test]
    fn fitness_is_zero_below_min_trades(
        sharpe in 0.0f64..5.0,
        win_rate in 0.0f64..100.0,
        trades in 0..MIN_TRADES
    ) {
        prop_assert_eq!(calculate_fitness(&record(sharpe, sharpe, win_rate, 0.0, trades)), 0.0);
    }

    /// Better ratios never lower the score; deeper drawdowns never raise it
    #[test]
    fn fitness_is_monotone(
        sharpe in -1.0f64..4.0,
        sortino in -1.0f64..6.0,
        win_rate in 0.0f64..90.0,
        drawdown in -40.0f64..0.0,
        bump in 0.0f64..10.0
    ) {
        let base = calculate_fitness(&record(sharpe, sortino, win_rate, drawdown, 20));
        prop_assert!(calculate_fitness(&record(sharpe + bump, sortino, win_rate, drawdown, 20)) >= base);
        prop_assert!(calculate_fitness(&record(sharpe, sortino + bump, win_rate, drawdown, 20)) >= base);
        prop_assert!(calculate_fitness(&record(sharpe, sortino, (win_rate + bump).min(100.0), drawdown, 20)) >= base);
        prop_assert!(calculate_fitness(&record(sharpe, sortino, win_rate, drawdown - bump, 20)) <= base);
    }

    /// Random, bred and mutated genomes keep the fast average below the slow one
    #[test]
    fn genomes_keep_moving_average_order(seed in any::<u64>(), rate in 0.0f64..1.0) {
        let mut rng = StdRng::seed_from_u64(seed);
        let a = Dna::random(&mut rng);
        let b = Dna::random(&mut rng);
        prop_assert!(a.ma_fast() < a.ma_slow());

        let mut child = a.crossover(&b, &mut rng);
        for _ in 0..5 {
            child.mutate(rate, &mut rng);
            prop_assert!(child.ma_fast() < child.ma_slow());
            prop_assert!(Dna::new(child.to_params()).is_ok());
        }
    }

    /// Drawdown of any positive equity curve is a non-positive fraction
    #[test]
    fn drawdown_is_non_positive(curve in prop::collection::vec(1.0f64..1000.0, 1..200)) {
        let dd = Stats::max_drawdown(&curve);
        prop_assert!((-1.0..=0.0).contains(&dd), "drawdown {}", dd);
    }

    /// The losing streak equals the trailing run of losses since the last win
    #[test]
    fn streak_tracks_trailing_losses(pnls in prop::collection::vec(-50i64..50, 0..40)) {
        let config = SafetyConfig {
            max_consecutive_losses: 1000,
            max_trades_per_day: 1000,
            ..SafetyConfig::default()
        };
        let mut gate = SafetyGate::new(config, dec!(100000));
        let mut expected = 0u32;
        for pnl in &pnls {
            gate.record_trade_result(Decimal::from(*pnl));
            if *pnl > 0 {
                expected = 0;
            } else if *pnl < 0 {
                expected += 1;
            }
        }
        prop_assert_eq!(gate.state().consecutive_losses, expected);
        prop_assert_eq!(gate.state().trades_today as usize, pnls.len());
        prop_assert_eq!(gate.status(), GateStatus::Armed);
    }
}
