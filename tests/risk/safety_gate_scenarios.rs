use evotrade::application::risk_management::safety_gate::{GateStatus, SafetyGate};
use evotrade::domain::errors::SafetyViolation;
use evotrade::domain::risk::risk_config::SafetyConfig;
use evotrade::domain::risk::validation::ValidationResult;
use evotrade::domain::trading::types::TradeProposal;
use evotrade::infrastructure::observability::Metrics;
use rust_decimal_macros::dec;

fn gate() -> SafetyGate {
    SafetyGate::new(SafetyConfig::default(), dec!(100000))
}

#[test]
fn test_tight_stop_allowed_wide_stop_denied() {
    crate::common::init_tracing();
    let mut gate = gate();

    // Position 10k of 20k allowed, risk 100 of 500 allowed
    assert_eq!(
        gate.validate_trade(dec!(100), dec!(99), dec!(100)),
        ValidationResult::Approve
    );

    // Risk 600 > 500
    let result = gate.validate_trade(dec!(100), dec!(94), dec!(100));
    assert!(matches!(
        result.violation(),
        Some(SafetyViolation::RiskPerTradeLimit { .. })
    ));
    assert!(result.rejection_reason().unwrap().contains("Risk per trade"));
    // A per-trade denial does not trip the breaker
    assert_eq!(gate.status(), GateStatus::Armed);
}

#[test]
fn test_daily_loss_trips_and_recovery_does_not_rearm() {
    let mut gate = gate();

    gate.update_capital(dec!(98000));
    let denied = gate.validate_trade(dec!(100), dec!(99), dec!(10));
    assert!(matches!(
        denied.violation(),
        Some(SafetyViolation::DailyLossLimit { .. })
    ));
    assert_eq!(gate.status(), GateStatus::Tripped);

    gate.update_capital(dec!(105000));
    let still_denied = gate.validate_trade(dec!(100), dec!(99), dec!(10));
    match still_denied.violation() {
        Some(SafetyViolation::CircuitBreakerActive { reason }) => {
            assert!(reason.contains("Daily loss"));
        }
        other => panic!("expected breaker denial, got {:?}", other),
    }

    gate.reset_session(dec!(105000));
    assert!(gate.validate_trade(dec!(100), dec!(99), dec!(10)).is_approved());
}

#[test]
fn test_five_losses_trip_the_breaker() {
    let mut gate = gate();
    for _ in 0..4 {
        gate.record_trade_result(dec!(-10));
        assert_eq!(gate.status(), GateStatus::Armed);
    }
    gate.record_trade_result(dec!(-10));
    assert_eq!(gate.status(), GateStatus::Tripped);
    assert_eq!(gate.state().consecutive_losses, 5);

    let result = gate.validate_trade(dec!(100), dec!(99), dec!(10));
    assert!(result.is_rejected());
    assert!(result.rejection_reason().unwrap().contains("Consecutive loss"));
}

#[test]
fn test_interleaved_win_keeps_gate_armed() {
    let mut gate = gate();
    for pnl in [dec!(-10), dec!(-10), dec!(-10), dec!(-10), dec!(25), dec!(-10)] {
        gate.record_trade_result(pnl);
    }
    assert_eq!(gate.state().consecutive_losses, 1);
    assert_eq!(gate.status(), GateStatus::Armed);
}

#[test]
fn test_proposal_path_and_metrics() {
    let metrics = Metrics::new().unwrap();
    let mut gate = gate().with_metrics(metrics.clone());

    let oversized = TradeProposal {
        symbol: "SPY".to_string(),
        entry_price: dec!(500),
        stop_loss: dec!(499),
        quantity: dec!(100),
        reason: "breakout".to_string(),
    };
    let result = gate.validate_proposal(&oversized);
    assert!(matches!(
        result.violation(),
        Some(SafetyViolation::PositionSizeLimit { .. })
    ));

    for _ in 0..5 {
        gate.record_trade_result(dec!(-1));
    }

    let rendered = metrics.render();
    assert!(rendered.contains("position_size"));
    assert!(rendered.contains("evotrade_circuit_breaker_status 1"));
}
