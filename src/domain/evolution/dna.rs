//! Typed strategy genome.
//!
//! `ma_slow` is stored as `ma_fast + ma_spread` with a non-zero spread, so
//! every `Dna` value satisfies `ma_fast < ma_slow`.

use crate::domain::errors::{ConfigError, DnaError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::ops::{Range, RangeInclusive};
use std::str::FromStr;

/// Hard bounds every gene must respect (validated at construction)
pub mod bounds {
    use std::ops::RangeInclusive;

    pub const RSI_PERIOD: RangeInclusive<u32> = 2..=50;
    pub const RSI_OVERBOUGHT: RangeInclusive<u32> = 51..=95;
    pub const RSI_OVERSOLD: RangeInclusive<u32> = 5..=49;
    pub const MA_FAST: RangeInclusive<u32> = 2..=150;
    pub const MA_SLOW: RangeInclusive<u32> = 3..=400;
    pub const STOP_LOSS_PCT: RangeInclusive<f64> = 0.1..=50.0;
    pub const TAKE_PROFIT_PCT: RangeInclusive<f64> = 0.1..=100.0;
    pub const MAX_POSITION_SIZE_PCT: RangeInclusive<f64> = 0.1..=100.0;
    pub const TRAILING_STOP_ACTIVATION: RangeInclusive<f64> = 0.1..=50.0;
}

// Initial draw distributions
const INIT_RSI_PERIOD: RangeInclusive<u32> = 7..=21;
const INIT_RSI_OVERBOUGHT: RangeInclusive<u32> = 65..=80;
const INIT_RSI_OVERSOLD: RangeInclusive<u32> = 20..=35;
const INIT_MA_FAST: RangeInclusive<u32> = 5..=50;
const INIT_MA_SLOW: RangeInclusive<u32> = 20..=200;
const INIT_STOP_LOSS_PCT: Range<f64> = 1.0..5.0;
const INIT_TAKE_PROFIT_PCT: Range<f64> = 2.0..10.0;
const INIT_MAX_POSITION_SIZE_PCT: Range<f64> = 5.0..20.0;
const INIT_TRAILING_STOP_ACTIVATION: Range<f64> = 1.0..5.0;

// Mutation step sizes
const RSI_PERIOD_STEP: i64 = 3;
const RSI_THRESHOLD_STEP: i64 = 5;
const MA_FAST_STEP: i64 = 5;
const MA_SLOW_STEP: i64 = 10;
const PCT_FACTOR: RangeInclusive<f64> = 0.8..=1.2;
const PCT_FLOOR: f64 = 0.1;

/// Categorical gene selecting the strategy flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    TrendFollowing,
    MeanReversion,
    Breakout,
}

impl StrategyType {
    pub const ALL: [StrategyType; 3] = [
        StrategyType::TrendFollowing,
        StrategyType::MeanReversion,
        StrategyType::Breakout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyType::TrendFollowing => "trend_following",
            StrategyType::MeanReversion => "mean_reversion",
            StrategyType::Breakout => "breakout",
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StrategyType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trend_following" => Ok(StrategyType::TrendFollowing),
            "mean_reversion" => Ok(StrategyType::MeanReversion),
            "breakout" => Ok(StrategyType::Breakout),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Flat, unvalidated view of a genome using the public gene names.
/// This is also the serialized form of [`Dna`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnaParams {
    pub rsi_period: u32,
    pub rsi_overbought: u32,
    pub rsi_oversold: u32,
    pub ma_fast: u32,
    pub ma_slow: u32,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub max_position_size_pct: f64,
    pub trailing_stop_activation: f64,
    pub strategy_type: StrategyType,
}

impl Default for DnaParams {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            rsi_overbought: 70,
            rsi_oversold: 30,
            ma_fast: 10,
            ma_slow: 50,
            stop_loss_pct: 2.0,
            take_profit_pct: 5.0,
            max_position_size_pct: 10.0,
            trailing_stop_activation: 2.0,
            strategy_type: StrategyType::TrendFollowing,
        }
    }
}

/// Value of a single gene, used when rendering a genome as a key/value map
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GeneValue {
    Int(u32),
    Float(f64),
    Category(StrategyType),
}

impl fmt::Display for GeneValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneValue::Int(v) => write!(f, "{}", v),
            GeneValue::Float(v) => write!(f, "{:.3}", v),
            GeneValue::Category(v) => write!(f, "{}", v),
        }
    }
}

/// Validated strategy genome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DnaParams", into = "DnaParams")]
pub struct Dna {
    rsi_period: u32,
    rsi_overbought: u32,
    rsi_oversold: u32,
    ma_fast: u32,
    ma_spread: NonZeroU32,
    stop_loss_pct: f64,
    take_profit_pct: f64,
    max_position_size_pct: f64,
    trailing_stop_activation: f64,
    strategy_type: StrategyType,
}

impl Dna {
    /// Build a genome, rejecting any gene outside its bounds
    pub fn new(params: DnaParams) -> Result<Self, DnaError> {
        check_int("rsi_period", params.rsi_period, &bounds::RSI_PERIOD)?;
        check_int("rsi_overbought", params.rsi_overbought, &bounds::RSI_OVERBOUGHT)?;
        check_int("rsi_oversold", params.rsi_oversold, &bounds::RSI_OVERSOLD)?;
        check_int("ma_fast", params.ma_fast, &bounds::MA_FAST)?;
        check_int("ma_slow", params.ma_slow, &bounds::MA_SLOW)?;
        check_float("stop_loss_pct", params.stop_loss_pct, &bounds::STOP_LOSS_PCT)?;
        check_float(
            "take_profit_pct",
            params.take_profit_pct,
            &bounds::TAKE_PROFIT_PCT,
        )?;
        check_float(
            "max_position_size_pct",
            params.max_position_size_pct,
            &bounds::MAX_POSITION_SIZE_PCT,
        )?;
        check_float(
            "trailing_stop_activation",
            params.trailing_stop_activation,
            &bounds::TRAILING_STOP_ACTIVATION,
        )?;

        let ma_spread = params
            .ma_slow
            .checked_sub(params.ma_fast)
            .and_then(NonZeroU32::new)
            .ok_or(DnaError::MovingAverageOrder {
                fast: params.ma_fast,
                slow: params.ma_slow,
            })?;

        Ok(Self {
            rsi_period: params.rsi_period,
            rsi_overbought: params.rsi_overbought,
            rsi_oversold: params.rsi_oversold,
            ma_fast: params.ma_fast,
            ma_spread,
            stop_loss_pct: params.stop_loss_pct,
            take_profit_pct: params.take_profit_pct,
            max_position_size_pct: params.max_position_size_pct,
            trailing_stop_activation: params.trailing_stop_activation,
            strategy_type: params.strategy_type,
        })
    }

    /// Draw every gene from its initial distribution
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let fast = rng.random_range(INIT_MA_FAST);
        let slow = rng.random_range(INIT_MA_SLOW);
        let (ma_fast, ma_spread) = ordered_moving_averages(fast, slow);

        Self {
            rsi_period: rng.random_range(INIT_RSI_PERIOD),
            rsi_overbought: rng.random_range(INIT_RSI_OVERBOUGHT),
            rsi_oversold: rng.random_range(INIT_RSI_OVERSOLD),
            ma_fast,
            ma_spread,
            stop_loss_pct: rng.random_range(INIT_STOP_LOSS_PCT),
            take_profit_pct: rng.random_range(INIT_TAKE_PROFIT_PCT),
            max_position_size_pct: rng.random_range(INIT_MAX_POSITION_SIZE_PCT),
            trailing_stop_activation: rng.random_range(INIT_TRAILING_STOP_ACTIVATION),
            strategy_type: StrategyType::random(rng),
        }
    }

    /// Perturb each gene independently with probability `rate`
    pub fn mutate<R: Rng + ?Sized>(&mut self, rate: f64, rng: &mut R) {
        let rate = if rate.is_finite() {
            rate.clamp(0.0, 1.0)
        } else {
            0.0
        };

        if rng.random_bool(rate) {
            self.rsi_period = step_int(self.rsi_period, RSI_PERIOD_STEP, &bounds::RSI_PERIOD, rng);
        }
        if rng.random_bool(rate) {
            self.rsi_overbought = step_int(
                self.rsi_overbought,
                RSI_THRESHOLD_STEP,
                &bounds::RSI_OVERBOUGHT,
                rng,
            );
        }
        if rng.random_bool(rate) {
            self.rsi_oversold = step_int(
                self.rsi_oversold,
                RSI_THRESHOLD_STEP,
                &bounds::RSI_OVERSOLD,
                rng,
            );
        }

        let mut fast = self.ma_fast;
        let mut slow = self.ma_slow();
        if rng.random_bool(rate) {
            fast = step_int(fast, MA_FAST_STEP, &bounds::MA_FAST, rng);
        }
        if rng.random_bool(rate) {
            slow = step_int(slow, MA_SLOW_STEP, &bounds::MA_SLOW, rng);
        }
        (self.ma_fast, self.ma_spread) = ordered_moving_averages(fast, slow);

        if rng.random_bool(rate) {
            self.stop_loss_pct = scale_pct(self.stop_loss_pct, &bounds::STOP_LOSS_PCT, rng);
        }
        if rng.random_bool(rate) {
            self.take_profit_pct = scale_pct(self.take_profit_pct, &bounds::TAKE_PROFIT_PCT, rng);
        }
        if rng.random_bool(rate) {
            self.max_position_size_pct = scale_pct(
                self.max_position_size_pct,
                &bounds::MAX_POSITION_SIZE_PCT,
                rng,
            );
        }
        if rng.random_bool(rate) {
            self.trailing_stop_activation = scale_pct(
                self.trailing_stop_activation,
                &bounds::TRAILING_STOP_ACTIVATION,
                rng,
            );
        }
        if rng.random_bool(rate) {
            self.strategy_type = StrategyType::random(rng);
        }
    }

    /// Uniform crossover: every gene comes from `self` or `partner` with equal odds
    pub fn crossover<R: Rng + ?Sized>(&self, partner: &Dna, rng: &mut R) -> Dna {
        let fast = pick(self.ma_fast, partner.ma_fast, rng);
        let slow = pick(self.ma_slow(), partner.ma_slow(), rng);
        let (ma_fast, ma_spread) = ordered_moving_averages(fast, slow);

        Dna {
            rsi_period: pick(self.rsi_period, partner.rsi_period, rng),
            rsi_overbought: pick(self.rsi_overbought, partner.rsi_overbought, rng),
            rsi_oversold: pick(self.rsi_oversold, partner.rsi_oversold, rng),
            ma_fast,
            ma_spread,
            stop_loss_pct: pick(self.stop_loss_pct, partner.stop_loss_pct, rng),
            take_profit_pct: pick(self.take_profit_pct, partner.take_profit_pct, rng),
            max_position_size_pct: pick(
                self.max_position_size_pct,
                partner.max_position_size_pct,
                rng,
            ),
            trailing_stop_activation: pick(
                self.trailing_stop_activation,
                partner.trailing_stop_activation,
                rng,
            ),
            strategy_type: pick(self.strategy_type, partner.strategy_type, rng),
        }
    }

    pub fn rsi_period(&self) -> u32 {
        self.rsi_period
    }

    pub fn rsi_overbought(&self) -> u32 {
        self.rsi_overbought
    }

    pub fn rsi_oversold(&self) -> u32 {
        self.rsi_oversold
    }

    pub fn ma_fast(&self) -> u32 {
        self.ma_fast
    }

    pub fn ma_slow(&self) -> u32 {
        self.ma_fast + self.ma_spread.get()
    }

    pub fn stop_loss_pct(&self) -> f64 {
        self.stop_loss_pct
    }

    pub fn take_profit_pct(&self) -> f64 {
        self.take_profit_pct
    }

    pub fn max_position_size_pct(&self) -> f64 {
        self.max_position_size_pct
    }

    pub fn trailing_stop_activation(&self) -> f64 {
        self.trailing_stop_activation
    }

    pub fn strategy_type(&self) -> StrategyType {
        self.strategy_type
    }

    pub fn to_params(&self) -> DnaParams {
        DnaParams {
            rsi_period: self.rsi_period,
            rsi_overbought: self.rsi_overbought,
            rsi_oversold: self.rsi_oversold,
            ma_fast: self.ma_fast,
            ma_slow: self.ma_slow(),
            stop_loss_pct: self.stop_loss_pct,
            take_profit_pct: self.take_profit_pct,
            max_position_size_pct: self.max_position_size_pct,
            trailing_stop_activation: self.trailing_stop_activation,
            strategy_type: self.strategy_type,
        }
    }

    /// Genes in their fixed key order
    pub fn genes(&self) -> Vec<(&'static str, GeneValue)> {
        vec![
            ("rsi_period", GeneValue::Int(self.rsi_period)),
            ("rsi_overbought", GeneValue::Int(self.rsi_overbought)),
            ("rsi_oversold", GeneValue::Int(self.rsi_oversold)),
            ("ma_fast", GeneValue::Int(self.ma_fast)),
            ("ma_slow", GeneValue::Int(self.ma_slow())),
            ("stop_loss_pct", GeneValue::Float(self.stop_loss_pct)),
            ("take_profit_pct", GeneValue::Float(self.take_profit_pct)),
            (
                "max_position_size_pct",
                GeneValue::Float(self.max_position_size_pct),
            ),
            (
                "trailing_stop_activation",
                GeneValue::Float(self.trailing_stop_activation),
            ),
            ("strategy_type", GeneValue::Category(self.strategy_type)),
        ]
    }
}

impl Default for Dna {
    fn default() -> Self {
        // DnaParams::default() lies inside every bound
        Self {
            rsi_period: 14,
            rsi_overbought: 70,
            rsi_oversold: 30,
            ma_fast: 10,
            ma_spread: NonZeroU32::MIN.saturating_add(39),
            stop_loss_pct: 2.0,
            take_profit_pct: 5.0,
            max_position_size_pct: 10.0,
            trailing_stop_activation: 2.0,
            strategy_type: StrategyType::TrendFollowing,
        }
    }
}

impl TryFrom<DnaParams> for Dna {
    type Error = DnaError;

    fn try_from(params: DnaParams) -> Result<Self, Self::Error> {
        Dna::new(params)
    }
}

impl From<Dna> for DnaParams {
    fn from(dna: Dna) -> Self {
        dna.to_params()
    }
}

impl fmt::Display for Dna {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .genes()
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        write!(f, "{}", rendered.join(" "))
    }
}

/// Order a (fast, slow) pair and express it as (fast, non-zero spread).
/// Equal periods become (p, p + 1).
fn ordered_moving_averages(a: u32, b: u32) -> (u32, NonZeroU32) {
    let (fast, slow) = if a <= b { (a, b) } else { (b, a) };
    let spread = NonZeroU32::new(slow - fast).unwrap_or(NonZeroU32::MIN);
    (fast, spread)
}

fn step_int<R: Rng + ?Sized>(
    value: u32,
    max_step: i64,
    range: &RangeInclusive<u32>,
    rng: &mut R,
) -> u32 {
    let delta = rng.random_range(-max_step..=max_step);
    let stepped = (value as i64 + delta).clamp(*range.start() as i64, *range.end() as i64);
    stepped as u32
}

fn scale_pct<R: Rng + ?Sized>(value: f64, range: &RangeInclusive<f64>, rng: &mut R) -> f64 {
    let factor = rng.random_range(PCT_FACTOR);
    (value * factor).max(PCT_FLOOR).min(*range.end())
}

fn pick<T: Copy, R: Rng + ?Sized>(mine: T, theirs: T, rng: &mut R) -> T {
    if rng.random_bool(0.5) { mine } else { theirs }
}

fn check_int(gene: &'static str, value: u32, range: &RangeInclusive<u32>) -> Result<(), DnaError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(DnaError::OutOfRange {
            gene,
            value: value as f64,
            min: *range.start() as f64,
            max: *range.end() as f64,
        })
    }
}

fn check_float(gene: &'static str, value: f64, range: &RangeInclusive<f64>) -> Result<(), DnaError> {
    if !value.is_finite() {
        return Err(DnaError::NotFinite { gene, value });
    }
    if range.contains(&value) {
        Ok(())
    } else {
        Err(DnaError::OutOfRange {
            gene,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}
