//! Fee model for the three priority tiers
//!
//! The network fee shown to the user is a fixed base fee scaled by a tier
//! multiplier. The priority fee attached to the transaction is a separate
//! per-compute-unit price, also keyed by tier.

use super::request::parse_amount;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Digits shown for every fee and total
pub const FEE_DISPLAY_DECIMALS: u32 = 6;

/// Base network fee in SOL (0.000005)
pub const BASE_FEE: Decimal = Decimal::from_parts(5, 0, 0, false, 6);

/// Priority level chosen per transfer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum PriorityTier {
    Low,
    #[default]
    Normal,
    High,
}

impl PriorityTier {
    pub const ALL: [PriorityTier; 3] = [PriorityTier::Low, PriorityTier::Normal, PriorityTier::High];

    /// Multiplier applied to [`BASE_FEE`]
    pub fn multiplier(&self) -> Decimal {
        match self {
            PriorityTier::Low => Decimal::new(5, 1),
            PriorityTier::Normal => Decimal::ONE,
            PriorityTier::High => Decimal::TWO,
        }
    }

    /// Compute unit price in micro-lamports
    pub fn priority_fee_rate(&self) -> u64 {
        match self {
            PriorityTier::Low => 10_000,
            PriorityTier::Normal => 50_000,
            PriorityTier::High => 100_000,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityTier::Low => "low",
            PriorityTier::Normal => "normal",
            PriorityTier::High => "high",
        }
    }
}

/// Unrecognised tiers fall back to `Normal`.
impl From<&str> for PriorityTier {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => PriorityTier::Low,
            "high" => PriorityTier::High,
            _ => PriorityTier::Normal,
        }
    }
}

impl From<String> for PriorityTier {
    fn from(value: String) -> Self {
        PriorityTier::from(value.as_str())
    }
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a half-way digit is resolved when rounding to display precision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    #[default]
    HalfUp,
    HalfEven,
}

impl RoundingMode {
    fn strategy(&self) -> RoundingStrategy {
        match self {
            RoundingMode::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
        }
    }
}

/// Fee figures for one tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    pub tier: PriorityTier,
    /// Network fee in SOL, rounded to display precision
    pub network_fee: Decimal,
    /// Micro-lamports per compute unit
    pub priority_fee_rate: u64,
}

impl FeeQuote {
    pub fn network_fee_display(&self) -> String {
        render(self.network_fee)
    }
}

/// Pure fee calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct FeeModel {
    rounding: RoundingMode,
}

impl FeeModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rounding(rounding: RoundingMode) -> Self {
        Self { rounding }
    }

    pub fn rounding(&self) -> RoundingMode {
        self.rounding
    }

    /// Network fee for a tier, rounded to six decimals
    pub fn network_fee(&self, tier: PriorityTier) -> Decimal {
        self.round(BASE_FEE * tier.multiplier())
    }

    pub fn priority_fee_rate(&self, tier: PriorityTier) -> u64 {
        tier.priority_fee_rate()
    }

    pub fn quote(&self, tier: PriorityTier) -> FeeQuote {
        FeeQuote {
            tier,
            network_fee: self.network_fee(tier),
            priority_fee_rate: self.priority_fee_rate(tier),
        }
    }

    /// `amount + network_fee(tier)` with six decimals, or `"0"` when the
    /// amount is empty, not a non-negative decimal, or too large to show
    /// with six decimals
    pub fn total(&self, amount: &str, tier: PriorityTier) -> String {
        parse_amount(amount)
            .filter(|amount| !amount.is_sign_negative())
            .and_then(|amount| amount.checked_add(self.network_fee(tier)))
            .and_then(|total| render_exact(self.round(total)))
            .unwrap_or_else(|| "0".to_string())
    }

    fn round(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(FEE_DISPLAY_DECIMALS, self.rounding.strategy())
    }
}

fn render(mut value: Decimal) -> String {
    value.rescale(FEE_DISPLAY_DECIMALS);
    value.to_string()
}

/// Like [`render`], but `None` when the value has too many integer digits
/// to carry six decimals
fn render_exact(mut value: Decimal) -> Option<String> {
    value.rescale(FEE_DISPLAY_DECIMALS);
    (value.scale() == FEE_DISPLAY_DECIMALS).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_fee_constant() {
        assert_eq!(BASE_FEE.to_string(), "0.000005");
    }

    #[test]
    fn tabulated_network_fees() {
        let model = FeeModel::new();
        assert_eq!(model.quote(PriorityTier::Low).network_fee_display(), "0.000003");
        assert_eq!(model.quote(PriorityTier::Normal).network_fee_display(), "0.000005");
        assert_eq!(model.quote(PriorityTier::High).network_fee_display(), "0.000010");
    }

    #[test]
    fn high_is_double_normal() {
        let model = FeeModel::new();
        assert_eq!(
            model.network_fee(PriorityTier::High),
            model.network_fee(PriorityTier::Normal) * Decimal::TWO
        );
    }

    #[test]
    fn unrounded_fees_scale_by_four_from_low_to_high() {
        let low = BASE_FEE * PriorityTier::Low.multiplier();
        let high = BASE_FEE * PriorityTier::High.multiplier();
        assert_eq!(high, low * Decimal::from(4));
    }

    #[test]
    fn half_even_rounds_low_tier_down() {
        let model = FeeModel::with_rounding(RoundingMode::HalfEven);
        assert_eq!(model.quote(PriorityTier::Low).network_fee_display(), "0.000002");
        assert_eq!(model.total("0.1234", PriorityTier::Low), "0.123402");
    }

    #[test]
    fn priority_fee_rates() {
        let model = FeeModel::new();
        assert_eq!(model.priority_fee_rate(PriorityTier::Low), 10_000);
        assert_eq!(model.priority_fee_rate(PriorityTier::Normal), 50_000);
        assert_eq!(model.priority_fee_rate(PriorityTier::High), 100_000);
    }

    #[test]
    fn totals() {
        let model = FeeModel::new();
        assert_eq!(model.total("1.5", PriorityTier::Normal), "1.500005");
        assert_eq!(model.total("2", PriorityTier::High), "2.000010");
        assert_eq!(model.total("0.1234", PriorityTier::Low), "0.123403");
    }

    #[test]
    fn total_of_empty_or_garbage_is_zero() {
        let model = FeeModel::new();
        for tier in PriorityTier::ALL {
            assert_eq!(model.total("", tier), "0");
            assert_eq!(model.total("abc", tier), "0");
            assert_eq!(model.total("-1", tier), "0");
        }
    }

    #[test]
    fn total_too_large_for_six_decimals_is_zero() {
        let model = FeeModel::new();
        assert_eq!(model.total("79228162514264337593543950335", PriorityTier::High), "0");
        assert_eq!(model.total("100000000000000000000000", PriorityTier::Normal), "0");
        assert_eq!(
            model.total("1000000000000000000000", PriorityTier::Normal),
            "1000000000000000000000.000005"
        );
    }

    #[test]
    fn unknown_tier_fails_closed_to_normal() {
        assert_eq!(PriorityTier::from("urgent"), PriorityTier::Normal);
        assert_eq!(PriorityTier::from("HIGH"), PriorityTier::High);
        let tier: PriorityTier = serde_json::from_str("\"bogus\"").unwrap();
        assert_eq!(tier, PriorityTier::Normal);
        assert_eq!(serde_json::to_string(&PriorityTier::Low).unwrap(), "\"low\"");
    }
}
