//! Shared arithmetic for the cost worksheets: unit conversion and rounding.
//!
//! Products and sums are checked: `None` means the result does not fit in a
//! [`Decimal`].

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// 元 per 万元.
pub const YUAN_PER_TEN_THOUSAND: Decimal = dec!(10000);

/// Square meters in one mu.
pub const SQUARE_METERS_PER_MU: Decimal = dec!(666.6666666667);

/// How a line's rate converts into 万元 per unit of quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateUnit {
    /// Rate already in 万元 per unit.
    TenThousandYuan,
    /// Rate in 元 per unit.
    Yuan,
    /// Rate in 元 per square meter applied to a quantity in mu.
    YuanPerSquareMeter,
}

impl RateUnit {
    /// The unit price shown on the estimate line.
    ///
    /// Per-square-meter rates are shown as entered; only the cost is converted.
    pub fn unit_price(
        &self,
        rate: Decimal,
    ) -> Decimal {
        match self {
            Self::TenThousandYuan | Self::YuanPerSquareMeter => rate,
            Self::Yuan => rate / YUAN_PER_TEN_THOUSAND,
        }
    }

    pub fn cost(
        &self,
        quantity: Decimal,
        rate: Decimal,
    ) -> Option<Decimal> {
        let product = quantity.checked_mul(rate)?;
        match self {
            Self::TenThousandYuan => Some(product),
            Self::Yuan => product.checked_div(YUAN_PER_TEN_THOUSAND),
            Self::YuanPerSquareMeter => product
                .checked_mul(SQUARE_METERS_PER_MU)?
                .checked_div(YUAN_PER_TEN_THOUSAND),
        }
    }
}

/// Sum of `values`, or `None` on overflow.
pub fn checked_sum(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, Decimal::checked_add)
}

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use landcost_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}
