use bigdecimal::{BigDecimal, RoundingMode, Zero};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

const PRICE_SCALE: i64 = 2;
/// Bound on significant digits and on the exponent magnitude of accepted text.
const MAX_DIGITS: i64 = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PriceError {
    #[error("invalid price text {0:?}")]
    Invalid(String),
    #[error("negative price {0}")]
    Negative(String),
    #[error("price out of range")]
    OutOfRange,
}

/// Monetary amount with exactly two fractional digits.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(BigDecimal);

impl Price {
    /// Parses `text` with `.` as the decimal point and quantizes it to cents,
    /// rounding half to even.
    pub fn parse(text: &str) -> Result<Self, PriceError> {
        let trimmed = text.trim();
        let value =
            BigDecimal::from_str(trimmed).map_err(|_| PriceError::Invalid(trimmed.to_string()))?;
        Self::from_decimal(value)
    }

    /// Same as [`Price::parse`] but also accepts `,` as the decimal separator.
    pub fn parse_localized(text: &str) -> Result<Self, PriceError> {
        Self::parse(&text.trim().replace(',', "."))
    }

    pub fn from_decimal(value: BigDecimal) -> Result<Self, PriceError> {
        let (_, scale) = value.as_bigint_and_exponent();
        if value.digits() as i64 > MAX_DIGITS || scale.abs() > MAX_DIGITS {
            return Err(PriceError::OutOfRange);
        }
        if value < BigDecimal::zero() {
            return Err(PriceError::Negative(value.to_string()));
        }
        Ok(Self(value.with_scale_round(PRICE_SCALE, RoundingMode::HalfEven)))
    }

    /// Renders the amount with a decimal comma, e.g. `1234,56`.
    pub fn to_comma_string(&self) -> String {
        self.to_string().replace('.', ",")
    }
}

impl Display for Price {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // BigDecimal renders some quantized values (zero) without the cents.
        let (digits, scale) = self.0.as_bigint_and_exponent();
        let mut cents = digits.to_string();
        if scale < PRICE_SCALE {
            cents.push_str(&"0".repeat((PRICE_SCALE - scale) as usize));
        } else {
            cents.truncate(cents.len().saturating_sub((scale - PRICE_SCALE) as usize));
        }
        let cents = format!("{cents:0>3}");
        let (whole, fraction) = cents.split_at(cents.len() - PRICE_SCALE as usize);
        write!(f, "{whole}.{fraction}")
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
