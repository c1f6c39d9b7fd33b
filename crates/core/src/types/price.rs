//! Money amounts using decimal arithmetic.
//!
//! Product and service prices are stored as `NUMERIC(12,2)`. Order totals are
//! computed server-side from these values, never from client input.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors produced when validating a price amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    /// Amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// Amount has more than two decimal places.
    #[error("price can have at most 2 decimal places")]
    TooPrecise,
    /// Amount exceeds the storable maximum.
    #[error("price must be at most {0}")]
    TooLarge(Decimal),
    /// Unknown ISO 4217 code.
    #[error("unsupported currency code: {0}")]
    UnknownCurrency(String),
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Largest amount that fits `NUMERIC(12,2)`.
    pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Check that an amount is storable as a catalog price.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] for negative, over-precise or oversized amounts.
    pub fn validate_amount(amount: Decimal) -> Result<Decimal, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount.normalize().scale() > 2 {
            return Err(PriceError::TooPrecise);
        }
        if amount > Self::MAX_AMOUNT {
            return Err(PriceError::TooLarge(Self::MAX_AMOUNT));
        }
        Ok(amount.round_dp(2))
    }

    /// Total for `quantity` units at this price.
    #[must_use]
    pub fn line_total(unit_price: Decimal, quantity: u32) -> Decimal {
        unit_price * Decimal::from(quantity)
    }

    /// Sum of `(unit_price, quantity)` lines.
    #[must_use]
    pub fn order_total<I>(lines: I) -> Decimal
    where
        I: IntoIterator<Item = (Decimal, u32)>,
    {
        lines
            .into_iter()
            .map(|(price, qty)| Self::line_total(price, qty))
            .sum()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:.2}", self.currency_code.symbol(), self.amount)
    }
}

/// ISO 4217 currency codes a store may sell in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    #[default]
    Usd,
    Eur,
    Gbp,
    Mxn,
    Ars,
    Clp,
    Cop,
    Pen,
    Brl,
}

impl CurrencyCode {
    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Usd | Self::Mxn | Self::Ars | Self::Clp | Self::Cop => "$",
            Self::Eur => "€",
            Self::Gbp => "£",
            Self::Pen => "S/",
            Self::Brl => "R$",
        }
    }

    /// ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Mxn => "MXN",
            Self::Ars => "ARS",
            Self::Clp => "CLP",
            Self::Cop => "COP",
            Self::Pen => "PEN",
            Self::Brl => "BRL",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            "MXN" => Ok(Self::Mxn),
            "ARS" => Ok(Self::Ars),
            "CLP" => Ok(Self::Clp),
            "COP" => Ok(Self::Cop),
            "PEN" => Ok(Self::Pen),
            "BRL" => Ok(Self::Brl),
            _ => Err(PriceError::UnknownCurrency(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).expect("decimal")
    }

    #[test]
    fn test_validate_amount() {
        assert_eq!(Price::validate_amount(dec("19.99")), Ok(dec("19.99")));
        assert_eq!(Price::validate_amount(dec("0")), Ok(dec("0")));
        assert_eq!(Price::validate_amount(dec("10.500")), Ok(dec("10.50")));
        assert_eq!(
            Price::validate_amount(dec("-1")),
            Err(PriceError::Negative)
        );
        assert_eq!(
            Price::validate_amount(dec("1.999")),
            Err(PriceError::TooPrecise)
        );
        assert!(matches!(
            Price::validate_amount(dec("10000000000")),
            Err(PriceError::TooLarge(_))
        ));
    }

    #[test]
    fn test_max_amount() {
        assert_eq!(Price::MAX_AMOUNT, dec("9999999999.99"));
    }

    #[test]
    fn test_order_total() {
        let total = Price::order_total([(dec("12.50"), 2), (dec("3.25"), 4)]);
        assert_eq!(total, dec("38.00"));
        assert_eq!(Price::order_total(Vec::<(Decimal, u32)>::new()), Decimal::ZERO);
    }

    #[test]
    fn test_currency_parse_and_display() {
        assert_eq!(CurrencyCode::from_str("mxn"), Ok(CurrencyCode::Mxn));
        assert!(CurrencyCode::from_str("XYZ").is_err());
        assert_eq!(CurrencyCode::Brl.to_string(), "BRL");
        let json = serde_json::to_string(&CurrencyCode::Eur).expect("serialize");
        assert_eq!(json, "\"EUR\"");
    }

    #[test]
    fn test_price_display() {
        let price = Price::new(dec("5"), CurrencyCode::Gbp);
        assert_eq!(price.to_string(), "£5.00");
    }
}
