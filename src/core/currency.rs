//! Currency definitions and values with conversion to the native currency
//!
//! Vendor prices are kept in the vendor's own currency (the "source" value).
//! Every comparison across vendors goes through [`CurrencyValue::native_value`],
//! which applies the definition's exchange rate.

use serde::{Deserialize, Serialize};

/// A currency together with its exchange rate into the native currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyDefinition {
    /// ISO code (e.g., "USD")
    pub code: String,

    /// Display symbol (e.g., "US$")
    pub symbol: String,

    /// Native units per unit of this currency
    #[serde(default = "default_exchange_rate")]
    pub exchange_rate: f64,
}

fn default_exchange_rate() -> f64 {
    1.0
}

impl CurrencyDefinition {
    /// Create a definition with an exchange rate of 1
    pub fn new(code: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            symbol: symbol.into(),
            exchange_rate: 1.0,
        }
    }

    /// Set the exchange rate into the native currency
    pub fn with_exchange_rate(mut self, rate: f64) -> Self {
        self.exchange_rate = rate;
        self
    }
}

impl Default for CurrencyDefinition {
    fn default() -> Self {
        Self::new("USD", "$")
    }
}

impl std::fmt::Display for CurrencyDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// An amount of money in a specific currency
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyValue {
    amount: f64,
    currency: CurrencyDefinition,
}

impl CurrencyValue {
    pub fn new(amount: f64, currency: CurrencyDefinition) -> Self {
        Self { amount, currency }
    }

    /// The amount in the currency it was quoted in
    pub fn source_value(&self) -> f64 {
        self.amount
    }

    /// The amount converted into the native currency
    pub fn native_value(&self) -> f64 {
        self.amount * self.currency.exchange_rate
    }

    pub fn currency(&self) -> &CurrencyDefinition {
        &self.currency
    }

    /// Multiply the amount, keeping the currency
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.amount * factor, self.currency.clone())
    }

    /// Format in the source currency, e.g. "US$ 12.50"
    pub fn source_string(&self) -> String {
        format!("{} {:.2}", self.currency.symbol, self.amount)
    }
}

impl std::fmt::Display for CurrencyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source_string())
    }
}
