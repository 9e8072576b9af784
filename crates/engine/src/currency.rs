use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Currency code attached to a payment amount.
///
/// The providers settle in different units: YooKassa charges rubles (`RUB`,
/// two fraction digits), Telegram Stars charge whole stars (`XTR`, no
/// fraction digits). Amounts are stored as an `i64` number of **minor
/// units**; `minor_units()` returns how many decimal digits separate major
/// from minor units.
///
/// Example: RUB has 2 minor units, so `100.00 RUB` ⇄ `10000`. XTR has 0, so
/// `5 XTR` ⇄ `5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Rub,
    Xtr,
}

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Rub => "RUB",
            Currency::Xtr => "XTR",
        }
    }

    /// Number of fraction digits used when parsing provider amounts.
    #[must_use]
    pub const fn minor_units(self) -> u8 {
        match self {
            Currency::Rub => 2,
            Currency::Xtr => 0,
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "RUB" => Ok(Currency::Rub),
            "XTR" => Ok(Currency::Xtr),
            other => Err(EngineError::CurrencyMismatch(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        assert_eq!(Currency::try_from("RUB").unwrap(), Currency::Rub);
        assert_eq!(Currency::try_from("xtr").unwrap(), Currency::Xtr);
        assert_eq!(Currency::Rub.code(), "RUB");
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert!(Currency::try_from("USD").is_err());
        assert!(Currency::try_from("").is_err());
    }
}
