//! VAT codes and tax calculation.

use rust_decimal::Decimal;

use crate::error::ParseError;

/// VAT code printed in the despatch tax column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxCode {
    /// Standard rate: 20%
    Standard,

    /// Outside the scope of VAT.
    OutsideScope,

    /// Exempt.
    Exempt,

    /// Zero-rated, "W" variant used by the carrier.
    ZeroW,

    /// Zero-rated.
    Zero,
}

impl TaxCode {
    /// Look up a printed code. Anything outside the table, including a blank
    /// column, is an error: missing tax is never assumed to be zero.
    pub fn from_code(code: &str, fragment: &str) -> Result<Self, ParseError> {
        match code.trim() {
            "S" => Ok(TaxCode::Standard),
            "O" => Ok(TaxCode::OutsideScope),
            "X" => Ok(TaxCode::Exempt),
            "W" => Ok(TaxCode::ZeroW),
            "Z" => Ok(TaxCode::Zero),
            other => Err(ParseError::UnknownCategoricalCode {
                code: other.to_string(),
                fragment: fragment.to_string(),
            }),
        }
    }

    /// Rate as a decimal multiplier (0.20 for 20%).
    pub fn rate(&self) -> Decimal {
        match self {
            TaxCode::Standard => Decimal::new(20, 2),
            TaxCode::OutsideScope | TaxCode::Exempt | TaxCode::ZeroW | TaxCode::Zero => Decimal::ZERO,
        }
    }
}

/// Tax payable on a net amount. Unrounded.
pub fn calculate_tax(net: Decimal, code: TaxCode) -> Decimal {
    net * code.rate()
}

/// `base + tax`. An amount past the decimal range is an invalid `gross_total`.
pub fn calculate_gross(base: Decimal, tax: Decimal, fragment: &str) -> Result<Decimal, ParseError> {
    base.checked_add(tax).ok_or_else(|| ParseError::InvalidField {
        field: "gross_total".to_string(),
        value: fragment.to_string(),
    })
}
