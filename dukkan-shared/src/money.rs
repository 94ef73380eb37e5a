use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Smallest-unit scale used when talking to the payment provider.
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Convert a major-unit amount to the provider's smallest currency unit.
///
/// Provider payloads carry integer amounts; catalog prices are stored with
/// at most two decimal places, so the conversion is exact.
pub fn minor_units(amount: Decimal) -> i64 {
    (amount * Decimal::from(MINOR_UNITS_PER_MAJOR))
        .round()
        .to_i64()
        .unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_unit_conversion() {
        assert_eq!(minor_units(Decimal::new(300, 2)), 300); // 3.00
        assert_eq!(minor_units(Decimal::new(200, 2)), 200); // 2.00
        assert_eq!(minor_units(Decimal::new(1, 2)), 1); // 0.01
        assert_eq!(minor_units(Decimal::new(1999, 2)), 1999); // 19.99
        assert_eq!(minor_units(Decimal::ZERO), 0);
    }

    #[test]
    fn test_rounds_sub_minor_amounts() {
        // 1.005 has no exact minor representation; round half away from zero
        // is not required, any consistent rounding is -- assert the scale.
        assert_eq!(minor_units(Decimal::new(10050, 4)), 100);
        assert_eq!(minor_units(Decimal::new(125, 1)), 1250); // 12.5
    }
}
