//! Money display helpers.
//!
//! Monetary amounts travel through the engine as [`rust_decimal::Decimal`];
//! this module only owns how they are rendered for display.

use rust_decimal::Decimal;

/// Format a monetary amount as a display string (e.g., "$19.99").
#[must_use]
pub fn display_amount(amount: Decimal) -> String {
    format!("${amount:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_display_amount_pads_cents() {
        assert_eq!(display_amount(Decimal::new(1999, 2)), "$19.99");
        assert_eq!(display_amount(Decimal::new(500, 0)), "$500.00");
        assert_eq!(display_amount(Decimal::ZERO), "$0.00");
    }
}
