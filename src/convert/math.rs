use std::str::FromStr;

use rust_decimal::Decimal;

use crate::types::PriceQuote;

/// `amount * base_usd / quote_usd`, `None` on overflow.
pub fn base_to_quote(amount: Decimal, quote: &PriceQuote) -> Option<Decimal> {
    amount
        .checked_mul(quote.base_asset_price_usd)?
        .checked_div(quote.quote_asset_price_usd)
}

pub fn quote_to_base(amount: Decimal, quote: &PriceQuote) -> Option<Decimal> {
    amount
        .checked_mul(quote.quote_asset_price_usd)?
        .checked_div(quote.base_asset_price_usd)
}

pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let value = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()?;
    (!value.is_sign_negative() || value.is_zero()).then_some(value)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::{base_to_quote, parse_amount, quote_to_base};
    use crate::types::PriceQuote;

    fn relative_error(expected: Decimal, actual: Decimal) -> Decimal {
        ((expected - actual) / expected).abs()
    }

    #[test]
    fn one_sol_at_fallback_prices() {
        let quote = PriceQuote::fallback();
        let nova = base_to_quote(dec!(1), &quote).expect("no overflow");

        assert_eq!(nova.round_dp(2), dec!(16260.16));
    }

    #[test]
    fn displayed_quote_amount_converts_back_to_one() {
        let quote = PriceQuote::fallback();
        let sol = quote_to_base(dec!(16260.16), &quote).expect("no overflow");

        assert!(relative_error(dec!(1), sol) < dec!(0.0001));
    }

    #[test]
    fn round_trip_stays_within_tolerance_across_magnitudes() {
        let quotes = [
            PriceQuote::fallback(),
            PriceQuote::new(dec!(187.42), dec!(0.000000731), Utc::now()).expect("valid"),
            PriceQuote::new(dec!(0.5), dec!(3200), Utc::now()).expect("valid"),
        ];
        let amounts = [
            dec!(0.000001),
            dec!(0.1),
            dec!(1),
            dec!(42.5),
            dec!(12345.678),
            dec!(9999999),
        ];

        for quote in &quotes {
            for amount in amounts {
                let there = base_to_quote(amount, quote).expect("no overflow");
                let back = quote_to_base(there, quote).expect("no overflow");
                assert!(
                    relative_error(amount, back) < dec!(0.0001),
                    "{amount} -> {there} -> {back}"
                );
            }
        }
    }

    #[test]
    fn overflow_is_reported_instead_of_panicking() {
        let quote = PriceQuote::new(Decimal::MAX, dec!(0.0001), Utc::now()).expect("valid");
        assert_eq!(base_to_quote(Decimal::MAX, &quote), None);
    }

    #[test]
    fn parses_user_input() {
        assert_eq!(parse_amount(" 1.5 "), Some(dec!(1.5)));
        assert_eq!(parse_amount("0"), Some(dec!(0)));
        assert_eq!(parse_amount("1e3"), Some(dec!(1000)));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("-2"), None);
    }
}
