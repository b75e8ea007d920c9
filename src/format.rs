//! Display formatting for money, quantities and dates.
//!
//! Amounts are carried at full precision everywhere else in the crate and only
//! rounded here, half away from zero, when they are turned into strings.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

pub const CURRENCY_DECIMALS: u32 = 2;

/// Standard commercial rounding: a midpoint goes away from zero (2.345 -> 2.35).
pub fn round_half_up(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    /// 1,234,567.00
    Western,
    /// 12,34,567.00 (lakh/crore)
    Indian,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormat {
    pub symbol: String,
    pub grouping: Grouping,
    pub decimals: u32,
}

impl CurrencyFormat {
    pub fn usd() -> Self {
        Self {
            symbol: "$".to_string(),
            grouping: Grouping::Western,
            decimals: CURRENCY_DECIMALS,
        }
    }

    pub fn inr() -> Self {
        Self {
            symbol: "\u{20B9}".to_string(),
            grouping: Grouping::Indian,
            decimals: CURRENCY_DECIMALS,
        }
    }

    pub fn format(&self, amount: Decimal) -> String {
        let mut rounded = round_half_up(amount, self.decimals);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        rounded.set_sign_positive(true);
        rounded.rescale(self.decimals);
        let plain = rounded.to_string();
        let (int_part, frac_part) = match plain.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (plain.as_str(), None),
        };
        let mut out = String::with_capacity(plain.len() + self.symbol.len() + 4);
        if negative {
            out.push('-');
        }
        out.push_str(&self.symbol);
        out.push_str(&group_digits(int_part, self.grouping));
        if let Some(frac) = frac_part {
            out.push('.');
            out.push_str(frac);
        }
        out
    }
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        CurrencyFormat::usd()
    }
}

fn group_digits(digits: &str, grouping: Grouping) -> String {
    let len = digits.len();
    let lead = match grouping {
        Grouping::None => return digits.to_string(),
        _ if len <= 3 => return digits.to_string(),
        Grouping::Western => 3,
        Grouping::Indian => 2,
    };
    // The last three digits always form one group; the rest repeat `lead`.
    let (head, tail) = digits.split_at(len - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(lead);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    groups.push(tail);
    groups.join(",")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateStyle {
    /// 15 Jan 2024
    #[default]
    Short,
    /// Monday, 15 January 2024
    Long,
    /// 2024-01-15
    Iso,
}

impl DateStyle {
    pub fn format(self, date: NaiveDate) -> String {
        let pattern = match self {
            DateStyle::Short => "%-d %b %Y",
            DateStyle::Long => "%A, %-d %B %Y",
            DateStyle::Iso => "%Y-%m-%d",
        };
        date.format(pattern).to_string()
    }
}

/// Locale-aware string conversion supplied by the host application. The
/// layout engine only ever prints what this returns.
pub trait InvoiceFormatter: Send + Sync {
    fn currency(&self, amount: Decimal) -> String;

    fn date(&self, date: NaiveDate) -> String;

    fn quantity(&self, quantity: Decimal) -> String {
        quantity.normalize().to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct LocaleFormatter {
    pub currency: CurrencyFormat,
    pub date_style: DateStyle,
}

impl LocaleFormatter {
    pub fn new(currency: CurrencyFormat, date_style: DateStyle) -> Self {
        Self {
            currency,
            date_style,
        }
    }

    pub fn usd() -> Self {
        Self::new(CurrencyFormat::usd(), DateStyle::Short)
    }

    pub fn inr() -> Self {
        Self::new(CurrencyFormat::inr(), DateStyle::Short)
    }
}

impl InvoiceFormatter for LocaleFormatter {
    fn currency(&self, amount: Decimal) -> String {
        self.currency.format(amount)
    }

    fn date(&self, date: NaiveDate) -> String {
        self.date_style.format(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).expect("decimal literal")
    }

    #[test]
    fn midpoints_round_away_from_zero() {
        assert_eq!(round_half_up(dec("2.345"), 2), dec("2.35"));
        assert_eq!(round_half_up(dec("2.344"), 2), dec("2.34"));
        assert_eq!(round_half_up(dec("-2.345"), 2), dec("-2.35"));
        assert_eq!(round_half_up(dec("0.005"), 2), dec("0.01"));
    }

    #[test]
    fn usd_groups_thousands_and_pads_cents() {
        let usd = CurrencyFormat::usd();
        assert_eq!(usd.format(dec("0")), "$0.00");
        assert_eq!(usd.format(dec("250")), "$250.00");
        assert_eq!(usd.format(dec("1234567.891")), "$1,234,567.89");
        assert_eq!(usd.format(dec("999.995")), "$1,000.00");
        assert_eq!(usd.format(dec("-5.5")), "-$5.50");
        assert_eq!(usd.format(dec("-0.001")), "$0.00");
    }

    #[test]
    fn inr_uses_lakh_grouping() {
        let inr = CurrencyFormat::inr();
        assert_eq!(inr.format(dec("12345678.9")), "\u{20B9}1,23,45,678.90");
        assert_eq!(inr.format(dec("100000")), "\u{20B9}1,00,000.00");
        assert_eq!(inr.format(dec("999")), "\u{20B9}999.00");
    }

    #[test]
    fn ungrouped_format_keeps_digits_together() {
        let plain = CurrencyFormat {
            symbol: String::new(),
            grouping: Grouping::None,
            decimals: 2,
        };
        assert_eq!(plain.format(dec("1234567")), "1234567.00");
    }

    #[test]
    fn date_styles() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).expect("date");
        assert_eq!(DateStyle::Short.format(date), "15 Jan 2024");
        assert_eq!(DateStyle::Long.format(date), "Monday, 15 January 2024");
        assert_eq!(DateStyle::Iso.format(date), "2024-01-15");
    }

    #[test]
    fn quantities_drop_trailing_zeros() {
        let formatter = LocaleFormatter::usd();
        assert_eq!(formatter.quantity(dec("2.00")), "2");
        assert_eq!(formatter.quantity(dec("1.50")), "1.5");
    }
}
