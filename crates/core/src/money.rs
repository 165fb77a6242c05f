use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;
use thiserror::Error;

/// Euro amount stored as signed cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Money(i64);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid amount: '{0}'")]
pub struct MoneyParseError(pub String);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn from_decimal(decimal: Decimal) -> Option<Self> {
        (decimal * Decimal::from(100)).round().to_i64().map(Money)
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(100)
    }

    pub fn zero() -> Self {
        Money(0)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Ratio of two amounts as `f64`, `0.0` when the denominator is zero.
    /// Statement files for dormant companies legitimately carry zero totals.
    pub fn ratio_to(self, denominator: Money) -> f64 {
        if denominator.0 == 0 {
            0.0
        } else {
            self.0 as f64 / denominator.0 as f64
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "€ {}", format_it(self.0))
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

/// Italian grouping: `-1234567` cents → `-12.345,67`.
fn format_it(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let units = abs / 100;
    let frac = abs % 100;

    let digits = units.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    format!("{sign}{grouped},{frac:02}")
}

impl FromStr for Money {
    type Err = MoneyParseError;

    /// Parses amounts as written in Italian statement exports: dot for
    /// thousands, comma for decimals, optional currency sign, accounting
    /// parentheses or a trailing minus for negatives.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let original = s;
        let s = s.trim().trim_start_matches('€').trim();
        if s.is_empty() {
            return Err(MoneyParseError(original.to_string()));
        }

        let (mut negative, s) = if s.starts_with('(') && s.ends_with(')') {
            (true, &s[1..s.len() - 1])
        } else {
            (false, s)
        };
        let s = if let Some(stripped) = s.strip_suffix('-') {
            negative = true;
            stripped
        } else {
            s
        };
        let s = s.trim().replace(['\u{a0}', ' '], "");

        let normalized = if s.contains(',') {
            // Italian format: drop thousands dots, comma becomes the point.
            s.replace('.', "").replace(',', ".")
        } else if is_machine_decimal(&s) {
            // Lone dot with 1-2 trailing digits: a machine-format decimal
            // point, not a thousands separator.
            s.clone()
        } else {
            s.replace('.', "")
        };

        let mut dec =
            Decimal::from_str(&normalized).map_err(|_| MoneyParseError(original.to_string()))?;
        if negative {
            dec = -dec;
        }
        Money::from_decimal(dec).ok_or_else(|| MoneyParseError(original.to_string()))
    }
}

fn is_machine_decimal(s: &str) -> bool {
    match s.split_once('.') {
        Some((head, tail)) => {
            !head.contains('.')
                && (1..=2).contains(&tail.len())
                && tail.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> i64 {
        s.parse::<Money>().unwrap().cents()
    }

    // ── parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn parse_italian_thousands_and_decimals() {
        assert_eq!(parse("1.234,56"), 123456);
        assert_eq!(parse("12.345.678,90"), 1234567890);
    }

    #[test]
    fn parse_comma_only() {
        assert_eq!(parse("99,50"), 9950);
        assert_eq!(parse("0,01"), 1);
    }

    #[test]
    fn parse_dot_only_is_thousands() {
        // "1.234" in an Italian export is one thousand two hundred thirty-four.
        assert_eq!(parse("1.234"), 123400);
        assert_eq!(parse("1.234.000"), 123400000);
    }

    #[test]
    fn parse_machine_decimal_point() {
        assert_eq!(parse("1234.56"), 123456);
        assert_eq!(parse("7.5"), 750);
    }

    #[test]
    fn parse_plain_integer() {
        assert_eq!(parse("1500"), 150000);
        assert_eq!(parse("0"), 0);
    }

    #[test]
    fn parse_negative_forms() {
        assert_eq!(parse("-1.234,56"), -123456);
        assert_eq!(parse("(1.234,56)"), -123456);
        assert_eq!(parse("1.234,56-"), -123456);
    }

    #[test]
    fn parse_currency_sign_and_spaces() {
        assert_eq!(parse("€ 1.234,56"), 123456);
        assert_eq!(parse("€1.234,56"), 123456);
        assert_eq!(parse("1 234,56"), 123456);
    }

    #[test]
    fn parse_invalid() {
        assert!("".parse::<Money>().is_err());
        assert!("n.d.".parse::<Money>().is_err());
        assert!("€".parse::<Money>().is_err());
    }

    // ── formatting ────────────────────────────────────────────────────────────

    #[test]
    fn display_italian_grouping() {
        assert_eq!(Money::from_cents(123456).to_string(), "€ 1.234,56");
        assert_eq!(Money::from_cents(1234567890).to_string(), "€ 12.345.678,90");
        assert_eq!(Money::from_cents(-9950).to_string(), "€ -99,50");
        assert_eq!(Money::from_cents(5).to_string(), "€ 0,05");
    }

    // ── arithmetic ────────────────────────────────────────────────────────────

    #[test]
    fn sum_of_amounts() {
        let total: Money = [100, 250, -50].map(Money::from_cents).into_iter().sum();
        assert_eq!(total.cents(), 300);
    }

    #[test]
    fn ratio_guards_zero_denominator() {
        assert_eq!(Money::from_cents(100).ratio_to(Money::zero()), 0.0);
        assert!((Money::from_cents(150).ratio_to(Money::from_cents(100)) - 1.5).abs() < 1e-9);
    }
}
