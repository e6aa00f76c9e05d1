// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("invalid money value")]
    Invalid,
    #[error("negative money value")]
    Negative,
}

pub type MoneyResult<T> = std::result::Result<T, MoneyError>;

pub fn parse_required_cents(input: &str) -> MoneyResult<i64> {
    parse_cents(input.trim())
}

/// Blank input is zero, matching a numeric field left empty.
pub fn parse_cents_or_zero(input: &str) -> MoneyResult<i64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    parse_cents(trimmed)
}

pub fn format_cents(cents: i64) -> String {
    let (sign, cents) = normalize_sign(cents);
    let pesos = cents / 100;
    let remainder = cents % 100;
    format!("{sign}${}.{:02}", comma_format(pesos), remainder)
}

/// Plain editable form (`1234.5` → `"1234.50"`), without sign or separators.
pub fn format_cents_plain(cents: i64) -> String {
    let (_, cents) = normalize_sign(cents);
    format!("{}.{:02}", cents / 100, cents % 100)
}

fn parse_cents(input: &str) -> MoneyResult<i64> {
    let clean = input.replace(',', "");
    if clean.starts_with('-') {
        return Err(MoneyError::Negative);
    }
    let clean = clean.strip_prefix('$').unwrap_or(&clean);

    let (pesos, centavos) = match clean.split_once('.') {
        Some((pesos, centavos)) => (pesos, Some(centavos)),
        None => (clean, None),
    };
    if pesos.is_empty() && centavos.is_none() {
        return Err(MoneyError::Invalid);
    }

    let pesos = if pesos.is_empty() { 0 } else { digits(pesos)? };
    let centavos = match centavos {
        None => 0,
        Some(raw) => match raw.len() {
            1 => digits(raw)? * 10,
            2 => digits(raw)?,
            _ => return Err(MoneyError::Invalid),
        },
    };

    pesos
        .checked_mul(100)
        .and_then(|value| value.checked_add(centavos))
        .ok_or(MoneyError::Invalid)
}

fn digits(raw: &str) -> MoneyResult<i64> {
    if raw.is_empty() || !raw.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(MoneyError::Invalid);
    }
    raw.parse().map_err(|_| MoneyError::Invalid)
}

fn comma_format(value: i64) -> String {
    let digits = value.to_string();
    let lead = match digits.len() % 3 {
        0 => 3,
        rest => rest,
    };
    let mut out = String::from(&digits[..lead]);
    for group in digits.as_bytes()[lead..].chunks(3) {
        out.push(',');
        out.extend(group.iter().map(|byte| char::from(*byte)));
    }
    out
}

fn normalize_sign(cents: i64) -> (&'static str, i64) {
    if cents >= 0 {
        return ("", cents);
    }
    if cents == i64::MIN {
        ("-", i64::MAX)
    } else {
        ("-", -cents)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        MoneyError, format_cents, format_cents_plain, parse_cents_or_zero, parse_required_cents,
    };
    use std::collections::BTreeMap;

    #[test]
    fn parse_required_cents_accepts_common_forms() {
        let cases = BTreeMap::from([
            ("350", 35_000),
            ("350.5", 35_050),
            ("350.05", 35_005),
            ("$1,234.56", 123_456),
            (".75", 75),
            ("0.99", 99),
        ]);
        for (input, expected) in cases {
            let got = parse_required_cents(input).expect("money should parse");
            assert_eq!(got, expected, "input {input}");
        }
    }

    #[test]
    fn parse_required_cents_rejects_garbage() {
        for input in ["", "12.345", "abc", "1.2.3", "$"] {
            assert!(parse_required_cents(input).is_err(), "input {input}");
        }
    }

    #[test]
    fn negative_amounts_are_reported_as_such() {
        assert_eq!(parse_required_cents("-5"), Err(MoneyError::Negative));
    }

    #[test]
    fn blank_is_zero_when_optional() {
        assert_eq!(parse_cents_or_zero("  "), Ok(0));
        assert_eq!(parse_cents_or_zero("12"), Ok(1_200));
    }

    #[test]
    fn format_cents_groups_thousands() {
        assert_eq!(format_cents(123_456), "$1,234.56");
        assert_eq!(format_cents(0), "$0.00");
        assert_eq!(format_cents(-1_050), "-$10.50");
    }

    #[test]
    fn plain_format_parses_back() {
        let plain = format_cents_plain(1_234_50);
        assert_eq!(plain, "1234.50");
        assert_eq!(parse_required_cents(&plain), Ok(1_234_50));
    }
}
