//! Money and date presentation helpers.

use chrono::NaiveDate;

use crate::config::DateFormat;

/// Largest amount accepted by the entry forms.
pub const MAX_AMOUNT: f64 = 999_999.99;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyInfo {
    pub code: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
}

pub const CURRENCIES: [CurrencyInfo; 7] = [
    CurrencyInfo {
        code: "USD",
        symbol: "$",
        name: "US Dollar",
    },
    CurrencyInfo {
        code: "EUR",
        symbol: "€",
        name: "Euro",
    },
    CurrencyInfo {
        code: "GBP",
        symbol: "£",
        name: "British Pound",
    },
    CurrencyInfo {
        code: "TRY",
        symbol: "₺",
        name: "Turkish Lira",
    },
    CurrencyInfo {
        code: "JPY",
        symbol: "¥",
        name: "Japanese Yen",
    },
    CurrencyInfo {
        code: "CAD",
        symbol: "C$",
        name: "Canadian Dollar",
    },
    CurrencyInfo {
        code: "AUD",
        symbol: "A$",
        name: "Australian Dollar",
    },
];

pub fn find(code: &str) -> Option<CurrencyInfo> {
    let wanted = code.trim().to_ascii_uppercase();
    CURRENCIES.iter().copied().find(|entry| entry.code == wanted)
}

pub fn supported_codes() -> Vec<&'static str> {
    CURRENCIES.iter().map(|entry| entry.code).collect()
}

/// Symbol for a currency code; unknown codes render as the code itself.
pub fn symbol_for(code: &str) -> String {
    find(code)
        .map(|entry| entry.symbol.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Formats `amount` as `<symbol><grouped>.<cents>`, e.g. `$1,234.50`.
pub fn format_amount(amount: f64, code: &str) -> String {
    let body = format_number(amount.abs());
    let symbol = symbol_for(code);
    if amount < 0.0 && body != "0.00" {
        format!("-{}{}", symbol, body)
    } else {
        format!("{}{}", symbol, body)
    }
}

/// Formats a non-negative number with thousands separators and two decimals.
pub fn format_number(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    format!("{}.{}", group_digits(int_part), frac_part)
}

fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx != 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Parses user input such as `$1,250.00`; returns `None` for non-numeric text.
pub fn parse_currency_input(input: &str) -> Option<f64> {
    let cleaned: String = input
        .chars()
        .filter(|ch| !matches!(ch, '$' | ',') && !ch.is_whitespace())
        .collect();
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// True for amounts a transaction may carry.
pub fn validate_amount(amount: f64) -> bool {
    amount > 0.0 && amount <= MAX_AMOUNT
}

pub fn format_date(date: NaiveDate, format: DateFormat) -> String {
    date.format(format.pattern()).to_string()
}

/// Long form used in detail views, e.g. `Mar 05, 2024`.
pub fn format_display_date(date: NaiveDate) -> String {
    date.format("%b %d, %Y").to_string()
}
