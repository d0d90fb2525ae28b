//! Engineering-notation parsing for component values, tolerances and ratings.
//!
//! Values are kept as [`Decimal`] so that `4k7`, `4.7k` and `4700` compare
//! equal exactly. A value that cannot be interpreted is reported as unknown,
//! never as zero: `0R` jumpers are real parts.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Category;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueParseError {
    #[error("empty value")]
    Empty,
    #[error("invalid number in '{0}'")]
    InvalidNumber(String),
    #[error("unknown multiplier '{multiplier}' in '{value}'")]
    UnknownMultiplier { value: String, multiplier: char },
}

/// A component or inventory value as written, plus its magnitude when the
/// category is numeric and the string could be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParsedValue {
    pub raw: String,
    #[serde(
        default,
        with = "rust_decimal::serde::str_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub magnitude: Option<Decimal>,
}

impl ParsedValue {
    pub fn parse(raw: &str, category: Option<&Category>) -> Self {
        let magnitude = match category {
            Some(category) if category.is_numeric() => match parse_magnitude(raw, category) {
                Ok(magnitude) => Some(magnitude),
                Err(err) => {
                    if !raw.trim().is_empty() {
                        log::debug!("Value '{raw}' is unknown for {category}: {err}");
                    }
                    None
                }
            },
            _ => None,
        };

        Self {
            raw: raw.trim().to_string(),
            magnitude,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Case-insensitive comparison of the raw text, used for non-numeric categories
    pub fn text_eq(&self, other: &ParsedValue) -> bool {
        self.raw.eq_ignore_ascii_case(&other.raw)
    }
}

#[inline]
fn pow10(exp: i32) -> Decimal {
    if exp >= 0 {
        Decimal::from_i128_with_scale(10i128.pow(exp as u32), 0)
    } else {
        Decimal::new(1, (-exp) as u32)
    }
}

/// Exponent for a multiplier letter. `R` only acts as a decimal point for
/// resistor and inductor style values (`3R3`, `4R7`).
fn multiplier_exponent(c: char, decimal_r: bool) -> Option<i32> {
    match c {
        'p' | 'P' => Some(-12),
        'n' | 'N' => Some(-9),
        'u' | 'U' | 'µ' | 'μ' => Some(-6),
        'm' => Some(-3),
        'k' | 'K' => Some(3),
        'M' => Some(6),
        'G' | 'g' => Some(9),
        'R' | 'r' if decimal_r => Some(0),
        _ => None,
    }
}

/// Parse `<digits>[.<digits>][<multiplier>[<digits>]]`, where digits after
/// the multiplier are the fractional part (`4k7`, `2u2`, `R47`).
fn parse_engineering(input: &str, decimal_r: bool) -> Result<Decimal, ValueParseError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(ValueParseError::Empty);
    }

    let split = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    let (number, rest) = s.split_at(split);

    let mut chars = rest.chars();
    let (exp, fraction) = match chars.next() {
        None => (0, ""),
        Some(c) => {
            let exp = multiplier_exponent(c, decimal_r).ok_or_else(|| {
                ValueParseError::UnknownMultiplier {
                    value: input.to_string(),
                    multiplier: c,
                }
            })?;
            (exp, chars.as_str())
        }
    };

    let invalid = || ValueParseError::InvalidNumber(input.to_string());

    if !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if !fraction.is_empty() && number.contains('.') {
        return Err(invalid());
    }

    let mut literal = match (number.is_empty(), fraction.is_empty()) {
        (true, true) => return Err(invalid()),
        (_, true) => number.to_string(),
        (true, false) => format!("0.{fraction}"),
        (false, false) => format!("{number}.{fraction}"),
    };
    if literal.starts_with('.') {
        literal.insert(0, '0');
    }
    if literal.ends_with('.') {
        literal.push('0');
    }

    let base = Decimal::from_str(&literal).map_err(|_| invalid())?;
    base.checked_mul(pow10(exp)).ok_or_else(invalid)
}

const SI_PREFIXES: [(i32, &str); 8] = [
    (9, "G"),
    (6, "M"),
    (3, "k"),
    (0, ""),
    (-3, "m"),
    (-6, "u"),
    (-9, "n"),
    (-12, "p"),
];

fn scale_to_si(raw: Decimal) -> (Decimal, &'static str) {
    for &(exp, sym) in &SI_PREFIXES {
        let factor = pow10(exp);
        if raw.abs() >= factor {
            return (raw / factor, sym);
        }
    }
    (raw, "")
}

/// Canonical display form of a magnitude: `4.7k`, `100n`, `1M`. Resistances
/// below one kilohm are marked with `R` (`330R`, `0R`) so they read as
/// resistor values.
pub fn format_magnitude(value: Decimal, category: &Category) -> String {
    let (scaled, prefix) = scale_to_si(value);
    let prefix = match (prefix, category) {
        ("", Category::Resistor) => "R",
        (prefix, _) => prefix,
    };
    format!("{}{prefix}", scaled.normalize())
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(suffix.len())?;
    if !s.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = s.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}

/// Remove the unit symbol a category's values are usually written with.
fn strip_unit<'a>(s: &'a str, category: &Category) -> &'a str {
    let units: &[&str] = match category {
        Category::Resistor => &["ohms", "ohm", "Ω", "Ω"],
        Category::Capacitor => &["F"],
        Category::Inductor => &["H"],
        _ => &[],
    };

    units
        .iter()
        .find_map(|unit| strip_suffix_ignore_case(s, unit))
        .map(str::trim_end)
        .unwrap_or(s)
}

/// Parse a component value to its magnitude in base units (ohms, farads,
/// henries).
///
/// A trailing tolerance token (`"10k 1%"`) is ignored, as is the category's
/// unit symbol. SPICE style `meg` is accepted for mega.
pub fn parse_magnitude(raw: &str, category: &Category) -> Result<Decimal, ValueParseError> {
    let parts: Vec<&str> = raw.split_whitespace().collect();
    let joined = match parts.split_last() {
        Some((last, head)) if !head.is_empty() && last.ends_with('%') => head.concat(),
        _ => parts.concat(),
    };
    if joined.is_empty() {
        return Err(ValueParseError::Empty);
    }

    let stripped = strip_unit(&joined, category);
    let normalized = match strip_suffix_ignore_case(stripped, "meg") {
        Some(head) => format!("{head}M"),
        None => stripped.to_string(),
    };

    let decimal_r = matches!(category, Category::Resistor | Category::Inductor);
    parse_engineering(&normalized, decimal_r)
}

/// Parse a tolerance such as `"5%"`, `"±1%"` or `"0.5 %"` into percentage
/// points. Unparsable input is absent, not zero.
pub fn parse_tolerance(raw: &str) -> Option<Decimal> {
    let s = raw.trim();
    let s = s
        .strip_prefix('±')
        .or_else(|| s.strip_prefix("+/-"))
        .or_else(|| s.strip_prefix("+-"))
        .unwrap_or(s)
        .trim();
    let s = s.strip_suffix('%').unwrap_or(s).trim();

    if s.is_empty() {
        return None;
    }

    let percent = Decimal::from_str(s).ok()?;
    (percent >= Decimal::ZERO).then_some(percent)
}

/// Parse a rating such as `"25V"`, `"100mA"`, `"0.25W"` or `"1/4W"` to its
/// magnitude in base units.
pub fn parse_rating(raw: &str) -> Option<Decimal> {
    let s: String = raw.split_whitespace().collect();
    let s = s
        .strip_suffix(|c: char| matches!(c, 'V' | 'v' | 'A' | 'a' | 'W' | 'w'))
        .unwrap_or(s.as_str());

    if let Some((numerator, denominator)) = s.split_once('/') {
        let numerator = Decimal::from_str(numerator.trim()).ok()?;
        let denominator = Decimal::from_str(denominator.trim()).ok()?;
        return numerator.checked_div(denominator);
    }

    parse_engineering(s, false).ok()
}
