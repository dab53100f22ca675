//! Display formatting shared by the dashboard and the plain CLI output.
//!
//! Every nullable figure renders `N/A` when absent. Percentages are expected
//! in percentage-point units (12.34 means 12.34%) and always print with two
//! decimals.

use crate::models::DeltaPair;

pub const NOT_AVAILABLE: &str = "N/A";

/// Insert `,` every three digits of an unsigned digit string.
fn group_digits(digits: &str) -> String {
    let mut with_commas = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

/// Round to a whole number and group: -1234.5 -> "-1,235".
fn whole(val: f64) -> (bool, String) {
    let rounded = val.round();
    let negative = rounded < 0.0;
    (negative, group_digits(&format!("{:.0}", rounded.abs())))
}

/// Format a float as whole US dollars with thousands separators: $1,235
pub fn money(val: f64) -> String {
    let (negative, digits) = whole(val);
    if negative {
        format!("-${digits}")
    } else {
        format!("${digits}")
    }
}

pub fn currency(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), money)
}

pub fn percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}%"),
        None => NOT_AVAILABLE.to_string(),
    }
}

pub fn count(value: Option<i64>) -> String {
    match value {
        Some(v) if v < 0 => format!("-{}", group_digits(&v.unsigned_abs().to_string())),
        Some(v) => group_digits(&v.to_string()),
        None => NOT_AVAILABLE.to_string(),
    }
}

pub fn number(n: u64) -> String {
    group_digits(&n.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Positive,
    Negative,
    Neutral,
}

impl Sign {
    pub fn of(value: f64) -> Self {
        if value > 0.0 {
            Self::Positive
        } else if value < 0.0 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaClass {
    Positive,
    Negative,
    Neutral,
    Unknown,
}

impl From<Sign> for DeltaClass {
    fn from(sign: Sign) -> Self {
        match sign {
            Sign::Positive => Self::Positive,
            Sign::Negative => Self::Negative,
            Sign::Neutral => Self::Neutral,
        }
    }
}

/// Unknown when either side is missing, otherwise the sign of the amount.
/// The percent never overrides the amount's class.
pub fn classify_delta(amount: Option<f64>, percent: Option<f64>) -> DeltaClass {
    match (amount, percent) {
        (Some(a), Some(_)) => Sign::of(a).into(),
        _ => DeltaClass::Unknown,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaUnit {
    Currency,
    Count,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaDisplay {
    pub amount: String,
    pub percent: String,
    pub class: DeltaClass,
    /// Colour of the percent text; `None` when the pair is unknown.
    pub percent_sign: Option<Sign>,
}

pub fn delta(pair: DeltaPair, unit: DeltaUnit) -> DeltaDisplay {
    let class = classify_delta(pair.amount, pair.percent);
    match (pair.amount, pair.percent) {
        (Some(amount), Some(pct)) => DeltaDisplay {
            amount: match unit {
                DeltaUnit::Currency => money(amount),
                DeltaUnit::Count => {
                    let (negative, digits) = whole(amount);
                    if negative { format!("-{digits}") } else { digits }
                }
            },
            percent: percent(Some(pct)),
            class,
            percent_sign: Some(Sign::of(pct)),
        },
        _ => DeltaDisplay {
            amount: NOT_AVAILABLE.to_string(),
            percent: NOT_AVAILABLE.to_string(),
            class,
            percent_sign: None,
        },
    }
}
