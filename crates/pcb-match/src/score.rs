//! Scoring of one component against one inventory candidate.
//!
//! Rules run in a fixed order: category, value, package, tolerance, then the
//! configured extra properties. A rule either adds a bonus or disqualifies the
//! candidate. Disqualified candidates are not "score zero", they are out of
//! the running entirely, so an eligible candidate with no bonuses still beats
//! them.

use std::collections::HashSet;
use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::component::{normalize_package, TOLERANCE};
use crate::value::{parse_rating, ParsedValue};
use crate::{Category, Component, InventoryItem};

/// Bonus weights. Exact tolerance outranks any tighter tolerance, and a
/// modestly tighter tolerance outranks a needlessly tight one.
pub mod bonus {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    pub const VALUE: Decimal = dec!(100);
    pub const PACKAGE: Decimal = dec!(50);
    pub const TOLERANCE_EXACT: Decimal = dec!(40);
    pub const TOLERANCE_BETTER: Decimal = dec!(30);
    pub const PROPERTY: Decimal = dec!(10);
}

/// Tighter tolerances within this many percentage points earn the full
/// "better" bonus.
const TOLERANCE_WINDOW: Decimal = dec!(1);

/// Properties that are ratings: a higher-rated candidate satisfies a lower
/// requirement.
pub const RATING_PROPERTIES: [&str; 3] = ["voltage", "current", "power"];

pub const DEFAULT_SCORED_PROPERTIES: [&str; 4] = ["voltage", "current", "power", "dielectric"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueMatch {
    Exact,
    /// Text category and the component gave no value
    NotCompared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageMatch {
    Exact,
    Mismatch,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToleranceMatch {
    NotRequired,
    Exact,
    /// Tighter, within one percentage point of the requirement
    Better,
    /// Tighter by more than one percentage point
    OverSpecified,
    /// Required, but the candidate states no tolerance
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Disqualification {
    CategoryMismatch,
    ValueUnknown,
    ValueMismatch,
    LooserTolerance { required: Decimal, offered: Decimal },
}

impl fmt::Display for Disqualification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disqualification::CategoryMismatch => write!(f, "category mismatch"),
            Disqualification::ValueUnknown => write!(f, "value unknown"),
            Disqualification::ValueMismatch => write!(f, "value mismatch"),
            Disqualification::LooserTolerance { required, offered } => {
                write!(f, "tolerance {offered}% looser than required {required}%")
            }
        }
    }
}

/// Bonuses an eligible candidate earned, and their sum
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreCard {
    pub score: Decimal,
    pub value: ValueMatch,
    pub package: PackageMatch,
    pub tolerance: ToleranceMatch,
    pub properties: Vec<String>,
}

impl ScoreCard {
    /// Human-readable summary, e.g. `exact value, exact tolerance, package mismatch`
    pub fn quality(&self) -> String {
        let mut parts = vec![match self.value {
            ValueMatch::Exact => "exact value",
            ValueMatch::NotCompared => "value not compared",
        }];

        match self.tolerance {
            ToleranceMatch::NotRequired => {}
            ToleranceMatch::Exact => parts.push("exact tolerance"),
            ToleranceMatch::Better => parts.push("tighter tolerance"),
            ToleranceMatch::OverSpecified => parts.push("over-specified tolerance"),
            ToleranceMatch::Unknown => parts.push("tolerance unknown"),
        }

        parts.push(match self.package {
            PackageMatch::Exact => "exact package",
            PackageMatch::Mismatch => "package mismatch",
            PackageMatch::Unknown => "package unknown",
        });

        let mut quality = parts.join(", ");
        for property in &self.properties {
            quality.push_str(&format!(", {property} match"));
        }
        quality
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scored {
    Eligible(ScoreCard),
    Disqualified(Disqualification),
}

/// What a classified component asks of a candidate, parsed once per
/// component rather than once per candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirements<'c> {
    pub component: &'c Component,
    pub category: Category,
    pub value: ParsedValue,
    pub package: Option<String>,
    pub tolerance: Option<Decimal>,
}

impl<'c> Requirements<'c> {
    pub fn new(component: &'c Component, category: Category) -> Self {
        Self {
            component,
            value: ParsedValue::parse(&component.value, Some(&category)),
            package: component.package(),
            tolerance: component.tolerance(),
            category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scorer {
    properties: Vec<String>,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(DEFAULT_SCORED_PROPERTIES.iter().map(|p| p.to_string()))
    }
}

impl Scorer {
    /// `properties` are the extra property keys compared for a small bonus.
    /// Keys already covered by dedicated rules are ignored, and each key is
    /// scored once, in first-listed order.
    pub fn new(properties: impl IntoIterator<Item = String>) -> Self {
        let mut seen = HashSet::new();
        let properties = properties
            .into_iter()
            .filter(|p| !matches!(p.as_str(), "value" | "package" | TOLERANCE))
            .filter(|p| seen.insert(p.clone()))
            .collect();
        Self { properties }
    }

    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    pub fn score(&self, req: &Requirements<'_>, candidate: &InventoryItem) -> Scored {
        if req.category != candidate.category {
            return Scored::Disqualified(Disqualification::CategoryMismatch);
        }

        let mut score = Decimal::ZERO;

        let value = match score_value(req, candidate) {
            Ok(value) => value,
            Err(reason) => return Scored::Disqualified(reason),
        };
        if value == ValueMatch::Exact {
            score += bonus::VALUE;
        }

        let package = match (&req.package, &candidate.package) {
            (Some(wanted), Some(offered))
                if normalize_package(wanted) == normalize_package(offered) =>
            {
                score += bonus::PACKAGE;
                PackageMatch::Exact
            }
            (Some(_), Some(_)) => PackageMatch::Mismatch,
            _ => PackageMatch::Unknown,
        };

        let tolerance = match req.tolerance {
            None => ToleranceMatch::NotRequired,
            Some(required) => match candidate.tolerance() {
                None => ToleranceMatch::Unknown,
                Some(offered) if offered == required => {
                    score += bonus::TOLERANCE_EXACT;
                    ToleranceMatch::Exact
                }
                Some(offered) if offered > required => {
                    return Scored::Disqualified(Disqualification::LooserTolerance {
                        required,
                        offered,
                    });
                }
                Some(offered) => {
                    let gap = required - offered;
                    if gap <= TOLERANCE_WINDOW {
                        score += bonus::TOLERANCE_BETTER;
                        ToleranceMatch::Better
                    } else {
                        score += bonus::TOLERANCE_BETTER / dec!(2) + proximity(required, gap);
                        ToleranceMatch::OverSpecified
                    }
                }
            },
        };

        let mut properties = Vec::new();
        for key in &self.properties {
            let (Some(wanted), Some(offered)) =
                (req.component.property(key), candidate.property(key))
            else {
                continue;
            };
            if property_matches(key, wanted, offered) {
                score += bonus::PROPERTY;
                properties.push(key.clone());
            }
        }

        Scored::Eligible(ScoreCard {
            score,
            value,
            package,
            tolerance,
            properties,
        })
    }
}

fn score_value(
    req: &Requirements<'_>,
    candidate: &InventoryItem,
) -> Result<ValueMatch, Disqualification> {
    if req.category.is_numeric() {
        return match (req.value.magnitude, candidate.value.magnitude) {
            (Some(wanted), Some(offered)) if wanted == offered => Ok(ValueMatch::Exact),
            (Some(_), Some(_)) => Err(Disqualification::ValueMismatch),
            _ => Err(Disqualification::ValueUnknown),
        };
    }

    // A stated value is never satisfied by a candidate without one
    if req.value.is_empty() {
        Ok(ValueMatch::NotCompared)
    } else if candidate.value.is_empty() {
        Err(Disqualification::ValueUnknown)
    } else if req.value.text_eq(&candidate.value) {
        Ok(ValueMatch::Exact)
    } else {
        Err(Disqualification::ValueMismatch)
    }
}

/// Fraction in `[0, 1)` that grows as an over-specified tolerance approaches
/// the requirement. It only separates candidates within the same tier.
fn proximity(required: Decimal, gap: Decimal) -> Decimal {
    gap.checked_div(required)
        .map(|ratio| (Decimal::ONE - ratio).round_dp(2))
        .unwrap_or(Decimal::ZERO)
}

fn property_matches(key: &str, wanted: &str, offered: &str) -> bool {
    if RATING_PROPERTIES.contains(&key) {
        if let (Some(wanted), Some(offered)) = (parse_rating(wanted), parse_rating(offered)) {
            return offered >= wanted;
        }
    }
    wanted.eq_ignore_ascii_case(offered)
}
