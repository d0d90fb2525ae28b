use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::value::parse_tolerance;
use crate::Category;

/// Property key holding a component's or item's tolerance
pub const TOLERANCE: &str = "tolerance";

/// A schematic component as handed over by a schematic reader.
///
/// Property keys are canonical (lowercase, `_` separated); the loader is
/// responsible for aliasing column or field names.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Component {
    pub reference: String,
    #[serde(default)]
    pub lib_id: String,
    #[serde(default)]
    pub footprint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    /// Explicit category; once set it is never overridden by classification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dnp: bool,
}

impl Component {
    pub fn new(
        reference: impl Into<String>,
        lib_id: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            reference: reference.into(),
            lib_id: lib_id.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_footprint(mut self, footprint: impl Into<String>) -> Self {
        self.footprint = footprint.into();
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_dnp(mut self, dnp: bool) -> Self {
        self.dnp = dnp;
        self
    }

    /// A non-blank property value
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Required tolerance in percentage points, if stated and parsable
    pub fn tolerance(&self) -> Option<Decimal> {
        self.property(TOLERANCE).and_then(parse_tolerance)
    }

    /// Explicit package, otherwise the one recognisable in the footprint name
    pub fn package(&self) -> Option<String> {
        self.package
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .or_else(|| extract_package(&self.footprint))
    }
}

fn package_regex() -> &'static Regex {
    static PACKAGE: OnceLock<Regex> = OnceLock::new();
    PACKAGE.get_or_init(|| {
        RegexBuilder::new(
            r"(?:^|[^0-9])(01005|0201|0402|0603|0805|1206|1210|1812|2010|2512)(?:[^0-9]|$)|(SOT-?23(?:-\d+)?|SOT-?223|SOT-?363|SOD-?\d+|SOIC-?\d+|SSOP-?\d+|TSSOP-?\d+|MSOP-?\d+|QFN-?\d+|LQFP-?\d+|TQFP-?\d+|DFN-?\d+|TO-?\d+)",
        )
        .case_insensitive(true)
        .build()
        .expect("package pattern is valid")
    })
}

/// Recognise a standard package in a footprint name, e.g. `0603` in
/// `Resistor_SMD:R_0603_1608Metric` or `SOT-23` in `Package_TO_SOT_SMD:SOT-23`.
pub fn extract_package(footprint: &str) -> Option<String> {
    let name = footprint
        .rsplit_once(':')
        .map_or(footprint, |(_, name)| name);
    let captures = package_regex().captures(name)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| m.as_str().to_ascii_uppercase())
}

/// Canonical form used to compare packages: upper-case, without spaces,
/// dashes or underscores (`sot-23` == `SOT23`).
pub fn normalize_package(package: &str) -> String {
    package
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_uppercase)
        .collect()
}
