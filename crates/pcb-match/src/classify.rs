//! Ordered, data-driven component classification.
//!
//! A [`Classifier`] holds a list of `(field, pattern, category)` rules. Rules
//! are tried in order and the first match wins, so more specific patterns
//! (`Device:LED`) must come before broader ones (`Device:D`).

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::{Category, Component, InventoryError};

/// Which component field a rule's pattern is tested against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleField {
    #[default]
    LibId,
    Footprint,
    Reference,
}

#[derive(Debug, Clone)]
pub struct ClassificationRule {
    field: RuleField,
    pattern: Regex,
    category: Category,
}

impl ClassificationRule {
    /// Compile a rule. Patterns are case-insensitive regular expressions.
    pub fn new(
        field: RuleField,
        pattern: &str,
        category: Category,
    ) -> Result<Self, InventoryError> {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|err| InventoryError::InvalidRulePattern {
                pattern: pattern.to_string(),
                message: err.to_string(),
            })?;

        Ok(Self {
            field,
            pattern,
            category,
        })
    }

    pub fn field(&self) -> RuleField {
        self.field
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn matches(&self, component: &Component) -> bool {
        let haystack = match self.field {
            RuleField::LibId => &component.lib_id,
            RuleField::Footprint => &component.footprint,
            RuleField::Reference => &component.reference,
        };
        !haystack.is_empty() && self.pattern.is_match(haystack)
    }
}

const DEFAULT_RULES: &[(RuleField, &str, &str)] = &[
    (RuleField::LibId, r"^Device:LED", "LED"),
    (RuleField::LibId, r"^LED:", "LED"),
    (RuleField::LibId, r"^Device:R(_|$)", "RES"),
    (RuleField::LibId, r"^Device:C(_|$)", "CAP"),
    (RuleField::LibId, r"^Device:L(_|$)", "IND"),
    (RuleField::LibId, r"^Device:D(_|$)", "DIO"),
    (RuleField::LibId, r"^Diode:", "DIO"),
    (RuleField::LibId, r"^Device:Q(_|$)", "Q"),
    (RuleField::LibId, r"^Transistor_", "Q"),
    (RuleField::LibId, r"^Device:(Crystal|Resonator)", "XTAL"),
    (RuleField::LibId, r"^Device:(Fuse|Polyfuse)", "FUSE"),
    (RuleField::LibId, r"^Connector", "CON"),
    (RuleField::LibId, r"^Switch:", "SW"),
    (
        RuleField::LibId,
        r"^(MCU_|Amplifier_|Regulator_|Interface_|Memory_|Logic_|Sensor_|Timer|Power_Management|Analog_)",
        "IC",
    ),
    (RuleField::Footprint, r"(^|:)LED_", "LED"),
    (RuleField::Footprint, r"(^|:)R_\d{4}", "RES"),
    (RuleField::Footprint, r"(^|:)C_\d{4}", "CAP"),
    (RuleField::Footprint, r"(^|:)L_\d{4}", "IND"),
    (RuleField::Reference, r"^LED\d+$", "LED"),
    (RuleField::Reference, r"^R\d+$", "RES"),
    (RuleField::Reference, r"^C\d+$", "CAP"),
    (RuleField::Reference, r"^L\d+$", "IND"),
    (RuleField::Reference, r"^D\d+$", "DIO"),
    (RuleField::Reference, r"^Q\d+$", "Q"),
    (RuleField::Reference, r"^(U|IC)\d+$", "IC"),
    (RuleField::Reference, r"^(J|P)\d+$", "CON"),
    (RuleField::Reference, r"^SW\d+$", "SW"),
    (RuleField::Reference, r"^Y\d+$", "XTAL"),
    (RuleField::Reference, r"^F\d+$", "FUSE"),
];

/// Assigns categories to components using an ordered rule list.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<ClassificationRule>,
}

impl Classifier {
    pub fn new(rules: Vec<ClassificationRule>) -> Self {
        Self { rules }
    }

    /// The built-in rule table covering KiCad's standard libraries
    pub fn default_rules() -> Vec<ClassificationRule> {
        DEFAULT_RULES
            .iter()
            .map(|(field, pattern, tag)| {
                let category = tag.parse().expect("built-in category tag is valid");
                ClassificationRule::new(*field, pattern, category)
                    .expect("built-in classification pattern is valid")
            })
            .collect()
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    /// An explicit component category wins; otherwise the first matching
    /// rule decides. `None` means the component is unclassified.
    pub fn classify(&self, component: &Component) -> Option<Category> {
        if let Some(category) = &component.category {
            return Some(category.clone());
        }

        self.rules
            .iter()
            .find(|rule| rule.matches(component))
            .map(|rule| rule.category.clone())
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(Self::default_rules())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(field: RuleField, pattern: &str, tag: &str) -> ClassificationRule {
        ClassificationRule::new(field, pattern, tag.parse().unwrap()).unwrap()
    }

    #[test]
    fn test_default_table() {
        let classifier = Classifier::default();
        let cases = [
            ("R1", "Device:R", Some(Category::Resistor)),
            ("R2", "Device:R_Small", Some(Category::Resistor)),
            ("C1", "Device:C_Polarized", Some(Category::Capacitor)),
            ("D1", "Device:LED", Some(Category::Led)),
            ("D2", "Device:D_Schottky", Some(Category::Diode)),
            ("U1", "MCU_ST_STM32F1:STM32F103C8Tx", Some(Category::IntegratedCircuit)),
            ("J1", "Connector_Generic:Conn_01x04", Some(Category::Connector)),
            ("H1", "Mechanical:MountingHole", None),
        ];

        for (reference, lib_id, expected) in cases {
            let component = Component::new(reference, lib_id, "");
            assert_eq!(classifier.classify(&component), expected, "{lib_id}");
        }
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let component = Component::new("D1", "Device:LED", "red");

        let led_first = Classifier::new(vec![
            rule(RuleField::LibId, "^Device:LED", "LED"),
            rule(RuleField::LibId, "^Device:", "DIO"),
        ]);
        assert_eq!(led_first.classify(&component), Some(Category::Led));

        let broad_first = Classifier::new(vec![
            rule(RuleField::LibId, "^Device:", "DIO"),
            rule(RuleField::LibId, "^Device:LED", "LED"),
        ]);
        assert_eq!(broad_first.classify(&component), Some(Category::Diode));
    }

    #[test]
    fn test_footprint_and_reference_rules() {
        let classifier = Classifier::default();

        let by_footprint =
            Component::new("X9", "Custom:Thing", "10k")
                .with_footprint("Resistor_SMD:R_0402_1005Metric");
        assert_eq!(classifier.classify(&by_footprint), Some(Category::Resistor));

        let by_reference = Component::new("C7", "", "100n");
        assert_eq!(classifier.classify(&by_reference), Some(Category::Capacitor));
    }

    #[test]
    fn test_explicit_category_is_kept() {
        let classifier = Classifier::default();
        let component =
            Component::new("R1", "Device:R", "").with_category(Category::Other("NTC".into()));
        assert_eq!(
            classifier.classify(&component),
            Some(Category::Other("NTC".into()))
        );
    }

    #[test]
    fn test_patterns_are_case_insensitive() {
        let classifier = Classifier::new(vec![rule(RuleField::LibId, "^device:r$", "RES")]);
        let component = Component::new("R1", "Device:R", "1k");
        assert_eq!(classifier.classify(&component), Some(Category::Resistor));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = ClassificationRule::new(RuleField::LibId, "(", Category::Resistor).unwrap_err();
        assert!(matches!(err, InventoryError::InvalidRulePattern { .. }));
    }

    #[test]
    fn test_empty_rule_table_leaves_everything_unclassified() {
        let classifier = Classifier::new(Vec::new());
        assert_eq!(classifier.classify(&Component::new("R1", "Device:R", "1k")), None);
    }
}
