//! Component-to-inventory matching for BOM generation.
//!
//! Given schematic components and one or more inventory sources, the engine
//! picks the best-fitting inventory part for each component:
//!
//! * [`merge::merge_sources`] pools the sources in precedence order; the
//!   first source to define an IPN owns it.
//! * [`classify::Classifier`] assigns each component a [`Category`] from an
//!   ordered rule table.
//! * [`score::Scorer`] scores candidates of the same category on value,
//!   package, tolerance and configured properties, disqualifying parts that
//!   cannot substitute (wrong value, looser tolerance).
//! * [`matcher::InventoryMatcher`] ranks eligible candidates by score, then
//!   priority, then IPN, and reports one [`matcher::MatchResult`] per
//!   component.
//!
//! Everything here is pure and synchronous: inputs are plain values and the
//! same inputs always give the same report.

pub mod bom;
pub mod category;
pub mod classify;
pub mod component;
pub mod designator;
pub mod diagnostics;
pub mod error;
pub mod fabricator;
pub mod inventory;
pub mod matcher;
pub mod merge;
pub mod score;
pub mod value;

pub use category::Category;
pub use classify::{ClassificationRule, Classifier, RuleField};
pub use component::Component;
pub use diagnostics::MatchSummary;
pub use error::InventoryError;
pub use fabricator::{builtin_fabricators, Fabricator};
pub use inventory::{InventoryItem, InventorySource, Priority, SourceId};
pub use matcher::{InventoryMatcher, MatchConfig, MatchOutcome, MatchReport, MatchResult};
pub use merge::{merge_sources, MergedInventory, ShadowedItem};

/// Merge `sources` (primary first) and match every component against the pool.
pub fn match_components(
    components: &[Component],
    sources: &[InventorySource],
    classifier: &Classifier,
    config: MatchConfig,
) -> MatchReport {
    let inventory = merge_sources(sources);
    log::debug!(
        "Matching {} components against {} inventory items from {} sources",
        components.len(),
        inventory.len(),
        sources.len()
    );
    InventoryMatcher::new(&inventory, classifier, config).match_all(components)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn source(id: &str, items: Vec<InventoryItem>) -> InventorySource {
        InventorySource::new(id, items).unwrap()
    }

    fn resistor(ipn: &str, value: &str) -> InventoryItem {
        InventoryItem::new(ipn, Category::Resistor, value, "inventory.csv").with_package("0603")
    }

    fn run(components: &[Component], sources: &[InventorySource]) -> MatchReport {
        match_components(components, sources, &Classifier::default(), MatchConfig::default())
    }

    fn selected<'a>(report: &'a MatchReport, reference: &str) -> Option<&'a str> {
        report.get(reference).and_then(MatchResult::ipn)
    }

    #[test]
    fn test_lower_priority_value_wins() {
        let inventory = source(
            "inventory.csv",
            vec![
                resistor("R011", "10k").with_priority(Priority::new(5)),
                resistor("R010", "10k").with_priority(Priority::new(1)),
            ],
        );
        let component = Component::new("R1", "Device:R", "10k").with_package("0603");

        let report = run(&[component], &[inventory]);
        assert_eq!(selected(&report, "R1"), Some("R010"));
        assert_eq!(report.results[0].priority, Some(Priority::new(1)));
    }

    #[test]
    fn test_closest_tighter_tolerance_preferred() {
        let inventory = source(
            "inventory.csv",
            vec![
                resistor("R1PCT", "10k").with_property("tolerance", "1%"),
                resistor("R5PCT", "10k").with_property("tolerance", "5%"),
            ],
        );
        let component = Component::new("R1", "Device:R", "10k")
            .with_package("0603")
            .with_property("tolerance", "10%");

        let report = run(&[component], &[inventory]);
        assert_eq!(selected(&report, "R1"), Some("R5PCT"));
        assert_eq!(
            report.results[0].quality.as_deref(),
            Some("exact value, over-specified tolerance, exact package")
        );
    }

    #[test]
    fn test_looser_tolerances_never_substitute() {
        let inventory = source(
            "inventory.csv",
            vec![
                resistor("R5PCT", "10k").with_property("tolerance", "5%"),
                resistor("R10PCT", "10k").with_property("tolerance", "10%"),
            ],
        );
        let component = Component::new("R1", "Device:R", "10k").with_property("tolerance", "1%");

        let report = run(&[component], &[inventory]);
        assert_eq!(selected(&report, "R1"), None);
        assert_eq!(report.results[0].outcome, MatchOutcome::NoEligible);
        assert_eq!(report.summary.no_eligible, 1);
    }

    #[test]
    fn test_priority_extremes() {
        let priorities = [100, 2_147_483_647, 5, 0, 50, 1];
        let items = priorities
            .iter()
            .map(|&p| resistor(&format!("R{p}"), "10k").with_priority(Priority::new(p)))
            .collect();
        let component = Component::new("R1", "Device:R", "10k");

        let report = run(&[component], &[source("inventory.csv", items)]);
        assert_eq!(selected(&report, "R1"), Some("R0"));
        assert_eq!(report.results[0].priority, Some(Priority::HIGHEST));
    }

    #[test]
    fn test_textual_priority_rejects_source() {
        let record = |ipn: &str, priority: &str| -> BTreeMap<String, String> {
            [
                ("ipn", ipn),
                ("category", "RES"),
                ("value", "10k"),
                ("priority", priority),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
        };

        let err = InventorySource::from_records(
            "parts.csv",
            vec![record("R001", "1"), record("R002", "high")],
        )
        .unwrap_err();

        assert_eq!(
            err,
            InventoryError::InvalidPriority {
                source_id: SourceId::from("parts.csv"),
                ipn: "R002".to_string(),
                field: "priority".to_string(),
                value: "high".to_string(),
            }
        );
        let message = err.to_string();
        assert!(message.contains("priority"));
        assert!(message.contains("'high'"));
        assert!(message.contains("parts.csv"));
    }

    #[test]
    fn test_primary_source_shadows_secondary() {
        let primary = source(
            "primary.csv",
            vec![InventoryItem::new("C001", Category::Capacitor, "100nF", "primary.csv")],
        );
        let secondary = source(
            "secondary.csv",
            vec![InventoryItem::new("C001", Category::Capacitor, "220nF", "secondary.csv")],
        );
        let components = [
            Component::new("C1", "Device:C", "100nF"),
            Component::new("C2", "Device:C", "220nF"),
        ];

        let report = run(&components, &[primary, secondary]);

        let c1 = report.get("C1").unwrap();
        assert_eq!(c1.ipn(), Some("C001"));
        assert_eq!(c1.item.as_ref().unwrap().value.raw, "100nF");
        assert_eq!(report.get("C2").unwrap().outcome, MatchOutcome::NoEligible);
        assert_eq!(
            report.summary.shadowed,
            vec![ShadowedItem {
                ipn: "C001".to_string(),
                kept_source: SourceId::from("primary.csv"),
                shadowed_source: SourceId::from("secondary.csv"),
            }]
        );
    }

    #[test]
    fn test_results_do_not_depend_on_row_order() {
        let items = vec![
            resistor("R_B", "10k").with_priority(Priority::new(3)),
            resistor("R_A", "10k").with_priority(Priority::new(3)),
            resistor("R_C", "4k7").with_priority(Priority::new(0)),
        ];
        let mut reversed = items.clone();
        reversed.reverse();
        let components = [
            Component::new("R1", "Device:R", "10k"),
            Component::new("R2", "Device:R", "4.7k"),
        ];

        let forward = run(&components, &[source("inv", items)]);
        let backward = run(&components, &[source("inv", reversed)]);

        assert_eq!(selected(&forward, "R1"), Some("R_A"));
        assert_eq!(selected(&forward, "R2"), Some("R_C"));
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_category_isolation() {
        // A capacitor with an identical value string must never stand in for a resistor
        let inventory = source(
            "inv",
            vec![
                InventoryItem::new("C10K", Category::Capacitor, "10k", "inv")
                    .with_package("0603"),
            ],
        );
        let component = Component::new("R1", "Device:R", "10k").with_package("0603");

        let report = run(&[component], &[inventory]);
        assert_eq!(report.results[0].outcome, MatchOutcome::NoCandidates);
    }

    #[test]
    fn test_fabricator_filter_is_strict() {
        let inventory = source(
            "inv",
            vec![
                resistor("BEST", "10k")
                    .with_property("tolerance", "1%")
                    .with_priority(Priority::HIGHEST),
                resistor("ORDERABLE", "10k")
                    .with_package("0805")
                    .with_property("lcsc", "C17414"),
            ],
        );
        let component = Component::new("R1", "Device:R", "10k")
            .with_package("0603")
            .with_property("tolerance", "1%");
        let config = MatchConfig {
            fabricator: Some(Fabricator::new("jlc", "lcsc")),
            ..MatchConfig::default()
        };

        let report = match_components(&[component], &[inventory], &Classifier::default(), config);
        assert_eq!(selected(&report, "R1"), Some("ORDERABLE"));
    }

    #[test]
    fn test_report_serializes() {
        let report = run(
            &[Component::new("R1", "Device:R", "10k")],
            &[source("inv", vec![resistor("R010", "10k")])],
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["results"][0]["outcome"], "matched");
        assert_eq!(json["results"][0]["item"]["ipn"], "R010");
        assert_eq!(json["results"][0]["category"], "RES");
        assert_eq!(json["summary"]["matched"], 1);
    }
}
