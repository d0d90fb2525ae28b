//! Grouping of match results into bill-of-materials lines.
//!
//! Matched components sharing an IPN and DNP state become one line.
//! Unmatched components are grouped by what they ask for (category, value
//! and package) so the gaps in the inventory are listed once each. Numeric
//! values of unmatched lines are shown in canonical form, so `4k7` and
//! `4.7k` share one line listed as `4.7k`.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::designator::Designator;
use crate::fabricator::Fabricator;
use crate::matcher::{MatchOutcome, MatchResult};
use crate::value::{format_magnitude, parse_magnitude};
use crate::Category;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BomLine {
    pub designators: BTreeSet<Designator>,
    pub quantity: usize,
    pub ipn: Option<String>,
    pub category: Option<Category>,
    pub value: String,
    pub package: Option<String>,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub mpn: Option<String>,
    /// Part number for the selected fabricator, when one is selected
    pub fabricator_part: Option<String>,
    pub outcome: MatchOutcome,
    pub dnp: bool,
}

impl BomLine {
    /// Designators joined with commas, in natural order
    pub fn designator_list(&self) -> String {
        self.designators
            .iter()
            .map(Designator::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Matched {
        ipn: String,
        dnp: bool,
    },
    Unmatched {
        category: Option<Category>,
        value: String,
        package: Option<String>,
        outcome: MatchOutcome,
        dnp: bool,
    },
}

/// Canonical form of an unmatched component's numeric value
fn canonical_value(result: &MatchResult) -> Option<String> {
    let category = result.category.as_ref().filter(|c| c.is_numeric())?;
    let magnitude = parse_magnitude(&result.value, category).ok()?;
    Some(format_magnitude(magnitude, category))
}

impl GroupKey {
    fn of(result: &MatchResult) -> Self {
        match &result.item {
            Some(item) => GroupKey::Matched {
                ipn: item.ipn.clone(),
                dnp: result.dnp,
            },
            None => GroupKey::Unmatched {
                category: result.category.clone(),
                value: canonical_value(result)
                    .unwrap_or_else(|| result.value.to_ascii_lowercase()),
                package: result.package.as_deref().map(str::to_ascii_uppercase),
                outcome: result.outcome,
                dnp: result.dnp,
            },
        }
    }
}

fn new_line(result: &MatchResult, fabricator: Option<&Fabricator>) -> BomLine {
    let item = result.item.as_ref();
    BomLine {
        designators: BTreeSet::new(),
        quantity: 0,
        ipn: item.map(|i| i.ipn.clone()),
        category: result.category.clone(),
        value: match item {
            Some(item) => item.value.raw.clone(),
            None => canonical_value(result).unwrap_or_else(|| result.value.clone()),
        },
        package: item
            .and_then(|i| i.package.clone())
            .or_else(|| result.package.clone()),
        description: item.and_then(|i| i.description.clone()),
        manufacturer: item.and_then(|i| i.manufacturer.clone()),
        mpn: item.and_then(|i| i.mpn.clone()),
        fabricator_part: item
            .zip(fabricator)
            .and_then(|(i, f)| f.part_number(i))
            .map(str::to_string),
        outcome: result.outcome,
        dnp: result.dnp,
    }
}

/// Group results into BOM lines: populated lines first, then DNP, each
/// ordered by first designator.
pub fn group_results(results: &[MatchResult], fabricator: Option<&Fabricator>) -> Vec<BomLine> {
    let mut groups: HashMap<GroupKey, BomLine> = HashMap::new();

    for result in results {
        let line = groups
            .entry(GroupKey::of(result))
            .or_insert_with(|| new_line(result, fabricator));
        line.designators.insert(result.reference.as_str().into());
        line.quantity += 1;
    }

    let mut lines: Vec<BomLine> = groups.into_values().collect();
    lines.sort_by(|a, b| {
        a.dnp
            .cmp(&b.dnp)
            .then_with(|| a.designators.iter().next().cmp(&b.designators.iter().next()))
    });

    log::debug!("Grouped {} results into {} BOM lines", results.len(), lines.len());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classifier;
    use crate::matcher::{InventoryMatcher, MatchConfig};
    use crate::merge::merge_sources;
    use crate::{Component, InventoryItem, InventorySource};

    fn results(components: &[Component]) -> Vec<MatchResult> {
        let source = InventorySource::new(
            "inv",
            vec![
                InventoryItem::new("R100", Category::Resistor, "10k", "inv")
                    .with_package("0603")
                    .with_property("lcsc", "C25804"),
                InventoryItem::new("C100", Category::Capacitor, "100nF", "inv")
                    .with_package("0402"),
            ],
        )
        .unwrap();
        let inventory = merge_sources(&[source]);
        let classifier = Classifier::default();
        InventoryMatcher::new(&inventory, &classifier, MatchConfig::default())
            .match_all(components)
            .results
    }

    #[test]
    fn test_grouping_and_order() {
        let components = vec![
            Component::new("R10", "Device:R", "10k"),
            Component::new("C1", "Device:C", "100n"),
            Component::new("R2", "Device:R", "10K"),
            Component::new("R3", "Device:R", "10k").with_dnp(true),
            Component::new("R4", "Device:R", "47k"),
            Component::new("R5", "Device:R", "47k"),
        ];
        let jlc = Fabricator::new("jlc", "lcsc");

        let lines = group_results(&results(&components), Some(&jlc));
        let summary: Vec<_> = lines
            .iter()
            .map(|l| (l.designator_list(), l.quantity, l.ipn.as_deref(), l.dnp))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("C1".to_string(), 1, Some("C100"), false),
                ("R2,R10".to_string(), 2, Some("R100"), false),
                ("R4,R5".to_string(), 2, None, false),
                ("R3".to_string(), 1, Some("R100"), true),
            ]
        );

        assert_eq!(lines[1].fabricator_part.as_deref(), Some("C25804"));
        assert_eq!(lines[1].value, "10k");
        assert_eq!(lines[1].package.as_deref(), Some("0603"));
        assert_eq!(lines[0].fabricator_part, None);
        assert_eq!(lines[2].outcome, MatchOutcome::NoEligible);
        assert_eq!(lines[2].value, "47k");
    }

    #[test]
    fn test_unmatched_values_group_by_magnitude() {
        let components = vec![
            Component::new("R1", "Device:R", "4k7"),
            Component::new("R2", "Device:R", "4.7k"),
            Component::new("R3", "Device:R", "4700"),
            Component::new("U1", "MCU:Chip", "STM32"),
        ];
        let lines = group_results(&results(&components), None);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].designator_list(), "R1,R2,R3");
        assert_eq!(lines[0].value, "4.7k");
        // Text values are listed as written
        assert_eq!(lines[1].value, "STM32");
    }

    #[test]
    fn test_without_fabricator_no_part_numbers() {
        let lines = group_results(&results(&[Component::new("R1", "Device:R", "10k")]), None);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].fabricator_part, None);
    }
}
