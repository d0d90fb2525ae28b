//! Per-component candidate selection.
//!
//! For each component the matcher classifies, narrows the merged pool to the
//! component's category, applies the fabricator filter, scores what remains
//! and ranks the eligible candidates by score, then priority, then IPN. The
//! IPN tie-break makes the outcome independent of input order.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::classify::Classifier;
use crate::diagnostics::MatchSummary;
use crate::fabricator::{Fabricator, FabricatorFilter};
use crate::inventory::Priority;
use crate::merge::MergedInventory;
use crate::score::{Requirements, ScoreCard, Scored, Scorer, DEFAULT_SCORED_PROPERTIES};
use crate::{Category, Component, InventoryItem, SourceId};

/// Why a component ended up with or without a part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    Matched,
    /// No category could be resolved for the component
    Unclassified,
    /// Nothing in the inventory shares the component's category
    NoCandidates,
    /// Candidates existed, but none carry the fabricator's part number
    FabricatorFiltered,
    /// Every remaining candidate was disqualified
    NoEligible,
}

impl MatchOutcome {
    pub fn is_matched(self) -> bool {
        self == MatchOutcome::Matched
    }

    pub fn describe(self) -> &'static str {
        match self {
            MatchOutcome::Matched => "matched",
            MatchOutcome::Unclassified => "unclassified",
            MatchOutcome::NoCandidates => "no inventory parts in category",
            MatchOutcome::FabricatorFiltered => "no part orderable from the fabricator",
            MatchOutcome::NoEligible => "no eligible candidate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchConfig {
    /// Restrict candidates to parts orderable from this fabricator
    pub fabricator: Option<Fabricator>,
    /// Extra property keys compared for a small bonus
    pub scored_properties: Vec<String>,
    /// Number of runner-up candidates kept on each result
    pub alternatives: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            fabricator: None,
            scored_properties: DEFAULT_SCORED_PROPERTIES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            alternatives: 0,
        }
    }
}

/// A ranked eligible candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub ipn: String,
    pub source: SourceId,
    pub score: Decimal,
    pub priority: Priority,
    pub quality: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub reference: String,
    pub value: String,
    pub category: Option<Category>,
    pub package: Option<String>,
    pub dnp: bool,
    pub outcome: MatchOutcome,
    pub item: Option<InventoryItem>,
    pub score: Option<Decimal>,
    pub quality: Option<String>,
    /// Priority of the selected item, i.e. the one used for tie-breaking
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<Candidate>,
}

impl MatchResult {
    fn unmatched(component: &Component, category: Option<Category>, outcome: MatchOutcome) -> Self {
        log::info!("{}: {}", component.reference, outcome.describe());
        Self {
            reference: component.reference.clone(),
            value: component.value.clone(),
            category,
            package: component.package(),
            dnp: component.dnp,
            outcome,
            item: None,
            score: None,
            quality: None,
            priority: None,
            alternatives: Vec::new(),
        }
    }

    pub fn is_matched(&self) -> bool {
        self.outcome.is_matched()
    }

    pub fn ipn(&self) -> Option<&str> {
        self.item.as_ref().map(|item| item.ipn.as_str())
    }
}

/// Every component's result in input order, plus the run summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchReport {
    pub results: Vec<MatchResult>,
    pub summary: MatchSummary,
}

impl MatchReport {
    pub fn get(&self, reference: &str) -> Option<&MatchResult> {
        self.results.iter().find(|r| r.reference == reference)
    }
}

struct Ranked<'i> {
    item: &'i InventoryItem,
    card: ScoreCard,
}

fn rank(a: &Ranked<'_>, b: &Ranked<'_>) -> Ordering {
    b.card
        .score
        .cmp(&a.card.score)
        .then(a.item.priority.cmp(&b.item.priority))
        .then_with(|| a.item.ipn.cmp(&b.item.ipn))
}

pub struct InventoryMatcher<'a> {
    inventory: &'a MergedInventory,
    classifier: &'a Classifier,
    fabricator: Option<Fabricator>,
    scorer: Scorer,
    alternatives: usize,
}

impl<'a> InventoryMatcher<'a> {
    pub fn new(
        inventory: &'a MergedInventory,
        classifier: &'a Classifier,
        config: MatchConfig,
    ) -> Self {
        Self {
            inventory,
            classifier,
            fabricator: config.fabricator,
            scorer: Scorer::new(config.scored_properties),
            alternatives: config.alternatives,
        }
    }

    pub fn match_component(&self, component: &Component) -> MatchResult {
        let Some(category) = self.classifier.classify(component) else {
            return MatchResult::unmatched(component, None, MatchOutcome::Unclassified);
        };

        let pool: Vec<&InventoryItem> = self.inventory.in_category(&category).collect();
        if pool.is_empty() {
            return MatchResult::unmatched(component, Some(category), MatchOutcome::NoCandidates);
        }

        let pool = FabricatorFilter::new(self.fabricator.as_ref()).apply(pool);
        if pool.is_empty() {
            return MatchResult::unmatched(
                component,
                Some(category),
                MatchOutcome::FabricatorFiltered,
            );
        }

        let requirements = Requirements::new(component, category.clone());
        let mut ranked: Vec<Ranked<'_>> = pool
            .into_iter()
            .filter_map(|item| match self.scorer.score(&requirements, item) {
                Scored::Eligible(card) => Some(Ranked { item, card }),
                Scored::Disqualified(reason) => {
                    log::debug!("{}: {} disqualified ({reason})", component.reference, item.ipn);
                    None
                }
            })
            .collect();

        if ranked.is_empty() {
            return MatchResult::unmatched(component, Some(category), MatchOutcome::NoEligible);
        }
        ranked.sort_by(rank);

        let alternatives = ranked
            .iter()
            .skip(1)
            .take(self.alternatives)
            .map(|r| Candidate {
                ipn: r.item.ipn.clone(),
                source: r.item.source.clone(),
                score: r.card.score,
                priority: r.item.priority,
                quality: r.card.quality(),
            })
            .collect();

        let best = &ranked[0];
        let quality = best.card.quality();
        log::debug!(
            "{}: selected {} from '{}' (score {}, priority {}, {quality})",
            component.reference,
            best.item.ipn,
            best.item.source,
            best.card.score,
            best.item.priority
        );

        MatchResult {
            reference: component.reference.clone(),
            value: component.value.clone(),
            package: requirements.package.clone(),
            category: Some(category),
            dnp: component.dnp,
            outcome: MatchOutcome::Matched,
            item: Some(best.item.clone()),
            score: Some(best.card.score),
            quality: Some(quality),
            priority: Some(best.item.priority),
            alternatives,
        }
    }

    /// Match every component, in input order
    pub fn match_all(&self, components: &[Component]) -> MatchReport {
        let mut summary = MatchSummary::new(self.inventory.shadowed().to_vec());
        let results: Vec<MatchResult> = components
            .iter()
            .map(|component| {
                let result = self.match_component(component);
                summary.record(result.outcome);
                result
            })
            .collect();

        log::info!("Matched {} of {} components", summary.matched, summary.total);
        MatchReport { results, summary }
    }
}
