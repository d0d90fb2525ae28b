use std::fmt;

use serde::Serialize;

use crate::matcher::MatchOutcome;
use crate::ShadowedItem;

/// Run-level counts of match outcomes, plus the IPNs hidden by precedence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub total: usize,
    pub matched: usize,
    pub unclassified: usize,
    pub no_candidates: usize,
    pub fabricator_filtered: usize,
    pub no_eligible: usize,
    pub shadowed: Vec<ShadowedItem>,
}

impl MatchSummary {
    pub fn new(shadowed: Vec<ShadowedItem>) -> Self {
        Self {
            shadowed,
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: MatchOutcome) {
        self.total += 1;
        match outcome {
            MatchOutcome::Matched => self.matched += 1,
            MatchOutcome::Unclassified => self.unclassified += 1,
            MatchOutcome::NoCandidates => self.no_candidates += 1,
            MatchOutcome::FabricatorFiltered => self.fabricator_filtered += 1,
            MatchOutcome::NoEligible => self.no_eligible += 1,
        }
    }

    pub fn unmatched(&self) -> usize {
        self.total - self.matched
    }
}

impl fmt::Display for MatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} of {} components matched", self.matched, self.total)?;

        let rows = [
            (MatchOutcome::Unclassified, self.unclassified),
            (MatchOutcome::NoCandidates, self.no_candidates),
            (MatchOutcome::FabricatorFiltered, self.fabricator_filtered),
            (MatchOutcome::NoEligible, self.no_eligible),
        ];
        for (outcome, count) in rows {
            if count > 0 {
                writeln!(f, "  {count} {}", outcome.describe())?;
            }
        }

        if !self.shadowed.is_empty() {
            writeln!(f, "{} shadowed inventory rows:", self.shadowed.len())?;
            for s in &self.shadowed {
                writeln!(
                    f,
                    "  {} from '{}' (kept '{}')",
                    s.ipn, s.shadowed_source, s.kept_source
                )?;
            }
        }
        Ok(())
    }
}
