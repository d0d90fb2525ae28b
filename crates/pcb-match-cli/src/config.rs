use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use pcb_match::score::DEFAULT_SCORED_PROPERTIES;
use pcb_match::{
    builtin_fabricators, Category, ClassificationRule, Classifier, Fabricator, MatchConfig,
    RuleField,
};
use serde::Deserialize;

/// Contents of a `--config` TOML file. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub scored_properties: Option<Vec<String>>,
    #[serde(default)]
    pub alternatives: usize,
    /// Drop the built-in classification table instead of appending it
    #[serde(default)]
    pub replace_default_rules: bool,
    #[serde(default)]
    pub classify: Vec<RuleConfig>,
    #[serde(default)]
    pub fabricators: BTreeMap<String, FabricatorConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    #[serde(default)]
    pub field: RuleField,
    pub pattern: String,
    pub category: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FabricatorConfig {
    pub part_number_field: String,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, fabricator) in &self.fabricators {
            if fabricator.part_number_field.trim().is_empty() {
                bail!("Fabricator '{name}' has an empty part_number_field");
            }
        }
        if self.replace_default_rules && self.classify.is_empty() {
            bail!("replace_default_rules is set but no [[classify]] rules are given");
        }
        Ok(())
    }

    /// Configured rules first, in file order, then the built-in table
    pub fn classifier(&self) -> Result<Classifier> {
        let mut rules = self
            .classify
            .iter()
            .map(|rule| -> Result<ClassificationRule> {
                let category: Category = rule.category.parse()?;
                Ok(ClassificationRule::new(rule.field, &rule.pattern, category)?)
            })
            .collect::<Result<Vec<_>>>()?;

        if !self.replace_default_rules {
            rules.extend(Classifier::default_rules());
        }
        log::debug!("Classifier has {} rules", rules.len());
        Ok(Classifier::new(rules))
    }

    /// Built-in fabricators, overridden or extended by the config file
    pub fn fabricators(&self) -> Vec<Fabricator> {
        let mut fabricators: Vec<Fabricator> = builtin_fabricators()
            .into_iter()
            .filter(|f| !self.fabricators.contains_key(&f.name))
            .collect();
        fabricators.extend(
            self.fabricators
                .iter()
                .map(|(name, f)| Fabricator::new(name.as_str(), f.part_number_field.trim())),
        );
        fabricators
    }

    pub fn match_config(&self, fabricator: Option<&str>) -> Result<MatchConfig> {
        let fabricator = match fabricator {
            None => None,
            Some(name) => {
                let known = self.fabricators();
                let found = known.iter().find(|f| f.name.eq_ignore_ascii_case(name));
                match found {
                    Some(f) => Some(f.clone()),
                    None => {
                        let names: Vec<_> = known.iter().map(|f| f.name.as_str()).collect();
                        bail!(
                            "Unknown fabricator '{name}' (known: {})",
                            names.join(", ")
                        );
                    }
                }
            }
        };

        Ok(MatchConfig {
            fabricator,
            scored_properties: self.scored_properties.clone().unwrap_or_else(|| {
                DEFAULT_SCORED_PROPERTIES
                    .iter()
                    .map(|p| p.to_string())
                    .collect()
            }),
            alternatives: self.alternatives,
        })
    }
}
