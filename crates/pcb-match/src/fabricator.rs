use serde::{Deserialize, Serialize};

use crate::InventoryItem;

/// An assembly service and the inventory property holding its part number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fabricator {
    pub name: String,
    pub part_number_field: String,
}

impl Fabricator {
    pub fn new(name: impl Into<String>, part_number_field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            part_number_field: part_number_field.into(),
        }
    }

    /// The item's part number for this fabricator, if non-blank
    pub fn part_number<'a>(&self, item: &'a InventoryItem) -> Option<&'a str> {
        item.property(&self.part_number_field)
    }

    pub fn can_order(&self, item: &InventoryItem) -> bool {
        self.part_number(item).is_some()
    }
}

/// Fabricators known without any configuration
pub fn builtin_fabricators() -> Vec<Fabricator> {
    vec![
        Fabricator::new("jlc", "lcsc"),
        Fabricator::new("pcbway", "pcbway"),
        Fabricator::new("seeed", "seeed_sku"),
    ]
}

/// Strict candidate filter for the selected fabricator.
///
/// Items without the fabricator's part number are removed outright: they
/// cannot be ordered through that fabricator however well they match. With
/// no fabricator selected the pool passes through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct FabricatorFilter<'f> {
    fabricator: Option<&'f Fabricator>,
}

impl<'f> FabricatorFilter<'f> {
    pub fn new(fabricator: Option<&'f Fabricator>) -> Self {
        Self { fabricator }
    }

    pub fn apply<'i>(&self, pool: Vec<&'i InventoryItem>) -> Vec<&'i InventoryItem> {
        match self.fabricator {
            None => pool,
            Some(fabricator) => pool
                .into_iter()
                .filter(|item| {
                    let keep = fabricator.can_order(item);
                    if !keep {
                        log::debug!(
                            "{}: dropping {} (no '{}')",
                            fabricator.name,
                            item.ipn,
                            fabricator.part_number_field
                        );
                    }
                    keep
                })
                .collect(),
        }
    }
}
