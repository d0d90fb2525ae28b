use std::collections::HashMap;

use serde::Serialize;

use crate::{Category, InventoryItem, InventorySource, SourceId};

/// An inventory row hidden by an earlier source defining the same IPN
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShadowedItem {
    pub ipn: String,
    pub kept_source: SourceId,
    pub shadowed_source: SourceId,
}

/// The candidate pool built from all sources, plus what precedence hid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedInventory {
    items: Vec<InventoryItem>,
    shadowed: Vec<ShadowedItem>,
}

impl MergedInventory {
    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn shadowed(&self) -> &[ShadowedItem] {
        &self.shadowed
    }

    pub fn get(&self, ipn: &str) -> Option<&InventoryItem> {
        self.items.iter().find(|item| item.ipn == ipn)
    }

    /// Items of one category. The iterator borrows only the inventory.
    pub fn in_category<'a>(
        &'a self,
        category: &Category,
    ) -> impl Iterator<Item = &'a InventoryItem> + use<'a> {
        let category = category.clone();
        self.items
            .iter()
            .filter(move |item| item.category == category)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Merge sources given in precedence order (primary first).
///
/// The first occurrence of an IPN wins. Later occurrences are recorded as
/// shadowed and never take part in matching. Pool order is source order,
/// then row order, so the result depends only on the inputs.
pub fn merge_sources(sources: &[InventorySource]) -> MergedInventory {
    let mut owner: HashMap<&str, &SourceId> = HashMap::new();
    let mut merged = MergedInventory::default();

    for source in sources {
        for item in source.items() {
            match owner.get(item.ipn.as_str()) {
                Some(&kept_source) => {
                    log::info!(
                        "IPN {} from '{}' is shadowed by '{}'",
                        item.ipn,
                        source.id(),
                        kept_source
                    );
                    merged.shadowed.push(ShadowedItem {
                        ipn: item.ipn.clone(),
                        kept_source: kept_source.clone(),
                        shadowed_source: source.id().clone(),
                    });
                }
                None => {
                    owner.insert(item.ipn.as_str(), source.id());
                    merged.items.push(item.clone());
                }
            }
        }
    }

    merged
}
