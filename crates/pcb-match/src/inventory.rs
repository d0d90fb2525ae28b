use std::collections::{BTreeMap, HashSet};
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::component::TOLERANCE;
use crate::value::{parse_tolerance, ParsedValue};
use crate::{Category, InventoryError};

/// Canonical inventory field names consumed directly by [`InventoryItem`].
/// Every other field lands in the property bag.
pub mod fields {
    pub const IPN: &str = "ipn";
    pub const CATEGORY: &str = "category";
    pub const VALUE: &str = "value";
    pub const PACKAGE: &str = "package";
    pub const PRIORITY: &str = "priority";
    pub const DESCRIPTION: &str = "description";
    pub const MANUFACTURER: &str = "manufacturer";
    pub const MPN: &str = "mpn";
}

/// Preference among equally scored candidates; lower is preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(u32);

impl Priority {
    pub const HIGHEST: Priority = Priority(0);
    /// Sentinel for "least preferred", also used when a source has no priority column
    pub const LOWEST: Priority = Priority(2_147_483_647);

    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Strict parse: only plain non-negative integers are accepted. Empty,
    /// signed, fractional and textual values are rejected rather than coerced.
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse().ok().map(Self)
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::LOWEST
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies the inventory source an item was loaded from (usually a file name)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub ipn: String,
    pub category: Category,
    pub value: ParsedValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    pub priority: Priority,
    pub source: SourceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mpn: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl InventoryItem {
    pub fn new(
        ipn: impl Into<String>,
        category: Category,
        value: &str,
        source: impl Into<SourceId>,
    ) -> Self {
        let value = ParsedValue::parse(value, Some(&category));
        Self {
            ipn: ipn.into(),
            category,
            value,
            package: None,
            priority: Priority::default(),
            source: source.into(),
            description: None,
            manufacturer: None,
            mpn: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// A non-blank property value
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Tolerance in percentage points, if stated and parsable
    pub fn tolerance(&self) -> Option<Decimal> {
        self.property(TOLERANCE).and_then(parse_tolerance)
    }

    /// Build an item from one canonical-key record of `source_id`.
    /// `row` is the 1-based data row used in error messages.
    fn from_record(
        source_id: &SourceId,
        row: usize,
        mut record: BTreeMap<String, String>,
    ) -> Result<Self, InventoryError> {
        let mut take = |key: &str| {
            record
                .remove(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let missing = |field: &str| InventoryError::MissingField {
            source_id: source_id.clone(),
            row,
            field: field.to_string(),
        };

        let ipn = take(fields::IPN).ok_or_else(|| missing(fields::IPN))?;
        let category: Category = take(fields::CATEGORY)
            .ok_or_else(|| missing(fields::CATEGORY))?
            .parse()?;
        let value = take(fields::VALUE).unwrap_or_default();
        let package = take(fields::PACKAGE);
        let description = take(fields::DESCRIPTION);
        let manufacturer = take(fields::MANUFACTURER);
        let mpn = take(fields::MPN);

        // Absent column means "least preferred"; a present but blank or
        // malformed cell is an error.
        let priority = match record.remove(fields::PRIORITY) {
            None => Priority::LOWEST,
            Some(raw) => {
                Priority::parse(&raw).ok_or_else(|| InventoryError::InvalidPriority {
                    source_id: source_id.clone(),
                    ipn: ipn.clone(),
                    field: fields::PRIORITY.to_string(),
                    value: raw.clone(),
                })?
            }
        };

        let properties = record
            .into_iter()
            .map(|(k, v)| (k, v.trim().to_string()))
            .filter(|(_, v)| !v.is_empty())
            .collect();

        let mut item = InventoryItem::new(ipn, category, &value, source_id.clone());
        item.package = package;
        item.priority = priority;
        item.description = description;
        item.manufacturer = manufacturer;
        item.mpn = mpn;
        item.properties = properties;
        Ok(item)
    }
}

/// One validated inventory source. Sources are handed to the merger in
/// precedence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySource {
    id: SourceId,
    items: Vec<InventoryItem>,
}

impl InventorySource {
    /// Wrap already-built items, checking IPN uniqueness within the source.
    pub fn new(
        id: impl Into<SourceId>,
        items: Vec<InventoryItem>,
    ) -> Result<Self, InventoryError> {
        let id = id.into();
        let mut seen = HashSet::new();
        for item in &items {
            if !seen.insert(item.ipn.as_str()) {
                return Err(InventoryError::DuplicateIpn {
                    source_id: id.clone(),
                    ipn: item.ipn.clone(),
                });
            }
        }
        Ok(Self { id, items })
    }

    /// Validate and build a source from canonical-key records, e.g. rows of
    /// a spreadsheet after header normalisation. The first invalid record
    /// rejects the whole source.
    pub fn from_records<I>(id: impl Into<SourceId>, records: I) -> Result<Self, InventoryError>
    where
        I: IntoIterator<Item = BTreeMap<String, String>>,
    {
        let id = id.into();
        let items = records
            .into_iter()
            .enumerate()
            .map(|(idx, record)| InventoryItem::from_record(&id, idx + 1, record))
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!("Loaded {} inventory items from '{}'", items.len(), id);
        Self::new(id, items)
    }

    pub fn id(&self) -> &SourceId {
        &self.id
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
