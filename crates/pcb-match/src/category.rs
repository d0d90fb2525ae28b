use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::InventoryError;

/// Coarse component class used to restrict candidate matching.
///
/// Tags outside the built-in set are kept as [`Category::Other`], upper-cased,
/// so rule tables and inventories can introduce their own classes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    Resistor,
    Capacitor,
    Inductor,
    Led,
    Diode,
    Transistor,
    IntegratedCircuit,
    Connector,
    Switch,
    Crystal,
    Fuse,
    Other(String),
}

impl Category {
    /// Short tag used in inventories and reports
    pub fn tag(&self) -> &str {
        match self {
            Category::Resistor => "RES",
            Category::Capacitor => "CAP",
            Category::Inductor => "IND",
            Category::Led => "LED",
            Category::Diode => "DIO",
            Category::Transistor => "Q",
            Category::IntegratedCircuit => "IC",
            Category::Connector => "CON",
            Category::Switch => "SW",
            Category::Crystal => "XTAL",
            Category::Fuse => "FUSE",
            Category::Other(tag) => tag,
        }
    }

    /// Categories whose values are physical magnitudes that must match exactly.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Category::Resistor | Category::Capacitor | Category::Inductor
        )
    }
}

impl FromStr for Category {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_uppercase();
        let category = match tag.as_str() {
            "" => {
                return Err(InventoryError::InvalidCategory {
                    value: s.to_string(),
                });
            }
            "RES" | "R" | "RESISTOR" => Category::Resistor,
            "CAP" | "C" | "CAPACITOR" => Category::Capacitor,
            "IND" | "L" | "INDUCTOR" => Category::Inductor,
            "LED" => Category::Led,
            "DIO" | "D" | "DIODE" => Category::Diode,
            "Q" | "TRANSISTOR" | "FET" | "MOSFET" | "BJT" => Category::Transistor,
            "IC" | "U" => Category::IntegratedCircuit,
            "CON" | "J" | "CONNECTOR" => Category::Connector,
            "SW" | "SWITCH" => Category::Switch,
            "XTAL" | "Y" | "CRYSTAL" => Category::Crystal,
            "FUSE" | "F" => Category::Fuse,
            _ => Category::Other(tag),
        };
        Ok(category)
    }
}

impl TryFrom<String> for Category {
    type Error = InventoryError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Category> for String {
    fn from(category: Category) -> String {
        category.tag().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}
