//! CSV/TSV loaders for components and inventories.
//!
//! Headers are normalised to the engine's canonical keys so that spreadsheet
//! exports can be used as-is: `LCSC Part` becomes `lcsc`, `Ref` becomes
//! `reference`, and so on. Unknown columns become properties.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use pcb_match::{Category, Component, InventorySource};

type Record = BTreeMap<String, String>;

/// Canonical key for a column header
pub fn normalize_header(header: &str) -> String {
    let key: String = header
        .trim()
        .trim_start_matches('\u{feff}')
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect();

    let canonical = match key.as_str() {
        "ref" | "refs" | "designator" | "designators" | "reference_designator" => "reference",
        "part_number" | "internal_part_number" | "part_no" => "ipn",
        "lib" | "library" | "symbol" | "lib_id" | "libid" => "lib_id",
        "type" | "class" => "category",
        "lcsc_part" | "lcsc_part_number" | "lcsc_#" => "lcsc",
        "mfr" | "mfg" => "manufacturer",
        "mfr_part" | "mfr_part_number" | "manufacturer_part_number" | "mfg_part" => "mpn",
        "tol" => "tolerance",
        "rating" | "voltage_rating" => "voltage",
        "do_not_populate" | "do_not_place" => "dnp",
        "pkg" | "size" => "package",
        _ => return key,
    };
    canonical.to_string()
}

fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}

/// Read a delimited file into canonical-key records. Blank cells are kept so
/// that validation can tell an empty cell from a missing column. Short rows
/// get a blank cell for every column they leave out. Fully blank rows are
/// skipped.
pub fn read_records(path: &Path) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_for(path))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .iter()
        .map(normalize_header)
        .collect();

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row
            .with_context(|| format!("Failed to read row {} of {}", idx + 1, path.display()))?;
        let record: Record = headers
            .iter()
            .zip(row.iter().chain(std::iter::repeat("")))
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect();
        if record.values().any(|value| !value.is_empty()) {
            records.push(record);
        }
    }

    log::debug!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Load one inventory source. The file path, as given, identifies the source
/// in diagnostics.
pub fn load_inventory(path: &Path) -> Result<InventorySource> {
    let records = read_records(path)?;
    let source = InventorySource::from_records(path.display().to_string(), records)?;
    if source.is_empty() {
        log::warn!("Inventory {} has no items", path.display());
    }
    Ok(source)
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "yes" | "y" | "true" | "x" | "dnp"
    )
}

/// Load schematic components. Rows whose reference starts with `#` (power
/// symbols, flags) are skipped.
pub fn load_components(path: &Path) -> Result<Vec<Component>> {
    let mut components = Vec::new();

    for (idx, mut record) in read_records(path)?.into_iter().enumerate() {
        record.retain(|_, value| !value.is_empty());
        let Some(reference) = record.remove("reference") else {
            bail!(
                "Missing required field 'reference' in row {} of {}",
                idx + 1,
                path.display()
            );
        };
        if reference.starts_with('#') {
            continue;
        }

        let mut component = Component::new(
            reference,
            record.remove("lib_id").unwrap_or_default(),
            record.remove("value").unwrap_or_default(),
        );
        if let Some(footprint) = record.remove("footprint") {
            component = component.with_footprint(footprint);
        }
        if let Some(package) = record.remove("package") {
            component = component.with_package(package);
        }
        if let Some(category) = record.remove("category") {
            let category: Category = category
                .parse()
                .with_context(|| format!("In row {} of {}", idx + 1, path.display()))?;
            component = component.with_category(category);
        }
        if let Some(dnp) = record.remove("dnp") {
            component = component.with_dnp(parse_flag(&dnp));
        }
        component.properties = record;
        components.push(component);
    }

    log::debug!("Loaded {} components from {}", components.len(), path.display());
    Ok(components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use pcb_match::{InventoryError, Priority};

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("LCSC Part"), "lcsc");
        assert_eq!(normalize_header(" Ref "), "reference");
        assert_eq!(normalize_header("Designator"), "reference");
        assert_eq!(normalize_header("Part Number"), "ipn");
        assert_eq!(normalize_header("IPN"), "ipn");
        assert_eq!(normalize_header("Seeed-SKU"), "seeed_sku");
        assert_eq!(normalize_header("Voltage"), "voltage");
    }

    #[test]
    fn test_load_inventory_csv() {
        let temp = TempDir::new().unwrap();
        let file = temp.child("inventory.csv");
        file.write_str(
            "IPN,Category,Value,Package,Priority,LCSC Part,Tolerance\n\
             R010,RES,10k,0603,1,C25804,1%\n\
             C001,CAP,100nF,0402,0,,\n",
        )
        .unwrap();

        let source = load_inventory(file.path()).unwrap();
        assert_eq!(source.len(), 2);

        let r010 = &source.items()[0];
        assert_eq!(r010.category, Category::Resistor);
        assert_eq!(r010.priority, Priority::new(1));
        assert_eq!(r010.property("lcsc"), Some("C25804"));
        assert_eq!(r010.property("tolerance"), Some("1%"));

        let c001 = &source.items()[1];
        assert_eq!(c001.priority, Priority::HIGHEST);
        assert_eq!(c001.property("lcsc"), None);
    }

    #[test]
    fn test_load_inventory_tsv() {
        let temp = TempDir::new().unwrap();
        let file = temp.child("stock.tsv");
        file.write_str("ipn\tcategory\tvalue\nL1\tIND\t10uH\n").unwrap();

        let source = load_inventory(file.path()).unwrap();
        assert_eq!(source.items()[0].value.raw, "10uH");
        assert_eq!(source.items()[0].category, Category::Inductor);
        // No priority column at all means least preferred
        assert_eq!(source.items()[0].priority, Priority::LOWEST);
    }

    #[test]
    fn test_textual_priority_is_rejected() {
        let temp = TempDir::new().unwrap();
        let file = temp.child("parts.csv");
        file.write_str("IPN,Category,Value,Priority\nR1,RES,1k,high\n").unwrap();

        let err = load_inventory(file.path()).unwrap_err();
        let err = err.downcast_ref::<InventoryError>().unwrap();
        assert!(matches!(err, InventoryError::InvalidPriority { value, .. } if *value == "high"));
    }

    #[test]
    fn test_blank_priority_cell_is_rejected() {
        let temp = TempDir::new().unwrap();
        let file = temp.child("parts.csv");
        file.write_str("IPN,Category,Value,Priority\nR1,RES,1k,2\nR2,RES,2k,\n").unwrap();

        let err = load_inventory(file.path()).unwrap_err();
        assert!(err.to_string().contains("IPN 'R2'"));
    }

    #[test]
    fn test_short_row_priority_is_rejected() {
        let temp = TempDir::new().unwrap();
        let file = temp.child("parts.csv");
        file.write_str("IPN,Category,Value,Priority
R1,RES,1k,2
R2,RES,1k
").unwrap();

        let err = load_inventory(file.path()).unwrap_err();
        let err = err.downcast_ref::<InventoryError>().unwrap();
        assert!(matches!(err, InventoryError::InvalidPriority { value, .. } if value.is_empty()));
        assert!(err.to_string().contains("IPN 'R2'"));
    }

    #[test]
    fn test_short_row_pads_blank_cells() {
        let temp = TempDir::new().unwrap();
        let file = temp.child("parts.csv");
        file.write_str("Reference,Value,Footprint
R1,10k
").unwrap();

        let records = read_records(file.path()).unwrap();
        assert_eq!(records[0].get("footprint").map(String::as_str), Some(""));
    }

    #[test]
    fn test_load_components() {
        let temp = TempDir::new().unwrap();
        let file = temp.child("parts.csv");
        file.write_str(
            "Reference,Lib Id,Value,Footprint,Tolerance,DNP\n\
             R1,Device:R,10k,Resistor_SMD:R_0603_1608Metric,1%,\n\
             #PWR01,power:GND,GND,,,\n\
             C1,Device:C,100n,Capacitor_SMD:C_0402_1005Metric,,yes\n",
        )
        .unwrap();

        let components = load_components(file.path()).unwrap();
        assert_eq!(components.len(), 2);

        let r1 = &components[0];
        assert_eq!(r1.lib_id, "Device:R");
        assert_eq!(r1.package(), Some("0603".to_string()));
        assert_eq!(r1.property("tolerance"), Some("1%"));
        assert!(!r1.dnp);
        assert!(components[1].dnp);
    }

    #[test]
    fn test_component_without_reference() {
        let temp = TempDir::new().unwrap();
        let file = temp.child("parts.csv");
        file.write_str("Value,Lib Id\n10k,Device:R\n").unwrap();

        let err = load_components(file.path()).unwrap_err();
        assert!(err.to_string().contains("Missing required field 'reference'"));
    }
}
