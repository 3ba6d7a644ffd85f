//! Inventory CSV.
//!
//! One row per captured tooltip, appended as soon as it is extracted so a crash
//! never loses earlier rows.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// CSV header row.
const CSV_HEADER: &str = "item_name,trait,qty,slot_img,tooltip_img,last_seen";

/// One inventory entry.
#[derive(Clone, Debug)]
pub struct InventoryRow {
    pub item_name: String,
    pub trait_text: String,
    pub qty: u32,
    pub slot_img: Option<PathBuf>,
    pub tooltip_img: Option<PathBuf>,
    pub last_seen: DateTime<Local>,
}

impl InventoryRow {
    /// A single sighting of an item, timestamped now. Absent fields become empty.
    pub fn sighting(item_name: Option<&str>, trait_text: Option<&str>, tooltip_img: Option<PathBuf>) -> Self {
        Self {
            item_name: item_name.unwrap_or_default().to_string(),
            trait_text: trait_text.unwrap_or_default().to_string(),
            qty: 1,
            slot_img: None,
            tooltip_img,
            last_seen: Local::now(),
        }
    }
}

/// Initializes CSV file with header if it doesn't exist or is empty.
///
/// If the file exists and has content, this does nothing (preserves existing data).
pub fn init_csv(path: &Path) -> Result<()> {
    if path.exists() {
        let file = File::open(path).context("Failed to open existing CSV")?;
        let reader = BufReader::new(file);
        if reader.lines().next().is_some() {
            return Ok(());
        }
    }

    let mut file = File::create(path).context("Failed to create CSV file")?;
    writeln!(file, "{}", CSV_HEADER).context("Failed to write CSV header")?;
    Ok(())
}

/// Appends one row, writing the header first when the file is new.
pub fn append_row(path: &Path, row: &InventoryRow) -> Result<()> {
    init_csv(path)?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("Failed to open CSV for append")?;

    let path_field = |p: &Option<PathBuf>| {
        p.as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    };

    // Format: item_name,trait,qty,slot_img,tooltip_img,last_seen
    let line = [
        escape_field(&row.item_name),
        escape_field(&row.trait_text),
        row.qty.to_string(),
        escape_field(&path_field(&row.slot_img)),
        escape_field(&path_field(&row.tooltip_img)),
        row.last_seen.format("%Y-%m-%dT%H:%M:%S").to_string(),
    ]
    .join(",");

    writeln!(file, "{}", line).context("Failed to write CSV row")?;
    Ok(())
}

/// Quotes a field containing a comma, quote or line break; inner quotes are doubled.
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn row(name: &str, trait_text: &str) -> InventoryRow {
        InventoryRow {
            item_name: name.to_string(),
            trait_text: trait_text.to_string(),
            qty: 1,
            slot_img: None,
            tooltip_img: Some(PathBuf::from("snaps/tooltip_20240101_120000.png")),
            last_seen: Local.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_init_csv_creates_header() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("inventory.csv");

        init_csv(&csv_path).unwrap();

        let content = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(content, format!("{}\n", CSV_HEADER));
    }

    #[test]
    fn test_init_csv_preserves_existing() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("inventory.csv");
        std::fs::write(&csv_path, "existing,data\n").unwrap();

        init_csv(&csv_path).unwrap();

        let content = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(content, "existing,data\n");
    }

    #[test]
    fn test_append_rows() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("inventory.csv");

        append_row(&csv_path, &row("Merciless Greatsword", "Crippling Strike")).unwrap();
        append_row(&csv_path, &row("", "")).unwrap();

        let content = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            "Merciless Greatsword,Crippling Strike,1,,snaps/tooltip_20240101_120000.png,2024-01-01T12:00:00"
        );
        assert!(lines[2].starts_with(",,1,,"));
    }

    #[test]
    fn test_fields_are_quoted() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("Hit, Stun"), "\"Hit, Stun\"");
        assert_eq!(escape_field("The \"Edge\""), "\"The \"\"Edge\"\"\"");

        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("inventory.csv");
        append_row(&csv_path, &row("Blade", "Heavy Attack, +5%")).unwrap();
        let content = std::fs::read_to_string(&csv_path).unwrap();
        assert!(content.contains("Blade,\"Heavy Attack, +5%\",1,"));
    }

    #[test]
    fn test_sighting_defaults() {
        let r = InventoryRow::sighting(Some("Blade"), None, None);
        assert_eq!(r.item_name, "Blade");
        assert_eq!(r.trait_text, "");
        assert_eq!(r.qty, 1);
        assert!(r.slot_img.is_none());
    }
}
