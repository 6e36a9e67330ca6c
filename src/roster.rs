use anyhow::{anyhow, Context, Result};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{TalentRecord, EXPECTED_HEADERS};

/// Fields offered as roster filters.
pub const FILTER_FIELDS: [&str; 4] = ["name", "code", "universitas", "major"];

/// Fields the summary view groups by.
pub const SUMMARY_FIELDS: [&str; 3] = ["code", "universitas", "major"];

/// Wildcard filter option meaning "no restriction on this field".
pub const ALL: &str = "All";

pub const PAGE_SIZE: usize = 10;

/// Current filter selections. `None` on a field means "All".
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    pub name: Option<String>,
    pub code: Option<String>,
    pub universitas: Option<String>,
    pub major: Option<String>,
}

impl FilterSet {
    pub fn get(&self, field: &str) -> Option<&str> {
        match field {
            "name" => self.name.as_deref(),
            "code" => self.code.as_deref(),
            "universitas" => self.universitas.as_deref(),
            "major" => self.major.as_deref(),
            _ => None,
        }
    }

    pub fn set(&mut self, field: &str, selection: Option<String>) {
        // "All" coming in from a selector collapses to no restriction
        let selection = selection.filter(|s| s != ALL);
        match field {
            "name" => self.name = selection,
            "code" => self.code = selection,
            "universitas" => self.universitas = selection,
            "major" => self.major = selection,
            _ => {}
        }
    }

    /// Conjunction of exact equality on every selected field.
    pub fn matches(&self, record: &TalentRecord) -> bool {
        FILTER_FIELDS.iter().all(|field| match self.get(field) {
            Some(wanted) => record.field(field) == Some(wanted),
            None => true,
        })
    }

    pub fn is_empty(&self) -> bool {
        FILTER_FIELDS.iter().all(|field| self.get(field).is_none())
    }
}

/// Selector options for one filter field: "All" plus the sorted
/// distinct values present in the current unfiltered snapshot.
pub fn filter_options(snapshot: &[TalentRecord], field: &str) -> Vec<String> {
    let distinct: BTreeSet<&str> = snapshot
        .iter()
        .filter_map(|record| record.field(field))
        .collect();
    let mut options = Vec::with_capacity(distinct.len() + 1);
    options.push(ALL.to_string());
    options.extend(distinct.into_iter().map(String::from));
    options
}

pub fn apply_filters<'a>(
    snapshot: &'a [TalentRecord],
    filters: &FilterSet,
) -> Vec<&'a TalentRecord> {
    snapshot
        .iter()
        .filter(|record| filters.matches(record))
        .collect()
}

pub fn total_pages(filtered_count: usize) -> usize {
    filtered_count.div_ceil(PAGE_SIZE)
}

/// One page of the filtered view. The page number is clamped to
/// [1, total_pages]; an empty view yields an empty page 1.
pub fn page<'a, 'b>(filtered: &'b [&'a TalentRecord], number: usize) -> &'b [&'a TalentRecord] {
    let pages = total_pages(filtered.len()).max(1);
    let number = number.clamp(1, pages);
    let start = (number - 1) * PAGE_SIZE;
    let end = (start + PAGE_SIZE).min(filtered.len());
    if start >= filtered.len() {
        &[]
    } else {
        &filtered[start..end]
    }
}

/// How a column is presented and whether it accepts edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    ReadOnly,
    /// Fixed-catalog selector (status, unit).
    Choice,
    /// Free text (assigned recruiter).
    FreeText,
    /// Actionable link when non-empty, placeholder otherwise.
    Link,
}

pub fn classify(column: &str) -> FieldKind {
    match column {
        "status" | "select_unit" => FieldKind::Choice,
        "user" => FieldKind::FreeText,
        "linkedin" | "cv" => FieldKind::Link,
        _ => FieldKind::ReadOnly,
    }
}

#[derive(Debug, Clone)]
pub struct CellView {
    pub column: &'static str,
    pub value: String,
    pub kind: FieldKind,
}

impl CellView {
    /// Presentation value: links and locked unit cells fall back to a
    /// placeholder dash when there is nothing to show.
    pub fn display(&self) -> &str {
        if self.value.is_empty() && self.kind != FieldKind::FreeText {
            "-"
        } else {
            &self.value
        }
    }

    pub fn link_target(&self) -> Option<&str> {
        if self.kind == FieldKind::Link && !self.value.is_empty() {
            Some(&self.value)
        } else {
            None
        }
    }

    pub fn is_editable(&self) -> bool {
        matches!(self.kind, FieldKind::Choice | FieldKind::FreeText)
    }
}

/// One renderable row. `row` is the record's original snapshot
/// position; edits must be committed against it, never against a
/// position in the filtered sequence.
#[derive(Debug, Clone)]
pub struct RowDescriptor {
    pub row: usize,
    pub cells: Vec<CellView>,
}

impl RowDescriptor {
    pub fn cell(&self, column: &str) -> Option<&CellView> {
        self.cells.iter().find(|cell| cell.column == column)
    }
}

pub fn row_descriptor(record: &TalentRecord) -> RowDescriptor {
    let status = record.status_display();
    let cells = EXPECTED_HEADERS
        .iter()
        .map(|&column| {
            let kind = classify(column);
            let value = match column {
                // display defaulting only; the stored cell keeps its raw value
                "status" => status.label().to_string(),
                // the unit selector is locked outside unit-facing stages
                "select_unit" if !status.allows_unit() => {
                    return CellView {
                        column,
                        value: String::new(),
                        kind: FieldKind::ReadOnly,
                    };
                }
                _ => record.field(column).unwrap_or_default().to_string(),
            };
            CellView { column, value, kind }
        })
        .collect();
    RowDescriptor {
        row: record.row,
        cells,
    }
}

pub fn row_descriptors(records: &[&TalentRecord]) -> Vec<RowDescriptor> {
    records.iter().map(|record| row_descriptor(record)).collect()
}

/// Serializes the given records to CSV: one header line, one line per
/// record, in the given column order.
pub fn export_csv(records: &[&TalentRecord], columns: &[&str]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(columns)?;
    for record in records {
        let fields: Vec<&str> = columns
            .iter()
            .map(|column| record.field(column).unwrap_or_default())
            .collect();
        writer.write_record(&fields)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV output: {e}"))?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}

/// Records per distinct value of one grouping field, over the full
/// unfiltered snapshot, sorted by value.
pub fn summary(snapshot: &[TalentRecord], field: &str) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for record in snapshot {
        if let Some(value) = record.field(field) {
            *counts.entry(value.to_string()).or_default() += 1;
        }
    }
    counts.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;

    fn record(row: usize, overrides: &[(&str, &str)]) -> TalentRecord {
        let mut cells = vec![String::new(); EXPECTED_HEADERS.len()];
        for (column, value) in overrides {
            let idx = EXPECTED_HEADERS.iter().position(|h| h == column).unwrap();
            cells[idx] = value.to_string();
        }
        TalentRecord::from_cells(row, &cells)
    }

    fn sample_snapshot() -> Vec<TalentRecord> {
        vec![
            record(0, &[("name", "Ana"), ("code", "A"), ("universitas", "UI"), ("major", "CS")]),
            record(1, &[("name", "Budi"), ("code", "A"), ("universitas", "UGM"), ("major", "EE")]),
            record(2, &[("name", "Citra"), ("code", "B"), ("universitas", "UI"), ("major", "CS")]),
        ]
    }

    #[test]
    fn test_filter_code_yields_exact_matches() {
        let snapshot = sample_snapshot();
        let mut filters = FilterSet::default();
        filters.set("code", Some("A".to_string()));
        let filtered = apply_filters(&snapshot, &filters);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|r| r.code == "A"));
    }

    #[test]
    fn test_filters_compose_by_conjunction() {
        let snapshot = sample_snapshot();
        let mut filters = FilterSet::default();
        filters.set("code", Some("A".to_string()));
        filters.set("universitas", Some("UI".to_string()));
        let filtered = apply_filters(&snapshot, &filters);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Ana");
    }

    #[test]
    fn test_filtered_never_exceeds_total() {
        let snapshot = sample_snapshot();
        for field in FILTER_FIELDS {
            for option in filter_options(&snapshot, field) {
                let mut filters = FilterSet::default();
                filters.set(field, Some(option));
                assert!(apply_filters(&snapshot, &filters).len() <= snapshot.len());
            }
        }
    }

    #[test]
    fn test_all_selection_means_no_restriction() {
        let snapshot = sample_snapshot();
        let mut filters = FilterSet::default();
        filters.set("code", Some(ALL.to_string()));
        assert!(filters.is_empty());
        assert_eq!(apply_filters(&snapshot, &filters).len(), 3);
    }

    #[test]
    fn test_filter_options_sorted_distinct_plus_all() {
        let snapshot = sample_snapshot();
        assert_eq!(filter_options(&snapshot, "code"), vec!["All", "A", "B"]);
        assert_eq!(filter_options(&snapshot, "universitas"), vec!["All", "UGM", "UI"]);
        // options follow the snapshot, not a static catalog
        assert_eq!(filter_options(&snapshot[..1], "code"), vec!["All", "A"]);
    }

    #[test]
    fn test_filtering_preserves_original_row_key() {
        let snapshot = sample_snapshot();
        let mut filters = FilterSet::default();
        filters.set("code", Some("B".to_string()));
        let filtered = apply_filters(&snapshot, &filters);
        // Citra is position 0 of the filtered view but row 2 of the
        // snapshot; the write key must be 2
        assert_eq!(filtered[0].row, 2);
        assert_eq!(row_descriptors(&filtered)[0].row, 2);
    }

    #[test]
    fn test_pagination_page_count() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(10), 1);
        assert_eq!(total_pages(11), 2);
        assert_eq!(total_pages(25), 3);
    }

    #[test]
    fn test_pagination_last_page_holds_remainder() {
        let snapshot: Vec<TalentRecord> = (0..25)
            .map(|i| record(i, &[("name", &format!("p{i}"))]))
            .collect();
        let refs: Vec<&TalentRecord> = snapshot.iter().collect();
        assert_eq!(page(&refs, 1).len(), 10);
        assert_eq!(page(&refs, 3).len(), 5);
        // out-of-range selections clamp instead of panicking
        assert_eq!(page(&refs, 0).len(), 10);
        assert_eq!(page(&refs, 99).len(), 5);
    }

    #[test]
    fn test_page_of_empty_view() {
        let refs: Vec<&TalentRecord> = Vec::new();
        assert!(page(&refs, 1).is_empty());
    }

    #[test]
    fn test_classification() {
        assert_eq!(classify("status"), FieldKind::Choice);
        assert_eq!(classify("select_unit"), FieldKind::Choice);
        assert_eq!(classify("user"), FieldKind::FreeText);
        assert_eq!(classify("linkedin"), FieldKind::Link);
        assert_eq!(classify("cv"), FieldKind::Link);
        assert_eq!(classify("name"), FieldKind::ReadOnly);
        assert_eq!(classify("email"), FieldKind::ReadOnly);
    }

    #[test]
    fn test_link_cells_placeholder_vs_target() {
        let rec = record(0, &[("name", "Ana"), ("cv", "http://x/cv.pdf")]);
        let desc = row_descriptor(&rec);
        let linkedin = desc.cell("linkedin").unwrap();
        assert_eq!(linkedin.display(), "-");
        assert_eq!(linkedin.link_target(), None);
        let cv = desc.cell("cv").unwrap();
        assert_eq!(cv.display(), "http://x/cv.pdf");
        assert_eq!(cv.link_target(), Some("http://x/cv.pdf"));
    }

    #[test]
    fn test_status_cell_defaults_display_without_mutating_record() {
        let rec = record(0, &[("name", "Ana"), ("status", "???")]);
        let desc = row_descriptor(&rec);
        assert_eq!(desc.cell("status").unwrap().value, "Waiting");
        // raw cell untouched
        assert_eq!(rec.status, "???");
    }

    #[test]
    fn test_unit_cell_locked_outside_unit_stages() {
        let waiting = record(0, &[("status", "Waiting"), ("select_unit", "GOMAN")]);
        let desc = row_descriptor(&waiting);
        let unit = desc.cell("select_unit").unwrap();
        assert_eq!(unit.kind, FieldKind::ReadOnly);
        assert!(!unit.is_editable());
        assert_eq!(unit.display(), "-");

        for status in ["Process in Unit", "Offering", "Hired"] {
            let rec = record(0, &[("status", status), ("select_unit", "GOMAN")]);
            let desc = row_descriptor(&rec);
            let unit = desc.cell("select_unit").unwrap();
            assert_eq!(unit.kind, FieldKind::Choice);
            assert!(unit.is_editable());
            assert_eq!(unit.value, "GOMAN");
        }
    }

    #[test]
    fn test_export_csv_shape() {
        let snapshot = sample_snapshot();
        let refs: Vec<&TalentRecord> = snapshot.iter().collect();
        let out = export_csv(&refs, &["name", "code", "status"]).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "name,code,status");
        assert_eq!(lines[1], "Ana,A,");
        assert_eq!(lines[3], "Citra,B,");
    }

    #[test]
    fn test_export_csv_follows_filtered_view() {
        let snapshot = sample_snapshot();
        let mut filters = FilterSet::default();
        filters.set("code", Some("A".to_string()));
        let filtered = apply_filters(&snapshot, &filters);
        let out = export_csv(&filtered, &["name"]).unwrap();
        assert_eq!(out, "name\nAna\nBudi\n");
    }

    #[test]
    fn test_summary_counts_over_unfiltered_snapshot() {
        let snapshot = sample_snapshot();
        assert_eq!(
            summary(&snapshot, "code"),
            vec![("A".to_string(), 2), ("B".to_string(), 1)]
        );
        assert_eq!(
            summary(&snapshot, "major"),
            vec![("CS".to_string(), 2), ("EE".to_string(), 1)]
        );
    }

    #[test]
    fn test_summary_of_empty_snapshot() {
        let snapshot: Vec<TalentRecord> = Vec::new();
        for field in SUMMARY_FIELDS {
            assert!(summary(&snapshot, field).is_empty());
        }
    }

    #[test]
    fn test_status_edit_uses_status_catalog() {
        // the selector is seeded from the display status, so an edit
        // cycles from the default for unknown raw values
        let rec = record(0, &[("status", "")]);
        assert_eq!(rec.status_display(), Status::Waiting);
        assert_eq!(rec.status_display().next(), Status::Screening);
    }
}
