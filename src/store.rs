use thiserror::Error;

use crate::models::{RosterSnapshot, TalentRecord, EXPECTED_HEADERS, REQUIRED_HEADERS};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("authorization failed: {0}")]
    Auth(String),

    #[error("no data found in the sheet")]
    EmptyData,

    #[error("required column '{0}' is missing from the sheet header")]
    SchemaMismatch(String),

    #[error("no column named '{0}' in the sheet header")]
    UnknownColumn(String),

    #[error("request to the backing store failed: {0}")]
    Transport(String),
}

/// A live session against one sheet of the backing store. The session
/// is a capability to read and write, not a cursor: it holds no data
/// state and may be shared freely.
pub trait SheetSession {
    /// All rows of the sheet, header row included, in sheet order.
    fn fetch_all_rows(&self) -> Result<Vec<Vec<String>>, StoreError>;

    /// The current header row, re-read from the store.
    fn read_header_row(&self) -> Result<Vec<String>, StoreError>;

    /// Write one cell. `row` and `col` are 1-based sheet coordinates;
    /// row 1 is the header row.
    fn write_cell(&self, row: usize, col: usize, value: &str) -> Result<(), StoreError>;
}

/// Fetch-and-write layer over a sheet session. The store is the sole
/// durable owner of roster data; every render cycle fetches a fresh
/// snapshot and discards it afterwards.
pub struct RosterStore<'a, S: SheetSession> {
    session: &'a S,
}

impl<'a, S: SheetSession> RosterStore<'a, S> {
    pub fn new(session: &'a S) -> Self {
        Self { session }
    }

    /// Reads the full sheet and reconciles every row against the
    /// expected headers. Columns missing from the live header come back
    /// empty, columns not in the expected list are dropped, and a
    /// duplicated live header name resolves to its first occurrence.
    pub fn fetch_all(&self) -> Result<RosterSnapshot, StoreError> {
        let rows = self.session.fetch_all_rows()?;
        let Some(header) = rows.first() else {
            return Err(StoreError::EmptyData);
        };

        let mapping = reconcile_header(header)?;

        let data = &rows[1..];
        if data.is_empty() {
            return Err(StoreError::EmptyData);
        }

        log::debug!("fetched {} data rows", data.len());

        let snapshot = data
            .iter()
            .enumerate()
            .map(|(row, raw)| {
                let cells: Vec<String> = mapping
                    .iter()
                    .map(|src| {
                        src.and_then(|col| raw.get(col))
                            .cloned()
                            .unwrap_or_default()
                    })
                    .collect();
                TalentRecord::from_cells(row, &cells)
            })
            .collect();

        Ok(snapshot)
    }

    /// Writes one cell addressed by snapshot row position and column
    /// name. The header row is re-read on every call; the sheet may
    /// have changed out-of-band and a cached column position would
    /// write into the wrong column.
    pub fn write_cell(
        &self,
        row_index: usize,
        column_name: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let header = self.session.read_header_row()?;
        let col = header
            .iter()
            .position(|name| name == column_name)
            .ok_or_else(|| StoreError::UnknownColumn(column_name.to_string()))?;

        // +2: one header row, then 1-based sheet rows.
        let sheet_row = row_index + 2;
        log::debug!("writing {column_name}={value} at sheet row {sheet_row}");
        self.session.write_cell(sheet_row, col + 1, value)
    }
}

/// Maps each expected header to its column position in the live header
/// row, or None when the live sheet lacks it. Required headers must
/// align.
fn reconcile_header(header: &[String]) -> Result<Vec<Option<usize>>, StoreError> {
    let mapping: Vec<Option<usize>> = EXPECTED_HEADERS
        .iter()
        .map(|expected| header.iter().position(|live| live == expected))
        .collect();

    for required in REQUIRED_HEADERS {
        let idx = EXPECTED_HEADERS
            .iter()
            .position(|h| *h == required)
            .unwrap_or_default();
        if mapping[idx].is_none() {
            return Err(StoreError::SchemaMismatch(required.to_string()));
        }
    }

    Ok(mapping)
}
