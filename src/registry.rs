//! Which table cells belong to which record.
//!
//! The results page renders one row per analysed record. A checkbox in each
//! row carries the record id; only a few columns (description, class name,
//! table) react to hovering.

use std::collections::BTreeMap;
use std::ops::Range;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::models::RecordId;

/// Rows of the results table.
pub const ROW_SELECTOR: &str = "#results-table tbody tr";
/// Element in a row that carries the record id in `data-id`.
pub const CHECKBOX_SELECTOR: &str = ".result-checkbox";

/// A table cell by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId {
    pub row: usize,
    pub column: usize,
}

impl CellId {
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// A rendered results row as seen by the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// Record id, if the row has one.
    pub record_id: Option<RecordId>,
    /// Number of cells in the row.
    pub cells: usize,
}

/// Cell → record bindings for the hover tooltip.
#[derive(Debug, Clone, Default)]
pub struct CellRegistry {
    cells: BTreeMap<CellId, RecordId>,
}

impl CellRegistry {
    /// Bind the eligible cells of every row that has a record id.
    pub fn from_rows(rows: impl IntoIterator<Item = TableRow>, eligible: Range<usize>) -> Self {
        let mut cells = BTreeMap::new();

        for (row_index, row) in rows.into_iter().enumerate() {
            let Some(record_id) = row.record_id else {
                debug!("Row #{}: no record id, skipped", row_index + 1);
                continue;
            };

            let columns = eligible.start.min(row.cells)..eligible.end.min(row.cells);
            for column in columns {
                cells.insert(CellId::new(row_index, column), record_id.clone());
            }
        }

        Self { cells }
    }

    /// Build the registry from a rendered results page.
    pub fn scan_html(html: &str, eligible: Range<usize>) -> anyhow::Result<Self> {
        let document = Html::parse_document(html);
        let rows_selector = selector(ROW_SELECTOR)?;
        let checkbox_selector = selector(CHECKBOX_SELECTOR)?;

        let rows: Vec<TableRow> = document
            .select(&rows_selector)
            .map(|row| {
                let record_id = row
                    .select(&checkbox_selector)
                    .next()
                    .and_then(|checkbox| checkbox.value().attr("data-id"))
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(RecordId::from);
                let cells = row
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|child| child.value().name() == "td")
                    .count();
                TableRow { record_id, cells }
            })
            .collect();

        debug!("Found {} rows in the results table", rows.len());
        Ok(Self::from_rows(rows, eligible))
    }

    /// Record bound to a cell, if the cell is registered.
    pub fn record_for(&self, cell: CellId) -> Option<&RecordId> {
        self.cells.get(&cell)
    }

    /// Number of registered cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Distinct records with at least one registered cell, grouped by row.
    pub fn rows(&self) -> Vec<(usize, &RecordId)> {
        let mut rows: Vec<(usize, &RecordId)> =
            self.cells.iter().map(|(cell, id)| (cell.row, id)).collect();
        rows.dedup_by_key(|(row, _)| *row);
        rows
    }
}

fn selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("invalid selector {}: {}", css, e))
}
