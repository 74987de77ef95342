mod client;
mod range;
mod status;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::ClusterError;

pub use client::SheetsClient;
pub use range::{A1Range, A1RangeError, cell_address};
pub use status::RowStatus;

/// Rows of cell values, as returned by the Sheets API. Trailing empty cells
/// are omitted, so rows may be shorter than the requested range.
pub type ValueGrid = Vec<Vec<Value>>;

#[async_trait]
pub trait SheetService: Send + Sync {
    /// Read a range such as `Sheet1!B29:H29`. An empty range yields an empty grid.
    async fn read_range(&self, spreadsheet_id: &str, range: &str) -> Result<ValueGrid, ClusterError>;

    /// Write `[success, timestamp, message]` to the status cells of `row`.
    async fn write_row_status(
        &self,
        spreadsheet_id: &str,
        row: u32,
        status: &RowStatus,
    ) -> Result<(), ClusterError>;
}
