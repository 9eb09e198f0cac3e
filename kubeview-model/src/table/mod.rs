//! Identity-tracked tabular data and the diffing that keeps it in sync with
//! successive listings.

mod delta;
pub mod filter;
pub mod fuzzy;
mod header;
mod row;
mod row_event;
pub mod sort;
mod table_data;

pub use delta::DeltaRow;
pub use header::{
    Header, HeaderColumn, AGE_COL, LABELS_COL, NAMESPACE_COL, NAME_COL, VALID_COL,
};
pub use row::{customize_fields, fields_diff, labelize, Fields, Row, Rows};
pub use row_event::{ResEvent, RowEvent, RowEvents};
pub use sort::ColumnKind;
pub use table_data::{FilterOpts, SortColumn, TableData};
