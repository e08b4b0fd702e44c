mod layout;

pub use layout::{CellPosition, ColumnMap, ColumnRole, LayoutSource, SheetLayout};
