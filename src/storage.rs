
mod rows;

pub use rows::{load_rows, save_rows, Format, RowsError};
