//! Result reporting: JSON persistence, CSV export, terminal summaries.

mod csv;
mod json;
mod terminal;

pub use csv::{csv_header, csv_row};
pub use json::{load_json, save_json, to_json, to_json_pretty};
pub use terminal::{format_comparison, format_summary};
