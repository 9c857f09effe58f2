//! Delimited-text export and import, and the printable report.

mod csv;
pub mod format;
mod report;

pub use csv::{
    CsvTable, csv_escape, guess_mapping, parse_csv, portfolio_csv, report_csv,
    scenarios_from_table, split_csv_line,
};
pub use report::text_report;
