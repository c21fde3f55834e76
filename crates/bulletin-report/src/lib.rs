//! bulletin-report — HTML and CSV rendering of analysis reports.

pub mod csv_export;
pub mod html;
