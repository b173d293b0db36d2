//! Export of commune data.
//!
//! Communes are written as semicolon-separated CSV in the same column layout
//! the importer reads, so an export can be edited in a spreadsheet and
//! imported again.

mod csv;

pub use csv::{export_communes, export_communes_csv, EXPORT_HEADER};
