// Adapters layer: concrete implementations for external systems (spreadsheets, PDF forms, output sinks).

pub mod pdf;
pub mod spreadsheet;
pub mod storage;

pub use pdf::{PdfForm, PdfTemplate};
pub use storage::{LocalStorage, ZipStorage};
