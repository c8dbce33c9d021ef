pub mod etl;
pub mod filename;
pub mod grouping;
pub mod matcher;
pub mod transform;

pub use crate::domain::model::{
    CellValue, FieldMapping, GenerationResult, OverrideMapping, Record, RecordGroup, SheetData,
    Workbook,
};
pub use crate::domain::ports::{
    ConfigProvider, FormDocument, FormTemplate, Pipeline, SourceData, Storage,
};
pub use crate::utils::error::Result;
