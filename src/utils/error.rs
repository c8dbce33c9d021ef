use thiserror::Error;

#[derive(Error, Debug)]
pub enum FillError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Spreadsheet error: {0}")]
    SpreadsheetError(#[from] calamine::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("PDF error: {0}")]
    PdfError(#[from] lopdf::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("No fillable text field named '{field}'")]
    FieldNotFound { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Template,
    Output,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FillError {
    pub fn config(message: impl Into<String>) -> Self {
        FillError::ConfigError {
            message: message.into(),
        }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        FillError::ProcessingError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            FillError::ConfigError { .. }
            | FillError::MissingConfigError { .. }
            | FillError::InvalidConfigValueError { .. }
            | FillError::TomlParseError(_) => ErrorCategory::Configuration,
            FillError::SpreadsheetError(_) | FillError::CsvError(_) => ErrorCategory::Input,
            FillError::PdfError(_) | FillError::FieldNotFound { .. } => ErrorCategory::Template,
            FillError::ZipError(_) | FillError::IoError(_) => ErrorCategory::Output,
            FillError::SerializationError(_) | FillError::ProcessingError { .. } => {
                ErrorCategory::Processing
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FillError::FieldNotFound { .. } => ErrorSeverity::Low,
            FillError::ProcessingError { .. } | FillError::SerializationError(_) => {
                ErrorSeverity::Medium
            }
            FillError::ConfigError { .. }
            | FillError::MissingConfigError { .. }
            | FillError::InvalidConfigValueError { .. }
            | FillError::TomlParseError(_)
            | FillError::SpreadsheetError(_)
            | FillError::CsvError(_)
            | FillError::PdfError(_) => ErrorSeverity::High,
            FillError::IoError(_) | FillError::ZipError(_) => ErrorSeverity::Critical,
        }
    }

    /// 依嚴重程度決定的程序結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the mapping and column names in your configuration (try suggest_mapping)"
            }
            ErrorCategory::Input => "Make sure the spreadsheet exists and is a valid xlsx/xls/ods/csv file",
            ErrorCategory::Template => "Make sure the template is a PDF with fillable text fields",
            ErrorCategory::Output => "Check that the output path exists and is writable",
            ErrorCategory::Processing => "Re-run with --verbose to see which record failed",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Input => format!("Could not read the spreadsheet: {}", self),
            ErrorCategory::Template => format!("Could not use the PDF template: {}", self),
            ErrorCategory::Output => format!("Could not write output: {}", self),
            ErrorCategory::Processing => format!("Processing failed: {}", self),
        }
    }
}

/// 批次中單筆記錄或群組的錯誤，累積後回傳而不中斷整個批次
#[derive(Error, Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchError {
    #[error("Row {row}: Error setting field {field}: {message}")]
    Field {
        row: usize,
        field: String,
        message: String,
    },

    #[error("Row {row}: Error processing - {message}")]
    Record { row: usize, message: String },

    #[error("Error processing {group}: {message}")]
    Group { group: String, message: String },
}

pub type Result<T> = std::result::Result<T, FillError>;
