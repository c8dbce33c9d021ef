use crate::utils::error::BatchError;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// 試算表儲存格的值
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateSerial(f64),
}

impl CellValue {
    /// 轉成文字；空值回傳 None
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) | CellValue::DateSerial(n) => Some(format_number(*n)),
            CellValue::Bool(b) => Some(b.to_string()),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// 1-based data row (header row excluded)
    pub row: usize,
    pub data: HashMap<String, CellValue>,
}

impl Record {
    pub fn new(row: usize) -> Self {
        Self {
            row,
            data: HashMap::new(),
        }
    }

    pub fn with(mut self, column: &str, value: CellValue) -> Self {
        self.data.insert(column.to_string(), value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.data.get(column)
    }

    /// 欄位的非空文字值；只含空白的儲存格視為缺值
    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column)
            .filter(|v| !v.is_blank())
            .and_then(CellValue::as_text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SheetData {
    pub name: String,
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheet_names: Vec<String>,
    pub sheet: SheetData,
}

/// 模板欄位名稱 -> 試算表欄位名稱
pub type FieldMapping = BTreeMap<String, String>;

/// 主要值等於 sentinel（例如 "Otro"）時改用的欄位
pub type OverrideMapping = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordGroup {
    pub name: String,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationResult {
    pub success_count: usize,
    pub errors: Vec<BatchError>,
    pub written: Vec<String>,
}

impl GenerationResult {
    pub fn record_success(&mut self, path: String) {
        self.success_count += 1;
        self.written.push(path);
    }

    pub fn push_error(&mut self, error: BatchError) {
        tracing::warn!("⚠️ {}", error);
        self.errors.push(error);
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.errors.is_empty() {
            format!("Generated {} PDF files", self.success_count)
        } else {
            format!(
                "Generated {} PDF files with {} errors",
                self.success_count,
                self.errors.len()
            )
        }
    }
}
