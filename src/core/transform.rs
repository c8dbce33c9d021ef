use crate::domain::model::{OverrideMapping, Record};
use crate::utils::text::{contains_folded, fold_key};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// 試算表日期序號的起點：序號 1 = 1899-12-31
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);
/// 9999-12-31
const MAX_SERIAL: f64 = 2_958_465.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformRules {
    pub other_sentinel: String,
    pub gender_markers: Vec<String>,
    pub date_marker: String,
    pub date_format: String,
    pub multi_select_marker: String,
    pub multi_select_separator: String,
    pub multi_select_joiner: String,
}

impl Default for TransformRules {
    fn default() -> Self {
        Self {
            other_sentinel: "Otro".to_string(),
            gender_markers: vec!["genero".to_string(), "sexo".to_string(), "gender".to_string()],
            date_marker: "fecha".to_string(),
            date_format: "%d/%m/%Y".to_string(),
            multi_select_marker: "selección múltiple".to_string(),
            multi_select_separator: ";".to_string(),
            multi_select_joiner: "   ".to_string(),
        }
    }
}

impl TransformRules {
    pub fn is_gender_field(&self, field: &str) -> bool {
        let folded = fold_key(field);
        self.gender_markers
            .iter()
            .any(|marker| !marker.is_empty() && folded.contains(&fold_key(marker)))
    }

    pub fn is_date_field(&self, field: &str) -> bool {
        contains_folded(field, &self.date_marker)
    }

    pub fn is_multi_select_column(&self, column: &str) -> bool {
        contains_folded(column, &self.multi_select_marker)
    }
}

/// 把單一記錄的對應值轉成要寫進 PDF 欄位的文字
pub struct ValueTransformer<'a> {
    rules: &'a TransformRules,
    overrides: &'a OverrideMapping,
}

impl<'a> ValueTransformer<'a> {
    pub fn new(rules: &'a TransformRules, overrides: &'a OverrideMapping) -> Self {
        Self { rules, overrides }
    }

    /// 回傳 None 表示略過此欄位（保留模板預設值）
    pub fn transform(&self, field: &str, column: &str, record: &Record) -> Option<String> {
        let mut value = record.text(column)?;

        if self.rules.is_gender_field(field) && value.trim() == self.rules.other_sentinel {
            if let Some(replacement) = self
                .overrides
                .get(field)
                .and_then(|override_column| record.text(override_column))
            {
                tracing::debug!(
                    "Row {}: '{}' uses override value for sentinel '{}'",
                    record.row,
                    field,
                    self.rules.other_sentinel
                );
                value = replacement;
            }
        }

        if self.rules.is_date_field(field) {
            match serial_to_date(&value, &self.rules.date_format) {
                Some(formatted) => value = formatted,
                None => tracing::debug!(
                    "Row {}: '{}' value '{}' is not a date serial, keeping original text",
                    record.row,
                    field,
                    value
                ),
            }
        }

        if self.rules.is_multi_select_column(column) {
            value = value.replace(
                self.rules.multi_select_separator.as_str(),
                &self.rules.multi_select_joiner,
            );
        }

        Some(value)
    }
}

/// 試算表日期序號 -> 日期字串；非數字或超出範圍時回傳 None
pub fn serial_to_date(value: &str, format: &str) -> Option<String> {
    let serial: f64 = value.trim().parse().ok()?;
    if !serial.is_finite() || !(0.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }

    let (y, m, d) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
    let date = epoch.checked_add_signed(Duration::days(serial.floor() as i64))?;
    Some(date.format(format).to_string())
}
