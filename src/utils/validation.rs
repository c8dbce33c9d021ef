use crate::domain::model::FieldMapping;
use crate::utils::error::{FillError, Result};
use std::collections::HashSet;

pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods", "csv"];
pub const TEMPLATE_EXTENSIONS: &[&str] = &["pdf"];

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(FillError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(FillError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_file_extension(field_name: &str, file: &str, allowed_extensions: &[&str]) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    match std::path::Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(extension) if allowed_set.contains(extension.to_ascii_lowercase().as_str()) => Ok(()),
        Some(extension) => Err(FillError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                extension,
                allowed_extensions.join(", ")
            ),
        }),
        None => Err(FillError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        }),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(FillError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 沒有任何對應又沒開自動比對時，在讀取輸入檔之前就回報
pub fn validate_mapping(mapping: &FieldMapping, auto_map: bool) -> Result<()> {
    if mapping.is_empty() && !auto_map {
        return Err(FillError::config(
            "Field mapping is empty; add field = \"column\" entries to [mapping] or enable auto-map",
        ));
    }
    Ok(())
}

/// 檢查 fallback 檔名樣板是否含有 `{n}` 佔位符
pub fn validate_fallback_pattern(field_name: &str, pattern: &str) -> Result<()> {
    validate_non_empty_string(field_name, pattern)?;
    if !pattern.contains("{n}") {
        return Err(FillError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: pattern.to_string(),
            reason: "Pattern must contain the {n} placeholder".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("output_path", "./output").is_ok());
        assert!(validate_path("output_path", "").is_err());
        assert!(validate_path("output_path", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension("spreadsheet", "respuestas.xlsx", SPREADSHEET_EXTENSIONS).is_ok());
        assert!(validate_file_extension("spreadsheet", "RESPUESTAS.CSV", SPREADSHEET_EXTENSIONS).is_ok());
        assert!(validate_file_extension("template", "formato.pdf", TEMPLATE_EXTENSIONS).is_ok());
        assert!(validate_file_extension("template", "formato.docx", TEMPLATE_EXTENSIONS).is_err());
        assert!(validate_file_extension("template", "formato", TEMPLATE_EXTENSIONS).is_err());
    }

    #[test]
    fn test_validate_mapping() {
        let mut mapping = FieldMapping::new();
        assert!(matches!(
            validate_mapping(&mapping, false),
            Err(FillError::ConfigError { .. })
        ));
        assert!(validate_mapping(&mapping, true).is_ok());

        mapping.insert("Nombre".to_string(), "Nombre completo".to_string());
        assert!(validate_mapping(&mapping, false).is_ok());
    }

    #[test]
    fn test_validate_fallback_pattern() {
        assert!(validate_fallback_pattern("fallback_name", "Record_{n}").is_ok());
        assert!(validate_fallback_pattern("fallback_name", "Record").is_err());
        assert!(validate_fallback_pattern("fallback_name", "  ").is_err());
    }
}
