use crate::adapters::spreadsheet;
use crate::core::matcher::auto_match;
use crate::core::{ConfigProvider, FieldMapping, FormTemplate};
use crate::utils::error::Result;

/// 產生對應表之前先看一眼輸入檔：工作表、欄位標題、模板欄位
#[derive(Debug, Clone)]
pub struct InputPreview {
    pub sheet_names: Vec<String>,
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub record_count: usize,
    pub template_fields: Vec<String>,
}

impl InputPreview {
    pub fn unmapped_fields<'a>(&'a self, mapping: &FieldMapping) -> Vec<&'a str> {
        self.template_fields
            .iter()
            .filter(|field| !mapping.contains_key(field.as_str()))
            .map(String::as_str)
            .collect()
    }
}

pub async fn preview_inputs<T: FormTemplate>(config: &impl ConfigProvider) -> Result<InputPreview> {
    let bytes = tokio::fs::read(config.spreadsheet_path()).await?;
    let workbook =
        spreadsheet::parse_workbook(&bytes, config.spreadsheet_path(), config.sheet_name())?;

    let template_bytes = tokio::fs::read(config.template_path()).await?;
    let template = T::from_bytes(&template_bytes)?;

    Ok(InputPreview {
        sheet_names: workbook.sheet_names,
        sheet_name: workbook.sheet.name,
        headers: workbook.sheet.headers,
        record_count: workbook.sheet.records.len(),
        template_fields: template.field_names().to_vec(),
    })
}

/// 明確寫出的對應優先；`auto` 時其餘欄位由自動比對補上
pub fn resolve_mapping(explicit: &FieldMapping, preview: &InputPreview, auto: bool) -> FieldMapping {
    let mut mapping = if auto {
        auto_match(&preview.template_fields, &preview.headers)
    } else {
        FieldMapping::new()
    };
    for (field, column) in explicit {
        mapping.insert(field.clone(), column.clone());
    }
    tracing::info!(
        "🔗 Mapping covers {} of {} template fields",
        preview
            .template_fields
            .iter()
            .filter(|f| mapping.contains_key(f.as_str()))
            .count(),
        preview.template_fields.len()
    );
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::pdf::tests::sample_template_bytes;
    use crate::adapters::PdfTemplate;
    use tempfile::TempDir;

    struct Paths {
        spreadsheet: String,
        template: String,
    }

    impl ConfigProvider for Paths {
        fn spreadsheet_path(&self) -> &str {
            &self.spreadsheet
        }

        fn template_path(&self) -> &str {
            &self.template
        }

        fn output_path(&self) -> &str {
            "unused"
        }

        fn sheet_name(&self) -> Option<&str> {
            None
        }

        fn group_column(&self) -> &str {
            "Escuela"
        }

        fn name_column(&self) -> &str {
            "Nombre"
        }

        fn fallback_name(&self) -> &str {
            "Record_{n}"
        }
    }

    fn preview() -> InputPreview {
        InputPreview {
            sheet_names: vec!["Hoja1".to_string()],
            sheet_name: "Hoja1".to_string(),
            headers: vec!["Nombre completo".to_string(), "Edad".to_string()],
            record_count: 2,
            template_fields: vec!["Nombre".to_string(), "alumno.edad".to_string(), "Firma".to_string()],
        }
    }

    #[test]
    fn test_resolve_mapping_explicit_wins() {
        let mut explicit = FieldMapping::new();
        explicit.insert("Nombre".to_string(), "Edad".to_string());

        let mapping = resolve_mapping(&explicit, &preview(), true);
        assert_eq!(mapping.get("Nombre").map(String::as_str), Some("Edad"));
        assert_eq!(mapping.get("alumno.edad").map(String::as_str), Some("Edad"));
        assert_eq!(preview().unmapped_fields(&mapping), vec!["Firma"]);

        let manual = resolve_mapping(&explicit, &preview(), false);
        assert_eq!(manual.len(), 1);
    }

    #[tokio::test]
    async fn test_preview_inputs_reads_both_files() {
        let temp_dir = TempDir::new().unwrap();
        let spreadsheet = temp_dir.path().join("respuestas.csv");
        let template = temp_dir.path().join("formato.pdf");
        std::fs::write(&spreadsheet, "Nombre,Escuela\nAna,Norte\nBeto,Sur\n").unwrap();
        std::fs::write(&template, sample_template_bytes()).unwrap();

        let paths = Paths {
            spreadsheet: spreadsheet.to_string_lossy().to_string(),
            template: template.to_string_lossy().to_string(),
        };
        let preview = preview_inputs::<PdfTemplate>(&paths).await.unwrap();

        assert_eq!(preview.sheet_name, "respuestas");
        assert_eq!(preview.headers, vec!["Nombre", "Escuela"]);
        assert_eq!(preview.record_count, 2);
        assert_eq!(preview.template_fields, vec!["Nombre", "alumno.edad"]);
    }
}
