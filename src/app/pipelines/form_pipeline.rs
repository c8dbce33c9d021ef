use crate::adapters::spreadsheet;
use crate::core::filename::{document_file_name, group_dir, PathRegistry};
use crate::core::grouping::group_and_sort;
use crate::core::transform::{TransformRules, ValueTransformer};
use crate::core::{
    ConfigProvider, FieldMapping, FormDocument, FormTemplate, GenerationResult, OverrideMapping,
    Pipeline, Record, RecordGroup, SheetData, SourceData, Storage,
};
use crate::utils::error::{BatchError, FillError, Result};
use std::collections::HashSet;
use std::marker::PhantomData;

/// 試算表 -> 每筆記錄一份填好的 PDF
pub struct FormPipeline<S: Storage, T: FormTemplate, C: ConfigProvider> {
    storage: S,
    config: C,
    mapping: FieldMapping,
    overrides: OverrideMapping,
    rules: TransformRules,
    _template: PhantomData<fn() -> T>,
}

impl<S: Storage, T: FormTemplate, C: ConfigProvider> FormPipeline<S, T, C> {
    pub fn new(storage: S, config: C, mapping: FieldMapping) -> Self {
        Self {
            storage,
            config,
            mapping,
            overrides: OverrideMapping::new(),
            rules: TransformRules::default(),
            _template: PhantomData,
        }
    }

    pub fn with_overrides(mut self, overrides: OverrideMapping) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_rules(mut self, rules: TransformRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    fn warn_unmatched(&self, sheet: &SheetData, template: &T) {
        let fields: HashSet<&str> = template.field_names().iter().map(String::as_str).collect();
        let headers: HashSet<&str> = sheet.headers.iter().map(String::as_str).collect();

        for (field, column) in &self.mapping {
            if !fields.contains(field.as_str()) {
                tracing::warn!("⚠️ Mapped field '{}' is not a text field in the template", field);
            }
            if !headers.contains(column.as_str()) {
                tracing::warn!("⚠️ Mapped column '{}' is not in sheet '{}'", column, sheet.name);
            }
        }
        for column in self.overrides.values() {
            if !headers.contains(column.as_str()) {
                tracing::warn!("⚠️ Override column '{}' is not in sheet '{}'", column, sheet.name);
            }
        }
    }

    /// 填一份表單；欄位錯誤記錄後繼續，序列化失敗才回傳 Err
    fn render_record(
        &self,
        template: &T,
        record: &Record,
        transformer: &ValueTransformer<'_>,
        result: &mut GenerationResult,
    ) -> Result<Vec<u8>> {
        let mut document = template.instantiate()?;

        for (field, column) in &self.mapping {
            let Some(value) = transformer.transform(field, column, record) else {
                continue;
            };
            if let Err(e) = document.set_text(field, &value) {
                result.push_error(BatchError::Field {
                    row: record.row,
                    field: field.clone(),
                    message: e.to_string(),
                });
            }
        }

        document.to_bytes()
    }

    async fn load_group(
        &self,
        group: &RecordGroup,
        template: &T,
        transformer: &ValueTransformer<'_>,
        registry: &mut PathRegistry,
        result: &mut GenerationResult,
    ) -> Result<()> {
        let dir = group_dir(&group.name);
        self.storage.prepare_dir(&dir).await?;
        tracing::info!("📂 {} ({} records) -> {}", group.name, group.records.len(), dir);

        for (index, record) in group.records.iter().enumerate() {
            let position = index + 1;
            let bytes = match self.render_record(template, record, transformer, result) {
                Ok(bytes) => bytes,
                Err(e) => {
                    result.push_error(BatchError::Record {
                        row: record.row,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let file_name = document_file_name(
                record,
                self.config.name_column(),
                position,
                self.config.fallback_name(),
            );
            let path = registry.claim(&dir, &file_name);

            match self.storage.write_file(&path, &bytes).await {
                Ok(()) => {
                    tracing::debug!("Row {} -> {}", record.row, path);
                    result.record_success(path);
                }
                Err(e) => result.push_error(BatchError::Record {
                    row: record.row,
                    message: e.to_string(),
                }),
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<S: Storage, T: FormTemplate, C: ConfigProvider> Pipeline for FormPipeline<S, T, C> {
    type Template = T;

    fn validate(&self) -> Result<()> {
        if self.mapping.is_empty() {
            return Err(FillError::config(
                "Field mapping is empty; map at least one template field to a column",
            ));
        }
        Ok(())
    }

    async fn extract(&self) -> Result<SourceData<T>> {
        let spreadsheet_path = self.config.spreadsheet_path();
        tracing::debug!("Reading spreadsheet: {}", spreadsheet_path);
        let bytes = tokio::fs::read(spreadsheet_path).await?;
        let workbook =
            spreadsheet::parse_workbook(&bytes, spreadsheet_path, self.config.sheet_name())?;

        let template_path = self.config.template_path();
        tracing::debug!("Reading template: {}", template_path);
        let template_bytes = tokio::fs::read(template_path).await?;
        let template = T::from_bytes(&template_bytes)?;

        self.warn_unmatched(&workbook.sheet, &template);

        Ok(SourceData {
            sheet: workbook.sheet,
            template,
        })
    }

    fn transform(&self, sheet: SheetData) -> Vec<RecordGroup> {
        group_and_sort(
            sheet.records,
            self.config.group_column(),
            self.config.name_column(),
        )
    }

    async fn load(&self, groups: Vec<RecordGroup>, template: &T) -> GenerationResult {
        let mut result = GenerationResult::default();
        let mut registry = PathRegistry::new();
        let transformer = ValueTransformer::new(&self.rules, &self.overrides);

        for group in &groups {
            if let Err(e) = self
                .load_group(group, template, &transformer, &mut registry, &mut result)
                .await
            {
                result.push_error(BatchError::Group {
                    group: group.name.clone(),
                    message: e.to_string(),
                });
            }
        }

        result
    }
}
