use crate::core::{FormTemplate, Pipeline};
use crate::domain::model::GenerationResult;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct FillEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> FillEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// 設定錯誤或輸入檔無法讀取時回傳 Err；單筆記錄的錯誤累積在結果中
    pub async fn run(&self) -> Result<GenerationResult> {
        tracing::info!("🚀 Starting PDF generation");

        self.pipeline.validate()?;

        tracing::info!("📥 Reading spreadsheet and template...");
        let source = self.pipeline.extract().await?;
        tracing::info!(
            "📥 Loaded {} records from sheet '{}', template has {} fields",
            source.sheet.records.len(),
            source.sheet.name,
            source.template.field_names().len()
        );
        self.monitor.log_stats("extract");

        let groups = self.pipeline.transform(source.sheet);
        tracing::info!("🗂️ Grouped records into {} groups", groups.len());
        self.monitor.log_stats("group");

        let result = self.pipeline.load(groups, &source.template).await;
        self.monitor.log_stats("generate");
        self.monitor.log_final_stats(result.success_count);

        tracing::info!("✅ {}", result.summary());
        Ok(result)
    }
}
