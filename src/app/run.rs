use crate::adapters::{LocalStorage, PdfTemplate, ZipStorage};
use crate::app::pipelines::FormPipeline;
use crate::config::OutputFormat;
use crate::core::etl::FillEngine;
use crate::core::transform::TransformRules;
use crate::core::{ConfigProvider, FieldMapping, GenerationResult, OverrideMapping};
use crate::utils::error::Result;
use std::path::Path;

/// 一次批次執行需要的設定（對應表已決定好）
#[derive(Debug, Clone, Default)]
pub struct RunPlan {
    pub mapping: FieldMapping,
    pub overrides: OverrideMapping,
    pub rules: TransformRules,
    pub format: OutputFormat,
    pub zip_filename: String,
    pub monitor: bool,
}

pub async fn execute<C: ConfigProvider>(config: C, plan: RunPlan) -> Result<GenerationResult> {
    let output_path = config.output_path().to_string();

    match plan.format {
        OutputFormat::Directory => {
            let storage = LocalStorage::new(&output_path);
            let pipeline = FormPipeline::<_, PdfTemplate, _>::new(storage, config, plan.mapping)
                .with_overrides(plan.overrides)
                .with_rules(plan.rules);
            let result = FillEngine::new_with_monitoring(pipeline, plan.monitor)
                .run()
                .await?;
            tracing::info!("📁 Output saved to: {}", output_path);
            Ok(result)
        }
        OutputFormat::Zip => {
            let pipeline = FormPipeline::<_, PdfTemplate, _>::new(ZipStorage::new(), config, plan.mapping)
                .with_overrides(plan.overrides)
                .with_rules(plan.rules);
            let engine = FillEngine::new_with_monitoring(pipeline, plan.monitor);
            let result = engine.run().await?;

            let zip_path = Path::new(&output_path).join(&plan.zip_filename);
            let size = engine
                .pipeline()
                .storage()
                .finish_to_file(&zip_path)
                .await?;
            tracing::info!("📦 Archive saved to: {} ({} bytes)", zip_path.display(), size);
            Ok(result)
        }
    }
}

/// 結果面板：成功數與錯誤清單寫成 JSON
pub async fn write_report(path: &str, result: &GenerationResult) -> Result<()> {
    let report = serde_json::json!({
        "summary": result.summary(),
        "success_count": result.success_count,
        "error_count": result.errors.len(),
        "messages": result.error_messages(),
        "errors": result.errors,
        "written": result.written,
    });
    tokio::fs::write(path, serde_json::to_string_pretty(&report)?).await?;
    Ok(())
}

pub fn print_result(result: &GenerationResult) {
    println!("✅ {}", result.summary());
    for message in result.error_messages() {
        println!("  ⚠️ {}", message);
    }
}
