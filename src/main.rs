use clap::Parser;
use pdf_form_filler::app::mapping::{preview_inputs, resolve_mapping};
use pdf_form_filler::app::run::{execute, print_result, write_report, RunPlan};
use pdf_form_filler::utils::{logger, validation::Validate};
use pdf_form_filler::{CliConfig, FillError, MappingFile, PdfTemplate};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_logger(config.verbose, config.json_logs);

    tracing::info!("Starting pdf-form-filler CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    match run(config).await {
        Ok(()) => Ok(()),
        Err(e) => exit_with(&e),
    }
}

async fn run(config: CliConfig) -> Result<(), FillError> {
    let explicit = match &config.mapping {
        Some(path) => {
            tracing::info!("📁 Loading mapping from: {}", path);
            MappingFile::from_file(path)?
        }
        None => MappingFile::default(),
    };
    explicit.check(config.auto_map)?;

    let preview = preview_inputs::<PdfTemplate>(&config).await?;
    tracing::info!(
        "📋 Sheet '{}' ({} records, {} columns), template has {} fields",
        preview.sheet_name,
        preview.record_count,
        preview.headers.len(),
        preview.template_fields.len()
    );

    let mapping = resolve_mapping(&explicit.mapping, &preview, config.auto_map);
    for field in preview.unmapped_fields(&mapping) {
        tracing::warn!("⚠️ Template field '{}' has no column and keeps its default", field);
    }

    let plan = RunPlan {
        mapping,
        rules: explicit.rules(),
        overrides: explicit.overrides,
        format: config.output_format(),
        zip_filename: config.zip_filename.clone(),
        monitor: config.monitor,
    };
    let report = config.report.clone();

    let result = execute(config, plan).await?;
    print_result(&result);

    if let Some(path) = report {
        write_report(&path, &result).await?;
        println!("📝 Report saved to: {}", path);
    }
    Ok(())
}

fn exit_with(e: &FillError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ PDF generation failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    std::process::exit(e.exit_code().max(1));
}
