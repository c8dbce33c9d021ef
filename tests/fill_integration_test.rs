use lopdf::{dictionary, Document, Object};
use pdf_form_filler::app::run::{execute, write_report, RunPlan};
use pdf_form_filler::core::etl::FillEngine;
use pdf_form_filler::core::{FieldMapping, FormTemplate, OverrideMapping};
use pdf_form_filler::{
    FillError, FormPipeline, JobConfig, LocalStorage, OutputFormat, PdfTemplate,
};
use std::path::Path;
use tempfile::TempDir;

const RESPONSES: &str = "\
Escuela,Nombre completo,Género,Otro género,Fecha de nacimiento,Actividades (selección múltiple)
Norte,Zoe Ruiz,Femenino,,40179,Fútbol;Ajedrez
Sur,Beto Díaz,Otro,No binario,39448,Danza
Norte,ana lópez,Masculino,,25569,
Sur,Carla Núñez,Femenino,,39814,Teatro;Coro;Pintura
Norte,Mario Soto,Masculino,,1,
";

/// Formulario AcroForm con cuatro campos de texto
fn build_template() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let fields: Vec<Object> = ["Nombre", "Genero", "FechaNacimiento", "Actividades"]
        .iter()
        .map(|name| {
            Object::Reference(doc.add_object(dictionary! {
                "FT" => "Tx",
                "T" => Object::string_literal(*name),
            }))
        })
        .collect();

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(595),
            Object::Integer(842),
        ],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => Object::Integer(1),
        }),
    );
    let acroform_id = doc.add_object(dictionary! { "Fields" => fields });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => acroform_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn write_inputs(dir: &Path, csv: &str) -> (String, String) {
    let spreadsheet = dir.join("respuestas.csv");
    let template = dir.join("formato.pdf");
    std::fs::write(&spreadsheet, csv).unwrap();
    std::fs::write(&template, build_template()).unwrap();
    (
        spreadsheet.to_string_lossy().to_string(),
        template.to_string_lossy().to_string(),
    )
}

fn job_toml(spreadsheet: &str, template: &str, output: &str, extra_output: &str) -> String {
    format!(
        r#"
[job]
name = "encuesta"

[source]
spreadsheet = "{spreadsheet}"
template = "{template}"

[grouping]
group_column = "Escuela"
name_column = "Nombre completo"

[mapping]
Nombre = "Nombre completo"
Genero = "Género"
FechaNacimiento = "Fecha de nacimiento"
Actividades = "Actividades (selección múltiple)"

[overrides]
Genero = "Otro género"

[output]
path = "{output}"
{extra_output}
"#
    )
}

fn plan_for(config: &JobConfig) -> RunPlan {
    RunPlan {
        mapping: config.mapping.clone(),
        overrides: config.overrides.clone(),
        rules: config.rules.clone(),
        format: config.output.format,
        zip_filename: config.zip_filename().to_string(),
        monitor: false,
    }
}

fn read_field(path: &Path, field: &str) -> Option<String> {
    let bytes = std::fs::read(path).unwrap();
    PdfTemplate::from_bytes(&bytes).unwrap().field_value(field)
}

#[tokio::test]
async fn test_end_to_end_directory_output() {
    let temp_dir = TempDir::new().unwrap();
    let (spreadsheet, template) = write_inputs(temp_dir.path(), RESPONSES);
    let output = temp_dir.path().join("salida");
    let output_str = output.to_string_lossy().to_string();

    let config = JobConfig::from_toml_str(&job_toml(&spreadsheet, &template, &output_str, "")).unwrap();
    let plan = plan_for(&config);
    let result = execute(config, plan).await.unwrap();

    assert_eq!(result.success_count, 5);
    assert!(result.is_clean(), "unexpected errors: {:?}", result.error_messages());
    assert_eq!(result.summary(), "Generated 5 PDF files");

    // 群組內依名稱排序（不分大小寫）
    assert_eq!(
        result.written,
        vec![
            "Norte/001_ana_lopez.pdf",
            "Norte/002_Mario_Soto.pdf",
            "Norte/003_Zoe_Ruiz.pdf",
            "Sur/001_Beto_Diaz.pdf",
            "Sur/002_Carla_Nunez.pdf",
        ]
    );
    for path in &result.written {
        assert!(output.join(path).exists(), "missing {}", path);
    }

    let ana = output.join("Norte/001_ana_lopez.pdf");
    assert_eq!(read_field(&ana, "Nombre").as_deref(), Some("ana lópez"));
    assert_eq!(read_field(&ana, "FechaNacimiento").as_deref(), Some("01/01/1970"));
    assert_eq!(read_field(&ana, "Actividades"), None);

    let mario = output.join("Norte/002_Mario_Soto.pdf");
    assert_eq!(read_field(&mario, "FechaNacimiento").as_deref(), Some("31/12/1899"));

    let beto = output.join("Sur/001_Beto_Diaz.pdf");
    assert_eq!(read_field(&beto, "Genero").as_deref(), Some("No binario"));

    let carla = output.join("Sur/002_Carla_Nunez.pdf");
    assert_eq!(
        read_field(&carla, "Actividades").as_deref(),
        Some("Teatro   Coro   Pintura")
    );
    assert_eq!(read_field(&carla, "Genero").as_deref(), Some("Femenino"));
}

#[tokio::test]
async fn test_zip_output_contains_group_folders() {
    let temp_dir = TempDir::new().unwrap();
    let (spreadsheet, template) = write_inputs(temp_dir.path(), RESPONSES);
    let output = temp_dir.path().join("descargas");
    let output_str = output.to_string_lossy().to_string();

    let toml = job_toml(
        &spreadsheet,
        &template,
        &output_str,
        "format = \"zip\"\nzip_filename = \"lote.zip\"",
    );
    let config = JobConfig::from_toml_str(&toml).unwrap();
    let plan = plan_for(&config);
    let result = execute(config, plan).await.unwrap();
    assert_eq!(result.success_count, 5);

    let zip_path = output.join("lote.zip");
    assert!(zip_path.exists());
    assert!(!output.join("Norte").exists());

    let zip_data = std::fs::read(&zip_path).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();
    assert!(names.contains(&"Norte/003_Zoe_Ruiz.pdf".to_string()));
    assert!(names.contains(&"Sur/002_Carla_Nunez.pdf".to_string()));

    let mut entry = archive.by_name("Sur/001_Beto_Diaz.pdf").unwrap();
    let mut bytes = Vec::new();
    std::io::Read::read_to_end(&mut entry, &mut bytes).unwrap();
    let filled = PdfTemplate::from_bytes(&bytes).unwrap();
    assert_eq!(filled.field_value("Nombre").as_deref(), Some("Beto Díaz"));
}

#[tokio::test]
async fn test_missing_group_and_name_values() {
    let temp_dir = TempDir::new().unwrap();
    let csv = "\
Escuela,Nombre completo,Género,Otro género,Fecha de nacimiento,Actividades (selección múltiple)
,Luis Vega,Masculino,,,
Norte,,Femenino,,,
";
    let (spreadsheet, template) = write_inputs(temp_dir.path(), csv);
    let output = temp_dir.path().join("salida");
    let output_str = output.to_string_lossy().to_string();

    let config = JobConfig::from_toml_str(&job_toml(&spreadsheet, &template, &output_str, "")).unwrap();
    let plan = plan_for(&config);
    let result = execute(config, plan).await.unwrap();

    assert_eq!(result.success_count, 2);
    assert_eq!(
        result.written,
        vec!["Unknown/001_Luis_Vega.pdf", "Norte/001_Record_1.pdf"]
    );
    assert!(output.join("Unknown/001_Luis_Vega.pdf").exists());
}

#[tokio::test]
async fn test_group_failure_does_not_stop_batch() {
    let temp_dir = TempDir::new().unwrap();
    let (spreadsheet, template) = write_inputs(temp_dir.path(), RESPONSES);
    let output = temp_dir.path().join("salida");
    std::fs::create_dir_all(&output).unwrap();
    // 同名檔案擋住群組資料夾
    std::fs::write(output.join("Sur"), b"not a directory").unwrap();
    let output_str = output.to_string_lossy().to_string();

    let config = JobConfig::from_toml_str(&job_toml(&spreadsheet, &template, &output_str, "")).unwrap();
    let plan = plan_for(&config);
    let result = execute(config, plan).await.unwrap();

    assert_eq!(result.success_count, 3);
    let messages = result.error_messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("Error processing Sur: "), "{}", messages[0]);
    assert_eq!(result.summary(), "Generated 3 PDF files with 1 errors");

    let report_path = temp_dir.path().join("reporte.json");
    write_report(report_path.to_str().unwrap(), &result).await.unwrap();
    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["success_count"], 3);
    assert_eq!(report["errors"][0]["kind"], "group");
    assert_eq!(report["errors"][0]["group"], "Sur");
}

#[tokio::test]
async fn test_field_missing_from_template_is_reported_per_row() {
    let temp_dir = TempDir::new().unwrap();
    let csv = "\
Escuela,Nombre completo,Firma
Norte,Ana,AL
Norte,Beto,
";
    let (spreadsheet, template) = write_inputs(temp_dir.path(), csv);
    let output = temp_dir.path().join("salida");

    let mut mapping = FieldMapping::new();
    mapping.insert("Nombre".to_string(), "Nombre completo".to_string());
    mapping.insert("Firma".to_string(), "Firma".to_string());

    let toml = job_toml(&spreadsheet, &template, &output.to_string_lossy(), "");
    let config = JobConfig::from_toml_str(&toml).unwrap();
    let plan = RunPlan {
        mapping,
        overrides: OverrideMapping::new(),
        ..RunPlan::default()
    };
    let result = execute(config, plan).await.unwrap();

    // Beto no tiene valor en Firma, así que sólo Ana produce el error
    assert_eq!(result.success_count, 2);
    assert_eq!(
        result.error_messages(),
        vec!["Row 1: Error setting field Firma: No fillable text field named 'Firma'"]
    );
    assert_eq!(
        read_field(&output.join("Norte/001_Ana.pdf"), "Nombre").as_deref(),
        Some("Ana")
    );
}

#[tokio::test]
async fn test_empty_mapping_fails_before_reading_inputs() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("salida");
    let toml = job_toml("no-existe.csv", "no-existe.pdf", &output.to_string_lossy(), "");
    let config = JobConfig::from_toml_str(&toml).unwrap();

    let pipeline = FormPipeline::<_, PdfTemplate, _>::new(
        LocalStorage::new(&output),
        config,
        FieldMapping::new(),
    );
    let result = FillEngine::new(pipeline).run().await;

    assert!(matches!(result, Err(FillError::ConfigError { .. })));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_missing_spreadsheet_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("salida");
    let toml = job_toml("no-existe.csv", "no-existe.pdf", &output.to_string_lossy(), "");
    let config = JobConfig::from_toml_str(&toml).unwrap();
    assert_eq!(config.output.format, OutputFormat::Directory);

    let plan = plan_for(&config);
    let result = execute(config, plan).await;
    assert!(matches!(result, Err(FillError::IoError(_))));
}

#[tokio::test]
async fn test_colliding_group_dirs_match_across_sinks() {
    let temp_dir = TempDir::new().unwrap();
    let csv = "\
Escuela,Nombre completo
José,Ana
Jose,Ana
";
    let (spreadsheet, template) = write_inputs(temp_dir.path(), csv);

    let dir_output = temp_dir.path().join("carpetas");
    let toml = job_toml(&spreadsheet, &template, &dir_output.to_string_lossy(), "");
    let config = JobConfig::from_toml_str(&toml).unwrap();
    let plan = plan_for(&config);
    let directory = execute(config, plan).await.unwrap();

    let zip_output = temp_dir.path().join("zip");
    let toml = job_toml(
        &spreadsheet,
        &template,
        &zip_output.to_string_lossy(),
        "format = \"zip\"",
    );
    let config = JobConfig::from_toml_str(&toml).unwrap();
    let plan = plan_for(&config);
    let zipped = execute(config, plan).await.unwrap();

    let expected = vec!["Jose/001_Ana.pdf", "Jose/001_Ana_2.pdf"];
    assert_eq!(directory.written, expected);
    assert_eq!(zipped.written, expected);
    assert!(zipped.is_clean(), "unexpected errors: {:?}", zipped.error_messages());
    assert_eq!(zipped.success_count, 2);

    let zip_data = std::fs::read(zip_output.join("formularios.zip")).unwrap();
    let archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
    let mut names: Vec<&str> = archive.file_names().collect();
    names.sort();
    assert_eq!(names, vec!["Jose/", "Jose/001_Ana.pdf", "Jose/001_Ana_2.pdf"]);
}
