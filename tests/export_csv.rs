//! Tests for CSV export to files, against file-backed databases.

use commune_targeting::export::export_communes;
use commune_targeting::import::{import_mairies, import_mairies_from_path, ImportOptions};
use commune_targeting::initialization::init_database;
use commune_targeting::storage::list_communes;
use commune_targeting::TargetingFilter;
use tempfile::TempDir;

#[path = "helpers.rs"]
mod helpers;

use helpers::mairie_csv;

#[tokio::test]
async fn test_export_to_file_and_reimport() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let source = init_database(&temp_dir.path().join("source.db"))
        .await
        .expect("Failed to open source database");

    let csv = mairie_csv(&[
        "Quimper;29232;29;63 283;;;29000;47,9960;-4,1024",
        "Brest;29019;29;139602;;;29200;;",
        "Nantes;44109;44;320732;;;44000,44100,44200;47.2184;-1.5536",
    ]);
    import_mairies(&source, csv.as_bytes(), &ImportOptions::default())
        .await
        .expect("Failed to import");

    let finistere = TargetingFilter {
        department_codes: vec!["29".into()],
        ..Default::default()
    };
    let output = temp_dir.path().join("finistere.csv");
    let count = export_communes(&source, &finistere, Some(&output))
        .await
        .expect("Failed to export");
    assert_eq!(count, 2);

    let content = std::fs::read_to_string(&output).expect("Failed to read export");
    assert_eq!(content.lines().count(), 3);
    assert!(content.contains("\"Brest\""));
    assert!(!content.contains("Nantes"));

    let target = init_database(&temp_dir.path().join("target.db"))
        .await
        .expect("Failed to open target database");
    let result = import_mairies_from_path(&target, &output, &ImportOptions::default())
        .await
        .expect("Failed to re-import");
    assert_eq!(result.imported_records, 2);
    assert_eq!(result.error_records, 0);

    let communes = list_communes(target.as_ref(), &TargetingFilter::default(), 0, 0)
        .await
        .expect("Failed to list communes");
    let quimper = communes
        .iter()
        .find(|c| c.insee_code == "29232")
        .expect("Quimper re-imported");
    assert_eq!(quimper.population, 63_283);
    assert_eq!(quimper.latitude, Some(47.996));
    assert_eq!(quimper.longitude, Some(-4.1024));
    assert_eq!(quimper.postal_codes, vec!["29000"]);
}

#[tokio::test]
async fn test_export_empty_selection_writes_header_only() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let pool = init_database(&temp_dir.path().join("empty.db"))
        .await
        .expect("Failed to open database");

    let output = temp_dir.path().join("empty.csv");
    let count = export_communes(&pool, &TargetingFilter::default(), Some(&output))
        .await
        .expect("Failed to export");
    assert_eq!(count, 0);

    let content = std::fs::read_to_string(&output).expect("Failed to read export");
    assert_eq!(content.lines().count(), 1);
    assert!(content.starts_with("\"nom_commune\";\"code_insee\""));
}

#[tokio::test]
async fn test_export_to_missing_directory_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let pool = init_database(&temp_dir.path().join("geo.db"))
        .await
        .expect("Failed to open database");

    let output = temp_dir.path().join("missing").join("out.csv");
    let err = export_communes(&pool, &TargetingFilter::default(), Some(&output))
        .await
        .expect_err("export into a missing directory");
    assert!(err.to_string().contains("Failed to create output file"));
}
