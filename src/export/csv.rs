//! CSV export of communes.
//!
//! Writes one row per commune in the import column layout, so an exported
//! file can be fed back to the importer unchanged.

use anyhow::{Context, Result};
use csv::{QuoteStyle, Writer, WriterBuilder};
use futures::TryStreamExt;
use sqlx::SqlitePool;
use std::io::{self, Write};
use std::path::Path;

use crate::config::CSV_DELIMITER;
use crate::filter::{compile, TargetingFilter};
use crate::storage::communes::commune_select;
use crate::storage::Commune;

/// Export header. The first seven columns are the ones the importer maps;
/// the department name and region are informative only.
pub const EXPORT_HEADER: [&str; 9] = [
    "nom_commune",
    "code_insee",
    "code_departement",
    "population",
    "code_postal",
    "latitude",
    "longitude",
    "departement",
    "region",
];

/// Writes every commune matching `filter` to `writer`, ordered by name.
///
/// Fields are `;`-separated and every field is quoted: commas, quotes and
/// line breaks inside names survive a round trip, and spreadsheets keep the
/// leading zero of codes such as `01004` or `01`.
///
/// # Returns
///
/// The number of communes written.
pub async fn export_communes_csv<W: Write>(
    pool: &SqlitePool,
    filter: &TargetingFilter,
    writer: W,
) -> Result<usize> {
    let mut writer = WriterBuilder::new()
        .delimiter(CSV_DELIMITER)
        .quote_style(QuoteStyle::Always)
        .from_writer(writer);
    writer.write_record(EXPORT_HEADER)?;

    let compiled = compile(filter);
    let mut query = commune_select();
    query.push(" WHERE ");
    compiled.push_predicate(&mut query);
    query.push(" ORDER BY c.name, c.insee_code");

    let mut rows = query.build().fetch(pool);
    let mut record_count = 0;
    while let Some(row) = rows.try_next().await? {
        write_commune(&mut writer, &Commune::from_row(&row))?;
        record_count += 1;
    }

    writer.flush().context("Failed to flush CSV output")?;
    Ok(record_count)
}

/// Exports to `output`, or to stdout when no path is given.
pub async fn export_communes(
    pool: &SqlitePool,
    filter: &TargetingFilter,
    output: Option<&Path>,
) -> Result<usize> {
    let writer: Box<dyn Write> = if let Some(output_path) = output {
        let file = std::fs::File::create(output_path).context(format!(
            "Failed to create output file: {}",
            output_path.display()
        ))?;
        Box::new(file)
    } else {
        Box::new(io::stdout())
    };

    let count = export_communes_csv(pool, filter, writer).await?;
    log::info!("Exported {} commune(s)", count);
    Ok(count)
}

fn write_commune<W: Write>(writer: &mut Writer<W>, commune: &Commune) -> Result<()> {
    let population = commune.population.to_string();
    let latitude = commune.latitude.map(|v| v.to_string()).unwrap_or_default();
    let longitude = commune.longitude.map(|v| v.to_string()).unwrap_or_default();
    writer.write_record([
        commune.name.as_str(),
        commune.insee_code.as_str(),
        commune.department_code.as_str(),
        population.as_str(),
        commune.postal_codes.join(",").as_str(),
        latitude.as_str(),
        longitude.as_str(),
        commune.department_name.as_deref().unwrap_or(""),
        commune.region.as_deref().unwrap_or(""),
    ])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{classify, import_mairies, ImportOptions};
    use crate::storage::test_helpers::{create_test_pool, insert_commune};

    type ComparableCommune = (String, String, String, i64, Vec<String>, Option<f64>, Option<f64>);

    /// Everything but ids, timestamps and joined department data.
    fn comparable(c: Commune) -> ComparableCommune {
        (
            c.insee_code,
            c.name,
            c.department_code,
            c.population,
            c.postal_codes,
            c.latitude,
            c.longitude,
        )
    }

    async fn export_to_string(pool: &SqlitePool, filter: &TargetingFilter) -> (usize, String) {
        let mut buffer = Vec::new();
        let count = export_communes_csv(pool, filter, &mut buffer)
            .await
            .expect("export");
        (count, String::from_utf8(buffer).expect("utf-8"))
    }

    #[test]
    fn test_header_maps_back_onto_import_fields() {
        let mapped: Vec<bool> = EXPORT_HEADER.iter().map(|h| classify(h).is_some()).collect();
        assert_eq!(mapped, vec![true, true, true, true, true, true, true, false, false]);
    }

    #[tokio::test]
    async fn test_export_quotes_text_fields() {
        let pool = create_test_pool().await;
        insert_commune(&pool, "75056", "Paris", "75", 2_161_000, &["75001", "75002"]).await;

        let (count, output) = export_to_string(&pool, &TargetingFilter::default()).await;
        assert_eq!(count, 1);
        let mut lines = output.lines();
        assert_eq!(
            lines.next(),
            Some(
                "\"nom_commune\";\"code_insee\";\"code_departement\";\"population\";\"code_postal\";\"latitude\";\"longitude\";\"departement\";\"region\""
            )
        );
        assert_eq!(
            lines.next(),
            Some("\"Paris\";\"75056\";\"75\";\"2161000\";\"75001,75002\";\"\";\"\";\"Paris\";\"Île-de-France\"")
        );
        assert_eq!(lines.next(), None);
    }

    #[tokio::test]
    async fn test_export_quotes_codes_with_leading_zero() {
        let pool = create_test_pool().await;
        insert_commune(&pool, "01004", "Ambérieu-en-Bugey", "01", 14_000, &["01500"]).await;

        let (_, output) = export_to_string(&pool, &TargetingFilter::default()).await;
        let row = output.lines().nth(1).expect("data row");
        assert!(
            row.starts_with("\"Ambérieu-en-Bugey\";\"01004\";\"01\";\"14000\";\"01500\";"),
            "{row}"
        );
    }

    #[tokio::test]
    async fn test_export_applies_filter() {
        let pool = create_test_pool().await;
        insert_commune(&pool, "75056", "Paris", "75", 2_161_000, &[]).await;
        insert_commune(&pool, "13055", "Marseille", "13", 873_076, &[]).await;

        let filter = TargetingFilter {
            department_codes: vec!["13".into()],
            ..Default::default()
        };
        let (count, output) = export_to_string(&pool, &filter).await;
        assert_eq!(count, 1);
        assert!(output.contains("Marseille"));
        assert!(!output.contains("Paris"));
    }

    #[tokio::test]
    async fn test_export_reimports_to_identical_communes() {
        let source = create_test_pool().await;
        let csv = "nom_commune;code_insee;code_departement;population;code_postal;latitude;longitude\n\
                   \"Saint-Denis; \"\"La Réunion\"\"\";97411;974;153 810;97400,97490;-20,8789;55.4481\n\
                   L'Haÿ-les-Roses;94038;94;31 000;94240;48.78;2.3375\n";
        let first = import_mairies(&source, csv.as_bytes(), &ImportOptions::default())
            .await
            .expect("import");
        assert_eq!(first.imported_records, 2);

        let (_, exported) = export_to_string(&source, &TargetingFilter::default()).await;

        let target = create_test_pool().await;
        let second = import_mairies(&target, exported.as_bytes(), &ImportOptions::default())
            .await
            .expect("re-import");
        assert_eq!(second.imported_records, 2);
        assert_eq!(second.error_records, 0);

        let before = crate::storage::list_communes(&source, &TargetingFilter::default(), 0, 0)
            .await
            .expect("list source");
        let after = crate::storage::list_communes(&target, &TargetingFilter::default(), 0, 0)
            .await
            .expect("list target");
        assert_eq!(
            before.into_iter().map(comparable).collect::<Vec<_>>(),
            after.into_iter().map(comparable).collect::<Vec<_>>()
        );
    }
}
