//! Download command - extract a fixture snapshot from the source server.

use anyhow::{Context, Result};
use clap::Args;
use fhirsync_fetch::{FhirClient, SearchWalker};
use fhirsync_store::SnapshotStore;
use std::path::PathBuf;
use tracing::info;

/// Arguments for the download command.
#[derive(Args)]
pub struct DownloadArgs {
    /// Source FHIR base URL.
    #[arg(
        long,
        env = "SOURCE_BASE",
        default_value = "https://r4.smarthealthit.org"
    )]
    pub source_base: String,

    /// Number of patients to pull, or "all" for every patient the source has.
    #[arg(long, env = "PATIENT_COUNT", default_value = "10")]
    pub patients: String,

    /// Page size for the patient search.
    #[arg(long, env = "PATIENT_PAGE_SIZE", default_value_t = 200)]
    pub page_size: usize,

    /// Number of practitioners to pull (zero or negative skips the fetch).
    #[arg(long, env = "PRACTITIONER_COUNT", default_value_t = 10)]
    pub practitioners: i64,

    /// Number of practitioner roles to pull (zero or negative skips the fetch).
    #[arg(long, env = "PRACTITIONER_ROLE_COUNT", default_value_t = 10)]
    pub practitioner_roles: i64,

    /// Number of related persons to pull (zero or negative skips the fetch).
    #[arg(long, env = "RELATED_PERSON_COUNT", default_value_t = 10)]
    pub related_persons: i64,

    /// Directory the snapshot is written to.
    #[arg(long, env = "OUTPUT_DIR", default_value = "fixtures")]
    pub output_dir: PathBuf,
}

/// Runs the download command.
pub async fn run(args: &DownloadArgs) -> Result<()> {
    let source_base = args.source_base.trim_end_matches('/').to_string();
    let patient_count = parse_patient_count(&args.patients)?;

    let client = FhirClient::new()?;
    let store = SnapshotStore::new(&args.output_dir);
    store.ensure_dir().await?;
    store.clear_search_pages().await?;

    let mut walker = SearchWalker::new(&client, &source_base, "Patient", args.page_size, patient_count)?;
    let mut pages = 0usize;
    while let Some(bundle) = walker.next_page().await? {
        pages += 1;
        store.save_search_page(pages, &bundle).await?;
    }
    let ids = walker.into_ids();
    if ids.is_empty() {
        anyhow::bail!("no patients returned from search");
    }
    info!(patients = ids.len(), pages, "patient search complete");

    for id in &ids {
        info!(patient = %id, "fetching $everything");
        let bundle = client.everything(&source_base, "Patient", id).await?;
        store.save_everything(id, &bundle).await?;
    }

    let collections = [
        ("Practitioner", "practitioners", args.practitioners),
        ("PractitionerRole", "practitioner-roles", args.practitioner_roles),
        ("RelatedPerson", "related-persons", args.related_persons),
    ];
    for (resource_type, file_name, count) in collections {
        if count <= 0 {
            continue;
        }
        info!(resource_type, count, "fetching auxiliary collection");
        #[allow(clippy::cast_sign_loss)]
        let bundle = client
            .collection(&source_base, resource_type, count as usize)
            .await?;
        store.save_collection(file_name, &bundle).await?;
    }

    info!(
        patients = ids.len(),
        dir = %args.output_dir.display(),
        "snapshot complete"
    );
    Ok(())
}

/// Parses the patient count; `all` means unbounded (zero).
fn parse_patient_count(raw: &str) -> Result<usize> {
    if raw.eq_ignore_ascii_case("all") {
        return Ok(0);
    }
    raw.parse()
        .with_context(|| format!("invalid patient count: {raw}"))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_patient_count_number() {
        assert_eq!(parse_patient_count("10").unwrap(), 10);
        assert_eq!(parse_patient_count("0").unwrap(), 0);
    }

    #[test]
    fn test_parse_patient_count_all() {
        assert_eq!(parse_patient_count("all").unwrap(), 0);
        assert_eq!(parse_patient_count("ALL").unwrap(), 0);
    }

    #[test]
    fn test_parse_patient_count_invalid() {
        assert!(parse_patient_count("ten").is_err());
        assert!(parse_patient_count("-1").is_err());
    }
}
