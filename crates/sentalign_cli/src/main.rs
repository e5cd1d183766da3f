//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `sentalign_core` linkage with deterministic output.
//! - Optionally check a stored alignment record and summarize it.
//! - Start file logging under the system temp dir before a record check.
//!
//! Usage: `sentalign_cli [record.json]`

use sentalign_core::{
    init_logging, AlignmentService, InMemoryDocumentRepository, LoggingConfig, LoggingError,
    PersistedRecord, ResolverConfig,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("sentalign_core ping={}", sentalign_core::ping());
    println!("sentalign_core version={}", sentalign_core::core_version());

    let Some(path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };
    if let Err(err) = logging_config().and_then(|config| init_logging(&config)) {
        eprintln!("warning: logging disabled: {err}");
    }
    match check_record(&path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn logging_config() -> Result<LoggingConfig, LoggingError> {
    LoggingConfig::with_default_level(std::env::temp_dir().join("sentalign-logs"))
}

fn check_record(path: &str) -> Result<(), String> {
    let text = std::fs::read_to_string(path).map_err(|err| format!("cannot read `{path}`: {err}"))?;
    let record = PersistedRecord::from_json_str(&text).map_err(|err| err.to_string())?;

    let repo = InMemoryDocumentRepository::from_record(&record);
    let mut service = AlignmentService::from_repository(&repo, ResolverConfig::default())
        .map_err(|err| err.to_string())?;

    let registry = service.registry();
    println!(
        "documents={} sentences={}",
        registry.documents().len(),
        registry.sentence_count()
    );

    if record.mappings.is_empty() {
        println!("mappings=none");
        return Ok(());
    }

    let report = service
        .ingest_candidate(record.mappings)
        .map_err(|err| err.to_string())?;
    println!(
        "processed_keys={} source_keys={} edges={} warnings={}",
        report.stats.processed_keys,
        report.stats.source_keys,
        report.stats.edges,
        report.warnings.len()
    );
    for warning in &report.warnings {
        println!("warning: {warning}");
    }

    for document in service.registry().documents() {
        let segmentation = service
            .segment_document(&document.doc_id)
            .map_err(|err| err.to_string())?;
        println!(
            "doc={} role={} lines={} tagged={} fallbacks={}",
            segmentation.doc_id,
            document.role.as_str(),
            segmentation.stats.lines,
            segmentation.stats.tagged,
            segmentation.stats.fallbacks
        );
    }
    Ok(())
}
