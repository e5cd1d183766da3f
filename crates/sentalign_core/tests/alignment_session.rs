use sentalign_core::{
    Adjacency, AlignmentService, CandidateMapping, Document, DocumentRole, GeneratorError,
    InMemoryDocumentRepository, Line, MappingError, MissingMirror, PersistedRecord, RawMapping,
    ResolverConfig, Sentence, SentenceRegistry, ServiceError, TextCompletionGenerator,
};
use std::cell::RefCell;

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn adjacency(entries: &[(&str, &[&str])]) -> Adjacency {
    entries
        .iter()
        .map(|(key, values)| (key.to_string(), ids(values)))
        .collect()
}

fn documents() -> Vec<Document> {
    let mut ethics = Document::new("src_001", "AI Ethics", DocumentRole::Source);
    ethics.lines = vec![
        Line::new(1, "AI 윤리 가이드라인.", ids(&["src_001_s1"])),
        Line::new(2, "AI 시스템은 투명하고", ids(&["src_001_s2"])),
        Line::new(3, "공정해야 합니다.", ids(&["src_001_s2"])),
    ];
    ethics.sentences = vec![
        Sentence::new("src_001_s1", "src_001", "AI 윤리 가이드라인.", vec![1]),
        Sentence::new(
            "src_001_s2",
            "src_001",
            "AI 시스템은 투명하고 공정해야 합니다.",
            vec![2, 3],
        ),
    ];

    let mut data = Document::new("src_002", "Data", DocumentRole::Source);
    data.lines = vec![Line::new(
        1,
        "데이터는 보호되어야 합니다. 동의가 필요합니다.",
        ids(&["src_002_s1", "src_002_s2"]),
    )];
    data.sentences = vec![
        Sentence::new("src_002_s1", "src_002", "데이터는 보호되어야 합니다.", vec![1]),
        Sentence::new("src_002_s2", "src_002", "동의가 필요합니다.", vec![1]),
    ];

    let mut summary = Document::new("gen", "Summary", DocumentRole::Processed);
    summary.lines = vec![Line::new(
        1,
        "AI는 투명해야 한다. 데이터는 보호된다.",
        ids(&["gen_s1", "gen_s2"]),
    )];
    summary.sentences = vec![
        Sentence::new("gen_s1", "gen", "AI는 투명해야 한다.", vec![1]),
        Sentence::new("gen_s2", "gen", "데이터는 보호된다.", vec![1]),
    ];

    vec![ethics, data, summary]
}

fn service() -> AlignmentService {
    let repo = InMemoryDocumentRepository::new(documents());
    AlignmentService::from_repository(&repo, ResolverConfig::default())
        .expect("fixture documents should load")
}

fn good_mapping() -> RawMapping {
    RawMapping::new(
        adjacency(&[
            ("gen_s1", &["src_001_s2"]),
            ("gen_s2", &["src_002_s1", "src_002_s2"]),
        ]),
        adjacency(&[
            ("src_001_s2", &["gen_s1"]),
            ("src_002_s1", &["gen_s2"]),
            ("src_002_s2", &["gen_s2"]),
        ]),
    )
}

#[test]
fn forward_only_edges_are_mirrored_with_one_warning_each() {
    let registry = SentenceRegistry::build(documents()).expect("registry should build");
    let mut candidate = CandidateMapping::ingest(
        adjacency(&[("gen_s2", &["src_002_s1", "src_002_s2"])]),
        Adjacency::new(),
    );

    let warnings = candidate.normalize().to_vec();
    assert_eq!(warnings.len(), 2);
    assert!(warnings
        .iter()
        .all(|warning| warning.missing == MissingMirror::Backward && warning.processed_id == "gen_s2"));
    assert_eq!(
        candidate.backward(),
        &adjacency(&[("src_002_s1", &["gen_s2"]), ("src_002_s2", &["gen_s2"])])
    );

    let validated = candidate
        .validate(&registry)
        .expect("mirrored mapping should validate");
    assert_eq!(validated.warnings.len(), 2);
    assert!(validated.graph.contains_edge("gen_s2", "src_002_s1"));
    assert_eq!(
        validated.graph.query("src_002_s2", DocumentRole::Source).to_vec(),
        ids(&["gen_s2"])
    );
}

#[test]
fn normalize_twice_matches_normalize_once() {
    let mut once = CandidateMapping::ingest(
        adjacency(&[("gen_s1", &["src_001_s2", "src_001_s2", "src_001_s1"])]),
        adjacency(&[("src_002_s1", &["gen_s2"])]),
    );
    once.normalize();
    let mut twice = once.clone();
    let repaired = twice.normalize().len();

    assert_eq!(repaired, 0);
    assert_eq!(once.forward(), twice.forward());
    assert_eq!(once.backward(), twice.backward());
}

#[test]
fn accepted_graph_is_symmetric() {
    let mut service = service();
    let mut raw = good_mapping();
    raw.source_to_summary.clear();
    service.ingest_candidate(raw).expect("mapping should be accepted");

    let graph = service.graph();
    for (processed_id, source_ids) in graph.forward() {
        for source_id in source_ids {
            assert!(graph.backward()[source_id].contains(processed_id));
        }
    }
    for (source_id, processed_ids) in graph.backward() {
        for processed_id in processed_ids {
            assert!(graph.forward()[processed_id].contains(source_id));
            assert!(service.registry().lookup(processed_id).is_ok());
        }
        assert!(service.registry().lookup(source_id).is_ok());
    }
}

#[test]
fn unknown_reference_rejects_candidate_and_keeps_active_graph() {
    let mut service = service();
    let accepted = service
        .ingest_candidate(good_mapping())
        .expect("good mapping should be accepted");
    assert_eq!(accepted.generation, 1);
    assert!(accepted.warnings.is_empty());
    let before = service.graph();

    let rejected = service
        .ingest_candidate(RawMapping::new(
            adjacency(&[("gen_s1", &["sX"])]),
            Adjacency::new(),
        ))
        .expect_err("unknown id must be rejected");

    assert_eq!(rejected.unknown_ids(), vec!["sX"]);
    assert_eq!(service.generation(), 1);
    assert_eq!(*service.graph(), *before);
}

#[test]
fn rejection_reports_every_problem_at_once() {
    let mut service = service();
    let rejected = service
        .ingest_candidate(RawMapping::new(
            adjacency(&[("gen_s1", &["sX", "sY"]), ("src_001_s1", &["gen_s2"])]),
            Adjacency::new(),
        ))
        .expect_err("candidate must be rejected");

    assert_eq!(rejected.unknown_ids(), vec!["sX", "sY"]);
    let wrong_side: Vec<&MappingError> = rejected
        .errors
        .iter()
        .filter(|err| matches!(err, MappingError::WrongSide { .. }))
        .collect();
    assert_eq!(wrong_side.len(), 2);
    assert!(service.graph().is_empty());
    assert_eq!(service.generation(), 0);
}

#[test]
fn generator_output_is_validated_before_activation() {
    let mut service = service();
    let payloads = RefCell::new(Vec::new());
    let generator = TextCompletionGenerator::new(|payload: &str| {
        payloads.borrow_mut().push(payload.to_string());
        Ok("```json\n{\"generated_doc_to_source_doc\": {\"gen_s1\": [\"src_001_s2\"]}}\n```".to_string())
    });

    let first = service
        .request_candidate(&generator, false)
        .expect("generated mapping should be accepted");
    assert_eq!(first.generation, 1);
    assert_eq!(first.warnings.len(), 1);
    assert!(service.graph().contains_edge("gen_s1", "src_001_s2"));

    service
        .request_candidate(&generator, true)
        .expect("refined mapping should be accepted");

    let payloads = payloads.borrow();
    assert_eq!(payloads.len(), 2);
    assert!(payloads[0].contains("\"processed_document\""));
    assert!(!payloads[0].contains("prior_mapping"));
    assert!(payloads[1].contains("prior_mapping"));
}

#[test]
fn generator_failures_leave_graph_untouched() {
    let mut service = service();
    service
        .ingest_candidate(good_mapping())
        .expect("good mapping should be accepted");

    let offline = TextCompletionGenerator::new(|_: &str| Err("connection refused".to_string()));
    let err = service
        .request_candidate(&offline, true)
        .expect_err("transport failure must surface");
    assert!(matches!(
        err,
        ServiceError::Generator(GeneratorError::Upstream(_))
    ));

    let chatty = TextCompletionGenerator::new(|_: &str| Ok("I could not decide.".to_string()));
    let err = service
        .request_candidate(&chatty, false)
        .expect_err("missing json must surface");
    assert!(matches!(err, ServiceError::Generator(GeneratorError::MissingJson)));

    let hallucinating = TextCompletionGenerator::new(|_: &str| {
        Ok("{\"summary_to_source\": {\"gen_s9\": [\"src_001_s1\"]}}".to_string())
    });
    let err = service
        .request_candidate(&hallucinating, false)
        .expect_err("unknown ids must surface");
    assert!(matches!(err, ServiceError::Rejected(_)));

    assert_eq!(service.generation(), 1);
}

#[test]
fn mapping_rows_carry_both_texts() {
    let mut service = service();
    service
        .ingest_candidate(good_mapping())
        .expect("good mapping should be accepted");

    let rows = service.mapping_rows();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].processed_id, "gen_s1");
    assert_eq!(rows[0].source_id, "src_001_s2");
    assert_eq!(rows[0].source_text, "AI 시스템은 투명하고 공정해야 합니다.");
}

#[test]
fn exported_record_survives_a_file_round_trip() {
    let mut service = service();
    service
        .ingest_candidate(good_mapping())
        .expect("good mapping should be accepted");
    let record = service.export_record();
    assert_eq!(record.source_documents.len(), 2);
    assert_eq!(record.processed_document.doc_id, "gen");

    let dir = tempfile::tempdir().expect("temp dir should be created");
    let path = dir.path().join("record.json");
    let json = record
        .to_json_string_pretty()
        .expect("record should serialize");
    std::fs::write(&path, json).expect("record should be written");

    let text = std::fs::read_to_string(&path).expect("record should be read back");
    let loaded = PersistedRecord::from_json_str(&text).expect("record should parse");
    assert_eq!(loaded, record);

    let repo = InMemoryDocumentRepository::from_record(&loaded);
    let mut reloaded = AlignmentService::from_repository(&repo, ResolverConfig::default())
        .expect("stored documents should load");
    let report = reloaded
        .ingest_candidate(loaded.mappings)
        .expect("stored mapping should be accepted");
    assert!(report.warnings.is_empty());
    assert_eq!(*reloaded.graph(), *service.graph());
}
