use exoncov::*;

fn fixture_transcript(accession: &str, strand: Strand) -> Transcript {
    Transcript {
        gene_symbol: "TP53".to_string(),
        accession: accession.to_string(),
        chrom: "17".to_string(),
        strand,
        tx_begin: 1000,
        tx_end: 1230,
        cds_begin: 1020,
        cds_end: 1220,
        exons: vec![Exon::new(1000, 1050), Exon::new(1200, 1230)],
    }
}

fn fixture_catalog() -> TranscriptCatalog {
    let mut catalog = TranscriptCatalog::new();
    catalog
        .insert(fixture_transcript("NM_000546", Strand::Forward))
        .unwrap();
    catalog
        .insert(fixture_transcript("NM_001126112", Strand::Reverse))
        .unwrap();
    catalog
}

fn unpadded_engine() -> CoverageEngine {
    CoverageEngine::with_config(
        fixture_catalog(),
        SampleRegistry::new(),
        EngineConfig { max_padding: 0 },
    )
}

fn synthetic_samples() -> Vec<String> {
    vec![SYNTHETIC_SAMPLE_ID.to_string()]
}

#[test]
fn test_gene_lookup_lists_both_transcripts() {
    let engine = unpadded_engine();
    let transcripts = engine.gene_transcripts("TP53").unwrap();
    assert_eq!(transcripts.len(), 2);
    assert!(matches!(
        engine.gene_transcripts("BRCA1"),
        Err(CoverageError::UnknownGene(_))
    ));
}

#[test]
fn test_synthetic_matrix_end_to_end() {
    let engine = unpadded_engine();
    let matrix = engine
        .coverage_matrix("NM_000546", &synthetic_samples())
        .unwrap();

    assert_eq!(matrix.chrom, "17");
    assert_eq!(matrix.samples, vec!["synthetic"]);
    assert_eq!(matrix.rows.len(), 80); // 50 + 30 exonic bases

    // the ramp rises from 0 to floor(50 * 79 / 80) = 49
    assert_eq!(matrix.rows[0].pos, 1001);
    assert_eq!(matrix.rows[0].exon_no, 1);
    assert_eq!(matrix.rows[0].depths, vec![0]);
    let last = matrix.rows.last().unwrap();
    assert_eq!(last.pos, 1230);
    assert_eq!(last.exon_no, 2);
    assert_eq!(last.depths, vec![49]);
}

#[test]
fn test_reverse_strand_exon_numbering_end_to_end() {
    let engine = unpadded_engine();
    let matrix = engine
        .coverage_matrix("NM_001126112", &synthetic_samples())
        .unwrap();

    // rows ascend genomically, so the reverse transcript starts at exon 2
    assert_eq!(matrix.rows[0].exon_no, 2);
    assert_eq!(matrix.rows.last().unwrap().exon_no, 1);

    let summary = engine
        .summary_table("NM_001126112", &synthetic_samples(), AggregateFn::Min)
        .unwrap();
    assert_eq!(summary.rows[0].kind, RowKind::Transcript);
    assert_eq!(summary.rows[0].values, vec![0.0]);
    assert_eq!(summary.rows[1].exon_no, Some(1));
    assert_eq!(summary.rows[1].values, vec![31.0]); // floor(50 * 50 / 80)
    assert_eq!(summary.rows[2].exon_no, Some(2));
    assert_eq!(summary.rows[2].values, vec![0.0]);
}

#[test]
fn test_summary_min_forward() {
    let engine = unpadded_engine();
    let summary = engine
        .summary_table("NM_000546", &synthetic_samples(), AggregateFn::Min)
        .unwrap();

    assert_eq!(summary.samples, vec!["synthetic"]);
    assert_eq!(summary.agg, AggregateFn::Min);
    assert_eq!(summary.rows.len(), 3);
    assert_eq!(summary.rows[0].values, vec![0.0]); // transcript
    assert_eq!(summary.rows[1].values, vec![0.0]); // exon 1
    assert_eq!(summary.rows[2].values, vec![31.0]); // exon 2
}

#[test]
fn test_projection_end_to_end() {
    let engine = unpadded_engine();
    let projected = engine
        .projected_coverage("NM_000546", &synthetic_samples(), 0)
        .unwrap();

    assert_eq!(projected.axis_len, 80);
    assert_eq!(projected.jumps, vec![50]); // display seam at the intron
    assert_eq!(projected.transcript.tx_begin, 0);
    assert_eq!(projected.transcript.tx_end, 80);
    assert_eq!(projected.transcript.cds, Some((20, 70)));
    assert_eq!(projected.transcript.exons, vec![(0, 50), (50, 80)]);
    assert_eq!(projected.rows.len(), 80);

    // display coordinates are dense ranks
    let xs: Vec<u32> = projected.rows.iter().map(|row| row.x).collect();
    assert_eq!(xs, (0..80).collect::<Vec<u32>>());

    // identical requests serve identical payloads
    let again = engine
        .projected_coverage("NM_000546", &synthetic_samples(), 0)
        .unwrap();
    assert_eq!(projected, again);
}

#[test]
fn test_projection_serializes_for_the_ui() {
    let engine = unpadded_engine();
    let projected = engine
        .projected_coverage("NM_000546", &synthetic_samples(), 0)
        .unwrap();

    let json = serde_json::to_value(&projected).unwrap();
    assert_eq!(json["axis_len"], 80);
    assert_eq!(json["samples"][0], "synthetic");
    assert_eq!(json["transcript"]["cds"][0], 20);
    assert_eq!(json["rows"][0]["x"], 0);
}

#[test]
fn test_matrices_are_cached_and_clearable() {
    let engine = unpadded_engine();
    let first = engine
        .coverage_matrix("NM_000546", &synthetic_samples())
        .unwrap();
    let second = engine
        .coverage_matrix("NM_000546", &synthetic_samples())
        .unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));

    engine.clear_cache();
    let third = engine
        .coverage_matrix("NM_000546", &synthetic_samples())
        .unwrap();
    assert!(!std::sync::Arc::ptr_eq(&first, &third));
    assert_eq!(*first, *third); // recomputation is deterministic
}

fn write_header_only_bam(path: &std::path::Path, text: &str) {
    use noodles::{bam, sam};

    let header: sam::Header = text.parse().unwrap();
    let mut writer = bam::io::Writer::new(std::fs::File::create(path).unwrap());
    writer.write_header(&header).unwrap();
    writer.try_finish().unwrap();
}

#[test]
fn test_bam_discovery_and_unsupported_samples() {
    let dir = tempfile::tempdir().unwrap();
    write_header_only_bam(
        &dir.path().join("case7.bam"),
        "@HD\tVN:1.6\n@SQ\tSN:17\tLN:10000\n@RG\tID:rg1\tSM:case7-N1-DNA1-WES1\n",
    );
    write_header_only_bam(
        &dir.path().join("merged.bam"),
        "@HD\tVN:1.6\n@SQ\tSN:17\tLN:10000\n@RG\tID:rg1\tSM:a\n@RG\tID:rg2\tSM:b\n",
    );

    let mut registry = SampleRegistry::new()
        .with_name_strip(regex::Regex::new(r"-N1(-DNA1)?(-WES1)?$").unwrap());
    let added = registry.discover(dir.path()).unwrap();
    assert_eq!(added, 2);
    assert_eq!(registry.len(), 3); // synthetic plus the two files

    let case7 = registry
        .iter()
        .find(|record| record.name == "case7")
        .expect("read group sample name, stripped");
    assert!(matches!(case7.backing, Backing::Bam(_)));

    let merged = registry
        .iter()
        .find(|record| matches!(record.backing, Backing::Unsupported { .. }))
        .expect("multi read group file registered as unsupported");
    let merged_id = merged.id.clone();

    let engine = CoverageEngine::new(fixture_catalog(), registry);
    let err = engine
        .coverage_matrix("NM_000546", &[merged_id])
        .unwrap_err();
    assert!(matches!(err, CoverageError::UnsupportedSample { .. }));
}

#[test]
fn test_bam_without_index_fails_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("case7.bam");
    write_header_only_bam(
        &path,
        "@HD\tVN:1.6\n@SQ\tSN:17\tLN:10000\n@RG\tID:rg1\tSM:case7\n",
    );

    let mut registry = SampleRegistry::new();
    let id = registry.register_bam(&path).unwrap();

    let engine = CoverageEngine::new(fixture_catalog(), registry);
    assert!(engine.coverage_matrix("NM_000546", &[id]).is_err());
}
