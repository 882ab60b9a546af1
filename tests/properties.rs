use exoncov::*;
use proptest::prelude::*;

fn exon_set() -> impl Strategy<Value = Vec<Exon>> {
    // (gap, length) pairs laid out left to right give sorted, disjoint exons
    proptest::collection::vec((1u64..500, 1u64..200), 1..8).prop_map(|segments| {
        let mut exons = Vec::with_capacity(segments.len());
        let mut cursor = 0u64;
        for (gap, len) in segments {
            let begin = cursor + gap;
            exons.push(Exon::new(begin, begin + len));
            cursor = begin + len;
        }
        exons
    })
}

fn noncoding_transcript(exons: &[Exon], strand: Strand) -> Transcript {
    let tx_begin = exons.first().map(|exon| exon.begin).unwrap_or(0);
    let tx_end = exons.last().map(|exon| exon.end).unwrap_or(0);
    Transcript {
        gene_symbol: "GENE".to_string(),
        accession: "NM_TEST".to_string(),
        chrom: "1".to_string(),
        strand,
        tx_begin,
        tx_end,
        cds_begin: tx_begin,
        cds_end: tx_begin,
        exons: exons.to_vec(),
    }
}

proptest! {
    #[test]
    fn positions_ascend_without_duplicates(exons in exon_set(), padding in 0u32..100) {
        let intervals = ExonIntervals::new(&exons);
        let positions = intervals.positions(padding);

        prop_assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        prop_assert!(positions.len() as u64 >= intervals.base_count());

        let merged_total: u64 = intervals
            .merged_windows(padding)
            .iter()
            .map(|(begin, end)| end - begin)
            .sum();
        prop_assert_eq!(positions.len() as u64, merged_total);
    }

    #[test]
    fn projection_ranks_every_position(exons in exon_set(), padding in 0u32..100) {
        let positions = ExonIntervals::new(&exons).positions(padding);
        let projection = Projection::from_positions(&positions);

        prop_assert_eq!(projection.len() as usize, positions.len());
        for (rank, &pos) in positions.iter().enumerate() {
            prop_assert_eq!(projection.project(pos), Some(rank as u32));
        }
    }

    #[test]
    fn jumps_mark_every_discontinuity(exons in exon_set(), padding in 0u32..100) {
        let positions = ExonIntervals::new(&exons).positions(padding);
        let projection = Projection::from_positions(&positions);

        let expected: Vec<u32> = positions
            .windows(2)
            .enumerate()
            .filter(|(_, pair)| pair[1] != pair[0] + 1)
            .map(|(i, _)| i as u32 + 1)
            .collect();
        prop_assert_eq!(projection.jump_positions(), expected.as_slice());
    }

    #[test]
    fn exon_bounds_project_half_open(exons in exon_set()) {
        let positions = ExonIntervals::new(&exons).positions(0);
        let projection = Projection::from_positions(&positions);

        let mut covered = 0u32;
        for exon in &exons {
            let begin = projection.project(exon.begin).unwrap();
            let end = projection.project_end(exon.end).unwrap();
            prop_assert_eq!(begin, covered);
            prop_assert_eq!(u64::from(end - begin), exon.len());
            covered = end;
        }
        prop_assert_eq!(covered, projection.len());
    }

    #[test]
    fn synthetic_extraction_is_deterministic_and_bounded(
        exons in exon_set(),
        padding in 0u32..100,
        reverse in any::<bool>(),
    ) {
        let strand = if reverse { Strand::Reverse } else { Strand::Forward };
        let tx = noncoding_transcript(&exons, strand);

        let mut source = SyntheticDepthSource::for_transcript(&tx, padding);
        let first = extract_coverage(&mut source, "s", &tx, padding).unwrap();
        let mut source = SyntheticDepthSource::for_transcript(&tx, padding);
        let second = extract_coverage(&mut source, "s", &tx, padding).unwrap();
        prop_assert_eq!(&first.rows, &second.rows);

        let window_total: u64 = ExonIntervals::new(&exons)
            .windows(padding)
            .iter()
            .map(|window| window.len())
            .sum();
        prop_assert_eq!(first.rows.len() as u64, window_total);

        // the ramp never reaches the cap and never descends along the axis
        prop_assert!(first.rows.iter().all(|row| row.depth < SYNTHETIC_MAX_DEPTH));
        prop_assert!(first
            .rows
            .windows(2)
            .all(|pair| pair[0].depth <= pair[1].depth));
    }
}
