//! End-to-end pipeline properties: offset round-trips across chunk
//! boundaries, idempotent re-runs, and cascade precedence observed
//! through the full chunk -> recognize -> resolve -> assemble path.

use std::sync::Arc;

use histmap_core::{AppConfig, DocumentInput, MatchStrategy};
use histmap_extract::{DocumentOutcome, ExtractionPipeline};
use histmap_gazetteer::{GazetteerBuilder, GazetteerIndex, RawPlace, SourceTag};

fn place(name: &str, aliases: &[&str]) -> RawPlace {
    RawPlace {
        name: name.to_string(),
        aliases: aliases.iter().map(|s| s.to_string()).collect(),
        latitude: Some(50.0),
        longitude: Some(6.0),
        country_code: Some("DE".to_string()),
        population: None,
        source: SourceTag::Cities,
    }
}

fn sample_index() -> Arc<GazetteerIndex> {
    Arc::new(
        GazetteerBuilder::new()
            .add_source(vec![
                place("Aachen", &[]),
                place("Aix-la-Chapelle", &["Aix", "Aquisgranum"]),
                place("Regensburg", &["Ratisbon"]),
                place("Rome", &["Roma"]),
                place("Verona", &[]),
                place("Mainz", &["Mayence"]),
            ])
            .build()
            .unwrap(),
    )
}

fn pipeline_with_chunk_bytes(max_chunk_bytes: usize) -> ExtractionPipeline {
    let mut config = AppConfig::default();
    config.chunker.max_chunk_bytes = max_chunk_bytes;
    ExtractionPipeline::new(&config, sample_index()).unwrap()
}

fn process(pipeline: &ExtractionPipeline, title: &str, text: &str) -> histmap_extract::DocumentReport {
    let input = DocumentInput::new(title, "http://example.org/book.txt", text);
    match pipeline.process_document(&input) {
        DocumentOutcome::Processed(report) => report,
        DocumentOutcome::Skipped { reason, .. } => panic!("unexpected skip: {reason}"),
    }
}

#[test]
fn offsets_round_trip_across_chunk_boundaries() {
    // Chunks small enough that every sentence crosses a boundary
    let pipeline = pipeline_with_chunk_bytes(32);
    let text = "First they rode to Verona under escort. Later the whole column \
                turned north again and made for Mainz before the first snows, \
                then wintered at Regensburg as planned.";

    let report = process(&pipeline, "Itinerary", text);

    assert!(report.stats.chunks > 1);
    assert_eq!(report.stats.mentions, 3);
    for mention in &report.mentions {
        let end = mention.text_position + mention.mentioned_as.len();
        assert_eq!(&text[mention.text_position..end], mention.mentioned_as);
    }
}

#[test]
fn reprocessing_is_idempotent() {
    let pipeline = pipeline_with_chunk_bytes(40);
    let text = "From Aachen to Rome and back to Aachen through Verona.";

    let first = process(&pipeline, "Travels", text);
    let second = process(&pipeline, "Travels", text);

    let essence = |report: &histmap_extract::DocumentReport| -> Vec<_> {
        report
            .mentions
            .iter()
            .map(|m| {
                (
                    m.text_position,
                    m.mentioned_as.clone(),
                    m.location_id,
                    m.match_strategy,
                    m.confidence.to_bits(),
                )
            })
            .collect()
    };
    assert_eq!(essence(&first), essence(&second));
    assert_eq!(first.stats, second.stats);
}

#[test]
fn mentions_are_ordered_by_position_within_a_document() {
    let pipeline = pipeline_with_chunk_bytes(24);
    let text = "Verona. Then Rome. Then Mainz. Then Aachen. Then Regensburg.";

    let report = process(&pipeline, "Order", text);

    let positions: Vec<usize> = report.mentions.iter().map(|m| m.text_position).collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted);
    assert_eq!(report.mentions.len(), 5);
}

#[test]
fn alias_precedence_holds_through_the_pipeline() {
    let pipeline = pipeline_with_chunk_bytes(500_000);
    let text = "The envoys assembled at Aix for the coronation.";

    let report = process(&pipeline, "Coronation", text);

    let aix = report
        .mentions
        .iter()
        .find(|m| m.mentioned_as == "Aix")
        .expect("Aix must resolve");
    assert_eq!(aix.match_strategy, MatchStrategy::Alias);
    assert_eq!(
        aix.confidence,
        AppConfig::default().resolver.alias_confidence
    );

    // It resolves to the canonical entry, de-duplicated with direct hits
    let canonical = process(&pipeline, "Direct", "He returned to Aix-la-Chapelle.");
    assert_eq!(aix.location_id, canonical.mentions[0].location_id);
}

#[test]
fn large_document_boundary_name_survives_chunking() {
    // A 1.2 MB document whose place name straddles the 500,000-byte
    // chunk bound; the boundary moves to whitespace and the name stays
    // whole in the second chunk
    let mut text = "a ".repeat(249_997);
    text.push_str("Regensburg kept the bridge. ");
    text.push_str(&"b ".repeat(349_985));
    assert!(text.len() > 1_000_000);

    let name_position = text.find("Regensburg").unwrap();
    assert!(name_position < 500_000 && name_position + 10 > 499_994);

    let pipeline = pipeline_with_chunk_bytes(500_000);
    let report = process(&pipeline, "Bridge", &text);

    assert_eq!(report.stats.chunks, 3);
    let mention = report
        .mentions
        .iter()
        .find(|m| m.mentioned_as == "Regensburg")
        .expect("straddling name must be recognized intact");
    assert_eq!(mention.text_position, name_position);
    assert_eq!(mention.match_strategy, MatchStrategy::Exact);
}

#[test]
fn registry_deduplicates_locations_across_documents() {
    let pipeline = pipeline_with_chunk_bytes(500_000);

    let first = process(&pipeline, "One", "The synod met at Mainz.");
    let second = process(&pipeline, "Two", "Mayence was the seat of the archbishop.");

    // Alias and canonical hits across documents share one Location
    assert_eq!(
        first.mentions[0].location_id,
        second.mentions[0].location_id
    );
    let registry = pipeline.registry();
    assert_eq!(
        registry
            .locations()
            .iter()
            .filter(|l| l.name == "Mainz")
            .count(),
        1
    );
}
