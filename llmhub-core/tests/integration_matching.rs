//! End-to-end tests: raw catalog JSON through matching, series sync, and ranking.

use pretty_assertions::assert_eq;
use serde_json::json;

use llmhub_core::config::load_config;
use llmhub_core::matcher::{Confidence, MatchReason, Matcher};
use llmhub_core::ranking::{RankingPayload, Weights, rank_payload};
use llmhub_core::record::{NormalizedRecord, RawRecord, parse_records};
use llmhub_core::series::{
    Modality, ResolutionKind, SeriesRecord, SeriesRegistry, canonical_series, make_slug,
    plan_series_sync,
};
use llmhub_core::core_key;

fn prepared(records: Vec<RawRecord>) -> Vec<NormalizedRecord> {
    Matcher::default().prepare(records)
}

#[test]
fn test_gpt4o_across_two_catalogs() {
    let left = parse_records(
        "artificial_analysis",
        &json!([{ "slug": "gpt-4o-2024-08-06", "name": "GPT-4o", "intelligence_index": 29.5 }]),
    );
    let right = parse_records(
        "openrouter",
        &json!({ "data": [{ "id": "openai/gpt-4o", "name": "OpenAI: GPT-4o", "pricing": { "prompt": "0.0000025" } }] }),
    );

    let left = prepared(left);
    let right = prepared(right);
    assert!(left[0].aliases().contains("gpt4o"));
    assert!(right[0].aliases().contains("gpt4o"));
    assert_eq!(left[0].core_key(), "gpt4o");
    assert_eq!(right[0].core_key(), "gpt4o");

    let rows = Matcher::default().merge(left, right);
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert!(row.has_left && row.has_right);
    assert!(row.match_score >= 10);
    assert_eq!(row.match_confidence, Confidence::High);
    assert_eq!(row.match_reason, Some(MatchReason::CoreKeyExact));
    assert_eq!(row.merge_key, "gpt4o");

    // Metrics ride along untouched.
    let right_raw = row.right.as_ref().unwrap().raw();
    assert_eq!(right_raw.extra["pricing"]["prompt"], json!("0.0000025"));
}

#[test]
fn test_shared_core_key_is_matched_as_core_key_exact() {
    assert_eq!(core_key("Model X 3.1"), "model-x-31");
    assert_eq!(core_key("model-x-3.1-instruct"), "model-x-31");

    let left = prepared(vec![RawRecord::new("a", "", "Model X 3.1")]);
    let right = prepared(vec![
        RawRecord::new("b", "vendor/model-y-2", "Model Y 2"),
        RawRecord::new("b", "vendor/model-x-3.1-instruct", "model-x-3.1-instruct"),
    ]);

    let matcher = Matcher::default();
    assert!(matcher.score(&left[0], &right[1]).total >= 8);

    let outcome = matcher.match_records(&left, &right);
    assert_eq!(outcome.pairs.len(), 1);
    assert_eq!(outcome.pairs[0].right_index, 1);
    assert_eq!(outcome.pairs[0].reason, MatchReason::CoreKeyExact);
    assert_eq!(outcome.unmatched_right, vec![0]);
}

#[test]
fn test_core_key_ignores_release_dates() {
    assert_eq!(core_key("Model X (Jan '24)"), core_key("Model X"));
    assert_eq!(core_key("Claude 3 Opus 20240229"), core_key("Claude 3 Opus"));
}

#[test]
fn test_unmatched_records_become_singletons() {
    let left = vec![
        RawRecord::new("a", "", "Claude 3.5 Sonnet"),
        RawRecord::new("a", "", "Totally Unknown Model"),
    ];
    let right = vec![
        RawRecord::new("b", "anthropic/claude-3.5-sonnet", "Anthropic: Claude 3.5 Sonnet"),
        RawRecord::new("b", "acme/widget", "Acme: Widget"),
    ];
    let rows = Matcher::default().merge_raw(left, right);

    assert_eq!(rows.len(), 3);
    assert!(rows[0].has_left && rows[0].has_right);
    assert!(rows[1].has_left && !rows[1].has_right);
    assert!(!rows[2].has_left && rows[2].has_right);
    assert_eq!(rows[1].match_confidence, Confidence::None);
    assert_eq!(rows[2].match_reason, None);
}

#[test]
fn test_malformed_fields_degrade_instead_of_failing() {
    let records = parse_records(
        "x",
        &json!([{ "id": 42, "name": null }, "not an object", { "slug": "ok-model" }]),
    );
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "");
    assert_eq!(records[0].display_name, "");

    let rows = Matcher::default().merge_raw(records, Vec::new());
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.has_left && !r.has_right));
}

#[test]
fn test_series_canonicalization_example() {
    let name = canonical_series("Qwen3.5 235B A22B Instruct", &Modality::Llm);
    assert_eq!(name, "Qwen 3.5");
    assert_eq!(make_slug(&name), "qwen-3.5");
}

#[test]
fn test_series_sync_then_resolve() {
    let mut registry = SeriesRegistry::default();
    let records: Vec<SeriesRecord> = serde_json::from_value(json!([
        { "slug": "qwen3.5-235b", "name": "Qwen3.5 235B A22B Instruct", "modality": "llm" },
        { "slug": "qwen3.5-max", "name": "Qwen3.5 Max", "modality": "llm", "series_id": "qwen-3.5" },
        { "slug": "veo-3-fast", "name": "Veo 3 Fast", "modality": "text_to_video" },
    ]))
    .unwrap();

    let plan = plan_series_sync(&records, &registry);
    let slugs: Vec<&str> = plan.new_series.iter().map(|s| s.slug.as_str()).collect();
    assert_eq!(slugs, vec!["qwen-3.5", "text_to_video--veo-3"]);
    assert_eq!(plan.updates().count(), 2);
    assert_eq!(plan.apply(&mut registry), 2);

    let hit = registry.resolve("Qwen3.5 Plus").unwrap();
    assert_eq!(hit.slug, "qwen-3.5");
    assert_eq!(hit.kind, ResolutionKind::Exact);

    let again = registry.resolve("Qwen3.5 Plus").unwrap();
    assert_eq!(again.slug, hit.slug);
}

#[test]
fn test_ranking_payload_end_to_end() {
    let payload: RankingPayload = serde_json::from_value(json!({
        "models": [
            { "name": "fast", "scores": { "quality": 6, "cost": 8, "latency": 10, "reliability": 8, "integration_fit": 8 } },
            { "name": "smart", "scores": { "quality": 10, "cost": 4, "latency": 5, "reliability": 9, "integration_fit": 8 } }
        ]
    }))
    .unwrap();
    let ranking = rank_payload(&payload, &Weights::default(), Some(1)).unwrap();
    assert_eq!(ranking.weights, Weights::default());
    assert_eq!(ranking.ranking.len(), 1);
    assert_eq!(ranking.ranking[0].name, "fast");
    assert_eq!(ranking.ranking[0].score, 7.7);
}

#[test]
fn test_workspace_config_is_layered_over_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join(".llmhub")).unwrap();
    std::fs::write(
        dir.path().join(".llmhub").join("config.toml"),
        "[matching]\njaccard_threshold = 0.7\nleft_order = \"primary_key\"\n",
    )
    .unwrap();

    let config = load_config(Some(dir.path()), None).unwrap();
    assert_eq!(config.matching.jaccard_threshold, 0.7);
    assert_eq!(config.matching.similarity_threshold, 0.92);
    assert!(config.validate().is_ok());

    let matcher = Matcher::from_config(&config);
    assert_eq!(matcher.config().jaccard_threshold, 0.7);
}
