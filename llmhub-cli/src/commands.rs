//! CLI subcommand handlers.

use crate::Commands;
use crate::ConfigAction;
use anyhow::Context;
use llmhub_core::config::{HubConfig, SeriesConfig, load_config};
use llmhub_core::matcher::{AliasIndex, Matcher};
use llmhub_core::provider::ReasoningType;
use llmhub_core::ranking::{RankingPayload, rank_payload};
use llmhub_core::record::{NormalizedRecord, RawRecord, parse_records};
use llmhub_core::series::{
    Modality, ResolutionKind, SeriesCanonicalizer, SeriesRecord, SeriesRegistry, plan_series_sync,
};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Handle a CLI subcommand.
pub fn handle_command(command: Commands, workspace: &Path) -> anyhow::Result<()> {
    match command {
        Commands::Match {
            left,
            right,
            output,
            left_order,
        } => handle_match(&left, &right, output.as_deref(), left_order.as_deref(), workspace),
        Commands::Series { names, modality } => handle_series(&names, &modality, workspace),
        Commands::Lookup {
            catalog,
            names,
            output,
        } => handle_lookup(&catalog, &names, output.as_deref(), workspace),
        Commands::Resolve {
            registry,
            queries,
            save,
        } => handle_resolve(&registry, &queries, save, workspace),
        Commands::Sync {
            records,
            registry,
            dry_run,
        } => handle_sync(&records, &registry, dry_run, workspace),
        Commands::Rank { input, top_k } => handle_rank(&input, top_k, workspace),
        Commands::Config { action } => handle_config(action, workspace),
    }
}

fn load_hub_config(workspace: &Path) -> anyhow::Result<HubConfig> {
    let config = load_config(Some(workspace), None)
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    config.validate()?;
    Ok(config)
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Pretty JSON to `output`, or to stdout when no file is given.
fn write_json<T: Serialize + ?Sized>(output: Option<&Path>, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, json + "\n")
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Source label for records read from `path`: the file stem.
fn source_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn handle_match(
    left: &Path,
    right: &Path,
    output: Option<&Path>,
    left_order: Option<&str>,
    workspace: &Path,
) -> anyhow::Result<()> {
    let mut config = load_hub_config(workspace)?;
    if let Some(order) = left_order {
        config.matching.left_order = order.parse()?;
    }
    let matcher = Matcher::from_config(&config);

    let left_records = parse_records(&source_name(left), &read_json(left)?);
    let right_records = parse_records(&source_name(right), &read_json(right)?);
    let rows = matcher.merge_raw(left_records, right_records);

    let matched = rows.iter().filter(|r| r.has_left && r.has_right).count();
    info!(
        rows = rows.len(),
        matched,
        left_order = %config.matching.left_order,
        "Merged catalogs"
    );
    write_json(output, &rows)
}

#[derive(Debug, Serialize)]
struct SeriesRow {
    name: String,
    series: String,
    slug: Option<String>,
    provider: Option<String>,
    reasoning: ReasoningType,
    regional_provider: bool,
}

fn series_rows(names: &[String], modality: &Modality, config: &SeriesConfig) -> Vec<SeriesRow> {
    let canonicalizer = SeriesCanonicalizer::from_config(config);
    names
        .iter()
        .map(|name| {
            let series = canonicalizer.series_for(name, modality);
            let slug = series.as_ref().map(|s| s.slug.clone());
            let provider = series.and_then(|s| s.provider);
            let regional_provider = canonicalizer
                .catalog()
                .is_regional_provider(provider.as_deref().unwrap_or(name.as_str()));
            SeriesRow {
                name: name.clone(),
                series: canonicalizer.canonical_series(name, modality),
                slug,
                provider,
                reasoning: ReasoningType::infer(name),
                regional_provider,
            }
        })
        .collect()
}

fn handle_series(names: &[String], modality: &str, workspace: &Path) -> anyhow::Result<()> {
    let config = load_hub_config(workspace)?;
    let rows = series_rows(names, &Modality::from(modality), &config.series);
    write_json(None, &rows)
}

#[derive(Debug, Serialize)]
struct LookupRow {
    query: String,
    found: bool,
    record: Option<RawRecord>,
}

/// First catalog record registered under each name's primary key or aliases.
fn lookup_rows(matcher: &Matcher, names: &[String], catalog: Vec<RawRecord>) -> Vec<LookupRow> {
    let catalog = matcher.prepare(catalog);
    let index = AliasIndex::build(&catalog);
    names
        .iter()
        .map(|name| {
            let query = NormalizedRecord::from_raw(
                RawRecord::new("query", "", name.as_str()),
                matcher.normalizer(),
            );
            let record = index.lookup(&query).map(|i| catalog[i].raw().clone());
            LookupRow {
                query: name.clone(),
                found: record.is_some(),
                record,
            }
        })
        .collect()
}

fn handle_lookup(
    catalog: &Path,
    names: &[String],
    output: Option<&Path>,
    workspace: &Path,
) -> anyhow::Result<()> {
    let config = load_hub_config(workspace)?;
    let matcher = Matcher::from_config(&config);
    let records = parse_records(&source_name(catalog), &read_json(catalog)?);
    let rows = lookup_rows(&matcher, names, records);
    info!(
        queries = rows.len(),
        found = rows.iter().filter(|r| r.found).count(),
        "Looked up names in catalog"
    );
    write_json(output, &rows)
}

/// Load a registry file. A missing file is an empty registry.
fn load_registry(path: &Path, config: &SeriesConfig) -> anyhow::Result<SeriesRegistry> {
    if !path.exists() {
        info!(path = %path.display(), "Registry file not found, starting empty");
        return Ok(SeriesRegistry::new(config));
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    SeriesRegistry::from_json(config, &text)
        .with_context(|| format!("Failed to load series table from {}", path.display()))
}

fn save_registry(path: &Path, registry: &SeriesRegistry) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, registry.to_json()? + "\n")
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), series = registry.len(), "Saved series registry");
    Ok(())
}

#[derive(Debug, Serialize)]
struct ResolveRow {
    query: String,
    slug: Option<String>,
    kind: Option<ResolutionKind>,
}

fn handle_resolve(
    registry_path: &Path,
    queries: &[String],
    save: bool,
    workspace: &Path,
) -> anyhow::Result<()> {
    let config = load_hub_config(workspace)?;
    let mut registry = load_registry(registry_path, &config.series)?;

    let rows: Vec<ResolveRow> = queries
        .iter()
        .map(|query| {
            let resolution = registry.resolve(query);
            if resolution.is_none() {
                warn!(query = %query, "Query has no usable series name");
            }
            ResolveRow {
                query: query.clone(),
                slug: resolution.as_ref().map(|r| r.slug.clone()),
                kind: resolution.map(|r| r.kind),
            }
        })
        .collect();

    if save {
        save_registry(registry_path, &registry)?;
    }
    write_json(None, &rows)
}

/// Series records from a bare array or a `{"data": [...]}` envelope.
/// Entries that are not records are skipped.
fn series_records(payload: Value) -> Vec<SeriesRecord> {
    let entries = match payload {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(entries)) => entries,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(index, error = %e, "Skipping malformed series record");
                None
            }
        })
        .collect()
}

fn handle_sync(
    records_path: &Path,
    registry_path: &Path,
    dry_run: bool,
    workspace: &Path,
) -> anyhow::Result<()> {
    let config = load_hub_config(workspace)?;
    let mut registry = load_registry(registry_path, &config.series)?;
    let records = series_records(read_json(records_path)?);

    let plan = plan_series_sync(&records, &registry);
    if dry_run {
        info!("Dry run, registry left unchanged");
    } else {
        plan.apply(&mut registry);
        save_registry(registry_path, &registry)?;
    }
    write_json(None, &plan)
}

fn handle_rank(input: &Path, top_k: usize, workspace: &Path) -> anyhow::Result<()> {
    let config = load_hub_config(workspace)?;
    let payload: RankingPayload = serde_json::from_value(read_json(input)?)
        .with_context(|| format!("Invalid ranking payload in {}", input.display()))?;
    let ranking = rank_payload(&payload, &config.ranking.default_weights, Some(top_k))?;
    write_json(None, &ranking)
}

fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".llmhub").join("config.toml")
}

fn handle_config(action: ConfigAction, workspace: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = workspace_config_path(workspace);
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }
            if let Some(config_dir) = config_path.parent() {
                std::fs::create_dir_all(config_dir)?;
            }

            let toml_str = toml::to_string_pretty(&HubConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_hub_config(workspace)?;
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
            Ok(())
        }
    }
}
