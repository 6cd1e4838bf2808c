//! Catalog records as fetched from providers, and their derived identity keys.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

use crate::alias::id_variants;
use crate::normalize::Normalizer;

/// One entry from a provider's catalog.
///
/// Name fields that are missing or not strings deserialize to `""`. A `name`
/// field stands in for an empty `display_name`. Everything else (metrics,
/// prices, context sizes) is kept verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RecordFields")]
pub struct RawRecord {
    pub source: String,
    pub id: String,
    pub slug: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_slug: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Wire form of [`RawRecord`]. Catalogs disagree on `name` vs `display_name`
/// and some send both.
#[derive(Deserialize)]
struct RecordFields {
    #[serde(default, deserialize_with = "lenient_string")]
    source: String,
    #[serde(default, deserialize_with = "lenient_string")]
    id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    slug: String,
    #[serde(default, deserialize_with = "lenient_string")]
    display_name: String,
    #[serde(default)]
    name: Option<Value>,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    canonical_slug: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<RecordFields> for RawRecord {
    fn from(fields: RecordFields) -> Self {
        let mut extra = fields.extra;
        let mut display_name = fields.display_name;
        match fields.name {
            Some(Value::String(name)) if display_name.is_empty() => display_name = name,
            Some(name) if !name.is_null() => {
                extra.insert("name".to_string(), name);
            }
            _ => {}
        }
        Self {
            source: fields.source,
            id: fields.id,
            slug: fields.slug,
            display_name,
            canonical_slug: fields.canonical_slug,
            extra,
        }
    }
}

pub(crate) fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        _ => String::new(),
    })
}

pub(crate) fn lenient_optional_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

impl RawRecord {
    pub fn new(
        source: impl Into<String>,
        id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            id: id.into(),
            display_name: display_name.into(),
            ..Default::default()
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn with_canonical_slug(mut self, canonical_slug: impl Into<String>) -> Self {
        self.canonical_slug = Some(canonical_slug.into());
        self
    }

    pub fn canonical_slug(&self) -> &str {
        self.canonical_slug.as_deref().unwrap_or("")
    }

    /// Fill empty fields from a later duplicate. The first non-empty value wins.
    fn absorb(&mut self, other: RawRecord) {
        for (mine, theirs) in [
            (&mut self.source, other.source),
            (&mut self.id, other.id),
            (&mut self.slug, other.slug),
            (&mut self.display_name, other.display_name),
        ] {
            if mine.is_empty() && !theirs.is_empty() {
                *mine = theirs;
            }
        }
        if self.canonical_slug().is_empty()
            && other.canonical_slug.as_deref().is_some_and(|s| !s.is_empty())
        {
            self.canonical_slug = other.canonical_slug;
        }
        for (key, value) in other.extra {
            let missing = self.extra.get(&key).is_none_or(Value::is_null);
            if missing && !value.is_null() {
                self.extra.insert(key, value);
            }
        }
    }
}

/// A record with its derived keys. Built only through [`NormalizedRecord::from_raw`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    raw: RawRecord,
    primary_key: String,
    core_key: String,
    aliases: BTreeSet<String>,
}

impl NormalizedRecord {
    pub fn from_raw(raw: RawRecord, normalizer: &Normalizer) -> Self {
        let primary_key = primary_key(&raw, normalizer);
        let core_key = [
            raw.display_name.as_str(),
            raw.canonical_slug(),
            raw.slug.as_str(),
            raw.id.as_str(),
        ]
        .into_iter()
        .map(|field| normalizer.core_key(field))
        .find(|key| !key.is_empty())
        .unwrap_or_default();

        let mut aliases =
            normalizer.build_aliases(&raw.slug, &raw.display_name, raw.canonical_slug());
        for variant in id_variants(&raw.id) {
            normalizer.extend_aliases(&mut aliases, variant);
        }

        Self {
            raw,
            primary_key,
            core_key,
            aliases,
        }
    }

    pub fn raw(&self) -> &RawRecord {
        &self.raw
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn core_key(&self) -> &str {
        &self.core_key
    }

    pub fn aliases(&self) -> &BTreeSet<String> {
        &self.aliases
    }

    pub fn into_raw(self) -> RawRecord {
        self.raw
    }
}

/// Best single normalized identity: canonical slug, then slug, display name, id.
pub fn primary_key(raw: &RawRecord, normalizer: &Normalizer) -> String {
    [
        raw.canonical_slug(),
        raw.slug.as_str(),
        raw.display_name.as_str(),
        raw.id.as_str(),
    ]
    .into_iter()
    .map(|field| normalizer.normalize(field))
    .find(|key| !key.is_empty())
    .unwrap_or_default()
}

/// Parse a provider payload: a bare array of objects or a `{"data": [...]}` envelope.
///
/// Entries that are not objects are skipped. Records without a `source` get `source`.
pub fn parse_records(source: &str, payload: &Value) -> Vec<RawRecord> {
    let entries: &[Value] = match payload {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => {
                warn!(source, "Payload has no data array");
                &[]
            }
        },
        _ => {
            warn!(source, "Payload is neither an array nor an object");
            &[]
        }
    };

    let mut records = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        if !entry.is_object() {
            debug!(source, index, "Skipping non-object entry");
            continue;
        }
        match serde_json::from_value::<RawRecord>(entry.clone()) {
            Ok(mut record) => {
                if record.source.is_empty() {
                    record.source = source.to_string();
                }
                records.push(record);
            }
            Err(e) => warn!(source, index, error = %e, "Skipping unreadable entry"),
        }
    }
    records
}

/// Merge records that share a primary key, keeping first-seen order.
///
/// Records whose primary key is empty are never merged.
pub fn collapse_duplicates(records: Vec<RawRecord>, normalizer: &Normalizer) -> Vec<RawRecord> {
    let before = records.len();
    let mut merged: Vec<RawRecord> = Vec::with_capacity(before);
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for record in records {
        let key = primary_key(&record, normalizer);
        if key.is_empty() {
            merged.push(record);
            continue;
        }
        match by_key.get(&key) {
            Some(&slot) => merged[slot].absorb(record),
            None => {
                by_key.insert(key, merged.len());
                merged.push(record);
            }
        }
    }

    if merged.len() < before {
        debug!(before, after = merged.len(), "Collapsed duplicate records");
    }
    merged
}
