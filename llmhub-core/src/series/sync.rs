//! Series sync planning: which series to create and which records to re-point.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::registry::{SeriesName, SeriesRegistry};
use super::Modality;
use crate::record::{lenient_optional_string, lenient_string};

/// A catalog record to place in a series.
///
/// Fields that are missing or not strings deserialize to empty values, and the
/// catalog spellings `slug`, `name` and `series_id` are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SeriesRecordFields")]
pub struct SeriesRecord {
    pub record_key: String,
    pub display_name: String,
    pub modality: Modality,
    /// The series the record currently points at, if any.
    pub current_series_id: Option<String>,
}

#[derive(Deserialize)]
struct SeriesRecordFields {
    #[serde(default, deserialize_with = "lenient_string")]
    record_key: String,
    #[serde(default, deserialize_with = "lenient_string")]
    slug: String,
    #[serde(default, deserialize_with = "lenient_string")]
    display_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    modality: String,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    current_series_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    series_id: Option<String>,
}

impl From<SeriesRecordFields> for SeriesRecord {
    fn from(fields: SeriesRecordFields) -> Self {
        let first = |a: String, b: String| if a.is_empty() { b } else { a };
        Self {
            record_key: first(fields.record_key, fields.slug),
            display_name: first(fields.display_name, fields.name),
            modality: Modality::from(fields.modality),
            current_series_id: fields
                .current_series_id
                .filter(|id| !id.is_empty())
                .or(fields.series_id),
        }
    }
}

/// Where one record belongs. Series ids are slugs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesAssignment {
    pub record_key: String,
    pub modality: Modality,
    pub series_name: String,
    pub series_slug: String,
    pub current_series_id: Option<String>,
    pub needs_update: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncPlan {
    /// Series missing from the registry, one per slug, ascending by slug.
    pub new_series: Vec<SeriesName>,
    /// One entry per record with a usable series, in input order.
    pub assignments: Vec<SeriesAssignment>,
}

impl SyncPlan {
    /// Assignments whose record must be re-pointed.
    pub fn updates(&self) -> impl Iterator<Item = &SeriesAssignment> {
        self.assignments.iter().filter(|a| a.needs_update)
    }

    /// Insert the planned series. Slugs already present are left untouched.
    pub fn apply(&self, registry: &mut SeriesRegistry) -> usize {
        let inserted = self
            .new_series
            .iter()
            .filter(|series| registry.insert((*series).clone()))
            .count();
        info!(planned = self.new_series.len(), inserted, "Applied series sync plan");
        inserted
    }
}

/// Derive each record's series and collect the series the registry lacks.
///
/// Records whose name canonicalizes to nothing are skipped.
pub fn plan_series_sync(records: &[SeriesRecord], registry: &SeriesRegistry) -> SyncPlan {
    let canonicalizer = registry.canonicalizer();
    let mut missing: BTreeMap<String, SeriesName> = BTreeMap::new();
    let mut assignments = Vec::with_capacity(records.len());

    for record in records {
        let Some(series) = canonicalizer.series_for(&record.display_name, &record.modality)
        else {
            debug!(
                record = %record.record_key,
                name = %record.display_name,
                "No series for record"
            );
            continue;
        };
        let needs_update = record.current_series_id.as_deref() != Some(series.slug.as_str());
        assignments.push(SeriesAssignment {
            record_key: record.record_key.clone(),
            modality: record.modality.clone(),
            series_name: series.display_name.clone(),
            series_slug: series.slug.clone(),
            current_series_id: record.current_series_id.clone(),
            needs_update,
        });
        if !registry.contains(&series.slug) {
            missing.entry(series.slug.clone()).or_insert(series);
        }
    }

    let plan = SyncPlan {
        new_series: missing.into_values().collect(),
        assignments,
    };
    info!(
        records = records.len(),
        assigned = plan.assignments.len(),
        new_series = plan.new_series.len(),
        updates = plan.updates().count(),
        "Planned series sync"
    );
    plan
}
