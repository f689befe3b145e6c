//! Value-preference list resolution
//!
//! Normalizes the baseline "matched stable values" list and the moral value
//! reorder list into lower-cased identifier sets used for alignment checks.

use serde_json::Value;
use tracing::debug;

/// Ordered list of lower-cased value identifiers, queried as a set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueSet {
    values: Vec<String>,
}

impl ValueSet {
    /// Build a set from already-resolved identifiers, lower-casing each
    pub fn from_identifiers<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            values: identifiers
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Case-insensitive membership test
    pub fn contains(&self, identifier: &str) -> bool {
        let needle = identifier.to_lowercase();
        self.values.iter().any(|v| *v == needle)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.values
    }
}

/// Where the moral value reorder set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderSource {
    /// Parsed from the reorder payload
    Parsed,
    /// Payload absent; baseline reused
    AbsentFallback,
    /// Payload present but unparseable; baseline reused
    MalformedFallback,
}

/// Both reference sets, ready for alignment checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValues {
    pub matched_stable: ValueSet,
    pub moral_reorder: ValueSet,
    pub reorder_source: ReorderSource,
}

/// Resolver for the two value-preference lists
pub struct ValueListResolver;

impl ValueListResolver {
    /// Resolve the baseline entries and the reorder payload.
    ///
    /// The reorder set falls back to the resolved baseline set when the payload
    /// is absent or cannot be read as a list.
    pub fn resolve(baseline: &[Value], reorder_payload: Option<&Value>) -> ResolvedValues {
        let matched_stable = resolve_baseline(baseline);

        let (moral_reorder, reorder_source) = match reorder_payload {
            None | Some(Value::Null) => (matched_stable.clone(), ReorderSource::AbsentFallback),
            Some(payload) => match parse_reorder_payload(payload) {
                Some(entries) => (
                    ValueSet::from_identifiers(entries.iter().map(reorder_identifier)),
                    ReorderSource::Parsed,
                ),
                None => {
                    debug!("moral value reorder list is malformed, falling back to baseline");
                    (matched_stable.clone(), ReorderSource::MalformedFallback)
                }
            },
        };

        ResolvedValues {
            matched_stable,
            moral_reorder,
            reorder_source,
        }
    }
}

/// Baseline entries resolve via `name`, else the raw value
fn resolve_baseline(entries: &[Value]) -> ValueSet {
    ValueSet::from_identifiers(entries.iter().map(baseline_identifier))
}

fn baseline_identifier(entry: &Value) -> String {
    match entry.get("name") {
        Some(name) => raw_identifier(name),
        None => raw_identifier(entry),
    }
}

/// Reorder entries resolve via `id`, then `name`, then the raw value
fn reorder_identifier(entry: &Value) -> String {
    match entry.get("id").or_else(|| entry.get("name")) {
        Some(field) => raw_identifier(field),
        None => raw_identifier(entry),
    }
}

fn raw_identifier(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Read the reorder payload as a list of entries.
///
/// The payload is normally a string holding a JSON array; an inline array is
/// accepted as-is. Anything else is malformed.
fn parse_reorder_payload(payload: &Value) -> Option<Vec<Value>> {
    match payload {
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Array(entries)) => Some(entries),
            _ => None,
        },
        Value::Array(entries) => Some(entries.clone()),
        _ => None,
    }
}
