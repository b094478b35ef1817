//! Cached artifact pages and their distribution summaries.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::debug;

/// Label → count summary of one distribution.
pub type LabelCounts = BTreeMap<String, u64>;

/// Distribution summaries keyed by kind.
pub type DistributionMap = BTreeMap<DistributionKind, LabelCounts>;

/// The statistical summaries attached to a cache page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionKind {
    /// Segment counts per label.
    Segments,
    /// Feature vector counts per label.
    FeatureVectors,
    /// Sample counts per label.
    Samples,
}

impl DistributionKind {
    /// All kinds, in display order.
    pub const ALL: [Self; 3] = [Self::Segments, Self::FeatureVectors, Self::Samples];

    /// The cache page field holding this distribution.
    fn field(self) -> &'static str {
        match self {
            Self::Segments => "distribution_segments",
            Self::FeatureVectors => "distribution_feature_vectors",
            Self::Samples => "distribution_samples",
        }
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Segments => write!(f, "segments"),
            Self::FeatureVectors => write!(f, "feature_vectors"),
            Self::Samples => write!(f, "samples"),
        }
    }
}

/// One stored result page for a step output (e.g. one cross-validation fold).
///
/// Decoding never fails: a missing or mistyped distribution is empty and
/// counts that are not non-negative integers are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct CacheEntry {
    /// The stored artifact file name.
    pub filename: String,
    /// Segment counts per label.
    pub distribution_segments: LabelCounts,
    /// Feature vector counts per label.
    pub distribution_feature_vectors: LabelCounts,
    /// Sample counts per label.
    pub distribution_samples: LabelCounts,
}

impl CacheEntry {
    /// Creates an entry with empty distributions.
    #[must_use]
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Default::default()
        }
    }

    /// Decodes a raw cache page.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let filename = value
            .get("filename")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let mut entry = Self::new(filename);
        for kind in DistributionKind::ALL {
            *entry.distribution_mut(kind) = label_counts(value, kind);
        }
        entry
    }

    /// Sets one label count for a distribution kind.
    #[must_use]
    pub fn with_count(mut self, kind: DistributionKind, label: impl Into<String>, count: u64) -> Self {
        self.distribution_mut(kind).insert(label.into(), count);
        self
    }

    /// Returns the summary for a distribution kind.
    #[must_use]
    pub fn distribution(&self, kind: DistributionKind) -> &LabelCounts {
        match kind {
            DistributionKind::Segments => &self.distribution_segments,
            DistributionKind::FeatureVectors => &self.distribution_feature_vectors,
            DistributionKind::Samples => &self.distribution_samples,
        }
    }

    fn distribution_mut(&mut self, kind: DistributionKind) -> &mut LabelCounts {
        match kind {
            DistributionKind::Segments => &mut self.distribution_segments,
            DistributionKind::FeatureVectors => &mut self.distribution_feature_vectors,
            DistributionKind::Samples => &mut self.distribution_samples,
        }
    }
}

fn label_counts(page: &Value, kind: DistributionKind) -> LabelCounts {
    let field = kind.field();
    match page.get(field) {
        None | Some(Value::Null) => LabelCounts::new(),
        Some(Value::Object(counts)) => counts
            .iter()
            .filter_map(|(label, count)| match count.as_u64() {
                Some(count) => Some((label.clone(), count)),
                None => {
                    debug!(field, label = %label, count = %count, "dropping invalid label count");
                    None
                }
            })
            .collect(),
        Some(other) => {
            debug!(field, value = %other, "ignoring malformed distribution");
            LabelCounts::new()
        }
    }
}

impl From<Value> for CacheEntry {
    fn from(value: Value) -> Self {
        Self::from_json(&value)
    }
}

/// Cache pages keyed by output name.
///
/// Decodes tolerantly: outputs whose pages are not an array have no pages and
/// pages that are not objects are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CacheStore {
    outputs: HashMap<String, Vec<CacheEntry>>,
}

impl CacheStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a raw store. Anything other than a JSON object is empty.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let Some(outputs) = value.as_object() else {
            debug!("cache store is not an object; treating as empty");
            return Self::default();
        };

        let outputs = outputs
            .iter()
            .map(|(output, pages)| {
                let pages = match pages.as_array() {
                    Some(pages) => pages
                        .iter()
                        .filter(|page| {
                            let keep = page.is_object();
                            if !keep {
                                debug!(output = %output, "skipping malformed cache page");
                            }
                            keep
                        })
                        .map(CacheEntry::from_json)
                        .collect(),
                    None => {
                        debug!(output = %output, "cache pages are not an array");
                        Vec::new()
                    }
                };
                (output.clone(), pages)
            })
            .collect();

        Self { outputs }
    }

    /// Sets the pages for an output.
    #[must_use]
    pub fn with_pages(mut self, output: impl Into<String>, pages: Vec<CacheEntry>) -> Self {
        self.outputs.insert(output.into(), pages);
        self
    }

    /// Returns the pages stored for an output, or an empty slice.
    #[must_use]
    pub fn pages(&self, output: &str) -> &[CacheEntry] {
        self.outputs.get(output).map_or(&[], Vec::as_slice)
    }

    /// Returns the number of outputs with stored pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl<'de> Deserialize<'de> for CacheStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|value| Self::from_json(&value))
    }
}
