use crate::model::Link;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a missing or non-numeric main link attribute is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericPolicy {
    /// Count the link and add 0 to the sum.
    #[default]
    Zero,
    /// Leave the link out of its pair.
    Skip,
}

/// (source identity, target identity)
pub type PairKey = (String, String);

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PairStats {
    pub total: usize,
    pub sum: f64,
    pub mean: f64,
}

/// One aggregated pair, flattened for payloads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairEntry<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub total: usize,
    pub mean: f64,
}

/// Link counts and mean main attribute per (source, target) pair.
/// Pairs without links are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairAggregate {
    pairs: BTreeMap<PairKey, PairStats>,
    min_mean: Option<f64>,
    max_mean: Option<f64>,
    max_total: usize,
    skipped: usize,
}

impl PairAggregate {
    pub fn get(&self, source: &str, target: &str) -> Option<&PairStats> {
        self.pairs.get(&(source.to_string(), target.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PairKey, &PairStats)> {
        self.pairs.iter()
    }

    pub fn entries(&self) -> impl Iterator<Item = PairEntry<'_>> {
        self.pairs.iter().map(|((source, target), stats)| PairEntry {
            source,
            target,
            total: stats.total,
            mean: stats.mean,
        })
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Smallest mean across all pairs.
    pub fn min_mean(&self) -> Option<f64> {
        self.min_mean
    }

    /// Largest mean across all pairs.
    pub fn max_mean(&self) -> Option<f64> {
        self.max_mean
    }

    /// Largest link count of any pair.
    pub fn max_total(&self) -> usize {
        self.max_total
    }

    /// Links left out under [`NumericPolicy::Skip`].
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Number of links counted across all pairs.
    pub fn link_count(&self) -> usize {
        self.pairs.values().map(|s| s.total).sum()
    }
}

/// Read a raw cell as a finite number.
pub fn coerce_numeric(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

pub fn aggregate(links: &[Link], main_attribute: &str, policy: NumericPolicy) -> PairAggregate {
    let mut result = PairAggregate::default();

    for link in links {
        let value = match (coerce_numeric(link.attribute(main_attribute)), policy) {
            (Some(v), _) => v,
            (None, NumericPolicy::Zero) => 0.0,
            (None, NumericPolicy::Skip) => {
                result.skipped += 1;
                continue;
            }
        };

        let stats = result
            .pairs
            .entry((link.source.clone(), link.target.clone()))
            .or_default();
        stats.total += 1;
        stats.sum += value;
    }

    for stats in result.pairs.values_mut() {
        stats.mean = stats.sum / stats.total as f64;

        result.max_total = result.max_total.max(stats.total);
        result.min_mean = Some(result.min_mean.map_or(stats.mean, |m| m.min(stats.mean)));
        result.max_mean = Some(result.max_mean.map_or(stats.mean, |m| m.max(stats.mean)));
    }

    if result.skipped > 0 {
        tracing::debug!(
            skipped = result.skipped,
            attribute = main_attribute,
            "links without a numeric value left out of aggregation"
        );
    }

    result
}
