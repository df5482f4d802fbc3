//! Weights table: (Category, KPI, Tier) -> weight
//!
//! The table is parsed from a CSV export whose header names the columns
//! `Category`, `KPI`, `Tier` and `Weights` (case-sensitive; extra columns
//! are ignored). Once built it is immutable and shared behind an `Arc` by
//! the service layer.
//!
//! Lookups never fail: a (Category, KPI) pair with no rows yields an empty
//! `TierWeights`, and any tier missing from a `TierWeights` weighs 0.

use crate::model::{Kpi, Tier};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use tracing::{debug, warn};

/// Column names required in the header row
pub const REQUIRED_COLUMNS: [&str; 4] = ["Category", "KPI", "Tier", "Weights"];

/// One row of the weights source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightEntry {
    pub category: String,
    pub kpi: Kpi,
    pub tier: Tier,
    pub weight: f64,
}

impl WeightEntry {
    pub fn new(category: impl Into<String>, kpi: Kpi, tier: Tier, weight: f64) -> Self {
        Self {
            category: category.into(),
            kpi,
            tier,
            weight,
        }
    }
}

/// Raw CSV row, deserialized by header name
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "KPI")]
    kpi: String,
    #[serde(rename = "Tier")]
    tier: String,
    #[serde(rename = "Weights")]
    weights: String,
}

/// Weight per tier for a single (Category, KPI) pair
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TierWeights(BTreeMap<Tier, f64>);

impl TierWeights {
    /// Weight for a tier, 0 when the tier has no entry
    pub fn get(&self, tier: Tier) -> f64 {
        self.0.get(&tier).copied().unwrap_or(0.0)
    }

    /// Whether the tier has an explicit entry
    pub fn contains(&self, tier: Tier) -> bool {
        self.0.contains_key(&tier)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tier, f64)> + '_ {
        self.0.iter().map(|(tier, weight)| (*tier, *weight))
    }
}

impl FromIterator<(Tier, f64)> for TierWeights {
    /// Later pairs overwrite earlier ones for the same tier
    fn from_iter<I: IntoIterator<Item = (Tier, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The three per-KPI weight mappings for one category
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KpiWeights {
    pub impression: TierWeights,
    pub view: TierWeights,
    pub engagement: TierWeights,
}

impl KpiWeights {
    pub fn for_kpi(&self, kpi: Kpi) -> &TierWeights {
        match kpi {
            Kpi::Impression => &self.impression,
            Kpi::View => &self.view,
            Kpi::Engagement => &self.engagement,
        }
    }
}

/// Parsed weights table
#[derive(Debug, Clone, Default)]
pub struct WeightsTable {
    entries: Vec<WeightEntry>,
    /// Distinct categories, sorted ascending
    categories: Vec<String>,
}

impl WeightsTable {
    /// Build a table from already-typed entries
    ///
    /// Categories are derived from the entries.
    pub fn from_entries(entries: Vec<WeightEntry>) -> Self {
        let categories: BTreeSet<String> = entries.iter().map(|e| e.category.clone()).collect();
        Self {
            entries,
            categories: categories.into_iter().collect(),
        }
    }

    /// Parse CSV text
    pub fn from_csv_str(text: &str) -> Result<Self> {
        Self::from_reader(text.as_bytes())
    }

    /// Parse a CSV stream
    ///
    /// # Errors
    /// `Error::DataSource` when the header lacks a required column, a
    /// `Weights` cell on a known (KPI, Tier) row is not a finite,
    /// non-negative number, the CSV itself is malformed,
    /// or the source holds no usable rows.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| Error::DataSource(format!("Failed to read header row: {}", e)))?
            .clone();

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| !headers.iter().any(|h| h == *column))
            .collect();
        if !missing.is_empty() {
            return Err(Error::DataSource(format!(
                "Weights source is missing column(s): {}",
                missing.join(", ")
            )));
        }

        let mut entries = Vec::new();
        let mut categories = BTreeSet::new();
        let mut skipped = 0usize;

        for record in csv_reader.deserialize::<CsvRow>() {
            let row = record.map_err(|e| Error::DataSource(format!("Malformed CSV row: {}", e)))?;

            if row.category.is_empty() {
                skipped += 1;
                continue;
            }
            categories.insert(row.category.clone());

            // Empty weight cell: no entry, so the tier weighs 0
            if row.weights.is_empty() {
                skipped += 1;
                continue;
            }

            let (kpi, tier) = match (Kpi::from_name(&row.kpi), Tier::from_name(&row.tier)) {
                (Some(kpi), Some(tier)) => (kpi, tier),
                _ => {
                    debug!(kpi = %row.kpi, tier = %row.tier, "Skipping row with unknown KPI or tier");
                    skipped += 1;
                    continue;
                }
            };

            let weight: f64 = row.weights.parse().map_err(|_| {
                Error::DataSource(format!(
                    "Weight '{}' for ({}, {}, {}) is not a number",
                    row.weights, row.category, kpi, tier
                ))
            })?;
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::DataSource(format!(
                    "Weight '{}' for ({}, {}, {}) is not a finite, non-negative number",
                    row.weights, row.category, kpi, tier
                )));
            }

            entries.push(WeightEntry::new(row.category, kpi, tier, weight));
        }

        if categories.is_empty() {
            return Err(Error::DataSource(
                "Weights source contains no rows".to_string(),
            ));
        }

        if skipped > 0 {
            warn!(skipped, "Weights source rows ignored (empty category/weight or unknown KPI/tier)");
        }

        Ok(Self {
            entries,
            categories: categories.into_iter().collect(),
        })
    }

    /// All entries in source order
    pub fn entries(&self) -> &[WeightEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct categories, sorted ascending
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.binary_search_by(|c| c.as_str().cmp(category)).is_ok()
    }

    /// First category in sorted order
    pub fn default_category(&self) -> Option<&str> {
        self.categories.first().map(String::as_str)
    }

    /// Tier weights for a (Category, KPI) pair; last entry per tier wins
    pub fn weights_for(&self, category: &str, kpi: Kpi) -> TierWeights {
        self.entries
            .iter()
            .filter(|e| e.category == category && e.kpi == kpi)
            .map(|e| (e.tier, e.weight))
            .collect()
    }

    /// All three KPI mappings for a category, derived fresh from the table
    pub fn kpi_weights(&self, category: &str) -> KpiWeights {
        KpiWeights {
            impression: self.weights_for(category, Kpi::Impression),
            view: self.weights_for(category, Kpi::View),
            engagement: self.weights_for(category, Kpi::Engagement),
        }
    }
}
