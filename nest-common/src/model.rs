//! Budget planning domain types
//!
//! Influencer tiers, KPI kinds and the per-tier budget inputs a user edits.
//! Both `Tier` and `Kpi` are closed sets: they are never extended at runtime,
//! and weights rows naming anything else cannot contribute to a projection.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Audience-size bracket of an influencer
///
/// Variant order is the display order used by every page and API response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "VIP")]
    Vip,
    Mega,
    Macro,
    Mid,
    Micro,
    Nano,
}

impl Tier {
    /// All tiers, in display order
    pub const ALL: [Tier; 6] = [
        Tier::Vip,
        Tier::Mega,
        Tier::Macro,
        Tier::Mid,
        Tier::Micro,
        Tier::Nano,
    ];

    /// Name as it appears in the weights source and in form fields
    pub fn name(&self) -> &'static str {
        match self {
            Tier::Vip => "VIP",
            Tier::Mega => "Mega",
            Tier::Macro => "Macro",
            Tier::Mid => "Mid",
            Tier::Micro => "Micro",
            Tier::Nano => "Nano",
        }
    }

    /// Parse a tier from its exact (case-sensitive) name
    ///
    /// Surrounding whitespace is ignored. Returns `None` for anything outside
    /// the closed set.
    pub fn from_name(s: &str) -> Option<Self> {
        Tier::ALL.into_iter().find(|tier| tier.name() == s.trim())
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Key performance indicator projected from a budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Kpi {
    Impression,
    View,
    Engagement,
}

impl Kpi {
    /// All KPIs, in display order
    pub const ALL: [Kpi; 3] = [Kpi::Impression, Kpi::View, Kpi::Engagement];

    pub fn name(&self) -> &'static str {
        match self {
            Kpi::Impression => "Impression",
            Kpi::View => "View",
            Kpi::Engagement => "Engagement",
        }
    }

    /// Parse a KPI from its exact (case-sensitive) name
    pub fn from_name(s: &str) -> Option<Self> {
        Kpi::ALL.into_iter().find(|kpi| kpi.name() == s.trim())
    }
}

impl std::fmt::Display for Kpi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Budget amount per tier
///
/// Every tier always has an amount; a fresh value has all six zeroed.
/// Amounts are not validated here (negative values pass through to the
/// aggregator unchanged); range checks belong to the input boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetInputs {
    amounts: BTreeMap<Tier, f64>,
}

impl Default for BudgetInputs {
    fn default() -> Self {
        Self {
            amounts: Tier::ALL.into_iter().map(|tier| (tier, 0.0)).collect(),
        }
    }
}

impl BudgetInputs {
    /// All tiers zeroed
    pub fn new() -> Self {
        Self::default()
    }

    /// Budget amount for a tier
    pub fn get(&self, tier: Tier) -> f64 {
        self.amounts.get(&tier).copied().unwrap_or(0.0)
    }

    /// Replace the amount for a single tier, returning the previous amount
    pub fn set(&mut self, tier: Tier, amount: f64) -> f64 {
        self.amounts.insert(tier, amount).unwrap_or(0.0)
    }

    /// Sum over all six tiers, always recomputed
    pub fn total(&self) -> f64 {
        Tier::ALL.iter().map(|tier| self.get(*tier)).sum()
    }

    /// (tier, amount) pairs in display order
    pub fn iter(&self) -> impl Iterator<Item = (Tier, f64)> + '_ {
        Tier::ALL.into_iter().map(move |tier| (tier, self.get(tier)))
    }
}

impl FromIterator<(Tier, f64)> for BudgetInputs {
    fn from_iter<I: IntoIterator<Item = (Tier, f64)>>(iter: I) -> Self {
        let mut inputs = BudgetInputs::new();
        for (tier, amount) in iter {
            inputs.set(tier, amount);
        }
        inputs
    }
}
