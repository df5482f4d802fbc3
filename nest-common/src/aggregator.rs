//! Budget aggregation
//!
//! Projects the three KPI totals for a budget allocation:
//!
//! ```text
//! total(KPI) = Σ over tiers of budget[tier] * weight(category, KPI, tier)
//! ```
//!
//! A tier without a weight contributes 0. Tier shares are percentages of the
//! total budget; with a zero total every share is 0 rather than NaN.
//! No rounding is applied here; presentation rounding is the caller's job.

use crate::model::{BudgetInputs, Kpi, Tier};
use crate::weights::{KpiWeights, TierWeights, WeightsTable};
use serde::Serialize;

/// Projected KPI totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct KpiTotals {
    pub impressions: f64,
    pub views: f64,
    pub engagement: f64,
}

impl KpiTotals {
    pub fn get(&self, kpi: Kpi) -> f64 {
        match kpi {
            Kpi::Impression => self.impressions,
            Kpi::View => self.views,
            Kpi::Engagement => self.engagement,
        }
    }
}

/// One tier's budget and its share of the total
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TierShare {
    pub tier: Tier,
    pub amount: f64,
    /// Percentage of the total budget (0-100 for non-negative inputs)
    pub percent: f64,
}

/// Full recomputation result for one category and budget allocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Simulation {
    pub category: String,
    pub total_budget: f64,
    pub totals: KpiTotals,
    /// One row per tier, in display order
    pub tiers: Vec<TierShare>,
}

/// Weighted sum of a budget against a single KPI mapping
pub fn kpi_total(inputs: &BudgetInputs, weights: &TierWeights) -> f64 {
    inputs
        .iter()
        .map(|(tier, amount)| amount * weights.get(tier))
        .sum()
}

/// All three KPI totals for a budget
pub fn kpi_totals(inputs: &BudgetInputs, weights: &KpiWeights) -> KpiTotals {
    KpiTotals {
        impressions: kpi_total(inputs, &weights.impression),
        views: kpi_total(inputs, &weights.view),
        engagement: kpi_total(inputs, &weights.engagement),
    }
}

/// Percentage share of each tier in the total budget
pub fn tier_shares(inputs: &BudgetInputs) -> Vec<TierShare> {
    let total = inputs.total();
    inputs
        .iter()
        .map(|(tier, amount)| TierShare {
            tier,
            amount,
            percent: if total > 0.0 { amount / total * 100.0 } else { 0.0 },
        })
        .collect()
}

/// Recompute everything for a category
///
/// Weight mappings are re-derived from `table` on every call, so switching
/// category can never reuse another category's weights. An unknown category
/// simply has no weights and projects zeros.
pub fn simulate(table: &WeightsTable, category: &str, inputs: &BudgetInputs) -> Simulation {
    let weights = table.kpi_weights(category);
    Simulation {
        category: category.to_string(),
        total_budget: inputs.total(),
        totals: kpi_totals(inputs, &weights),
        tiers: tier_shares(inputs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weights::WeightEntry;

    fn inputs(pairs: &[(Tier, f64)]) -> BudgetInputs {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_kpi_total_scenario() {
        let weights: TierWeights = [(Tier::Vip, 10.0), (Tier::Mega, 5.0)].into_iter().collect();
        let budget = inputs(&[(Tier::Vip, 100.0), (Tier::Mega, 200.0)]);
        assert_eq!(kpi_total(&budget, &weights), 2000.0);
    }

    #[test]
    fn test_empty_weights_project_zero() {
        let budget = inputs(&[(Tier::Vip, 100.0), (Tier::Nano, 5.0)]);
        assert_eq!(kpi_total(&budget, &TierWeights::default()), 0.0);
    }

    #[test]
    fn test_zero_budget_has_zero_shares() {
        let shares = tier_shares(&BudgetInputs::new());
        assert_eq!(shares.len(), 6);
        assert!(shares.iter().all(|s| s.percent == 0.0 && !s.percent.is_nan()));
    }

    #[test]
    fn test_shares_sum_to_hundred() {
        let budget = inputs(&[
            (Tier::Vip, 3.0),
            (Tier::Mega, 7.0),
            (Tier::Macro, 11.0),
            (Tier::Micro, 13.0),
        ]);
        let sum: f64 = tier_shares(&budget).iter().map(|s| s.percent).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_negative_inputs_pass_through() {
        let weights: TierWeights = [(Tier::Mid, 2.0)].into_iter().collect();
        let budget = inputs(&[(Tier::Mid, -10.0)]);
        assert_eq!(kpi_total(&budget, &weights), -20.0);
    }

    #[test]
    fn test_simulate_unknown_category_projects_zero() {
        let table = WeightsTable::from_entries(vec![WeightEntry::new(
            "A",
            Kpi::View,
            Tier::Vip,
            4.0,
        )]);
        let budget = inputs(&[(Tier::Vip, 10.0)]);
        let sim = simulate(&table, "B", &budget);
        assert_eq!(sim.totals, KpiTotals::default());
        assert_eq!(sim.total_budget, 10.0);
        assert_eq!(sim.tiers[0].percent, 100.0);
    }
}
