//! Integration tests for weights parsing + budget aggregation
//!
//! Exercises the full path from CSV text to a `Simulation`, the way the
//! service drives it on every page render.

use nest_common::{simulate, BudgetInputs, Kpi, Tier, WeightsTable};

const WEIGHTS_CSV: &str = "\
Category,KPI,Tier,Weights
CatA,Impression,VIP,10
CatA,Impression,Mega,5
CatA,View,VIP,4
CatA,View,Mega,2
CatA,Engagement,VIP,0.5
CatA,Engagement,Mega,0.25
CatA,Engagement,Macro,0.1
CatB,Impression,VIP,20
CatB,Impression,Mega,5
CatB,View,VIP,4
CatB,View,Mega,2
";

fn table() -> WeightsTable {
    WeightsTable::from_csv_str(WEIGHTS_CSV).expect("fixture parses")
}

fn budget(pairs: &[(Tier, f64)]) -> BudgetInputs {
    pairs.iter().copied().collect()
}

#[test]
fn test_scenario_impressions_2000() {
    let inputs = budget(&[(Tier::Vip, 100.0), (Tier::Mega, 200.0)]);
    let sim = simulate(&table(), "CatA", &inputs);

    assert_eq!(sim.totals.impressions, 2000.0);
    assert_eq!(sim.totals.views, 100.0 * 4.0 + 200.0 * 2.0);
    assert_eq!(sim.totals.get(Kpi::Impression), 2000.0);
    assert_eq!(sim.total_budget, 300.0);
}

#[test]
fn test_all_zero_inputs() {
    let sim = simulate(&table(), "CatA", &BudgetInputs::new());

    assert_eq!(sim.total_budget, 0.0);
    assert_eq!(sim.totals.impressions, 0.0);
    assert_eq!(sim.totals.views, 0.0);
    assert_eq!(sim.totals.engagement, 0.0);
    assert_eq!(sim.tiers.len(), 6);
    for share in &sim.tiers {
        assert_eq!(share.percent, 0.0);
    }
}

#[test]
fn test_missing_nano_engagement_weight_contributes_zero() {
    let with_nano = budget(&[(Tier::Vip, 10.0), (Tier::Macro, 10.0), (Tier::Nano, 1000.0)]);
    let without_nano = budget(&[(Tier::Vip, 10.0), (Tier::Macro, 10.0)]);

    let a = simulate(&table(), "CatA", &with_nano);
    let b = simulate(&table(), "CatA", &without_nano);

    assert_eq!(a.totals.engagement, b.totals.engagement);
    assert!((a.totals.engagement - (10.0 * 0.5 + 10.0 * 0.1)).abs() < 1e-12);
}

#[test]
fn test_empty_mapping_total_is_zero() {
    let inputs = budget(&[(Tier::Vip, 100.0), (Tier::Mega, 100.0), (Tier::Nano, 100.0)]);
    let sim = simulate(&table(), "CatB", &inputs);
    assert_eq!(sim.totals.engagement, 0.0);
}

#[test]
fn test_category_switch_changes_totals() {
    let inputs = budget(&[(Tier::Vip, 100.0), (Tier::Mega, 200.0)]);
    let a = simulate(&table(), "CatA", &inputs);
    let b = simulate(&table(), "CatB", &inputs);

    assert_ne!(a.totals.impressions, b.totals.impressions);
    assert_eq!(b.totals.impressions, 100.0 * 20.0 + 200.0 * 5.0);
    // Identical View mappings give identical View totals
    assert_eq!(a.totals.views, b.totals.views);
    assert_eq!(b.category, "CatB");
}

#[test]
fn test_shares_sum_to_hundred_for_positive_budget() {
    let inputs = budget(&[
        (Tier::Vip, 1.0),
        (Tier::Mega, 2.0),
        (Tier::Macro, 3.0),
        (Tier::Mid, 4.0),
        (Tier::Micro, 5.0),
        (Tier::Nano, 6.0),
    ]);
    let sim = simulate(&table(), "CatA", &inputs);
    let sum: f64 = sim.tiers.iter().map(|s| s.percent).sum();
    assert!((sum - 100.0).abs() < 1e-9);
    assert!((sim.tiers[5].percent - 6.0 / 21.0 * 100.0).abs() < 1e-9);
}
