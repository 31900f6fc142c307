//! Income and price shock scenarios and their aggregation.

use crate::error::{DemandError, check_positive};
use crate::household::IncomeGroup;
use crate::population::Population;
use crate::stats::{Accumulator, compute_median};
use serde::{Deserialize, Serialize};

/// Exogenous shocks applied in one scenario run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Shock {
    /// Multiplicative factor on baseline income (`1.10` is +10%).
    pub income_factor: Option<f64>,
    /// New food price.
    pub new_food_price: Option<f64>,
}

impl Shock {
    pub fn income(income_factor: f64) -> Self {
        Self {
            income_factor: Some(income_factor),
            new_food_price: None,
        }
    }

    pub fn price(new_food_price: f64) -> Self {
        Self {
            income_factor: None,
            new_food_price: Some(new_food_price),
        }
    }

    pub fn validate(&self) -> Result<(), DemandError> {
        if let Some(factor) = self.income_factor {
            check_positive("income_factor", factor)?;
        }
        if let Some(price) = self.new_food_price {
            check_positive("new_food_price", price)?;
        }
        Ok(())
    }
}

/// Scenario outcome of one household.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HouseholdOutcome {
    pub baseline_demand: f64,
    /// Income the household has during the scenario.
    pub current_income: Option<f64>,
    pub income_change_demand: Option<f64>,
    pub price_change_demand: Option<f64>,
}

impl HouseholdOutcome {
    /// Most recent shocked demand; the price branch wins when both shocks ran.
    pub fn current_food_demand(&self) -> Option<f64> {
        self.price_change_demand.or(self.income_change_demand)
    }
}

/// Market-level aggregates plus per-household outcomes, indexed like the population.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioResult {
    pub shock: Shock,
    pub aggregate_food_baseline: f64,
    pub aggregate_food_demand_income_change: f64,
    pub aggregate_food_demand_price_change: f64,
    pub outcomes: Vec<HouseholdOutcome>,
}

impl ScenarioResult {
    fn current_food_demand(&self, index: usize) -> Result<f64, DemandError> {
        self.outcomes[index]
            .current_food_demand()
            .ok_or(DemandError::MissingScenarioData {
                field: "current_food_demand",
                index,
            })
    }

    fn current_income(&self, index: usize) -> Result<f64, DemandError> {
        self.outcomes[index]
            .current_income
            .ok_or(DemandError::MissingScenarioData {
                field: "current_income",
                index,
            })
    }

    /// Shocked demand of every household, in population order.
    pub fn current_food_demands(&self) -> Result<Vec<f64>, DemandError> {
        (0..self.outcomes.len())
            .map(|index| self.current_food_demand(index))
            .collect()
    }
}

/// Apply `shock` to every household of `population`.
///
/// Baseline demand is always computed. When both shocks are given, both are
/// evaluated independently and the price branch determines the current demand.
pub fn run_scenario(population: &Population, shock: &Shock) -> Result<ScenarioResult, DemandError> {
    shock.validate()?;
    match (shock.income_factor, shock.new_food_price) {
        (None, None) => log::warn!("scenario has no shock; only baseline demand is computed"),
        (Some(_), Some(_)) => {
            log::warn!("income and price shocks in one scenario; current demand uses the price shock")
        }
        _ => {}
    }

    let mut aggregate_food_baseline = 0.0;
    let mut aggregate_food_demand_income_change = 0.0;
    let mut aggregate_food_demand_price_change = 0.0;
    let mut outcomes = Vec::with_capacity(population.len());

    for h in population.households() {
        let baseline_demand = h.baseline_quantity();
        aggregate_food_baseline += baseline_demand;

        let mut outcome = HouseholdOutcome {
            baseline_demand,
            current_income: None,
            income_change_demand: None,
            price_change_demand: None,
        };

        if let Some(factor) = shock.income_factor {
            let q_income = h.demand_under_income_change(factor)?;
            outcome.current_income = Some(h.income() * factor);
            outcome.income_change_demand = Some(q_income);
            aggregate_food_demand_income_change += q_income;
        }

        if let Some(price) = shock.new_food_price {
            let q_price = h.demand_under_price_change(price)?;
            outcome.current_income.get_or_insert(h.income());
            outcome.price_change_demand = Some(q_price);
            aggregate_food_demand_price_change += q_price;
        }

        outcomes.push(outcome);
    }

    log::info!(
        "baseline demand {aggregate_food_baseline:.3}, income-shocked demand {aggregate_food_demand_income_change:.3}, price-shocked demand {aggregate_food_demand_price_change:.3}"
    );

    Ok(ScenarioResult {
        shock: *shock,
        aggregate_food_baseline,
        aggregate_food_demand_income_change,
        aggregate_food_demand_price_change,
        outcomes,
    })
}

/// Market-level statistics of the shocked demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TableSummary {
    pub mean_demand: f64,
    pub median_demand: f64,
    pub std_demand: f64,
    pub total_demand: f64,
}

impl TableSummary {
    pub fn from_result(result: &ScenarioResult) -> Result<Self, DemandError> {
        let q_new = result.current_food_demands()?;
        let report = q_new.iter().copied().collect::<Accumulator>().report();
        Ok(Self {
            mean_demand: report.mean,
            median_demand: compute_median(&q_new),
            std_demand: report.std_dev,
            total_demand: report.sum,
        })
    }
}

/// Group means by income quartile, one entry per group in `groups` order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotData {
    pub groups: Vec<IncomeGroup>,
    pub baseline_demand: Vec<f64>,
    pub new_demand: Vec<f64>,
    pub baseline_budget_share: Vec<f64>,
    pub new_budget_share: Vec<f64>,
}

/// Summarize a finished scenario for reporting.
///
/// The new budget share of a household is
/// `reference_price * current_food_demand / current_income`; pass the baseline
/// price for income scenarios and the shocked price for price scenarios.
/// Empty groups report zero for every metric.
pub fn build_summary_and_plot_data(
    population: &Population,
    result: &ScenarioResult,
    reference_price: f64,
) -> Result<(TableSummary, PlotData), DemandError> {
    check_positive("reference_price", reference_price)?;
    if result.outcomes.len() != population.len() {
        return Err(DemandError::PopulationMismatch {
            outcomes: result.outcomes.len(),
            households: population.len(),
        });
    }

    let table_summary = TableSummary::from_result(result)?;

    let mut baseline_demand: [Accumulator; 4] = std::array::from_fn(|_| Accumulator::new());
    let mut new_demand: [Accumulator; 4] = std::array::from_fn(|_| Accumulator::new());
    let mut baseline_share: [Accumulator; 4] = std::array::from_fn(|_| Accumulator::new());
    let mut new_share: [Accumulator; 4] = std::array::from_fn(|_| Accumulator::new());

    let pairs = population.households().iter().zip(&result.outcomes);
    for (index, (h, outcome)) in pairs.enumerate() {
        let i_grp = h.income_group() as usize;
        let q_new = result.current_food_demand(index)?;
        let income = result.current_income(index)?;

        baseline_demand[i_grp].add(outcome.baseline_demand);
        new_demand[i_grp].add(q_new);
        baseline_share[i_grp].add(h.food_budget_share());
        new_share[i_grp].add(reference_price * q_new / income);
    }

    for group in IncomeGroup::ALL {
        if baseline_demand[group as usize].n_vals() == 0 {
            log::warn!("income group {group} is empty; reporting zeros");
        }
    }

    let means = |accs: &[Accumulator; 4]| -> Vec<f64> {
        accs.iter().map(Accumulator::mean_or_zero).collect()
    };
    let plot_data = PlotData {
        groups: IncomeGroup::ALL.to_vec(),
        baseline_demand: means(&baseline_demand),
        new_demand: means(&new_demand),
        baseline_budget_share: means(&baseline_share),
        new_budget_share: means(&new_share),
    };

    Ok((table_summary, plot_data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::household::DemandParams;
    use approx::assert_relative_eq;

    fn four_households() -> Population {
        Population::from_parts(
            &[10_000.0, 20_000.0, 30_000.0, 40_000.0],
            &[0.3; 4],
            DemandParams::default(),
        )
        .unwrap()
    }

    #[test]
    fn baseline_aggregate() {
        let result = run_scenario(&four_households(), &Shock::price(1.10)).unwrap();
        assert_relative_eq!(result.aggregate_food_baseline, 30_000.0, max_relative = 1e-12);
        let baseline: Vec<_> = result.outcomes.iter().map(|o| o.baseline_demand).collect();
        for (q, expected) in baseline.iter().zip([3_000.0, 6_000.0, 9_000.0, 12_000.0]) {
            assert_relative_eq!(*q, expected, max_relative = 1e-12);
        }
    }

    #[test]
    fn price_scenario_scales_every_household() {
        let result = run_scenario(&four_households(), &Shock::price(1.10)).unwrap();
        let factor = 1.10_f64.powf(-0.6);
        for outcome in &result.outcomes {
            assert_relative_eq!(
                outcome.current_food_demand().unwrap(),
                outcome.baseline_demand * factor,
                max_relative = 1e-12
            );
            assert!(outcome.income_change_demand.is_none());
        }
        assert_relative_eq!(
            result.aggregate_food_demand_price_change,
            30_000.0 * factor,
            max_relative = 1e-12
        );
        assert_eq!(result.aggregate_food_demand_income_change, 0.0);
    }

    #[test]
    fn income_scenario_sets_current_income() {
        let pop = four_households();
        let result = run_scenario(&pop, &Shock::income(1.5)).unwrap();
        let factor = 1.5_f64.powf(0.8);
        for (h, outcome) in pop.households().iter().zip(&result.outcomes) {
            assert_relative_eq!(outcome.current_income.unwrap(), h.income() * 1.5);
            assert_relative_eq!(
                outcome.current_food_demand().unwrap(),
                outcome.baseline_demand * factor,
                max_relative = 1e-12
            );
        }
        assert_relative_eq!(
            result.aggregate_food_demand_income_change,
            30_000.0 * factor,
            max_relative = 1e-12
        );
        assert_eq!(result.aggregate_food_demand_price_change, 0.0);
    }

    #[test]
    fn both_shocks_keep_both_demands() {
        let result = run_scenario(&four_households(), &Shock {
            income_factor: Some(1.2),
            new_food_price: Some(1.3),
        })
        .unwrap();
        for outcome in &result.outcomes {
            assert_eq!(outcome.current_food_demand(), outcome.price_change_demand);
            assert!(outcome.income_change_demand.unwrap() > outcome.baseline_demand);
            assert!(outcome.price_change_demand.unwrap() < outcome.baseline_demand);
        }
        assert!(result.aggregate_food_demand_income_change > 0.0);
        assert!(result.aggregate_food_demand_price_change > 0.0);
    }

    #[test]
    fn rejects_invalid_shocks() {
        let pop = four_households();
        assert!(run_scenario(&pop, &Shock::income(0.0)).is_err());
        assert!(run_scenario(&pop, &Shock::price(-1.0)).is_err());
        assert!(run_scenario(&pop, &Shock::price(f64::INFINITY)).is_err());
    }

    #[test]
    fn summary_requires_a_shock() {
        let pop = four_households();
        let result = run_scenario(&pop, &Shock::default()).unwrap();
        assert_relative_eq!(result.aggregate_food_baseline, 30_000.0, max_relative = 1e-12);
        assert!(matches!(
            build_summary_and_plot_data(&pop, &result, 1.0),
            Err(DemandError::MissingScenarioData {
                field: "current_food_demand",
                index: 0
            })
        ));
        assert!(TableSummary::from_result(&result).is_err());
    }

    #[test]
    fn summary_rejects_foreign_result() {
        let pop = four_households();
        let other = Population::from_parts(&[1_000.0], &[0.2], DemandParams::default()).unwrap();
        let result = run_scenario(&other, &Shock::income(1.1)).unwrap();
        assert!(matches!(
            build_summary_and_plot_data(&pop, &result, 1.0),
            Err(DemandError::PopulationMismatch { outcomes: 1, households: 4 })
        ));
    }

    #[test]
    fn summary_of_price_scenario() {
        let pop = four_households();
        let result = run_scenario(&pop, &Shock::price(1.10)).unwrap();
        let (table, plot) = build_summary_and_plot_data(&pop, &result, 1.10).unwrap();

        let factor = 1.10_f64.powf(-0.6);
        assert_relative_eq!(table.total_demand, 30_000.0 * factor, max_relative = 1e-12);
        assert_relative_eq!(table.mean_demand, 7_500.0 * factor, max_relative = 1e-12);
        assert_relative_eq!(table.median_demand, 7_500.0 * factor, max_relative = 1e-12);
        // Population std of [3000, 6000, 9000, 12000] is sqrt(11_250_000).
        assert_relative_eq!(
            table.std_demand,
            11_250_000.0_f64.sqrt() * factor,
            max_relative = 1e-12
        );

        assert_eq!(plot.groups, IncomeGroup::ALL.to_vec());
        for (i_grp, expected) in [3_000.0, 6_000.0, 9_000.0, 12_000.0].iter().enumerate() {
            assert_relative_eq!(plot.baseline_demand[i_grp], *expected, max_relative = 1e-12);
            assert_relative_eq!(plot.new_demand[i_grp], expected * factor, max_relative = 1e-12);
            assert_relative_eq!(plot.baseline_budget_share[i_grp], 0.3);
            // Spending share rises because demand is inelastic.
            assert_relative_eq!(
                plot.new_budget_share[i_grp],
                0.3 * 1.10 * factor,
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn summary_of_income_scenario() {
        let pop = four_households();
        let result = run_scenario(&pop, &Shock::income(2.0)).unwrap();
        let (_, plot) = build_summary_and_plot_data(&pop, &result, pop.food_price()).unwrap();
        // Share falls by 2^0.8 / 2 because the income elasticity is below one.
        for share in plot.new_budget_share {
            assert_relative_eq!(share, 0.3 * 2.0_f64.powf(-0.2), max_relative = 1e-12);
        }
    }

    #[test]
    fn empty_groups_report_zero() {
        let pop = Population::from_parts(&[25_000.0], &[0.25], DemandParams::default()).unwrap();
        let result = run_scenario(&pop, &Shock::price(1.2)).unwrap();
        let (table, plot) = build_summary_and_plot_data(&pop, &result, 1.2).unwrap();
        assert_eq!(table.std_demand, 0.0);
        for series in [
            &plot.baseline_demand,
            &plot.new_demand,
            &plot.baseline_budget_share,
            &plot.new_budget_share,
        ] {
            assert_eq!(series.len(), 4);
            assert!(series[0] > 0.0);
            assert_eq!(&series[1..], &[0.0, 0.0, 0.0]);
        }
    }
}
