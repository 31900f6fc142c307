use crate::config::Config;
use crate::population::Population;
use crate::scenario::{
    PlotData, ScenarioResult, Shock, TableSummary, build_summary_and_plot_data, run_scenario,
};
use anyhow::{Context, Result, bail};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::Serialize;
use std::path::Path;

/// Everything handed to reporting for one scenario run.
#[derive(Debug, Serialize)]
pub struct Report {
    pub n_households: usize,
    pub sigma: f64,
    pub mean_income: f64,
    pub median_income: f64,
    pub shock: Shock,
    pub aggregate_food_baseline: f64,
    pub aggregate_food_demand_income_change: f64,
    pub aggregate_food_demand_price_change: f64,
    pub table_summary: TableSummary,
    pub plot_data: PlotData,
}

/// Builds populations and runs scenarios from a [`Config`].
pub struct Manager {
    cfg: Config,
}

impl Manager {
    pub fn new(cfg: Config) -> Self {
        log::info!("{cfg:#?}");
        Self { cfg }
    }

    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let cfg = Config::from_file(file).context("failed to construct cfg")?;
        Ok(Self::new(cfg))
    }

    pub fn cfg(&self) -> &Config {
        &self.cfg
    }

    pub fn generate_population(&self) -> Result<Population> {
        let mut rng = match self.cfg.population.seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::try_from_os_rng()?,
        };

        let population = Population::generate(&self.cfg.population_params(), &mut rng)
            .context("failed to generate population")?;
        log::info!(
            "generated {} households (sigma {:.4}, mean income {:.2})",
            population.len(),
            population.sigma(),
            population.mean_income()
        );

        Ok(population)
    }

    /// Run the scenario of the config file.
    pub fn run_configured(&self) -> Result<Report> {
        self.run(self.cfg.scenario)
    }

    /// Generate a fresh population and apply `shock` to it.
    pub fn run(&self, shock: Shock) -> Result<Report> {
        if shock.income_factor.is_none() && shock.new_food_price.is_none() {
            bail!("scenario needs an income factor or a new food price");
        }

        let population = self.generate_population()?;
        let result = run_scenario(&population, &shock).context("failed to run scenario")?;
        Self::report(&population, result)
    }

    fn report(population: &Population, result: ScenarioResult) -> Result<Report> {
        // Income scenarios keep the baseline price.
        let reference_price = result
            .shock
            .new_food_price
            .unwrap_or_else(|| population.food_price());
        let (table_summary, plot_data) =
            build_summary_and_plot_data(population, &result, reference_price)
                .context("failed to build summary")?;

        Ok(Report {
            n_households: population.len(),
            sigma: population.sigma(),
            mean_income: population.mean_income(),
            median_income: population.median_income(),
            shock: result.shock,
            aggregate_food_baseline: result.aggregate_food_baseline,
            aggregate_food_demand_income_change: result.aggregate_food_demand_income_change,
            aggregate_food_demand_price_change: result.aggregate_food_demand_price_change,
            table_summary,
            plot_data,
        })
    }
}
