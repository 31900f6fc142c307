use crate::household::DemandParams;
use crate::population::{DEFAULT_MEAN_INCOME, Dispersion, PopulationParams};
use crate::scenario::Shock;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Population parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PopulationConfig {
    /// Number of households.
    pub n_households: usize,

    /// Target mean income.
    #[serde(default = "default_mean_income")]
    pub mean_income: f64,

    /// Log-income standard deviation.
    pub sigma: Option<f64>,
    /// Target Gini coefficient.
    pub gini: Option<f64>,
    /// Target P90/P10 ratio.
    pub p90_p10: Option<f64>,

    /// Seed of the random number generator.
    pub seed: Option<u64>,
}

fn default_mean_income() -> f64 {
    DEFAULT_MEAN_INCOME
}

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub population: PopulationConfig,

    #[serde(default)]
    pub household: DemandParams,

    #[serde(default)]
    pub scenario: Shock,
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        contents.parse()
    }

    fn validate(&self) -> Result<()> {
        let pop = &self.population;
        check_num(pop.n_households, 1..=10_000_000).context("invalid number of households")?;
        check_num(pop.mean_income, f64::MIN_POSITIVE..f64::INFINITY)
            .context("invalid mean income")?;
        self.dispersion()
            .sigma()
            .context("invalid income dispersion")?;

        let hh = &self.household;
        check_num(hh.income_elasticity, -10.0..=10.0).context("invalid income elasticity")?;
        check_num(hh.price_elasticity, -10.0..=10.0).context("invalid price elasticity")?;
        check_num(hh.food_price, f64::MIN_POSITIVE..f64::INFINITY)
            .context("invalid food price")?;

        self.scenario.validate().context("invalid scenario")?;

        Ok(())
    }

    /// Dispersion selected by the `[population]` section.
    pub fn dispersion(&self) -> Dispersion {
        let pop = &self.population;
        match (pop.sigma, pop.gini, pop.p90_p10) {
            (Some(sigma), _, _) => Dispersion::Sigma(sigma),
            (None, Some(gini), _) => Dispersion::Gini(gini),
            (None, None, Some(ratio)) => Dispersion::P90P10(ratio),
            (None, None, None) => Dispersion::default(),
        }
    }

    pub fn population_params(&self) -> PopulationParams {
        PopulationParams {
            household_number: self.population.n_households,
            mean_income: self.population.mean_income,
            dispersion: self.dispersion(),
            demand: self.household,
        }
    }
}

impl std::str::FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("failed to deserialize config")?;

        let pop = &config.population;
        let n_targets = [pop.sigma, pop.gini, pop.p90_p10]
            .iter()
            .filter(|target| target.is_some())
            .count();
        if n_targets > 1 {
            bail!("at most one of sigma, gini and p90_p10 may be given, but {n_targets} are");
        }

        config.validate().context("failed to validate config")?;

        Ok(config)
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}
