//! Synthetic household population with lognormal incomes.

use crate::calibration::{sigma_from_gini, sigma_from_p90_p10};
use crate::error::{DemandError, check_positive};
use crate::household::{DemandParams, Household, IncomeGroup};
use crate::stats::{compute_median, compute_percentile, sorted_copy};
use rand::Rng;
use rand_distr::{Distribution, LogNormal, Uniform};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MEAN_INCOME: f64 = 30_000.0;
pub const DEFAULT_SIGMA: f64 = 0.55;

/// How the dispersion of log-income is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dispersion {
    Sigma(f64),
    Gini(f64),
    P90P10(f64),
}

impl Default for Dispersion {
    fn default() -> Self {
        Self::Sigma(DEFAULT_SIGMA)
    }
}

impl Dispersion {
    /// Resolve to the lognormal `sigma`, calibrating from an inequality target if needed.
    pub fn sigma(self) -> Result<f64, DemandError> {
        match self {
            Self::Sigma(sigma) => check_positive("sigma", sigma),
            Self::Gini(gini) => sigma_from_gini(gini),
            Self::P90P10(ratio) => sigma_from_p90_p10(ratio),
        }
    }
}

/// Parameters of the population generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationParams {
    pub household_number: usize,
    pub mean_income: f64,
    pub dispersion: Dispersion,
    pub demand: DemandParams,
}

impl PopulationParams {
    pub fn new(household_number: usize) -> Self {
        Self {
            household_number,
            mean_income: DEFAULT_MEAN_INCOME,
            dispersion: Dispersion::default(),
            demand: DemandParams::default(),
        }
    }
}

/// Empirical 25th, 50th and 75th percentiles of an income sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuartileCutoffs {
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
}

impl QuartileCutoffs {
    pub fn from_incomes(incomes: &[f64]) -> Self {
        let sorted = sorted_copy(incomes);
        Self {
            p25: compute_percentile(&sorted, 25.0),
            p50: compute_percentile(&sorted, 50.0),
            p75: compute_percentile(&sorted, 75.0),
        }
    }

    pub fn classify(&self, income: f64) -> IncomeGroup {
        if income <= self.p25 {
            IncomeGroup::Q1
        } else if income <= self.p50 {
            IncomeGroup::Q2
        } else if income <= self.p75 {
            IncomeGroup::Q3
        } else {
            IncomeGroup::Q4
        }
    }
}

/// Fixed-size set of households.
#[derive(Debug, Clone, Serialize)]
pub struct Population {
    sigma: f64,
    cutoffs: QuartileCutoffs,
    households: Vec<Household>,
}

impl Population {
    /// Draw `household_number` households with lognormal incomes whose mean is
    /// about `mean_income`, then assign budget shares by realized income quartile.
    pub fn generate<R: Rng + ?Sized>(
        params: &PopulationParams,
        rng: &mut R,
    ) -> Result<Self, DemandError> {
        if params.household_number == 0 {
            return Err(DemandError::invalid(
                "household_number",
                0.0,
                "must be at least 1",
            ));
        }
        let mean_income = check_positive("mean_income", params.mean_income)?;
        params.demand.validate()?;
        let sigma = params.dispersion.sigma()?;

        // Lognormal mean is exp(mu + sigma^2 / 2).
        let mu = mean_income.ln() - 0.5 * sigma.powi(2);
        log::debug!("lognormal income parameters: mu = {mu}, sigma = {sigma}");

        let income_dist = LogNormal::new(mu, sigma)?;
        let incomes: Vec<f64> = (0..params.household_number)
            .map(|_| income_dist.sample(rng))
            .collect();

        let cutoffs = QuartileCutoffs::from_incomes(&incomes);
        log::debug!("{cutoffs:?}");

        let mut share_dists = Vec::with_capacity(IncomeGroup::ALL.len());
        for group in IncomeGroup::ALL {
            let (lo, hi) = group.share_range();
            share_dists.push(Uniform::new(lo, hi)?);
        }

        let mut households = Vec::with_capacity(params.household_number);
        for income in incomes {
            let group = cutoffs.classify(income);
            let share = share_dists[group as usize].sample(rng);
            households.push(Household::new(income, share, params.demand, group)?);
        }

        Ok(Self {
            sigma,
            cutoffs,
            households,
        })
    }

    /// Build a population from given incomes and budget shares.
    ///
    /// Quartile labels come from the empirical percentiles of `incomes`.
    pub fn from_parts(
        incomes: &[f64],
        shares: &[f64],
        demand: DemandParams,
    ) -> Result<Self, DemandError> {
        if incomes.is_empty() {
            return Err(DemandError::invalid(
                "household_number",
                0.0,
                "must be at least 1",
            ));
        }
        if incomes.len() != shares.len() {
            return Err(DemandError::invalid(
                "food_budget_share count",
                shares.len() as f64,
                "must match the number of incomes",
            ));
        }

        let cutoffs = QuartileCutoffs::from_incomes(incomes);
        let households = incomes
            .iter()
            .zip(shares)
            .map(|(&income, &share)| {
                Household::new(income, share, demand, cutoffs.classify(income))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            sigma: f64::NAN,
            cutoffs,
            households,
        })
    }

    pub fn households(&self) -> &[Household] {
        &self.households
    }

    pub fn len(&self) -> usize {
        self.households.len()
    }

    pub fn is_empty(&self) -> bool {
        self.households.is_empty()
    }

    /// Dispersion used to draw incomes (`NaN` for hand-built populations).
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn cutoffs(&self) -> QuartileCutoffs {
        self.cutoffs
    }

    /// Baseline food price shared by the population.
    pub fn food_price(&self) -> f64 {
        self.households[0].food_price()
    }

    pub fn mean_income(&self) -> f64 {
        self.households.iter().map(Household::income).sum::<f64>() / self.len() as f64
    }

    pub fn median_income(&self) -> f64 {
        let incomes: Vec<f64> = self.households.iter().map(Household::income).collect();
        compute_median(&incomes)
    }

    /// Number of households per income group, in `Q1..Q4` order.
    pub fn group_sizes(&self) -> [usize; 4] {
        let mut sizes = [0; 4];
        for h in &self.households {
            sizes[h.income_group() as usize] += 1;
        }
        sizes
    }
}
