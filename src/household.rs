//! Household agents and their constant-elasticity food demand.

use crate::error::{DemandError, check_positive};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_INCOME_ELASTICITY: f64 = 0.8;
pub const DEFAULT_PRICE_ELASTICITY: f64 = -0.6;
pub const DEFAULT_FOOD_PRICE: f64 = 1.0;

/// Income quartile a household belongs to, fixed when the population is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IncomeGroup {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl IncomeGroup {
    pub const ALL: [IncomeGroup; 4] = [Self::Q1, Self::Q2, Self::Q3, Self::Q4];

    /// Food budget share interval `[lo, hi)` of the group.
    ///
    /// Poorer groups spend a larger share of income on food (Engel's law).
    pub fn share_range(self) -> (f64, f64) {
        match self {
            Self::Q1 => (0.25, 0.35),
            Self::Q2 => (0.20, 0.30),
            Self::Q3 => (0.15, 0.25),
            Self::Q4 => (0.10, 0.20),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Q1 => "Q1",
            Self::Q2 => "Q2",
            Self::Q3 => "Q3",
            Self::Q4 => "Q4",
        }
    }
}

impl fmt::Display for IncomeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Food-demand parameters shared by every household of a population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemandParams {
    /// Percentage change in quantity per percentage change in income.
    pub income_elasticity: f64,
    /// Percentage change in quantity per percentage change in price.
    pub price_elasticity: f64,
    /// Baseline food price.
    pub food_price: f64,
}

impl Default for DemandParams {
    fn default() -> Self {
        Self {
            income_elasticity: DEFAULT_INCOME_ELASTICITY,
            price_elasticity: DEFAULT_PRICE_ELASTICITY,
            food_price: DEFAULT_FOOD_PRICE,
        }
    }
}

impl DemandParams {
    pub fn validate(&self) -> Result<(), DemandError> {
        if !self.income_elasticity.is_finite() {
            return Err(DemandError::invalid(
                "income_elasticity",
                self.income_elasticity,
                "must be finite",
            ));
        }
        if !self.price_elasticity.is_finite() {
            return Err(DemandError::invalid(
                "price_elasticity",
                self.price_elasticity,
                "must be finite",
            ));
        }
        check_positive("food_price", self.food_price)?;
        Ok(())
    }
}

/// One economic agent.
///
/// Fields are fixed at construction; scenario outcomes are kept outside the
/// household, in [`crate::scenario::ScenarioResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Household {
    income: f64,
    food_budget_share: f64,
    income_elasticity_food: f64,
    price_elasticity_food: f64,
    food_price: f64,
    income_group: IncomeGroup,
}

impl Household {
    pub fn new(
        income: f64,
        food_budget_share: f64,
        params: DemandParams,
        income_group: IncomeGroup,
    ) -> Result<Self, DemandError> {
        check_positive("income", income)?;
        if !(food_budget_share > 0.0 && food_budget_share < 1.0) {
            return Err(DemandError::invalid(
                "food_budget_share",
                food_budget_share,
                "must be strictly between 0 and 1",
            ));
        }
        params.validate()?;

        Ok(Self {
            income,
            food_budget_share,
            income_elasticity_food: params.income_elasticity,
            price_elasticity_food: params.price_elasticity,
            food_price: params.food_price,
            income_group,
        })
    }

    pub fn income(&self) -> f64 {
        self.income
    }

    pub fn food_budget_share(&self) -> f64 {
        self.food_budget_share
    }

    pub fn income_elasticity_food(&self) -> f64 {
        self.income_elasticity_food
    }

    pub fn price_elasticity_food(&self) -> f64 {
        self.price_elasticity_food
    }

    pub fn food_price(&self) -> f64 {
        self.food_price
    }

    pub fn income_group(&self) -> IncomeGroup {
        self.income_group
    }

    /// Baseline food quantity: spending on food divided by the baseline price.
    pub fn baseline_quantity(&self) -> f64 {
        self.income * self.food_budget_share / self.food_price
    }

    /// Demand after income is scaled by `income_factor`, price held fixed.
    ///
    /// `q_new = q_baseline * exp(e_income * ln(income_factor))`
    pub fn demand_under_income_change(&self, income_factor: f64) -> Result<f64, DemandError> {
        let income_factor = check_positive("income_factor", income_factor)?;
        let delta_ln_q = self.income_elasticity_food * income_factor.ln();
        Ok(self.baseline_quantity() * delta_ln_q.exp())
    }

    /// Demand after the food price moves to `new_price`, income held fixed.
    ///
    /// `q_new = q_baseline * exp(e_price * (ln(new_price) - ln(food_price)))`
    pub fn demand_under_price_change(&self, new_price: f64) -> Result<f64, DemandError> {
        let new_price = check_positive("new_food_price", new_price)?;
        let delta_ln_q = self.price_elasticity_food * (new_price.ln() - self.food_price.ln());
        Ok(self.baseline_quantity() * delta_ln_q.exp())
    }
}
