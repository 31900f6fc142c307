//! Aggregate food demand under income and price shocks.
//!
//! A synthetic population of households is drawn with lognormal incomes and
//! Engel's-law budget shares; each household responds to a shock with
//! constant-elasticity demand, and the responses are summarized by income
//! quartile.

pub mod calibration;
pub mod config;
pub mod error;
pub mod household;
pub mod manager;
pub mod population;
pub mod scenario;
pub mod stats;

pub use error::DemandError;
pub use household::{DemandParams, Household, IncomeGroup};
pub use population::{Dispersion, Population, PopulationParams};
pub use scenario::{
    PlotData, ScenarioResult, Shock, TableSummary, build_summary_and_plot_data, run_scenario,
};
