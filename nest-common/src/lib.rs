//! # Nest Common Library
//!
//! Shared code for the Nest budget planning services:
//! - Tier / KPI / budget domain types
//! - Weights table parsing and queries
//! - Budget aggregation (KPI projections and tier shares)
//! - Credential verification
//! - Configuration loading

pub mod aggregator;
pub mod auth;
pub mod config;
pub mod error;
pub mod model;
pub mod weights;

pub use aggregator::{simulate, KpiTotals, Simulation, TierShare};
pub use auth::{CredentialVerifier, StaticCredentials};
pub use error::{Error, Result};
pub use model::{BudgetInputs, Kpi, Tier};
pub use weights::{KpiWeights, TierWeights, WeightEntry, WeightsTable};
