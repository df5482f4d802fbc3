//! HTTP API handlers for nest-sim

pub mod auth;
pub mod buildinfo;
pub mod health;
pub mod simulation;
pub mod ui;

pub use auth::{login, logout, require_api_session, require_page_session, serve_login};
pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use simulation::{get_categories, get_simulation, put_category, put_tier_budget, refresh_weights};
pub use ui::{navigate, serve_dashboard, submit_simulation};
