//! ECS resources made available to systems.
//!
//! Overview
//! - `simconfig` – INI-backed simulation settings
//! - `worldtime` – simulation time and delta
pub mod simconfig;
pub mod worldtime;
