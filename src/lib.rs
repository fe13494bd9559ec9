pub mod chart;
pub mod cli;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod fetch;
pub mod matching;
pub mod measurements;
pub mod page;
pub mod pipeline;
pub mod product_type;
pub mod render;
pub mod selector;
pub mod site;
pub mod size_ui;
pub mod units;
pub mod wait;

pub use error::{FitError, Result};
