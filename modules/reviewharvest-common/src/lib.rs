pub mod config;
pub mod heuristics;
pub mod types;

pub use config::Config;
pub use heuristics::HeuristicLists;
pub use types::*;
