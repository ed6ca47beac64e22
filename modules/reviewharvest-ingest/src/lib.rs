pub mod aggregate;
pub mod config;
pub mod dedup;
pub mod discovery;
pub mod escalation;
pub mod extract;
pub mod fetch;
pub mod html;
pub mod render;
pub mod validate;

pub use aggregate::{Aggregator, HarvestOutcome, HarvestStats, SourceTarget};
pub use config::PipelineConfig;
pub use escalation::{needs_js_rendering, RenderBudget};
pub use validate::Classifier;
