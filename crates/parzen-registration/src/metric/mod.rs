//! Parzen-window mutual information metric.
//!
//! The pipeline runs histogram → smoothing → normalisation → log ratio, then
//! branches into the value reduction and the gradient engine.

pub mod config;
pub mod entropy;
pub mod gradient;
pub mod log_ratio;
pub mod mutual_information;
pub mod probability;
pub mod trait_;

pub use config::{GradientStrategy, LogBase, MetricConfig};
pub use entropy::Entropies;
pub use gradient::{gather_per_pixel, windowed_per_pixel, GradientTerms};
pub use log_ratio::{log_ratio, reduce_value, LOG_ZERO};
pub use mutual_information::ParzenMutualInformation;
pub use probability::JointProbability;
pub use trait_::{Gradient, GradientMode, Metric, MetricOutput, OutputRequest};
