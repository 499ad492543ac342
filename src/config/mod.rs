//! Configuration data structures for simulation setups.

mod parameters;
mod sampling;
mod settings;

pub use parameters::{ConversionRule, GrowthMode, SimulationParameters};
pub use sampling::SamplingPolicy;
pub use settings::{Settings, SettingsError};
