use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SimulationError};

/// Shape of the arrival rate.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum GrowthMode {
    /// Every group receives newcomers at rate `mu`, independent of its size.
    Constant,
    /// Logistic arrival rate bounded by the carrying capacity and diluted by the global
    /// population.
    DensityDependent,
}

/// How a drawn conversion attempt is turned into a concrete event.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum ConversionRule {
    /// Compare the share of the conversion rate in the total rate against `1 - cost`.
    #[default]
    RateRatio,
    /// Convert with probability `1 - cost`, otherwise the non-programmer leaves.
    CostWeighted,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SimulationParameters {
    /// Arrival intensity of new non-programmers.
    pub mu: f64,

    /// Per capita departure intensity of non-programmers.
    pub nu_n: f64,

    /// Per capita departure intensity of programmers.
    pub nu_p: f64,

    /// Exponent of the non-programmer count in the conversion benefit.
    pub alpha: f64,

    /// Exponent of the programmer count in the conversion benefit.
    pub beta: f64,

    /// Scale of the conversion cost.
    pub b: f64,

    pub growth_mode: GrowthMode,

    /// Carrying capacity of a group, only used for density dependent growth.
    pub carrying_capacity: f64,

    /// Number of groups. Constant for the whole run.
    pub total_groups: usize,

    /// Number of trials of the binomial initial group size.
    pub max_group_size: usize,

    /// Probability for an initial member to be a programmer.
    pub initial_programmer_fraction: f64,

    /// Success probability of the binomial initial group size.
    #[serde(default = "default_initial_occupancy")]
    pub initial_occupancy: f64,

    #[serde(default)]
    pub conversion_rule: ConversionRule,

    /// Simulated time horizon.
    pub t_max: f64,
}

fn default_initial_occupancy() -> f64 {
    0.1
}

impl std::fmt::Display for SimulationParameters {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut output = vec![];
        self.write(&mut output).map_err(|_| std::fmt::Error)?;
        write!(formatter, "{}", String::from_utf8_lossy(&output))
    }
}

impl Default for SimulationParameters {
    /// Parameters of the reference run: 1000 groups, logistic growth capped at 40 members.
    fn default() -> Self {
        Self {
            mu: 0.5,
            nu_n: 0.01,
            nu_p: 0.01,
            alpha: 0.01,
            beta: 0.1,
            b: 0.5,
            growth_mode: GrowthMode::DensityDependent,
            carrying_capacity: 40.,
            total_groups: 1000,
            max_group_size: 40,
            initial_programmer_fraction: 0.1,
            initial_occupancy: default_initial_occupancy(),
            conversion_rule: ConversionRule::RateRatio,
            t_max: 500.,
        }
    }
}

impl SimulationParameters {
    /// Reject parameter sets that cannot drive a run.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("mu", self.mu), ("nu_n", self.nu_n), ("nu_p", self.nu_p)] {
            if !value.is_finite() || value < 0. {
                return Err(SimulationError::invalid(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        for (name, value) in [("alpha", self.alpha), ("beta", self.beta), ("b", self.b)] {
            if !value.is_finite() {
                return Err(SimulationError::invalid(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }
        if !self.carrying_capacity.is_finite() || self.carrying_capacity <= 0. {
            return Err(SimulationError::invalid(format!(
                "carrying_capacity must be positive, got {}",
                self.carrying_capacity
            )));
        }
        if self.total_groups == 0 {
            return Err(SimulationError::invalid("total_groups must be positive"));
        }
        if self.max_group_size == 0 {
            return Err(SimulationError::invalid("max_group_size must be positive"));
        }
        if !(0. ..=1.).contains(&self.initial_programmer_fraction) {
            return Err(SimulationError::invalid(format!(
                "initial_programmer_fraction must lie in [0, 1], got {}",
                self.initial_programmer_fraction
            )));
        }
        if !(self.initial_occupancy > 0. && self.initial_occupancy <= 1.) {
            return Err(SimulationError::invalid(format!(
                "initial_occupancy must lie in (0, 1], got {}",
                self.initial_occupancy
            )));
        }
        if !self.t_max.is_finite() || self.t_max < 0. {
            return Err(SimulationError::invalid(format!(
                "t_max must be finite and non-negative, got {}",
                self.t_max
            )));
        }
        Ok(())
    }

    pub fn write(
        &self,
        writer: &mut dyn std::io::Write,
    ) -> std::result::Result<(), serde_yaml::Error> {
        serde_yaml::to_writer(writer, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(SimulationParameters::default().validate().is_ok());
    }

    #[test]
    fn reject_negative_rates() {
        for field in 0..3 {
            let mut parameters = SimulationParameters::default();
            match field {
                0 => parameters.mu = -1.,
                1 => parameters.nu_n = -0.1,
                _ => parameters.nu_p = f64::NAN,
            }
            assert!(matches!(
                parameters.validate(),
                Err(SimulationError::InvalidParameters { .. })
            ));
        }
    }

    #[test]
    fn reject_non_positive_sizes() {
        let mut parameters = SimulationParameters::default();
        parameters.carrying_capacity = 0.;
        assert!(parameters.validate().is_err());

        let mut parameters = SimulationParameters::default();
        parameters.total_groups = 0;
        assert!(parameters.validate().is_err());

        let mut parameters = SimulationParameters::default();
        parameters.max_group_size = 0;
        assert!(parameters.validate().is_err());

        let mut parameters = SimulationParameters::default();
        parameters.initial_occupancy = 0.;
        assert!(parameters.validate().is_err());

        let mut parameters = SimulationParameters::default();
        parameters.initial_programmer_fraction = 1.5;
        assert!(parameters.validate().is_err());
    }

    #[test]
    fn read_write() {
        let mut buffer = Vec::new();
        let parameters = SimulationParameters {
            growth_mode: GrowthMode::Constant,
            conversion_rule: ConversionRule::CostWeighted,
            ..Default::default()
        };
        parameters.write(&mut buffer).unwrap();
        let read_parameters = serde_yaml::from_slice::<SimulationParameters>(&buffer).unwrap();
        assert_eq!(read_parameters, parameters);
    }

    #[test]
    fn read_with_defaults() {
        let content = r#"
mu: 0.5
nu_n: 0.01
nu_p: 0.01
alpha: 0.01
beta: 0.1
b: 0.5
growth_mode: DensityDependent
carrying_capacity: 40.0
total_groups: 10
max_group_size: 40
initial_programmer_fraction: 0.1
t_max: 5.0
"#;
        let parameters = serde_yaml::from_str::<SimulationParameters>(content).unwrap();
        assert_eq!(parameters.initial_occupancy, 0.1);
        assert_eq!(parameters.conversion_rule, ConversionRule::RateRatio);
        assert_eq!(parameters.total_groups, 10);
    }
}
