//! Settings module.

use super::parameters::SimulationParameters;
use super::sampling::SamplingPolicy;
use crate::sweep::ParameterGrid;

use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Settings {
    pub parameters: SimulationParameters,

    #[serde(default)]
    pub seed: u64,

    #[serde(default)]
    pub sampling: SamplingPolicy,

    /// Run a batch over this grid instead of a single trajectory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sweep: Option<ParameterGrid>,
}

#[derive(Debug)]
pub enum SettingsError {
    IoError(std::io::Error),
    YamlError(serde_yaml::Error),
}

impl std::error::Error for SettingsError {}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::IoError(error) => write!(formatter, "IO error: {error}"),
            SettingsError::YamlError(error) => write!(formatter, "YAML error: {error}"),
        }
    }
}

impl std::fmt::Display for Settings {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut output = vec![];
        self.write(&mut output).map_err(|_| std::fmt::Error)?;
        write!(formatter, "{}", String::from_utf8_lossy(&output))
    }
}

impl Settings {
    pub fn write(&self, writer: &mut dyn std::io::Write) -> Result<(), SettingsError> {
        serde_yaml::to_writer(writer, self).map_err(SettingsError::YamlError)
    }

    pub fn read(reader: &mut dyn std::io::Read) -> Result<Settings, SettingsError> {
        serde_yaml::from_reader(reader).map_err(SettingsError::YamlError)
    }

    pub fn write_to_file(&self, filename: &str) -> Result<(), SettingsError> {
        let file = fs::File::create(filename).map_err(SettingsError::IoError)?;
        let mut writer = std::io::BufWriter::new(file);
        self.write(&mut writer)
    }

    pub fn read_from_file(filename: &str) -> Result<Settings, SettingsError> {
        let file = fs::File::open(filename).map_err(SettingsError::IoError)?;
        let mut reader = std::io::BufReader::new(file);
        Self::read(&mut reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_write() {
        let settings = Settings {
            parameters: SimulationParameters::default(),
            seed: 7,
            sampling: SamplingPolicy { interval: 0.5 },
            sweep: Some(ParameterGrid {
                alpha: vec![1., 1.5],
                beta: vec![2.],
            }),
        };
        let mut output = vec![];
        settings.write(&mut output).unwrap();
        let settings2 = Settings::read(&mut &output[..]).unwrap();
        assert_eq!(settings, settings2);
    }

    #[test]
    fn optional_sections() {
        let content = r#"
parameters:
  mu: 0.5
  nu_n: 0.01
  nu_p: 0.01
  alpha: 0.01
  beta: 0.1
  b: 0.5
  growth_mode: Constant
  carrying_capacity: 40.0
  total_groups: 100
  max_group_size: 40
  initial_programmer_fraction: 0.1
  t_max: 50.0
"#;
        let settings = Settings::read(&mut content.as_bytes()).unwrap();
        assert_eq!(settings.seed, 0);
        assert_eq!(settings.sampling, SamplingPolicy::default());
        assert!(settings.sweep.is_none());
    }

    #[test]
    fn demo_settings() {
        let demos = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos");
        let reference =
            Settings::read_from_file(&demos.join("reference.yaml").to_string_lossy()).unwrap();
        assert_eq!(reference.parameters, SimulationParameters::default());
        assert!(reference.sweep.is_none());

        let sweep = Settings::read_from_file(&demos.join("sweep.yaml").to_string_lossy()).unwrap();
        assert_eq!(sweep.sweep.map(|grid| grid.len()), Some(49));
        assert!(sweep.parameters.validate().is_ok());
    }
}
