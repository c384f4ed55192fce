use crate::core::error::RallyError;
use crate::core::variant::{Variant, VariantCatalog, VariantPars};
use crate::core::vehicle::VehiclePars;
use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::Path;
use std::time::Duration;

/// * `tick_interval_ms` - (ms) Real time one tick takes, 1000 ms correspond to one simulated hour
/// * `realtime_factor` - Speed-up of the real-time pacing, the tick interval is divided by it
/// * `seed` - (optional) Seed of the malfunction random stream, entropy is used if not set
/// * `variant_overrides` - (optional) Catalog rows replacing the standard variant parameters
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EngineConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_realtime_factor")]
    pub realtime_factor: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub variant_overrides: BTreeMap<Variant, VariantPars>,
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_realtime_factor() -> f64 {
    1.0
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            tick_interval_ms: default_tick_interval_ms(),
            realtime_factor: default_realtime_factor(),
            seed: None,
            variant_overrides: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// catalog returns the standard variant catalog with the configured overrides applied.
    pub fn catalog(&self) -> Result<VariantCatalog, RallyError> {
        let mut catalog = VariantCatalog::default();
        for (&variant, &variant_pars) in self.variant_overrides.iter() {
            catalog = catalog.with_override(variant, variant_pars)?;
        }
        Ok(catalog)
    }

    /// tick_duration returns the real time one tick takes.
    pub fn tick_duration(&self) -> Result<Duration, RallyError> {
        if !(self.realtime_factor.is_finite() && self.realtime_factor > 0.0) {
            return Err(RallyError::Validation(format!(
                "realtime factor must be a positive number, but is {}",
                self.realtime_factor
            )));
        }
        Ok(Duration::from_secs_f64(
            self.tick_interval_ms as f64 / 1000.0 / self.realtime_factor,
        ))
    }

    pub fn validate(&self) -> Result<(), RallyError> {
        self.catalog()?;
        self.tick_duration()?;
        Ok(())
    }
}

/// * `year` - Race year, also the key of the race
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RacePars {
    pub year: u32,
}

/// RaceScenario is used to store the race and its participants.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RaceScenario {
    pub race: RacePars,
    pub vehicles: Vec<VehiclePars>,
}

/// read_race_scenario reads the JSON file and decodes the JSON string into the race scenario
/// struct.
pub fn read_race_scenario(filepath: &Path) -> anyhow::Result<RaceScenario> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open race scenario file {}!",
            filepath.display()
        ))?;
    let pars = serde_json::from_reader(&fh).context(format!(
        "Failed to parse race scenario file {}!",
        filepath.display()
    ))?;
    Ok(pars)
}

/// Read the engine configuration (pacing, seed, catalog overrides) from a JSON file.
pub fn read_engine_config(filepath: &Path) -> anyhow::Result<EngineConfig> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open engine config file {}!",
            filepath.display()
        ))?;
    let config: EngineConfig = serde_json::from_reader(&fh).context(format!(
        "Failed to parse engine config file {}!",
        filepath.display()
    ))?;
    config
        .validate()
        .context(format!("Invalid engine config file {}!", filepath.display()))?;
    Ok(config)
}
