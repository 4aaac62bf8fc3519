//! Typed, validated configuration for the conveyor simulation.
//!
//! Every section has an independent [`Default`] so a TOML file may omit any
//! `[section]` table entirely and still parse to sensible values (spec §6).

pub mod error;

pub use error::ConfigError;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConveyorCfg {
    pub total_length_mm: f64,
    pub infeed_to_diverter_mm: f64,
    pub diverter_to_outfeed_mm: f64,
    pub belt_speed_mms: f64,
    pub box_length_mm: f64,
}

impl Default for ConveyorCfg {
    fn default() -> Self {
        Self {
            total_length_mm: 3000.0,
            infeed_to_diverter_mm: 1500.0,
            diverter_to_outfeed_mm: 1000.0,
            belt_speed_mms: 500.0,
            box_length_mm: 200.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct BoxesCfg {
    pub arrival_rate_per_hour: f64,
    pub arrival_jitter_pct: f64,
}

impl Default for BoxesCfg {
    fn default() -> Self {
        Self {
            arrival_rate_per_hour: 72.0,
            arrival_jitter_pct: 20.0,
        }
    }
}

/// Where a forced jam should occur; "random" picks a site per box at
/// runtime using the seeded RNG.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JamLocationCfg {
    Random,
    Infeed,
    Diverter,
    OutfeedB,
    OutfeedC,
}

impl Default for JamLocationCfg {
    fn default() -> Self {
        JamLocationCfg::Random
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct JamsCfg {
    pub enabled: bool,
    pub probability_per_box: f64,
    pub jam_location: JamLocationCfg,
}

impl Default for JamsCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            probability_per_box: 0.03,
            jam_location: JamLocationCfg::Random,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationCfg {
    pub duration_sec: f64,
    pub time_scale: f64,
    pub update_interval_ms: u64,
}

impl Default for SimulationCfg {
    fn default() -> Self {
        Self {
            duration_sec: 900.0,
            time_scale: 1.0,
            update_interval_ms: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingCfg {
    pub output_dir: Option<String>,
    pub log_interval_sec: f64,
    pub log_events: bool,
}

impl Default for LoggingCfg {
    fn default() -> Self {
        Self {
            output_dir: None,
            log_interval_sec: 1.0,
            log_events: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub conveyor: ConveyorCfg,
    pub boxes: BoxesCfg,
    pub jams: JamsCfg,
    pub simulation: SimulationCfg,
    pub logging: LoggingCfg,
}

impl Config {
    /// Validate range and geometry constraints, returning a descriptive
    /// error on the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.conveyor;
        if c.total_length_mm <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "total_length_mm",
                value: c.total_length_mm.to_string(),
            });
        }
        if c.belt_speed_mms <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "belt_speed_mms",
                value: c.belt_speed_mms.to_string(),
            });
        }
        if c.box_length_mm <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "box_length_mm",
                value: c.box_length_mm.to_string(),
            });
        }
        let diverter_mm = c.infeed_to_diverter_mm;
        let outfeed_mm = diverter_mm + c.diverter_to_outfeed_mm;
        let geometry_ok = diverter_mm >= 0.0
            && diverter_mm <= outfeed_mm
            && outfeed_mm <= c.total_length_mm
            && c.box_length_mm < diverter_mm;
        if !geometry_ok {
            return Err(ConfigError::InvalidGeometry {
                diverter_mm: diverter_mm.to_string(),
                outfeed_mm: outfeed_mm.to_string(),
                total_mm: c.total_length_mm.to_string(),
                box_length_mm: c.box_length_mm.to_string(),
            });
        }

        if !(0.0..=100.0).contains(&self.boxes.arrival_jitter_pct) {
            return Err(ConfigError::InvalidJitterPct(
                self.boxes.arrival_jitter_pct.to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.jams.probability_per_box) {
            return Err(ConfigError::InvalidProbability(
                self.jams.probability_per_box.to_string(),
            ));
        }

        if self.simulation.duration_sec <= 0.0 {
            return Err(ConfigError::InvalidDuration(
                self.simulation.duration_sec.to_string(),
            ));
        }
        if self.simulation.time_scale <= 0.0 {
            return Err(ConfigError::InvalidTimeScale(
                self.simulation.time_scale.to_string(),
            ));
        }
        if self.simulation.update_interval_ms == 0 {
            return Err(ConfigError::ZeroUpdateInterval);
        }

        if self.logging.log_interval_sec <= 0.0 {
            return Err(ConfigError::InvalidLogInterval(
                self.logging.log_interval_sec.to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn empty_toml_uses_all_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg: Config = toml::from_str("[boxes]\narrival_rate_per_hour = 600\n").unwrap();
        assert_eq!(cfg.boxes.arrival_rate_per_hour, 600.0);
        assert_eq!(cfg.boxes.arrival_jitter_pct, BoxesCfg::default().arrival_jitter_pct);
        assert_eq!(cfg.conveyor, ConveyorCfg::default());
    }

    #[test]
    fn rejects_inconsistent_geometry() {
        let mut cfg = Config::default();
        cfg.conveyor.infeed_to_diverter_mm = 0.0;
        cfg.conveyor.box_length_mm = 50.0;
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidGeometry { .. }));
    }

    #[test]
    fn rejects_out_of_range_probability() {
        let mut cfg = Config::default();
        cfg.jams.probability_per_box = 1.5;
        assert!(matches!(
            cfg.validate().unwrap_err(),
            ConfigError::InvalidProbability(_)
        ));
    }

    #[test]
    fn jam_location_parses_named_site() {
        let cfg: Config = toml::from_str("[jams]\njam_location = \"diverter\"\n").unwrap();
        assert_eq!(cfg.jams.jam_location, JamLocationCfg::Diverter);
    }
}
