use std::fs;
use std::path::Path;

use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::arrivals::ArrivalConfig;
use crate::clock::SimTime;
use crate::distributions::sample_exponential;
use crate::ecs::{VehicleId, VehicleKind};
use crate::error::{ConfigError, SamplerError};

pub const DEFAULT_NORMAL_COUNT: usize = 100;
pub const DEFAULT_EV_COUNT: usize = 30;
/// Mean gap between arrivals (minutes).
pub const DEFAULT_MEAN_INTERARRIVAL: f64 = 2.0;
pub const DEFAULT_PARKING_CAPACITY: usize = 30;
pub const DEFAULT_CHARGER_CAPACITY: usize = 5;
pub const DEFAULT_MEAN_PARKING_TIME: f64 = 60.0;
pub const DEFAULT_MEAN_CHARGING_TIME: f64 = 45.0;

/// Facility-wide defaults used when a scheduler is built without explicit counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrivalDefaults {
    pub normal_count: usize,
    pub ev_count: usize,
    pub mean_interarrival: f64,
}

impl Default for ArrivalDefaults {
    fn default() -> Self {
        Self {
            normal_count: DEFAULT_NORMAL_COUNT,
            ev_count: DEFAULT_EV_COUNT,
            mean_interarrival: DEFAULT_MEAN_INTERARRIVAL,
        }
    }
}

/// Exponential dwell times per vehicle kind.
#[derive(Debug, Clone, Copy, Resource)]
pub struct DwellConfig {
    pub mean_parking_time: f64,
    pub mean_charging_time: f64,
    /// Dwell stream seed. Vehicle `k` draws from `seed + k`.
    pub seed: u64,
}

impl Default for DwellConfig {
    fn default() -> Self {
        Self {
            mean_parking_time: DEFAULT_MEAN_PARKING_TIME,
            mean_charging_time: DEFAULT_MEAN_CHARGING_TIME,
            seed: 0,
        }
    }
}

impl DwellConfig {
    /// Dwell for one vehicle. Seeded by vehicle id so the draw does not depend
    /// on the order in which vehicles reach their pool.
    pub fn sample(&self, vehicle: VehicleId, kind: VehicleKind) -> Result<SimTime, SamplerError> {
        let mean = match kind {
            VehicleKind::Normal => self.mean_parking_time,
            VehicleKind::Ev => self.mean_charging_time,
        };
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(vehicle.0));
        sample_exponential(&mut rng, mean)
    }
}

/// Simulation end time. When set, the runner stops before processing any event
/// at or after this time.
#[derive(Debug, Clone, Copy, Resource)]
pub struct SimulationEndTime(pub SimTime);

/// Parameters for building a simulation scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioParams {
    pub parking_capacity: usize,
    pub charger_capacity: usize,
    /// `None` uses [DEFAULT_NORMAL_COUNT].
    pub normal_count: Option<i64>,
    /// `None` uses [DEFAULT_EV_COUNT].
    pub ev_count: Option<i64>,
    pub mean_interarrival: f64,
    pub mean_parking_time: f64,
    pub mean_charging_time: f64,
    pub seed: Option<u64>,
    pub simulation_end_time: Option<SimTime>,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            parking_capacity: DEFAULT_PARKING_CAPACITY,
            charger_capacity: DEFAULT_CHARGER_CAPACITY,
            normal_count: None,
            ev_count: None,
            mean_interarrival: DEFAULT_MEAN_INTERARRIVAL,
            mean_parking_time: DEFAULT_MEAN_PARKING_TIME,
            mean_charging_time: DEFAULT_MEAN_CHARGING_TIME,
            seed: None,
            simulation_end_time: None,
        }
    }
}

impl ScenarioParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_counts(mut self, normal: i64, ev: i64) -> Self {
        self.normal_count = Some(normal);
        self.ev_count = Some(ev);
        self
    }

    pub fn with_capacities(mut self, parking: usize, chargers: usize) -> Self {
        self.parking_capacity = parking;
        self.charger_capacity = chargers;
        self
    }

    pub fn with_mean_interarrival(mut self, mean: f64) -> Self {
        self.mean_interarrival = mean;
        self
    }

    /// Mean parking and charging durations.
    pub fn with_dwell_means(mut self, parking: f64, charging: f64) -> Self {
        self.mean_parking_time = parking;
        self.mean_charging_time = charging;
        self
    }

    pub fn with_simulation_end_time(mut self, end: SimTime) -> Self {
        self.simulation_end_time = Some(end);
        self
    }

    pub fn arrival_defaults(&self) -> ArrivalDefaults {
        ArrivalDefaults {
            normal_count: DEFAULT_NORMAL_COUNT,
            ev_count: DEFAULT_EV_COUNT,
            mean_interarrival: self.mean_interarrival,
        }
    }

    pub fn arrival_config(&self) -> ArrivalConfig {
        ArrivalConfig {
            normal_count: self.normal_count,
            ev_count: self.ev_count,
            plan_seed: self.seed,
        }
    }

    /// Check the values the scheduler and lifecycle cannot fix up themselves.
    /// Negative counts are left to the arrival scheduler.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("mean_interarrival", self.mean_interarrival)?;
        positive("mean_parking_time", self.mean_parking_time)?;
        positive("mean_charging_time", self.mean_charging_time)?;
        if let Some(end) = self.simulation_end_time {
            if !end.is_finite() || end < 0.0 {
                return Err(ConfigError::Invalid {
                    field: "simulation_end_time",
                    reason: format!("must be a non-negative finite time, got {end}"),
                });
            }
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be positive and finite, got {value}"),
        })
    }
}

/// Load scenario parameters from a JSON file. Missing fields take defaults.
pub fn load_params(path: impl AsRef<Path>) -> Result<ScenarioParams, ConfigError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let params: ScenarioParams = serde_json::from_str(&raw)?;
    params.validate()?;
    Ok(params)
}
