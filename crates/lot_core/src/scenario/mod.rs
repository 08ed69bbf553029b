//! Scenario setup: pools, dwell times and the arrival scheduler.
//!
//! Parameters can be built in code or loaded from a JSON file; missing fields
//! take the defaults below.

mod build;
mod params;

pub use build::{build_scenario, ScenarioHandles};
pub use params::{
    load_params, ArrivalDefaults, DwellConfig, ScenarioParams, SimulationEndTime,
    DEFAULT_CHARGER_CAPACITY, DEFAULT_EV_COUNT, DEFAULT_MEAN_CHARGING_TIME,
    DEFAULT_MEAN_INTERARRIVAL, DEFAULT_MEAN_PARKING_TIME, DEFAULT_NORMAL_COUNT,
    DEFAULT_PARKING_CAPACITY,
};
