//! Error types for the parking facility simulation.

use std::path::PathBuf;

use bevy_ecs::prelude::Entity;
use thiserror::Error;

use crate::ecs::{VehicleId, VehicleKind};

/// Failure to produce an interarrival (or dwell) delay.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SamplerError {
    #[error("sampled delay {0} is negative")]
    Negative(f64),
    #[error("sampled delay {0} is not finite")]
    NotFinite(f64),
    /// A finite sampler (e.g. a replayed trace) ran out of values.
    #[error("sampler has no more delays")]
    Exhausted,
    #[error("invalid distribution: {0}")]
    Distribution(String),
}

/// Failure of a vehicle factory to construct a vehicle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpawnError {
    #[error("vehicle factory rejected the request: {0}")]
    Rejected(String),
    #[error("vehicle factory capacity of {0} vehicles exhausted")]
    LimitReached(u64),
    #[error("vehicle lifecycle could not be started: {0}")]
    NotStarted(String),
}

/// Errors raised by the arrival scheduler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArrivalError {
    #[error("invalid arrival configuration: {0}")]
    Configuration(String),
    #[error("failed to spawn vehicle {id} ({kind}): {source}")]
    Spawn {
        id: VehicleId,
        kind: VehicleKind,
        #[source]
        source: SpawnError,
    },
    #[error("interarrival sampler failed: {0}")]
    Sampler(#[from] SamplerError),
}

/// Rejected scheduling request on the simulation clock.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClockError {
    #[error("cannot schedule {delay} time units into the past")]
    NegativeDelay { delay: f64 },
    #[error("cannot schedule at non-finite time {0}")]
    NonFinite(f64),
    #[error("cannot schedule at {at}, clock is already at {now}")]
    InPast { at: f64, now: f64 },
}

/// Problems loading or validating scenario configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Umbrella error surfaced by the runner and scenario builder.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Arrival(#[from] ArrivalError),
    #[error(transparent)]
    Clock(#[from] ClockError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("event refers to unknown vehicle entity {0:?}")]
    UnknownVehicle(Entity),
    #[error("lifecycle step for vehicle {vehicle} failed: {reason}")]
    Lifecycle { vehicle: VehicleId, reason: String },
    #[error("missing world resource `{0}`")]
    MissingResource(&'static str),
}
