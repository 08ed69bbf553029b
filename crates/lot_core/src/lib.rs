pub mod arrivals;
pub mod clock;
pub mod distributions;
pub mod ecs;
pub mod error;
pub mod events;
pub mod factory;
pub mod pools;
pub mod runner;
pub mod scenario;
pub mod systems;
#[cfg(feature = "test-helpers")]
pub mod test_helpers;
