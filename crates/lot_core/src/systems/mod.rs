pub mod arrivals;
pub mod lifecycle;
