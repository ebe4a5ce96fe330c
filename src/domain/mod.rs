pub mod errors;
pub mod ports;
pub mod repositories;
pub mod telemetry;
