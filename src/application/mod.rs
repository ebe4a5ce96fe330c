// Startup wiring
pub mod bootstrap;

// Scheduled collect-and-report job
pub mod telemetry;
