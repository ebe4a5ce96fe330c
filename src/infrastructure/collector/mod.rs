pub mod client;

pub use client::{CLIENT_SOURCE_HEADER, HttpTelemetryPublisher};
