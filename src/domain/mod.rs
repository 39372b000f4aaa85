// Domain layer - Pure telemetry model and conversions
pub mod anomaly;
pub mod constants;
pub mod efficiency;
pub mod normalizer;
pub mod raw;
pub mod snapshot;
