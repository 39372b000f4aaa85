// Application layer - Store, ingestion protocol and publishing seam
pub mod connections;
pub mod ingestion_service;
pub mod snapshot_publisher;
pub mod telemetry_store;
