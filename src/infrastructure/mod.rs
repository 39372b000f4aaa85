// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod file_publisher;
pub mod wire;
