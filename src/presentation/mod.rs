// Presentation layer - HTTP routes and the ingestion WebSocket
pub mod app_state;
pub mod handlers;
pub mod websocket;
