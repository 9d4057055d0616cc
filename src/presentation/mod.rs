// Presentation layer - HTTP surface over the growth pipeline
pub mod app_state;
pub mod handlers;
pub mod routes;
