// Application layer - Use cases over the domain pipeline
pub mod device_service;
pub mod feed_repository;
pub mod growth_service;
pub mod snapshot_store;
