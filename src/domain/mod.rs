// Domain layer - Telemetry tables and the growth-curve pipeline stages
pub mod columns;
pub mod device;
pub mod estimate;
pub mod growth;
pub mod retention;
pub mod snapshot;
pub mod table;
pub mod tube;

#[cfg(test)]
pub mod test_support;
