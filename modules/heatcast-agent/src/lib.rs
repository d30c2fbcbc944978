pub mod agent;
pub mod dedup;
pub mod events;
pub mod judge;
pub mod scoring;
pub mod sink;
pub mod sources;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
