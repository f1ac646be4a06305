pub mod canonical;
pub mod config;
pub mod dedup;
pub mod enrichment;
pub mod event;
pub mod http;
pub mod persistence;
pub mod pipeline;
pub mod sources;
pub mod text;
pub mod tracing;
pub mod venues;
