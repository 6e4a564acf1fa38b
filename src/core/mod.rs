pub mod cache;
pub mod dedup;
pub mod endpoints;
pub mod fetcher;
pub mod query;
pub mod recommend;
pub mod response;
pub mod scoring;
pub mod service;

pub use crate::domain::ports::{
    AreaRepository, CountSource, LocationSource, ProfileProvider, SnapshotRepository,
    TextGenerator,
};
pub use crate::utils::error::Result;
