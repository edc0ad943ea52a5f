mod feed;
mod ingestion_pipeline;
mod ingestion_service;

pub use feed::*;
pub use ingestion_pipeline::*;
pub use ingestion_service::*;
