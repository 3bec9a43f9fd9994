//! RSS crawling, article canonicalization and per-user submissions, served over gRPC.

pub mod article_store;
pub mod fetcher;
pub mod grpc;
pub mod item_handler;
pub mod link_cache;
pub mod models;
pub mod processor;
pub mod source_store;

pub mod proto {
    tonic::include_proto!("news");
}
