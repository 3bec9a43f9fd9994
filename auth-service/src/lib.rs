//! Credential storage, JWT issuance and session refresh for the news platform.

pub mod grpc;
pub mod models;
pub mod service;
pub mod storage;
pub mod token;

pub mod proto {
    tonic::include_proto!("auth");
}
