//! HTTP+WebSocket surface: composes auth-service and news-service over gRPC behind a
//! bounded, ordered read-through cache (`FeedCache`).

pub mod clients;
pub mod cors;
pub mod envelope;
pub mod feed_cache;
pub mod fetcher;
pub mod identity;
pub mod metrics;
pub mod models;
pub mod routes;
pub mod state;
pub mod ws;

pub mod proto {
    pub mod auth {
        tonic::include_proto!("auth");
    }
    pub mod news {
        tonic::include_proto!("news");
    }
}
