//! Rocket-managed application state: the gRPC clients, the local feed cache/fetcher, and the
//! handful of durations handlers and middleware need. Grounded on the teacher's `AppState`
//! (`mynewslens::server::AppState`) — one struct, `.manage()`d once, handlers and guards reach
//! into it via `&State<AppState>`.

use std::sync::Arc;
use std::time::Duration;

use crate::clients::{AuthClient, NewsClient};
use crate::feed_cache::FeedCache;
use crate::fetcher::FeedFetcher;
use crate::metrics::GatewayMetrics;

pub struct AppState {
    pub auth: AuthClient,
    pub news: NewsClient,
    pub feed_cache: Arc<FeedCache>,
    pub feed_fetcher: Arc<FeedFetcher>,
    pub refresh_ttl: Duration,
    pub request_timeout: Duration,
    pub ws_push_interval: Duration,
    pub metrics: Arc<GatewayMetrics>,
}
