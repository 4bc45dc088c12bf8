use crate::config::Args;
use crate::email::Mailer;
use crate::geo::GeoLocator;
use crate::rate_limit::RateLimiter;
use crate::views::ViewStore;
// app's shared state

pub struct AppState {
    pub rate_limiter: RateLimiter,     // contact form limiter, per client key
    pub mailer: Mailer,
    pub geo: GeoLocator,
    pub views: Option<ViewStore>,      // None unless a database or --record-views is set
}

impl AppState {
    pub fn from_args(args: &Args) -> Self {
        let client = reqwest::Client::new();
        Self {
            rate_limiter: RateLimiter::new(args.rate_limit, args.rate_window_ms()),
            mailer: Mailer::new(client.clone(), args),
            geo: GeoLocator::new(client, &args.geo_api_url),
            views: ViewStore::from_config(args.database_url(), args.record_views),
        }
    }
}

// Current wall-clock time in ms, as fed to the rate limiter
pub fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}
