use clap::Parser;

use crate::rate_limit::{MAX_REQUESTS_PER_WINDOW, WINDOW_DURATION_MS};

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "portfolio-relay")]
#[command(about = "Contact-form relay and visit tracker for a static portfolio site")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    // Rate limit max requests per window
    #[arg(long, default_value_t = MAX_REQUESTS_PER_WINDOW)]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, default_value_t = WINDOW_DURATION_MS / 1000)]
    pub rate_window: u64,

    // How often stale rate limit entries are swept, in seconds (0 = never)
    #[arg(long, default_value_t = 300)]
    pub sweep_interval: u64,

    #[arg(long, env = "BREVO_API_KEY", hide_env_values = true)]
    pub brevo_api_key: Option<String>,

    #[arg(long, env = "BREVO_API_URL", default_value = "https://api.brevo.com/v3/smtp/email")]
    pub brevo_api_url: String,

    // Use a Brevo template for contact mails instead of plain text
    #[arg(long, env = "BREVO_TEMPLATE_ID")]
    pub brevo_template_id: Option<u64>,

    #[arg(long, env = "FROM_EMAIL", default_value = "noreply@example.com")]
    pub from_email: String,

    #[arg(long, env = "TO_EMAIL", default_value = "owner@example.com")]
    pub to_email: String,

    #[arg(long, env = "FROM_NAME", default_value = "Portfolio Contact")]
    pub contact_from_name: String,

    #[arg(long, default_value = "Portfolio Notification")]
    pub notify_from_name: String,

    // ip-api compatible geolocation endpoint
    #[arg(long, env = "GEO_API_URL", default_value = "http://ip-api.com/json")]
    pub geo_api_url: String,

    // Persist visits and view counts to Postgres
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    // Takes precedence over DATABASE_URL
    #[arg(long, env = "NEON_DATABASE_URL", hide_env_values = true)]
    pub neon_database_url: Option<String>,

    // Keep in-memory per-page view counters when no database is configured
    #[arg(long, env = "RECORD_VIEWS", default_value_t = false)]
    pub record_views: bool,
}

impl Args {
    pub fn database_url(&self) -> Option<&str> {
        fn set(url: &Option<String>) -> Option<&str> {
            url.as_deref().filter(|u| !u.is_empty())
        }
        set(&self.neon_database_url).or(set(&self.database_url))
    }

    pub fn rate_window_ms(&self) -> u64 {
        self.rate_window.saturating_mul(1000)
    }
}
