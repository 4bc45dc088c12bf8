use lazy_static::lazy_static;
use prometheus::{
    Counter, Encoder, Gauge, Histogram, TextEncoder, register_counter, register_gauge,
    register_histogram,
};

lazy_static! {
    pub static ref CONTACT_REQUESTS: Counter =
        register_counter!("portfolio_contact_requests_total", "Total contact form submissions").unwrap();
    pub static ref RATE_LIMITED: Counter =
        register_counter!("portfolio_rate_limited_total", "Contact submissions denied by the rate limiter").unwrap();
    pub static ref EMAILS_SENT: Counter =
        register_counter!("portfolio_emails_sent_total", "Emails accepted by the provider").unwrap();
    pub static ref EMAIL_FAILURES: Counter =
        register_counter!("portfolio_email_failures_total", "Emails rejected or not delivered").unwrap();
    pub static ref VISITS: Counter =
        register_counter!("portfolio_visits_total", "Total page-view pings").unwrap();
    pub static ref VISITS_IGNORED: Counter =
        register_counter!("portfolio_visits_ignored_total", "Page-view pings dropped as bot or campaign traffic").unwrap();
    pub static ref RATE_LIMITER_KEYS: Gauge =
        register_gauge!("portfolio_rate_limiter_keys", "Client keys currently tracked by the rate limiter").unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "portfolio_request_latency_seconds",
        "Handler latency in seconds"
    )
    .unwrap();
}

// Text exposition of everything in the default registry
pub fn render() -> Result<String, String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| e.to_string())?;
    String::from_utf8(buffer).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_metrics_show_up_in_render() {
        CONTACT_REQUESTS.inc();
        RATE_LIMITER_KEYS.set(3.0);
        let text = render().unwrap();
        assert!(text.contains("portfolio_contact_requests_total"));
        assert!(text.contains("portfolio_rate_limiter_keys"));
    }
}
