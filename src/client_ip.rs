use axum::http::HeaderMap;

pub const UNKNOWN_CLIENT: &str = "unknown";

const FORWARDED_HEADERS: [&str; 2] = ["x-forwarded-for", "x-nf-client-connection-ip"];

// First address of the forwarded chain, if any
pub fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let raw = FORWARDED_HEADERS
        .iter()
        .find_map(|name| {
            headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
        })?;

    let first = raw.split(',').next().unwrap_or("").trim();
    if first.is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}

// Rate limit key for a request, "unknown" when nothing was forwarded
pub fn client_key(headers: &HeaderMap) -> String {
    forwarded_ip(headers).unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}
