use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::USER_AGENT},
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::client_ip::{UNKNOWN_CLIENT, forwarded_ip};
use crate::email::MailError;
use crate::error::{AppError, Result};
use crate::metrics::{EMAIL_FAILURES, EMAILS_SENT, VISITS, VISITS_IGNORED};
use crate::models::{GeoInfo, VisitRequest};
use crate::state::AppState;
use crate::views::{VisitRecord, slugify};

const BOT_SIGNATURES: [&str; 6] = [
    "bot",
    "crawl",
    "spider",
    "slurp",
    "bingpreview",
    "mediapartners-google",
];

fn is_bot(user_agent: &str) -> bool {
    BOT_SIGNATURES.iter().any(|sig| user_agent.contains(sig))
}

// Campaign links are not organic traffic
fn has_utm(params: &HashMap<String, String>) -> bool {
    params.keys().any(|key| key.starts_with("utm_"))
}

fn ignored(reason: &str) -> (StatusCode, Json<Value>) {
    VISITS_IGNORED.inc();
    debug!(reason, "visit ignored");
    (
        StatusCode::NO_CONTENT,
        Json(json!({ "ok": true, "ignored": reason })),
    )
}

// Plain-text notification body, one fact per line
pub fn notification_text(
    visit: &VisitRequest,
    ip: &str,
    geo: &GeoInfo,
    user_agent: &str,
    total_views: Option<u64>,
    timestamp: &str,
) -> String {
    let dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    let coord = |v: Option<f64>| v.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());

    let mut lines = Vec::new();
    lines.push(format!("Page: {}", visit.page.as_deref().unwrap_or("unknown")));
    if let Some(case_study) = &visit.case_study {
        lines.push(format!("Case Study: {case_study}"));
    }
    lines.push(format!(
        "Visitor IP: {}",
        geo.query.as_deref().unwrap_or(ip)
    ));
    if geo.is_success() {
        lines.push(format!(
            "Location: {}, {}, {} ({}, {})",
            dash(&geo.city),
            dash(&geo.region_name),
            dash(&geo.country),
            coord(geo.lat),
            coord(geo.lon)
        ));
        lines.push(format!("ISP: {} | ZIP: {} ", dash(&geo.isp), dash(&geo.zip)));
    }
    lines.push(format!(
        "Referrer: {}",
        visit.referrer.as_deref().unwrap_or("direct / none")
    ));
    lines.push(format!(
        "User Agent: {}",
        if user_agent.is_empty() { "unknown" } else { user_agent }
    ));
    let visitor_count = match &visit.visitor_count {
        Some(Value::String(s)) => s.clone(),
        Some(v) => v.to_string(),
        None => "unknown".to_string(),
    };
    lines.push(format!("Visitor view count (this browser): {visitor_count}"));
    if let Some(total) = total_views {
        lines.push(format!("Total views (all visitors): {total}"));
    }
    lines.push("---".to_string());
    lines.push(format!("Timestamp: {timestamp}"));
    lines.join("\n")
}

// 2026-01-01T00:00:00.000Z
pub fn notification_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn notification_subject(visit: &VisitRequest) -> String {
    match &visit.case_study {
        Some(case_study) => format!("Portfolio Visit \u{2014} {case_study}"),
        None => "Portfolio Visit".to_string(),
    }
}

pub async fn track_visit_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>)> {
    VISITS.inc();

    let visit: VisitRequest = if body.is_empty() {
        VisitRequest::default()
    } else {
        serde_json::from_slice::<VisitRequest>(&body)
            .map_err(|_| AppError::InvalidJson)?
            .normalized()
    };

    let Some(title) = visit.case_study.clone().or_else(|| visit.page.clone()) else {
        return Err(AppError::Validation("Missing page or caseStudy".into()));
    };

    let header_ua = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let user_agent = visit
        .user_agent
        .clone()
        .unwrap_or_else(|| header_ua.to_string());
    if is_bot(&user_agent.to_lowercase()) {
        return Ok(ignored("bot"));
    }
    if has_utm(&params) {
        return Ok(ignored("utm"));
    }

    let ip = forwarded_ip(&headers)
        .or_else(|| visit.ip.clone())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

    let geo = state.geo.locate(&ip).await;

    let total_views = match &state.views {
        Some(views) => {
            let record = VisitRecord {
                slug: slugify(&title),
                title: title.clone(),
                ip: geo.query.clone().unwrap_or_else(|| ip.clone()),
                geo: geo.clone(),
                user_agent: Some(user_agent.clone()).filter(|ua| !ua.is_empty()),
                referrer: visit.referrer.clone(),
                created_at: Utc::now(),
            };
            views.record(&record).await
        }
        None => None,
    };

    if !state.mailer.is_configured() {
        warn!("visit not reported, BREVO_API_KEY is not set");
        return Err(AppError::NotConfigured(
            "Server: BREVO_API_KEY not set".into(),
        ));
    }

    let text = notification_text(
        &visit,
        &ip,
        &geo,
        &user_agent,
        total_views,
        &notification_timestamp(Utc::now()),
    );
    let email = state
        .mailer
        .notification_payload(notification_subject(&visit), text);

    match state.mailer.send(&email).await {
        Ok(()) => {
            EMAILS_SENT.inc();
            Ok((StatusCode::OK, Json(json!({ "ok": true }))))
        }
        Err(MailError::Rejected { status, .. }) => {
            EMAIL_FAILURES.inc();
            error!(status, "Brevo send failed");
            Err(AppError::Notification)
        }
        Err(MailError::Transport(e)) => {
            EMAIL_FAILURES.inc();
            error!(error = %e, "Track-visit error");
            Err(AppError::Server)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_bot_user_agents() {
        assert!(is_bot("mozilla/5.0 (compatible; googlebot/2.1)"));
        assert!(is_bot("mediapartners-google"));
        assert!(!is_bot("mozilla/5.0 (x11; linux x86_64) firefox/120.0"));
    }

    #[test]
    fn detects_utm_parameters() {
        let params = |pairs: &[(&str, &str)]| -> HashMap<String, String> {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        assert!(has_utm(&params(&[("utm_source", "twitter")])));
        assert!(has_utm(&params(&[("ref", "home"), ("utm_campaign", "launch")])));
        assert!(!has_utm(&params(&[("ref", "utm_source")])));
        assert!(!has_utm(&HashMap::new()));
    }

    #[test]
    fn timestamp_has_millis_and_z() {
        let now = DateTime::parse_from_rfc3339("2026-03-04T05:06:07.123456789+00:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(notification_timestamp(now), "2026-03-04T05:06:07.123Z");
    }

    #[test]
    fn empty_strings_are_absent() {
        let visit: VisitRequest = serde_json::from_value(json!({
            "caseStudy": "",
            "page": "/about",
            "userAgent": "",
            "referrer": ""
        }))
        .unwrap();
        let visit = visit.normalized();
        assert_eq!(visit.case_study, None);
        assert_eq!(visit.page.as_deref(), Some("/about"));
        assert_eq!(visit.user_agent, None);
        assert_eq!(notification_subject(&visit), "Portfolio Visit");
        assert!(!notification_text(&visit, "ip", &GeoInfo::unknown(), "", None, "ts")
            .contains("Case Study"));
    }

    #[test]
    fn subject_mentions_case_study() {
        let mut visit = VisitRequest::default();
        assert_eq!(notification_subject(&visit), "Portfolio Visit");
        visit.case_study = Some("Payments".into());
        assert_eq!(notification_subject(&visit), "Portfolio Visit \u{2014} Payments");
    }

    #[test]
    fn text_without_geo() {
        let visit = VisitRequest {
            page: Some("/work".into()),
            visitor_count: Some(json!(3)),
            ..VisitRequest::default()
        };
        let text = notification_text(
            &visit,
            "1.2.3.4",
            &GeoInfo::unknown(),
            "",
            None,
            "2026-01-01T00:00:00+00:00",
        );
        assert_eq!(
            text,
            "Page: /work\n\
             Visitor IP: 1.2.3.4\n\
             Referrer: direct / none\n\
             User Agent: unknown\n\
             Visitor view count (this browser): 3\n\
             ---\n\
             Timestamp: 2026-01-01T00:00:00+00:00"
        );
    }

    #[test]
    fn text_with_geo_and_totals() {
        let visit = VisitRequest {
            case_study: Some("Payments".into()),
            referrer: Some("https://example.com".into()),
            ..VisitRequest::default()
        };
        let geo = GeoInfo {
            status: Some("success".into()),
            city: Some("Ikeja".into()),
            region_name: Some("Lagos".into()),
            country: Some("Nigeria".into()),
            lat: Some(6.5),
            lon: Some(3.25),
            query: Some("9.9.9.9".into()),
            isp: Some("ISP".into()),
            zip: None,
        };
        let text = notification_text(&visit, "1.2.3.4", &geo, "firefox", Some(12), "ts");
        assert!(text.starts_with("Page: unknown\nCase Study: Payments\nVisitor IP: 9.9.9.9\n"));
        assert!(text.contains("Location: Ikeja, Lagos, Nigeria (6.5, 3.25)\n"));
        assert!(text.contains("ISP: ISP | ZIP: - \n"));
        assert!(text.contains("Referrer: https://example.com\n"));
        assert!(text.contains("User Agent: firefox\n"));
        assert!(text.contains("Visitor view count (this browser): unknown\n"));
        assert!(text.contains("Total views (all visitors): 12\n"));
    }
}
