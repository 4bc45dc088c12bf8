use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{info, warn};

use crate::db::PgVisitStore;
use crate::models::GeoInfo;

// Everything recorded about a single page view
#[derive(Debug, Clone)]
pub struct VisitRecord {
    pub slug: String,
    pub title: String,
    pub ip: String,
    pub geo: GeoInfo,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Per-page view counters, keyed by slug
#[derive(Default)]
pub struct ViewCounter {
    counts: DashMap<String, u64>,
}

impl ViewCounter {
    pub fn new() -> Self {
        Self::default()
    }

    // Bump the page's counter and return the total including this visit
    pub fn record(&self, visit: &VisitRecord) -> u64 {
        let total = {
            let mut count = self.counts.entry(visit.slug.clone()).or_insert(0);
            *count += 1;
            *count
        };

        info!(
            slug = %visit.slug,
            title = %visit.title,
            ip = %visit.ip,
            city = visit.geo.city.as_deref().unwrap_or("-"),
            country = visit.geo.country.as_deref().unwrap_or("-"),
            user_agent = visit.user_agent.as_deref().unwrap_or("-"),
            referrer = visit.referrer.as_deref().unwrap_or("-"),
            created_at = %visit.created_at.to_rfc3339(),
            views = total,
            "visit recorded"
        );
        total
    }

    pub fn views(&self, slug: &str) -> u64 {
        self.counts.get(slug).map(|c| *c).unwrap_or(0)
    }
}

// Where page views go: Postgres when a database is configured, else process memory
pub enum ViewStore {
    Postgres(PgVisitStore),
    Memory(ViewCounter),
}

impl ViewStore {
    pub fn from_config(database_url: Option<&str>, record_views: bool) -> Option<Self> {
        match database_url {
            Some(url) => Some(ViewStore::Postgres(PgVisitStore::new(url))),
            None => record_views.then(|| ViewStore::Memory(ViewCounter::new())),
        }
    }

    // Total views for the page, None when persistence failed; never fails the visit
    pub async fn record(&self, visit: &VisitRecord) -> Option<u64> {
        match self {
            ViewStore::Postgres(db) => match db.record(visit).await {
                Ok(total) => Some(total),
                Err(e) => {
                    warn!(error = %e, slug = %visit.slug, "visit persistence skipped or failed");
                    None
                }
            },
            ViewStore::Memory(counter) => Some(counter.record(visit)),
        }
    }
}

// "Case Study: Foo!" -> "case-study-foo", empty -> "page"
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "page".to_string()
    } else {
        slug
    }
}
