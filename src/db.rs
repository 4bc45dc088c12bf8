use tokio_postgres::NoTls;
use tracing::warn;

use crate::views::VisitRecord;

const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS case_study_counts (
    slug TEXT PRIMARY KEY,
    title TEXT,
    views BIGINT DEFAULT 0,
    updated_at TIMESTAMPTZ DEFAULT now()
);
CREATE TABLE IF NOT EXISTS visits (
    id BIGSERIAL PRIMARY KEY,
    case_study_slug TEXT,
    case_study_title TEXT,
    ip TEXT,
    city TEXT,
    region TEXT,
    country TEXT,
    lat DOUBLE PRECISION,
    lon DOUBLE PRECISION,
    isp TEXT,
    user_agent TEXT,
    referrer TEXT,
    created_at TIMESTAMPTZ DEFAULT now()
);";

const UPSERT_COUNT: &str = "
INSERT INTO case_study_counts (slug, title, views, updated_at)
VALUES ($1, $2, 1, now())
ON CONFLICT (slug) DO UPDATE SET views = case_study_counts.views + 1, updated_at = now()
RETURNING views";

const INSERT_VISIT: &str = "
INSERT INTO visits (case_study_slug, case_study_title, ip, city, region, country, lat, lon, isp, user_agent, referrer, created_at)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)";

// Visit rows and per-page counters in Postgres, one connection per visit
pub struct PgVisitStore {
    database_url: String,
}

impl PgVisitStore {
    pub fn new(database_url: &str) -> Self {
        Self {
            database_url: database_url.to_string(),
        }
    }

    // Upsert the page counter, insert the visit row, return the page's total views
    pub async fn record(&self, visit: &VisitRecord) -> Result<u64, tokio_postgres::Error> {
        let (client, connection) = tokio_postgres::connect(&self.database_url, NoTls).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!(error = %e, "postgres connection closed with error");
            }
        });

        client.batch_execute(CREATE_TABLES).await?;

        let row = client
            .query_one(UPSERT_COUNT, &[&visit.slug, &visit.title])
            .await?;
        let views: i64 = row.get(0);

        client
            .execute(
                INSERT_VISIT,
                &[
                    &visit.slug,
                    &visit.title,
                    &visit.ip,
                    &visit.geo.city,
                    &visit.geo.region_name,
                    &visit.geo.country,
                    &visit.geo.lat,
                    &visit.geo.lon,
                    &visit.geo.isp,
                    &visit.user_agent,
                    &visit.referrer,
                    &visit.created_at,
                ],
            )
            .await?;

        Ok(u64::try_from(views).unwrap_or(0))
    }
}
