use reqwest::Url;
use std::time::Duration;
use tracing::warn;

use crate::models::GeoInfo;

const GEO_FIELDS: &str = "status,country,regionName,city,zip,lat,lon,query,isp";
const GEO_TIMEOUT: Duration = Duration::from_secs(3);

// Best-effort IP geolocation against an ip-api compatible endpoint
pub struct GeoLocator {
    client: reqwest::Client,
    base_url: String,
}

impl GeoLocator {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    // <base>/<ip>?fields=..., None when the base url is unusable
    pub fn lookup_url(&self, ip: &str) -> Option<Url> {
        let mut url = Url::parse(&self.base_url).ok()?;
        url.path_segments_mut().ok()?.pop_if_empty().push(ip);
        url.query_pairs_mut().append_pair("fields", GEO_FIELDS);
        Some(url)
    }

    // Never fails - any error degrades to status "unknown"
    pub async fn locate(&self, ip: &str) -> GeoInfo {
        let Some(url) = self.lookup_url(ip) else {
            warn!(base_url = %self.base_url, "geolocation url is invalid");
            return GeoInfo::unknown();
        };

        let result = self
            .client
            .get(url)
            .timeout(GEO_TIMEOUT)
            .send()
            .await;

        match result {
            Ok(res) => match res.json::<GeoInfo>().await {
                Ok(info) => info,
                Err(e) => {
                    warn!(ip, error = %e, "geolocation response unreadable");
                    GeoInfo::unknown()
                }
            },
            Err(e) => {
                warn!(ip, error = %e, "geolocation lookup failed");
                GeoInfo::unknown()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_lookup_url() {
        let geo = GeoLocator::new(reqwest::Client::new(), "http://ip-api.com/json/");
        let url = geo.lookup_url("1.2.3.4").unwrap();
        assert_eq!(url.path(), "/json/1.2.3.4");
        assert_eq!(
            url.query_pairs().collect::<Vec<_>>(),
            vec![("fields".into(), GEO_FIELDS.into())]
        );

        let bare = GeoLocator::new(reqwest::Client::new(), "http://127.0.0.1:9");
        assert_eq!(bare.lookup_url("1.2.3.4").unwrap().path(), "/1.2.3.4");
    }

    #[test]
    fn ip_is_escaped_as_one_path_segment() {
        let geo = GeoLocator::new(reqwest::Client::new(), "http://ip-api.com/json");
        assert_eq!(geo.lookup_url("a b/c").unwrap().path(), "/json/a%20b%2Fc");
        assert_eq!(geo.lookup_url("x?y#z").unwrap().path(), "/json/x%3Fy%23z");
    }

    #[test]
    fn unusable_base_url_has_no_lookup_url() {
        let geo = GeoLocator::new(reqwest::Client::new(), "not a url");
        assert!(geo.lookup_url("1.2.3.4").is_none());
    }

    #[test]
    fn parses_ip_api_response() {
        let info: GeoInfo = serde_json::from_str(
            r#"{"status":"success","country":"Nigeria","regionName":"Lagos","city":"Ikeja",
                "zip":"","lat":6.6,"lon":3.35,"query":"1.2.3.4","isp":"Example ISP"}"#,
        )
        .unwrap();
        assert!(info.is_success());
        assert_eq!(info.region_name.as_deref(), Some("Lagos"));
        assert_eq!(info.lat, Some(6.6));

        let failed: GeoInfo = serde_json::from_str(r#"{"status":"fail"}"#).unwrap();
        assert!(!failed.is_success());
        assert!(!GeoInfo::unknown().is_success());
    }

    #[tokio::test]
    async fn unreachable_endpoint_degrades_to_unknown() {
        let geo = GeoLocator::new(reqwest::Client::new(), "http://127.0.0.1:9");
        assert_eq!(geo.locate("1.2.3.4").await, GeoInfo::unknown());
    }
}
