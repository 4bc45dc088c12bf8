use serde::{Deserialize, Serialize};
use serde_json::Value;

// Contact form submission; fields are coerced to strings during validation
#[derive(Deserialize, Debug, Default, Clone)]
pub struct ContactRequest {
    pub name: Option<Value>,
    pub email: Option<Value>,
    pub subject: Option<Value>,
    pub message: Option<Value>,
}

impl ContactRequest {
    // Anything but a JSON object carries no fields
    pub fn from_body(body: Value) -> Self {
        match body {
            Value::Object(_) => serde_json::from_value(body).unwrap_or_default(),
            _ => Self::default(),
        }
    }
}

// Page-view ping sent by the site
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VisitRequest {
    pub case_study: Option<String>,
    pub page: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    // per-browser counter kept by the site, any JSON value
    pub visitor_count: Option<serde_json::Value>,
    pub ip: Option<String>,
}

impl VisitRequest {
    // Empty strings carry no information; treat them as absent
    pub fn normalized(self) -> Self {
        let present = |v: Option<String>| v.filter(|s| !s.is_empty());
        Self {
            case_study: present(self.case_study),
            page: present(self.page),
            referrer: present(self.referrer),
            user_agent: present(self.user_agent),
            visitor_count: self.visitor_count,
            ip: present(self.ip),
        }
    }
}

// Brevo transactional email API request format
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Sender {
    pub name: String,
    pub email: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Recipient {
    pub email: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ContactParams {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmailPayload {
    pub sender: Sender,
    pub to: Vec<Recipient>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<ContactParams>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<Recipient>,
}

// ip-api.com response; every field is optional on failure
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeoInfo {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub region_name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub isp: Option<String>,
}

impl GeoInfo {
    pub fn unknown() -> Self {
        Self {
            status: Some("unknown".to_string()),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}
