use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::error::AppError;
use crate::models::ContactRequest;

pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_SUBJECT_CHARS: usize = 150;
pub const MAX_MESSAGE_CHARS: usize = 5000;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

// Trimmed, checked contact form
#[derive(Debug, Clone, PartialEq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

// String form of a submitted value; null, false, 0 and "" count as missing
pub fn coerce(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::Null => String::new(),
                    Value::String(s) => s.clone(),
                    other => coerce(other).unwrap_or_else(|| other.to_string()),
                })
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some("[object Object]".to_string()),
    }
}

fn required(field: &Option<Value>) -> Option<String> {
    field.as_ref().and_then(coerce)
}

pub fn contact_form(req: &ContactRequest) -> Result<ContactForm, AppError> {
    let (Some(name), Some(email), Some(subject), Some(message)) = (
        required(&req.name),
        required(&req.email),
        required(&req.subject),
        required(&req.message),
    ) else {
        return Err(AppError::Validation("Missing required fields".into()));
    };

    let form = ContactForm {
        name: name.trim().to_string(),
        email: email.trim().to_string(),
        subject: subject.trim().to_string(),
        message: message.trim().to_string(),
    };

    if form.name.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::Validation(format!(
            "Name too long (max {MAX_NAME_CHARS} chars)"
        )));
    }
    if form.subject.chars().count() > MAX_SUBJECT_CHARS {
        return Err(AppError::Validation(format!(
            "Subject too long (max {MAX_SUBJECT_CHARS} chars)"
        )));
    }
    if form.message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "Message too long (max {MAX_MESSAGE_CHARS} chars)"
        )));
    }
    if !is_valid_email(&form.email) {
        return Err(AppError::Validation("Invalid email address".into()));
    }

    Ok(form)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(&email.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(name: &str, email: &str, subject: &str, message: &str) -> ContactRequest {
        ContactRequest {
            name: Some(json!(name)),
            email: Some(json!(email)),
            subject: Some(json!(subject)),
            message: Some(json!(message)),
        }
    }

    fn message_of(err: AppError) -> String {
        err.to_string()
    }

    #[test]
    fn accepts_and_trims_valid_form() {
        let form = contact_form(&request(" Ada ", " ada@example.com ", " Hi ", " Hello\n")).unwrap();
        assert_eq!(
            form,
            ContactForm {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                subject: "Hi".into(),
                message: "Hello".into(),
            }
        );
    }

    #[test]
    fn missing_or_empty_fields_are_rejected() {
        let mut req = request("Ada", "ada@example.com", "Hi", "Hello");
        req.subject = None;
        assert_eq!(message_of(contact_form(&req).unwrap_err()), "Missing required fields");

        let req = request("Ada", "", "Hi", "Hello");
        assert_eq!(message_of(contact_form(&req).unwrap_err()), "Missing required fields");
    }

    #[test]
    fn scalars_are_coerced_like_form_values() {
        assert_eq!(coerce(&json!(42)), Some("42".to_string()));
        assert_eq!(coerce(&json!(1.5)), Some("1.5".to_string()));
        assert_eq!(coerce(&json!(true)), Some("true".to_string()));
        assert_eq!(coerce(&json!(["a", 1, null])), Some("a,1,".to_string()));
        assert_eq!(coerce(&json!({"k": 1})), Some("[object Object]".to_string()));
        assert_eq!(coerce(&json!(0)), None);
        assert_eq!(coerce(&json!(false)), None);
        assert_eq!(coerce(&json!(null)), None);
        assert_eq!(coerce(&json!("")), None);
    }

    #[test]
    fn numeric_name_is_accepted() {
        let req = ContactRequest::from_body(json!({
            "name": 42,
            "email": "a@b.co",
            "subject": "s",
            "message": "m"
        }));
        assert_eq!(contact_form(&req).unwrap().name, "42");
    }

    #[test]
    fn non_object_bodies_have_no_fields() {
        for body in [json!(null), json!([1, 2, 3, 4]), json!(5), json!("text")] {
            let err = contact_form(&ContactRequest::from_body(body)).unwrap_err();
            assert_eq!(message_of(err), "Missing required fields");
        }
    }

    #[test]
    fn length_limits() {
        let long_name = "a".repeat(101);
        let err = contact_form(&request(&long_name, "a@b.co", "Hi", "Hello")).unwrap_err();
        assert_eq!(message_of(err), "Name too long (max 100 chars)");

        let long_subject = "s".repeat(151);
        let err = contact_form(&request("Ada", "a@b.co", &long_subject, "Hello")).unwrap_err();
        assert_eq!(message_of(err), "Subject too long (max 150 chars)");

        let long_message = "m".repeat(5001);
        let err = contact_form(&request("Ada", "a@b.co", "Hi", &long_message)).unwrap_err();
        assert_eq!(message_of(err), "Message too long (max 5000 chars)");

        // limits count characters, not bytes
        let accented = "é".repeat(100);
        assert!(contact_form(&request(&accented, "a@b.co", "Hi", "Hello")).is_ok());
    }

    #[test]
    fn email_format() {
        assert!(is_valid_email("someone@example.com"));
        assert!(is_valid_email("A.B@Sub.Example.org"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email("a@example"));
        assert!(!is_valid_email("a@.com"));
        assert!(!is_valid_email("a@example."));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@b\tc.com"));

        let err = contact_form(&request("Ada", "nope", "Hi", "Hello")).unwrap_err();
        assert_eq!(message_of(err), "Invalid email address");
    }
}
