use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::Args;
use crate::models::{ContactParams, EmailPayload, Recipient, Sender};
use crate::validate::ContactForm;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("provider rejected the message with status {status}")]
    Rejected { status: u16, body: Value },

    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

// Brevo transactional email client
pub struct Mailer {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    template_id: Option<u64>,
    from_email: String,
    to_email: String,
    contact_from_name: String,
    notify_from_name: String,
}

impl Mailer {
    pub fn new(client: reqwest::Client, args: &Args) -> Self {
        Self {
            client,
            api_url: args.brevo_api_url.clone(),
            api_key: args.brevo_api_key.clone().filter(|k| !k.is_empty()),
            template_id: args.brevo_template_id,
            from_email: args.from_email.clone(),
            to_email: args.to_email.clone(),
            contact_from_name: args.contact_from_name.clone(),
            notify_from_name: args.notify_from_name.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    // Prefer the template when one is configured, otherwise plain text (never raw HTML)
    pub fn contact_payload(&self, form: &ContactForm) -> EmailPayload {
        let sender = Sender {
            name: self.contact_from_name.clone(),
            email: self.from_email.clone(),
        };
        let to = vec![Recipient {
            email: self.to_email.clone(),
        }];
        let reply_to = Some(Recipient {
            email: form.email.clone(),
        });

        match self.template_id {
            Some(template_id) => EmailPayload {
                sender,
                to,
                subject: None,
                text_content: None,
                template_id: Some(template_id),
                params: Some(ContactParams {
                    name: form.name.clone(),
                    email: form.email.clone(),
                    subject: form.subject.clone(),
                    message: form.message.clone(),
                }),
                reply_to,
            },
            None => EmailPayload {
                sender,
                to,
                subject: Some(format!("[Portfolio Contact] {}", form.subject)),
                text_content: Some(format!(
                    "Name: {}\nEmail: {}\n\n{}",
                    form.name, form.email, form.message
                )),
                template_id: None,
                params: None,
                reply_to,
            },
        }
    }

    pub fn notification_payload(&self, subject: String, text: String) -> EmailPayload {
        EmailPayload {
            sender: Sender {
                name: self.notify_from_name.clone(),
                email: self.from_email.clone(),
            },
            to: vec![Recipient {
                email: self.to_email.clone(),
            }],
            subject: Some(subject),
            text_content: Some(text),
            template_id: None,
            params: None,
            reply_to: None,
        }
    }

    // Callers check is_configured() first; a missing key is reported as a rejection
    pub async fn send(&self, payload: &EmailPayload) -> Result<(), MailError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(MailError::Rejected {
                status: 401,
                body: Value::String("api key not configured".into()),
            });
        };

        let res = self
            .client
            .post(&self.api_url)
            .header("api-key", api_key)
            .json(payload)
            .send()
            .await?;

        let status = res.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "email accepted by provider");
            return Ok(());
        }

        let text = res
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        error!(status = status.as_u16(), body = %body, "Brevo error");

        Err(MailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
