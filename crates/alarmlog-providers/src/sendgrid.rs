//! SendGrid v3 mail transport.

use alarmlog_core::{ComposedEmail, DeliveryReceipt, EmailTransport, NotifierError, Sender};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error};

const SENDGRID_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";
const MESSAGE_ID_HEADER: &str = "x-message-id";

#[derive(thiserror::Error, Debug)]
pub enum SendGridError {
    #[error("SendGrid API error {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'static str,
    value: &'a str,
}

#[derive(Serialize)]
struct MailRequest<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: &'a Sender,
    subject: &'a str,
    content: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_args: Option<&'a Map<String, Value>>,
}

impl<'a> MailRequest<'a> {
    fn from_email(email: &'a ComposedEmail) -> Self {
        Self {
            personalizations: vec![Personalization {
                to: email.to.iter().map(|a| Address { email: a }).collect(),
            }],
            from: &email.from,
            subject: &email.subject,
            content: vec![Content {
                content_type: "text/html",
                value: &email.html,
            }],
            custom_args: email.custom_args.as_ref(),
        }
    }
}

/// Sends composed emails through the SendGrid API.
pub struct SendGridClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl SendGridClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(api_key, SENDGRID_API_URL)
    }

    /// Targets a different mail-send endpoint, such as a local relay.
    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl EmailTransport for SendGridClient {
    async fn send(&self, email: &ComposedEmail) -> Result<DeliveryReceipt, NotifierError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&MailRequest::from_email(email))
            .send()
            .await
            .map_err(NotifierError::transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "SendGrid rejected message");
            return Err(NotifierError::transport(SendGridError::Rejected {
                status: status.as_u16(),
                body,
            }));
        }

        let message_id = response
            .headers()
            .get(MESSAGE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        debug!(status = status.as_u16(), ?message_id, "SendGrid accepted message");
        Ok(DeliveryReceipt {
            status: status.as_u16(),
            message_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alarmlog_core::ErrorKind;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn email() -> ComposedEmail {
        ComposedEmail {
            from: Sender {
                name: "AWS Lambda".into(),
                address: "alerts@example.com".into(),
            },
            to: vec!["a@example.com".into(), "b@example.com".into()],
            subject: "ALARM: \"test alarm\"".into(),
            html: "<pre>log</pre>".into(),
            custom_args: Some(json!({"team": "ops"}).as_object().unwrap().clone()),
        }
    }

    #[test]
    fn test_request_body_shape() {
        let email = email();
        let body = serde_json::to_value(MailRequest::from_email(&email)).unwrap();
        assert_eq!(
            body,
            json!({
                "personalizations": [{"to": [{"email": "a@example.com"}, {"email": "b@example.com"}]}],
                "from": {"name": "AWS Lambda", "email": "alerts@example.com"},
                "subject": "ALARM: \"test alarm\"",
                "content": [{"type": "text/html", "value": "<pre>log</pre>"}],
                "custom_args": {"team": "ops"}
            })
        );
    }

    #[test]
    fn test_custom_args_omitted_when_absent() {
        let mut email = email();
        email.custom_args = None;
        let body = serde_json::to_value(MailRequest::from_email(&email)).unwrap();
        assert!(body.get("custom_args").is_none());
    }

    type Captured = Arc<Mutex<Vec<(Option<String>, Value)>>>;

    /// Starts a local mail-send endpoint answering with `status`.
    async fn serve(status: StatusCode) -> (String, Captured) {
        let captured: Captured = Arc::default();
        let sink = captured.clone();
        let app = Router::new().route(
            "/v3/mail/send",
            post(move |headers: HeaderMap, Json(body): Json<Value>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                sink.lock().unwrap().push((auth, body));
                (status, [("x-message-id", "abc123")], "rejected: bad sender")
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (format!("http://{addr}/v3/mail/send"), captured)
    }

    #[tokio::test]
    async fn test_accepted_message_returns_receipt() {
        let (endpoint, captured) = serve(StatusCode::ACCEPTED).await;
        let client = SendGridClient::with_endpoint("SG.key", endpoint);

        let receipt = client.send(&email()).await.unwrap();
        assert_eq!(receipt.status, 202);
        assert_eq!(receipt.message_id.as_deref(), Some("abc123"));

        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].0.as_deref(), Some("Bearer SG.key"));
        assert_eq!(captured[0].1["subject"], "ALARM: \"test alarm\"");
    }

    #[tokio::test]
    async fn test_rejected_message_is_transport_failure() {
        let (endpoint, _) = serve(StatusCode::FORBIDDEN).await;
        let client = SendGridClient::with_endpoint("SG.key", endpoint);

        let err = client.send(&email()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
        assert_eq!(
            err.to_string(),
            "Email transport failed: SendGrid API error 403: rejected: bad sender"
        );
    }
}
