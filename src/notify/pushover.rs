//! Pushover notification transport.
//!
//! Messages are POSTed as a form to the Pushover messages endpoint.  The
//! response body says whether the message was accepted; the per-application
//! quota comes back in `X-Limit-App-*` headers.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Deserialize;

use super::{DeliveryRequest, Notifier, Receipt};
use crate::error::NotifyError;

const ENDPOINT: &str = "https://api.pushover.net/1/messages.json";

const LIMIT_HEADER: &str = "x-limit-app-limit";
const REMAINING_HEADER: &str = "x-limit-app-remaining";

/// Sends notifications to one Pushover user or group.
#[derive(Debug, Clone)]
pub struct PushoverClient {
    client: reqwest::Client,
    app_token: String,
    recipient: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: i64,
    #[serde(default)]
    request: String,
    #[serde(default)]
    errors: Vec<String>,
}

impl PushoverClient {
    pub fn new(
        app_token: impl Into<String>,
        recipient: impl Into<String>,
        user_agent: &str,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            client,
            app_token: app_token.into(),
            recipient: recipient.into(),
        })
    }

    fn form_fields(&self, request: &DeliveryRequest) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("token", self.app_token.clone()),
            ("user", self.recipient.clone()),
            ("title", request.title.clone()),
            ("message", request.body.clone()),
            ("html", "1".to_string()),
            ("timestamp", request.timestamp.timestamp().to_string()),
        ];
        if let Some(url) = &request.url {
            fields.push(("url", url.clone()));
        }
        fields
    }
}

#[async_trait]
impl Notifier for PushoverClient {
    async fn send(&self, request: &DeliveryRequest) -> Result<Receipt, NotifyError> {
        let response = self
            .client
            .post(ENDPOINT)
            .form(&self.form_fields(request))
            .send()
            .await?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        interpret_response(status, &headers, &body)
    }
}

/// Turn a raw Pushover reply into a [`Receipt`] or a rejection.
fn interpret_response(
    status: u16,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Receipt, NotifyError> {
    let parsed: ApiResponse = match serde_json::from_slice(body) {
        Ok(parsed) => parsed,
        // A non-JSON error page still deserves the HTTP status in the error.
        Err(_) if !(200..300).contains(&status) => {
            return Err(NotifyError::Rejected {
                status,
                errors: vec![String::from_utf8_lossy(body).trim().to_string()],
            });
        }
        Err(e) => return Err(e.into()),
    };

    if parsed.status != 1 || !(200..300).contains(&status) {
        return Err(NotifyError::Rejected {
            status,
            errors: parsed.errors,
        });
    }

    Ok(Receipt {
        id: parsed.request,
        remaining: header_u32(headers, REMAINING_HEADER),
        limit: header_u32(headers, LIMIT_HEADER),
    })
}

fn header_u32(headers: &HeaderMap, name: &str) -> Option<u32> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}
