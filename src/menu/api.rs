use crate::menu::config::{endpoints, get_platform, BillingConfig, APPLICATION_ID, BILLING_TIMEOUT_SECS};
use crate::menu::types::{BillingError, SessionHandle};
use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

/// External purchase service the verifier talks to
#[async_trait]
pub trait PurchaseService: Send + Sync {
    async fn open_session(&self) -> Result<SessionHandle, BillingError>;

    /// Product identifiers owned by the current user, in service order
    async fn list_purchases(&self, session: &SessionHandle) -> Result<Vec<String>, BillingError>;

    /// Best effort; failures are logged by the implementation
    async fn close_session(&self, session: SessionHandle);
}

// ============================================================================
// Common Response Types
// ============================================================================

/// Error object returned by the server
#[derive(Deserialize, Debug, Clone)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

/// Envelope every purchase server response uses
#[derive(Deserialize, Debug)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
    pub timestamp: Option<String>,
    pub signature: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.message.clone())
    }

    pub fn error_code(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.code.clone())
    }
}

// ============================================================================
// Open Session
// ============================================================================

#[derive(Serialize)]
pub struct OpenSessionRequest {
    pub install_id: String,
    pub package_name: String,
    pub platform: String,
    pub app_version: String,
}

#[derive(Deserialize, Debug)]
pub struct OpenSessionData {
    pub session_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

// ============================================================================
// List Purchases
// ============================================================================

#[derive(Serialize)]
pub struct ListPurchasesRequest {
    pub session_token: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PurchaseRecord {
    pub product_id: String,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub purchase_time: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Debug)]
pub struct ListPurchasesData {
    #[serde(default)]
    pub purchases: Vec<PurchaseRecord>,
}

impl ListPurchasesData {
    pub fn product_ids(&self) -> Vec<String> {
        self.purchases.iter().map(|p| p.product_id.clone()).collect()
    }
}

// ============================================================================
// Close Session
// ============================================================================

#[derive(Serialize)]
pub struct CloseSessionRequest {
    pub session_token: String,
}

// ============================================================================
// Signatures
// ============================================================================

/// Bytes the server signs for a purchase list
pub fn signed_payload(timestamp: &str, product_ids: &[String]) -> String {
    format!("{}:{}", timestamp, product_ids.join(","))
}

/// Check a base64 Ed25519 signature against a base64 public key
pub fn verify_signature(
    public_key_b64: &str,
    payload: &str,
    signature_b64: &str,
) -> Result<(), BillingError> {
    let engine = base64::engine::general_purpose::STANDARD;

    let key_bytes: [u8; 32] = engine
        .decode(public_key_b64)
        .ok()
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(BillingError::SignatureInvalid)?;
    let key = VerifyingKey::from_bytes(&key_bytes).map_err(|_| BillingError::SignatureInvalid)?;

    let sig_bytes: [u8; 64] = engine
        .decode(signature_b64)
        .ok()
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(BillingError::SignatureInvalid)?;
    let signature = Signature::from_bytes(&sig_bytes);

    key.verify(payload.as_bytes(), &signature)
        .map_err(|_| BillingError::SignatureInvalid)
}

/// Map a server error code onto the billing error kinds
fn classify_error(code: &str, message: String, fallback: fn(String) -> BillingError) -> BillingError {
    match code {
        "SERVICE_UNAVAILABLE" | "MAINTENANCE" => BillingError::ServiceUnavailable(message),
        _ => fallback(message),
    }
}

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client for the purchase server
///
/// Stand-in for the platform billing service: it speaks to a REST purchase
/// server (`BILLING_SERVER_URL`, `/api/v1/billing/*`) that does not exist
/// yet. Until it does, every restore ends as "not purchased". Swap in a
/// `PurchaseService` backed by the store's billing library when wiring a
/// release build.
pub struct BillingApiClient {
    client: reqwest::Client,
    config: BillingConfig,
    install_id: String,
}

impl BillingApiClient {
    pub fn new(config: BillingConfig, install_id: String) -> Result<Self, BillingError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(BILLING_TIMEOUT_SECS))
            .build()
            .map_err(|e| BillingError::ServiceUnavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            install_id,
        })
    }

    async fn post<Req, Data>(
        &self,
        path: &str,
        request: &Req,
        on_error: fn(String) -> BillingError,
    ) -> Result<ApiResponse<Data>, BillingError>
    where
        Req: Serialize + Sync,
        Data: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(self.config.endpoint(path))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    BillingError::ServiceUnavailable(e.to_string())
                } else {
                    on_error(e.to_string())
                }
            })?;

        if response.status() == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return Err(BillingError::ServiceUnavailable("Server returned 503".to_string()));
        }

        // Parse response body regardless of status code (server returns JSON errors)
        let result: ApiResponse<Data> = response
            .json()
            .await
            .map_err(|e| on_error(format!("Failed to parse response: {}", e)))?;

        if !result.success {
            let message = result
                .error_message()
                .unwrap_or_else(|| "Unknown error".to_string());
            let code = result.error_code().unwrap_or_default();
            return Err(classify_error(&code, message, on_error));
        }

        Ok(result)
    }
}

#[async_trait]
impl PurchaseService for BillingApiClient {
    async fn open_session(&self) -> Result<SessionHandle, BillingError> {
        let request = OpenSessionRequest {
            install_id: self.install_id.clone(),
            package_name: APPLICATION_ID.to_string(),
            platform: get_platform().to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        };

        let response: ApiResponse<OpenSessionData> = self
            .post(endpoints::OPEN_SESSION, &request, BillingError::SessionOpenFailed)
            .await?;

        let data = response
            .data
            .ok_or_else(|| BillingError::SessionOpenFailed("Response had no session".to_string()))?;

        if let Some(expires) = data.expires_at {
            log::debug!("Billing session open until {}", expires);
        }
        Ok(SessionHandle(data.session_token))
    }

    async fn list_purchases(&self, session: &SessionHandle) -> Result<Vec<String>, BillingError> {
        let request = ListPurchasesRequest {
            session_token: session.token().to_string(),
        };

        let response: ApiResponse<ListPurchasesData> = self
            .post(endpoints::LIST_PURCHASES, &request, BillingError::QueryFailed)
            .await?;

        let product_ids = response
            .data
            .as_ref()
            .map(ListPurchasesData::product_ids)
            .ok_or_else(|| BillingError::QueryFailed("Response had no purchase list".to_string()))?;

        if let Some(public_key) = &self.config.public_key {
            let (Some(timestamp), Some(signature)) = (&response.timestamp, &response.signature) else {
                return Err(BillingError::SignatureInvalid);
            };
            verify_signature(public_key, &signed_payload(timestamp, &product_ids), signature)?;
        }

        Ok(product_ids)
    }

    async fn close_session(&self, session: SessionHandle) {
        let request = CloseSessionRequest {
            session_token: session.0,
        };

        let closed: Result<ApiResponse<serde_json::Value>, BillingError> = self
            .post(endpoints::CLOSE_SESSION, &request, BillingError::QueryFailed)
            .await;

        if let Err(e) = closed {
            log::warn!("Failed to close billing session: {}", e);
        }
    }
}

/// Stand-in used when no purchase server client could be built
pub struct UnavailableService {
    reason: String,
}

impl UnavailableService {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl PurchaseService for UnavailableService {
    async fn open_session(&self) -> Result<SessionHandle, BillingError> {
        Err(BillingError::ServiceUnavailable(self.reason.clone()))
    }

    async fn list_purchases(&self, _session: &SessionHandle) -> Result<Vec<String>, BillingError> {
        Err(BillingError::ServiceUnavailable(self.reason.clone()))
    }

    async fn close_session(&self, _session: SessionHandle) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn keypair() -> (SigningKey, String) {
        let signing = SigningKey::from_bytes(&[7u8; 32]);
        let public = base64::engine::general_purpose::STANDARD.encode(signing.verifying_key().to_bytes());
        (signing, public)
    }

    #[test]
    fn test_purchase_list_parses_in_order() {
        let json = r#"{
            "success": true,
            "data": {"purchases": [
                {"product_id": "premium", "order_id": "GPA.1", "purchase_time": "2024-03-01T10:00:00Z"},
                {"product_id": "coins100"}
            ]},
            "timestamp": "2024-03-02T00:00:00Z",
            "signature": null
        }"#;

        let response: ApiResponse<ListPurchasesData> = serde_json::from_str(json).unwrap();
        assert!(response.success);
        assert_eq!(response.data.unwrap().product_ids(), vec!["premium", "coins100"]);
    }

    #[test]
    fn test_error_envelope() {
        let json = r#"{"success": false, "data": null, "error": {"code": "SERVICE_UNAVAILABLE", "message": "down"}}"#;
        let response: ApiResponse<OpenSessionData> = serde_json::from_str(json).unwrap();

        let err = classify_error(
            &response.error_code().unwrap(),
            response.error_message().unwrap(),
            BillingError::SessionOpenFailed,
        );
        assert_eq!(err, BillingError::ServiceUnavailable("down".to_string()));
    }

    #[test]
    fn test_unknown_error_code_uses_fallback() {
        let err = classify_error("SESSION_EXPIRED", "expired".to_string(), BillingError::QueryFailed);
        assert_eq!(err, BillingError::QueryFailed("expired".to_string()));
    }

    #[test]
    fn test_signature_roundtrip() {
        let (signing, public) = keypair();
        let ids = vec!["premium".to_string(), "coins100".to_string()];
        let payload = signed_payload("2024-03-02T00:00:00Z", &ids);
        let signature = base64::engine::general_purpose::STANDARD.encode(signing.sign(payload.as_bytes()).to_bytes());

        assert!(verify_signature(&public, &payload, &signature).is_ok());
    }

    #[test]
    fn test_signature_rejects_tampered_list() {
        let (signing, public) = keypair();
        let signed = signed_payload("t", &["coins100".to_string()]);
        let signature = base64::engine::general_purpose::STANDARD.encode(signing.sign(signed.as_bytes()).to_bytes());

        let tampered = signed_payload("t", &["coins100".to_string(), "premium".to_string()]);
        assert_eq!(
            verify_signature(&public, &tampered, &signature),
            Err(BillingError::SignatureInvalid)
        );
    }

    #[test]
    fn test_signature_rejects_garbage_key() {
        assert_eq!(
            verify_signature("not-base64!", "payload", "AAAA"),
            Err(BillingError::SignatureInvalid)
        );
    }
}
