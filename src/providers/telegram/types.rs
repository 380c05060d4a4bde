//! Types for Telegram Gateway API payloads.

use serde::{Deserialize, Serialize};

/// Envelope every gateway method answers with.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GatewayResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub error: Option<String>,
}

impl<T> GatewayResponse<T> {
    /// Convert response into a Result for ergonomic error handling.
    pub fn into_result(self) -> Result<T, String> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err("response carries no result".to_string()),
            (false, _) => Err(self.error.unwrap_or_else(|| "unknown error".to_string())),
        }
    }
}

/// `RequestStatus` object returned by check/send/status calls.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RequestStatus {
    pub request_id: String,
    pub phone_number: Option<String>,
    pub request_cost: Option<f64>,
    pub remaining_balance: Option<f64>,
    pub verification_status: Option<VerificationStatus>,
}

/// Verification state of a delivered message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VerificationStatus {
    /// One of `code_valid`, `code_invalid`, `code_max_attempts_exceeded`, `expired`.
    pub status: String,
    pub updated_at: Option<i64>,
    pub code_entered: Option<String>,
}

impl VerificationStatus {
    pub fn is_valid(&self) -> bool {
        self.status == "code_valid"
    }
}

/// Body of `sendVerificationMessage`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendVerificationMessage {
    pub phone_number: String,
    pub payload: String,
    pub ttl: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_length: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_result_ok() {
        let json = r#"{"ok": true, "result": {"request_id": "tg-1", "remaining_balance": 12.5}}"#;
        let response: GatewayResponse<RequestStatus> = serde_json::from_str(json).unwrap();
        let status = response.into_result().unwrap();
        assert_eq!(status.request_id, "tg-1");
        assert_eq!(status.remaining_balance, Some(12.5));
    }

    #[test]
    fn test_into_result_error() {
        let json = r#"{"ok": false, "error": "PHONE_NUMBER_INVALID"}"#;
        let response: GatewayResponse<RequestStatus> = serde_json::from_str(json).unwrap();
        assert_eq!(response.into_result().unwrap_err(), "PHONE_NUMBER_INVALID");
    }

    #[test]
    fn test_send_body_skips_empty_fields() {
        let body = SendVerificationMessage {
            phone_number: "+79991234567".to_string(),
            payload: "4821".to_string(),
            ttl: 60,
            code: Some("4821".to_string()),
            code_length: None,
            request_id: None,
            sender_username: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"phone_number": "+79991234567", "payload": "4821", "ttl": 60, "code": "4821"})
        );
    }

    #[test]
    fn test_verification_status() {
        let json = r#"{"request_id": "r", "verification_status": {"status": "code_valid"}}"#;
        let status: RequestStatus = serde_json::from_str(json).unwrap();
        assert!(status.verification_status.unwrap().is_valid());
    }
}
