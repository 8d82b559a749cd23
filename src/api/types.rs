//! Wire types shared by the kDrive endpoints.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{KdriveError, Result};

/// Every kDrive response is wrapped in this envelope.
///
/// Success: `{"result": "success", "data": ..., "cursor": ..., "has_more": ...}`
/// Failure: `{"result": "error", "error": {"code": ..., "description": ...}}`
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    pub result: String,
    pub data: Option<T>,
    pub cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub code: String,
    #[serde(default)]
    pub description: String,
}

impl From<ApiErrorBody> for KdriveError {
    fn from(body: ApiErrorBody) -> Self {
        KdriveError::ApiError {
            code: body.code,
            description: body.description,
        }
    }
}

impl<T> ApiEnvelope<T> {
    /// Turn an error envelope into `KdriveError::ApiError`, keep the rest.
    pub fn check(mut self) -> Result<Self> {
        if let Some(error) = self.error.take() {
            return Err(error.into());
        }
        if self.result != "success" {
            return Err(KdriveError::ApiError {
                code: self.result,
                description: "Unexpected result status".to_string(),
            });
        }
        Ok(self)
    }

    /// The `data` payload of a successful envelope.
    pub fn into_data(self) -> Result<T> {
        self.check()?.data.ok_or(KdriveError::InvalidResponse)
    }
}

/// Parse a response body into a checked envelope.
pub(crate) fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<ApiEnvelope<T>> {
    let envelope: ApiEnvelope<T> = serde_json::from_str(body)?;
    envelope.check()
}

/// Node ids come back as integers from kDrive; keep them as opaque strings.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "invalid node id: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RemoteEntry;

    #[test]
    fn test_success_envelope_with_page() {
        let body = r#"{"result":"success","data":[{"id":12,"name":"test docs.docx","type":"file","size":50274,"last_modified_at":1651941461}],"cursor":"abc","has_more":true}"#;
        let envelope: ApiEnvelope<Vec<RemoteEntry>> = parse_envelope(body).unwrap();
        assert!(envelope.has_more);
        assert_eq!(envelope.cursor.as_deref(), Some("abc"));

        let entries = envelope.into_data().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "12");
        assert_eq!(entries[0].kind_tag, "file");
        assert_eq!(entries[0].last_modified_at, Some(1651941461));
    }

    #[test]
    fn test_empty_directory_envelope() {
        let body = r#"{"result":"success","data":[],"response_at":1741257188,"cursor":null,"has_more":false}"#;
        let envelope: ApiEnvelope<Vec<RemoteEntry>> = parse_envelope(body).unwrap();
        assert!(!envelope.has_more);
        assert!(envelope.cursor.is_none());
        assert!(envelope.into_data().unwrap().is_empty());
    }

    #[test]
    fn test_error_envelope() {
        let body = r#"{"result":"error","error":{"code":"destination_not_a_directory","description":"Destination not a valid directory"}}"#;
        let err = parse_envelope::<Vec<RemoteEntry>>(body).unwrap_err();
        match err {
            KdriveError::ApiError { code, description } => {
                assert_eq!(code, "destination_not_a_directory");
                assert_eq!(description, "Destination not a valid directory");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_success_without_data() {
        let envelope: ApiEnvelope<Value> = parse_envelope(r#"{"result":"success"}"#).unwrap();
        assert!(matches!(
            envelope.into_data(),
            Err(KdriveError::InvalidResponse)
        ));
    }

    #[test]
    fn test_string_and_numeric_ids() {
        let a: RemoteEntry = serde_json::from_str(r#"{"id":"77","name":"a","type":"dir"}"#).unwrap();
        let b: RemoteEntry = serde_json::from_str(r#"{"id":77,"name":"a","type":"dir"}"#).unwrap();
        assert_eq!(a.id, b.id);

        let bad = serde_json::from_str::<RemoteEntry>(r#"{"id":[1],"name":"a"}"#);
        assert!(bad.is_err());
    }
}
