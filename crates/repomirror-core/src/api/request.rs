use reqwest::Method;
use serde_json::Value;

/// An outbound API call.
///
/// The attempt count is fixed at construction. A replay after a token
/// refresh is a new value produced by [`ApiRequest::as_retry`], so the
/// original request is never mutated and a retry is never retried again.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    body: Option<Value>,
    attempt: u8,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method,
            path: path.into(),
            body,
            attempt: 0,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path, None)
    }

    pub fn post(path: impl Into<String>, body: Option<Value>) -> Self {
        Self::new(Method::POST, path, body)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn attempt(&self) -> u8 {
        self.attempt
    }

    pub fn is_retry(&self) -> bool {
        self.attempt > 0
    }

    /// The same call, marked as a replay.
    pub fn as_retry(&self) -> Self {
        Self {
            attempt: self.attempt.saturating_add(1),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_retry_leaves_original_untouched() {
        let original = ApiRequest::post("/api/stats", Some(serde_json::json!({"a": 1})));
        let retry = original.as_retry();

        assert!(!original.is_retry());
        assert!(retry.is_retry());
        assert_eq!(retry.attempt(), 1);
        assert_eq!(retry.path(), original.path());
        assert_eq!(retry.body(), original.body());
        assert_eq!(retry.method(), &Method::POST);
    }
}
