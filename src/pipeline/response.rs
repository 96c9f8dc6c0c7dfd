//! Handler responses: an HTTP status plus a JSON body.

use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status: u16,
    pub body: Value,
}

impl HandlerResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// `{"ok": false, "error": code}`
    pub fn error(status: u16, code: &str) -> Self {
        Self::json(status, json!({ "ok": false, "error": code }))
    }

    pub fn error_code(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_shape() {
        let resp = HandlerResponse::error(401, "unauthorized");
        assert_eq!(resp.body, json!({"ok": false, "error": "unauthorized"}));
        assert_eq!(resp.error_code(), Some("unauthorized"));
        assert_eq!(resp.status, 401);
    }
}
