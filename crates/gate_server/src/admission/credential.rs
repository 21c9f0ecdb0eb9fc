use axum::extract::Query;
use axum::http::{HeaderMap, Uri};
use std::collections::HashMap;

/// Compares two strings in time that depends only on their lengths.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

/// The operator bypass credential: a parameter name and its shared secret.
#[derive(Clone)]
pub struct BypassCredential {
    param: String,
    secret: Option<String>,
}

impl std::fmt::Debug for BypassCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BypassCredential")
            .field("param", &self.param)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl BypassCredential {
    pub fn new(param: impl Into<String>, secret: Option<String>) -> Self {
        Self {
            param: param.into(),
            secret,
        }
    }

    pub fn param(&self) -> &str {
        &self.param
    }

    /// Whether `presented` matches the configured secret.
    pub fn verify(&self, presented: Option<&str>) -> bool {
        match (&self.secret, presented) {
            (Some(secret), Some(presented)) => constant_time_eq(secret, presented),
            _ => false,
        }
    }

    /// Reads the credential from the request header or, failing that, the
    /// query parameter of the same name.
    pub fn extract(&self, headers: &HeaderMap, uri: &Uri) -> Option<String> {
        if let Some(value) = headers.get(self.param.as_str()).and_then(|v| v.to_str().ok()) {
            return Some(value.to_string());
        }

        Query::<HashMap<String, String>>::try_from_uri(uri)
            .ok()
            .and_then(|Query(mut params)| params.remove(&self.param))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("s3cret", "s3cret"));
        assert!(!constant_time_eq("s3cret", "s3cres"));
        assert!(!constant_time_eq("s3cret", "s3cret!"));
        assert!(constant_time_eq("", ""));
    }

    #[test]
    fn test_verify_requires_configured_secret() {
        let open = BypassCredential::new("bastion-bypass", None);
        assert!(!open.verify(Some("anything")));

        let credential = BypassCredential::new("bastion-bypass", Some("s3cret".to_string()));
        assert!(credential.verify(Some("s3cret")));
        assert!(!credential.verify(Some("wrong")));
        assert!(!credential.verify(None));
    }

    #[test]
    fn test_extract_from_header_then_query() {
        let credential = BypassCredential::new("bastion-bypass", Some("s3cret".to_string()));

        let mut headers = HeaderMap::new();
        headers.insert("bastion-bypass", HeaderValue::from_static("from-header"));
        let uri: Uri = "/api?bastion-bypass=from-query".parse().unwrap();
        assert_eq!(credential.extract(&headers, &uri).as_deref(), Some("from-header"));

        let empty = HeaderMap::new();
        assert_eq!(credential.extract(&empty, &uri).as_deref(), Some("from-query"));

        let bare: Uri = "/api".parse().unwrap();
        assert_eq!(credential.extract(&empty, &bare), None);
    }

    #[test]
    fn test_debug_hides_secret() {
        let credential = BypassCredential::new("bastion-bypass", Some("s3cret".to_string()));
        assert!(!format!("{credential:?}").contains("s3cret"));
    }
}
