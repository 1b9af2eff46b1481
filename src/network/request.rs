//! Request description handed to the executor

use crate::models::{Auth, Call, Collection};

/// A call with its URL and auth already resolved against its collection
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub auth: Option<Auth>,
}

impl PreparedRequest {
    pub fn from_call(call: &Call, collection: Option<&Collection>) -> Self {
        PreparedRequest {
            method: call.method.to_uppercase(),
            url: call.resolve_url(collection),
            headers: call.headers.iter().filter_map(|h| parse_header(h)).collect(),
            body: call.data.clone(),
            auth: call.resolve_auth(collection),
        }
    }
}

/// Split a `"Key: Value"` line on the first colon. Lines without a colon
/// or with an empty key are not sendable.
pub fn parse_header(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("Content-Type: application/json"),
            Some(("Content-Type".to_string(), "application/json".to_string()))
        );
        assert_eq!(
            parse_header("Referer: https://example.com:8080/x"),
            Some(("Referer".to_string(), "https://example.com:8080/x".to_string()))
        );
        assert_eq!(parse_header("X-Trace"), None);
        assert_eq!(parse_header(": value"), None);
    }

    #[test]
    fn test_from_call_resolves_against_collection() {
        let mut collection = Collection::new("api");
        collection.base_url = "https://api.example.com".to_string();
        collection.auth = Some(Auth::BearerToken {
            token: "abc".to_string(),
        });

        let mut call = Call::new();
        call.method = "post".to_string();
        call.url = "{{BASE_URL}}/users".to_string();
        call.headers = vec!["Accept: application/json".to_string(), "X-Trace".to_string()];
        call.auth = Some(Auth::Inherit);
        call.data = "{}".to_string();

        let request = PreparedRequest::from_call(&call, Some(&collection));
        assert_eq!(request.method, "POST");
        assert_eq!(request.url, "https://api.example.com/users");
        assert_eq!(
            request.headers,
            vec![("Accept".to_string(), "application/json".to_string())]
        );
        assert_eq!(request.auth, collection.auth);
        assert_eq!(request.body, "{}");
    }
}
