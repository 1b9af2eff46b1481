use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use url::Url;
use uuid::Uuid;

use crate::constants::{BASE_URL_PLACEHOLDER, DEFAULT_METHOD, UNTITLED};
use crate::tracker::Tracked;

/// Stand-in origin for reading relative URLs
const RELATIVE_URL_BASE: &str = "http://localhost/";

/// URL fragments returned verbatim by [`Call::title`] while still being typed
const TYPING_PREFIXES: [&str; 23] = [
    "h", "ht", "htt", "http", "https", "https:", "http:", "http:/", "https:/", "http://",
    "https://", "{", "{{", "{{B", "{{BA", "{{BAS", "{{BASE", "{{BASE_", "{{BASE_U",
    "{{BASE_UR", "{{BASE_URL", "{{BASE_URL}", "{{BASE_URL}}",
];

/// How a request authenticates.
///
/// Tagged by `type` on disk. Empty credential fields are omitted on write.
/// The legacy tags `basic`, `bearer` and `apiKey` are accepted on read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Auth {
    #[serde(alias = "")]
    None,
    /// Defer to the owning collection
    Inherit,
    #[serde(alias = "basic")]
    BasicAuth {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        username: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        password: String,
    },
    #[serde(alias = "bearer")]
    BearerToken {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        token: String,
    },
    #[serde(alias = "apiKey")]
    ApiKey {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        header_name: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        header_value: String,
    },
}

/// Discriminant of [`Auth`], used when switching variants
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthKind {
    None,
    Inherit,
    BasicAuth,
    BearerToken,
    ApiKey,
}

impl AuthKind {
    pub fn as_str(&self) -> &str {
        match self {
            AuthKind::None => "none",
            AuthKind::Inherit => "inherit",
            AuthKind::BasicAuth => "basic_auth",
            AuthKind::BearerToken => "bearer_token",
            AuthKind::ApiKey => "api_key",
        }
    }

    pub fn parse(s: &str) -> Option<AuthKind> {
        match s {
            "none" => Some(AuthKind::None),
            "inherit" => Some(AuthKind::Inherit),
            "basic_auth" => Some(AuthKind::BasicAuth),
            "bearer_token" => Some(AuthKind::BearerToken),
            "api_key" => Some(AuthKind::ApiKey),
            _ => None,
        }
    }
}

/// Credential sub-field addressed by auth edits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthField {
    Username,
    Password,
    Token,
    HeaderName,
    HeaderValue,
}

impl Auth {
    /// Empty-credential auth of the given kind
    pub fn empty(kind: AuthKind) -> Auth {
        match kind {
            AuthKind::None => Auth::None,
            AuthKind::Inherit => Auth::Inherit,
            AuthKind::BasicAuth => Auth::BasicAuth {
                username: String::new(),
                password: String::new(),
            },
            AuthKind::BearerToken => Auth::BearerToken {
                token: String::new(),
            },
            AuthKind::ApiKey => Auth::ApiKey {
                header_name: String::new(),
                header_value: String::new(),
            },
        }
    }

    pub fn kind(&self) -> AuthKind {
        match self {
            Auth::None => AuthKind::None,
            Auth::Inherit => AuthKind::Inherit,
            Auth::BasicAuth { .. } => AuthKind::BasicAuth,
            Auth::BearerToken { .. } => AuthKind::BearerToken,
            Auth::ApiKey { .. } => AuthKind::ApiKey,
        }
    }

    /// Update a credential field. Returns false when the field does not
    /// belong to the active variant.
    pub fn set_field(&mut self, field: AuthField, value: impl Into<String>) -> bool {
        let slot = match (self, field) {
            (Auth::BasicAuth { username, .. }, AuthField::Username) => username,
            (Auth::BasicAuth { password, .. }, AuthField::Password) => password,
            (Auth::BearerToken { token }, AuthField::Token) => token,
            (Auth::ApiKey { header_name, .. }, AuthField::HeaderName) => header_name,
            (Auth::ApiKey { header_value, .. }, AuthField::HeaderValue) => header_value,
            _ => return false,
        };
        *slot = value.into();
        true
    }

    /// Messages for required sub-fields missing from the active variant
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        match self {
            Auth::BasicAuth { username, password } => {
                if username.is_empty() {
                    errors.push("Username is required".to_string());
                }
                if password.is_empty() {
                    errors.push("Password is required".to_string());
                }
            }
            Auth::BearerToken { token } => {
                if token.is_empty() {
                    errors.push("Token is required".to_string());
                }
            }
            Auth::ApiKey {
                header_name,
                header_value,
            } => {
                if header_name.is_empty() {
                    errors.push("Header name is required".to_string());
                }
                if header_value.is_empty() {
                    errors.push("Header value is required".to_string());
                }
            }
            Auth::None | Auth::Inherit => {}
        }
        errors
    }
}

/// A single HTTP request template
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// May contain the `{{BASE_URL}}` placeholder
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    /// `"Key: Value"` entries
    #[serde(default, deserialize_with = "nullable")]
    pub headers: Vec<String>,
    /// `None` means no auth set on this call
    #[serde(default)]
    pub auth: Option<Auth>,
    #[serde(default)]
    pub data: String,
    /// Body editor label ("", "Text", "JSON" or a content type)
    #[serde(default)]
    pub data_type: String,
}

impl Default for Call {
    fn default() -> Self {
        Call::new()
    }
}

impl Call {
    /// Fresh call with a unique id
    pub fn new() -> Self {
        Call {
            id: Uuid::new_v4().to_string(),
            name: String::new(),
            url: String::new(),
            method: DEFAULT_METHOD.to_string(),
            headers: Vec::new(),
            auth: None,
            data: String::new(),
            data_type: String::new(),
        }
    }

    /// Short display label derived from the name, or else the URL
    pub fn title(&self) -> String {
        let raw = if self.name.is_empty() {
            &self.url
        } else {
            &self.name
        };

        if TYPING_PREFIXES.contains(&raw.as_str()) {
            return raw.clone();
        }

        let stripped = raw.replacen(BASE_URL_PLACEHOLDER, "", 1);
        let parts: Vec<&str> = stripped.split("://").collect();
        if parts.len() > 1 && !parts[1].is_empty() {
            return parts[1].to_string();
        }
        if !parts[0].is_empty() && parts[0] != "http" && parts[0] != "https" {
            return parts[0].to_string();
        }
        UNTITLED.to_string()
    }

    pub fn headers_count(&self) -> usize {
        self.headers.len()
    }

    /// Number of distinct query-parameter keys in the URL, 0 if unparsable.
    /// Relative and `{{BASE_URL}}` URLs are read against a stand-in base.
    pub fn params_count(&self) -> usize {
        let parsed = match Url::parse(&self.url) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let relative = self
                    .url
                    .strip_prefix(BASE_URL_PLACEHOLDER)
                    .unwrap_or(&self.url);
                Url::parse(RELATIVE_URL_BASE).and_then(|base| base.join(relative))
            }
            Err(e) => Err(e),
        };
        match parsed {
            Ok(url) => url
                .query_pairs()
                .map(|(key, _)| key)
                .collect::<HashSet<_>>()
                .len(),
            Err(_) => 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.url.is_empty()
    }

    /// Three-letter method label for compact lists
    pub fn method_short(&self) -> String {
        match self.method.as_str() {
            "GET" => "GET".to_string(),
            "POST" => "POS".to_string(),
            "PUT" => "PUT".to_string(),
            "DELETE" => "DEL".to_string(),
            other => other.chars().take(3).collect::<String>().to_uppercase(),
        }
    }

    /// URL with the first `{{BASE_URL}}` replaced by the collection's base URL
    pub fn resolve_url(&self, collection: Option<&Collection>) -> String {
        match collection {
            Some(c) => self.url.replacen(BASE_URL_PLACEHOLDER, &c.base_url, 1),
            None => self.url.clone(),
        }
    }

    /// Auth actually applied: the collection's when this call inherits
    pub fn resolve_auth(&self, collection: Option<&Collection>) -> Option<Auth> {
        match &self.auth {
            Some(Auth::Inherit) => collection.and_then(|c| c.auth.clone()),
            other => other.clone(),
        }
    }
}

/// Fields of a collection that can be validated independently
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectionField {
    Name,
    BaseUrl,
    Auth,
}

impl CollectionField {
    pub const ALL: [CollectionField; 3] = [
        CollectionField::Name,
        CollectionField::BaseUrl,
        CollectionField::Auth,
    ];
}

/// A named group of calls sharing a base URL and default auth
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub calls: Vec<Tracked<Call>>,
    #[serde(default)]
    pub base_url: String,
    /// Fallback for member calls whose auth is `inherit`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<Auth>,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Collection {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            calls: Vec::new(),
            base_url: String::new(),
            auth: None,
        }
    }

    pub fn description(&self) -> &str {
        if self.base_url.is_empty() {
            " "
        } else {
            &self.base_url
        }
    }

    pub fn find_call(&self, id: &str) -> Option<&Tracked<Call>> {
        self.calls.iter().find(|c| c.id == id)
    }

    pub fn find_call_mut(&mut self, id: &str) -> Option<&mut Tracked<Call>> {
        self.calls.iter_mut().find(|c| c.id == id)
    }

    /// Replace the call with the same id in place, or append it.
    /// Returns true when an existing call was replaced.
    pub fn upsert_call(&mut self, call: Call) -> bool {
        match self.find_call_mut(&call.id) {
            Some(existing) => {
                existing.set(call);
                true
            }
            None => {
                self.calls.push(Tracked::pending(call));
                false
            }
        }
    }

    /// Validate only the given fields; empty when valid
    pub fn validate_partial(&self, fields: &[CollectionField]) -> Vec<String> {
        let mut errors = Vec::new();
        for field in fields {
            match field {
                CollectionField::Name => {
                    if self.name.is_empty() {
                        errors.push("Name is required".to_string());
                    }
                }
                CollectionField::BaseUrl => {
                    if !self.base_url.is_empty() && Url::parse(&self.base_url).is_err() {
                        errors.push("Base URL is not valid".to_string());
                    }
                }
                CollectionField::Auth => {
                    if let Some(auth) = &self.auth {
                        errors.extend(auth.validate());
                    }
                }
            }
        }
        errors
    }

    pub fn validate(&self) -> Vec<String> {
        self.validate_partial(&CollectionField::ALL)
    }
}

fn default_method() -> String {
    DEFAULT_METHOD.to_string()
}

/// Reads `null` as the default value
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
