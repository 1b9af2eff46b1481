use crate::error::CurlError;
use crate::models::{Auth, Call};
use crate::network::{format_body, PreparedRequest};

/// Request options as given on a curl-like command line
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CurlOptions {
    pub url: String,
    pub method: Option<String>,
    pub data: String,
    pub data_raw: String,
    /// Raw `"Key: Value"` entries
    pub headers: Vec<String>,
    /// `user:password`
    pub user: Option<String>,
}

impl CurlOptions {
    /// Build a call the way the command line would
    pub fn into_call(self) -> Call {
        let mut call = Call::new();
        call.url = self.url;
        if let Some(method) = self.method.filter(|m| !m.is_empty()) {
            call.method = method.to_uppercase();
        }

        call.data = if self.data.is_empty() {
            self.data_raw
        } else {
            self.data
        };
        if !call.data.is_empty() {
            call.data_type = "Text".to_string();
            // a body implies POST
            if call.method == "GET" {
                call.method = "POST".to_string();
            }
        }

        if let Some(user) = self.user {
            let (username, password) = user.split_once(':').unwrap_or((user.as_str(), ""));
            call.auth = Some(Auth::BasicAuth {
                username: username.to_string(),
                password: password.to_string(),
            });
        }

        for header in self.headers {
            if header.is_empty() {
                continue;
            }
            let parts: Vec<&str> = header.split(':').collect();
            if parts.len() == 2 {
                let key = parts[0].trim().to_lowercase();
                if key == "authorization" && parts[1].contains("Bearer") {
                    call.auth = Some(Auth::BearerToken {
                        token: parts[1].replace("Bearer", "").trim().to_string(),
                    });
                    continue;
                }
                if key == "content-type" && parts[1].contains("application/json") {
                    call.data_type = "JSON".to_string();
                    call.data = format_body(&call.data);
                }
            }
            call.headers.push(header);
        }

        call
    }
}

/// Parse a cURL command into a Call
pub fn parse_curl(input: &str) -> Result<Call, CurlError> {
    Ok(parse_options(input)?.into_call())
}

/// Parse a cURL command into its options
pub fn parse_options(input: &str) -> Result<CurlOptions, CurlError> {
    // Remove line continuations and normalize
    let normalized = input.replace("\\\r\n", " ").replace("\\\n", " ");
    let mut tokens = tokenize(&normalized)?.into_iter();
    let mut options = CurlOptions::default();

    while let Some(token) = tokens.next() {
        let mut value = |flag: &str| {
            tokens
                .next()
                .ok_or_else(|| CurlError::MissingValue(flag.to_string()))
        };
        match token.as_str() {
            "curl" if options.url.is_empty() && options.headers.is_empty() => {}
            "-X" | "--request" => options.method = Some(value(&token)?),
            "-H" | "--header" => options.headers.push(value(&token)?),
            "-d" | "--data" | "--data-binary" | "--data-ascii" => options.data = value(&token)?,
            "--data-raw" => options.data_raw = value(&token)?,
            "-u" | "--user" => options.user = Some(value(&token)?),
            "--url" => options.url = value(&token)?,
            flag if flag.starts_with("-X") && flag.len() > 2 => {
                options.method = Some(flag[2..].to_string());
            }
            flag if flag.starts_with('-') => {
                tracing::debug!(flag, "Ignoring cURL flag");
            }
            _ => {
                if options.url.is_empty() {
                    options.url = token.clone();
                }
            }
        }
    }

    if options.url.is_empty() {
        return Err(CurlError::MissingUrl);
    }
    Ok(options)
}

/// Tokenize a curl command, respecting quotes
fn tokenize(input: &str) -> Result<Vec<String>, CurlError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut escape_next = false;

    for c in input.chars() {
        if escape_next {
            current.push(c);
            escape_next = false;
            continue;
        }

        match c {
            '\\' if !in_single_quote => {
                escape_next = true;
                in_token = true;
            }
            '\'' if !in_double_quote => {
                in_single_quote = !in_single_quote;
                in_token = true;
            }
            '"' if !in_single_quote => {
                in_double_quote = !in_double_quote;
                in_token = true;
            }
            ' ' | '\t' | '\n' | '\r' if !in_single_quote && !in_double_quote => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            _ => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_single_quote || in_double_quote {
        return Err(CurlError::UnterminatedQuote);
    }
    if in_token {
        tokens.push(current);
    }

    Ok(tokens)
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Format a prepared request as a cURL command
pub fn to_curl(request: &PreparedRequest) -> String {
    let mut parts = vec!["curl".to_string()];

    if request.method != "GET" {
        parts.push(format!("-X {}", request.method));
    }

    parts.push(quote(&request.url));

    for (key, value) in &request.headers {
        parts.push(format!("-H {}", quote(&format!("{}: {}", key, value))));
    }

    match &request.auth {
        Some(Auth::BearerToken { token }) => {
            parts.push(format!("-H {}", quote(&format!("Authorization: Bearer {}", token))));
        }
        Some(Auth::BasicAuth { username, password })
            if !username.is_empty() && !password.is_empty() =>
        {
            parts.push(format!("-u {}", quote(&format!("{}:{}", username, password))));
        }
        Some(Auth::ApiKey {
            header_name,
            header_value,
        }) if !header_name.is_empty() => {
            parts.push(format!("-H {}", quote(&format!("{}: {}", header_name, header_value))));
        }
        _ => {}
    }

    if !request.body.is_empty() {
        parts.push(format!("-d {}", quote(&request.body)));
    }

    parts.join(" \\\n  ")
}
