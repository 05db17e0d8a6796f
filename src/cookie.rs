//! Session cookie helpers.

use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    HeaderMap, HeaderValue,
};

pub const DEFAULT_COOKIE_NAME: &str = "auth_token";

#[derive(Clone, Debug)]
pub struct CookieConfig {
    name: String,
    secure: bool,
}

impl CookieConfig {
    #[must_use]
    pub fn new(name: String) -> Self {
        Self {
            name,
            secure: false,
        }
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build the `HttpOnly` cookie carrying a freshly issued token.
    ///
    /// # Errors
    /// Returns an error if the token contains characters not allowed in a header.
    pub fn session(&self, token: &str, max_age: i64) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut cookie = format!(
            "{}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}",
            self.name
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
    }

    /// Build the cookie that empties the session on the client.
    ///
    /// # Errors
    /// Returns an error if the configured cookie name is not a valid header value.
    pub fn cleared(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", self.name);
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
    }

    /// Read the session token from the request's `Cookie` headers.
    #[must_use]
    pub fn extract(&self, headers: &HeaderMap) -> Option<String> {
        extract_cookie(headers, &self.name)
    }
}

/// Find a cookie by name across every `Cookie` header of the request.
#[must_use]
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, val) = pair.trim().split_once('=')?;
            (key.trim() == name).then(|| val.trim().to_string())
        })
        .filter(|value| !value.is_empty())
}
