//! Opaque provider credentials
//!
//! Supplied by the caller at dispatch time. Not `Serialize`, so it never
//! ends up in the durable store.

use reqwest::header::HeaderValue;

use super::ProviderError;

#[derive(Clone)]
pub struct Credentials {
    api_key: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Read the API key from an environment variable
    pub fn from_env(var: &str) -> Option<Self> {
        std::env::var(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(Self::new)
    }

    /// Build the `Authorization` header value
    ///
    /// Rejects empty keys, the literal `none`, and anything that cannot be
    /// carried in an HTTP header (control characters, line breaks).
    pub fn bearer_header(&self) -> Result<HeaderValue, ProviderError> {
        let key = self.api_key.trim();

        if key.is_empty() || key.eq_ignore_ascii_case("none") {
            return Err(ProviderError::Unauthorized {
                message: "API key is empty or set to 'none'".to_string(),
            });
        }

        if let Some((index, _)) = key
            .char_indices()
            .find(|(_, ch)| ch.is_control())
        {
            return Err(ProviderError::Unauthorized {
                message: format!(
                    "API key contains a control character at position {}",
                    index
                ),
            });
        }

        let mut value = HeaderValue::from_str(&format!("Bearer {}", key)).map_err(|_| {
            ProviderError::Unauthorized {
                message: format!(
                    "API key results in an invalid Authorization header ({} characters)",
                    key.len()
                ),
            }
        })?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_header_valid() {
        let header = Credentials::new(" sk-test123 ").bearer_header().unwrap();
        assert_eq!(header.to_str().unwrap(), "Bearer sk-test123");
        assert!(header.is_sensitive());
    }

    #[test]
    fn test_bearer_header_invalid() {
        assert!(Credentials::new("").bearer_header().is_err());
        assert!(Credentials::new("NONE").bearer_header().is_err());
        assert!(Credentials::new("sk\n123").bearer_header().is_err());
        assert!(Credentials::new("sk\x00123").bearer_header().is_err());
        assert!(Credentials::new("sk\x7f123").bearer_header().is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", Credentials::new("sk-secret"));
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("redacted"));
    }
}
