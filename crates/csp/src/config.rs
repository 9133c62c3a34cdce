//! Rewriter configuration.

use markup::ConfigurationError;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct CspConfig {
    /// Client-side function called as `f(id, event, callback)`.
    pub register_function: String,
    /// Derive an id from the owning component when an element carrying
    /// handlers has no explicit `id`.
    pub generate_ids: bool,
    /// Separator between the owner's client id and the generated suffix.
    pub id_separator: String,
    /// Nonce stamped onto every `script` element.
    pub nonce: Option<String>,
    /// Divert `href="javascript:..."` into a click handler.
    pub rewrite_javascript_urls: bool,
    /// Write the pending-scripts queue as a trailing eval at document end.
    pub execute_scripts_on_end_document: bool,
}

impl Default for CspConfig {
    fn default() -> Self {
        Self {
            register_function: "csp.register".to_string(),
            generate_ids: true,
            id_separator: "_".to_string(),
            nonce: None,
            rewrite_javascript_urls: true,
            execute_scripts_on_end_document: true,
        }
    }
}

impl CspConfig {
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !is_identifier_path(&self.register_function) {
            return Err(invalid(format!(
                "register_function '{}' is not a dotted identifier path",
                self.register_function
            )));
        }
        if self.id_separator.is_empty() {
            return Err(invalid("id_separator must not be empty".to_string()));
        }
        if let Some(nonce) = &self.nonce {
            let ok = !nonce.is_empty()
                && nonce
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'=' | b'-' | b'_'));
            if !ok {
                return Err(invalid("nonce must be non-empty base64".to_string()));
            }
        }
        Ok(())
    }
}

fn invalid(reason: String) -> ConfigurationError {
    ConfigurationError::InvalidConfig { reason }
}

fn is_identifier_path(path: &str) -> bool {
    !path.is_empty()
        && path.split('.').all(|part| {
            let mut bytes = part.bytes();
            match bytes.next() {
                Some(b) if b.is_ascii_alphabetic() || b == b'_' || b == b'$' => {
                    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'$')
                }
                _ => false,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(CspConfig::default().validate().is_ok());
        assert!(
            CspConfig::default()
                .with_nonce("rAnd0m+/=")
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn rejects_bad_register_function() {
        for name in ["", "csp.", ".register", "csp.re gister", "1csp.register", "a('x')"] {
            let config = CspConfig {
                register_function: name.to_string(),
                ..CspConfig::default()
            };
            assert!(config.validate().is_err(), "accepted {name:?}");
        }
        let config = CspConfig {
            register_function: "$app._csp.register".to_string(),
            ..CspConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_empty_separator_and_quoted_nonce() {
        let config = CspConfig {
            id_separator: String::new(),
            ..CspConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(
            CspConfig::default()
                .with_nonce("a\"b")
                .validate()
                .is_err()
        );
    }
}
