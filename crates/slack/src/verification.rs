use secrecy::{ExposeSecret, SecretString};

/// Checks the `token` field Slack attaches to every slash-command request.
#[derive(Clone, Debug)]
pub struct TokenVerifier {
    expected: SecretString,
}

impl TokenVerifier {
    pub fn new(expected: SecretString) -> Self {
        Self { expected }
    }

    /// Exact match against the configured token. An unset token matches nothing.
    pub fn verify(&self, provided: &str) -> bool {
        let expected = self.expected.expose_secret();
        !expected.is_empty() && provided == expected
    }
}
