use std::fmt;
use std::sync::OnceLock;

/// Client identity plus the project token obtained by logging in.
///
/// The identity never changes. The token slot is written at most once, by the
/// client that owns this credential, and is read-only afterwards.
pub struct Credential {
    client_id: Option<String>,
    client_secret: Option<String>,
    project_token: OnceLock<String>,
}

impl Credential {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self::from_parts(Some(client_id.into()), Some(client_secret.into()))
    }

    pub fn from_parts(client_id: Option<String>, client_secret: Option<String>) -> Self {
        Self {
            client_id,
            client_secret,
            project_token: OnceLock::new(),
        }
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    pub fn project_token(&self) -> Option<&str> {
        self.project_token.get().map(String::as_str)
    }

    /// Stores the token from a login exchange. Returns `false` if a token was
    /// already present, in which case the stored token is kept.
    pub(crate) fn set_project_token(&self, token: String) -> bool {
        self.project_token.set(token).is_ok()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .field("project_token", &self.project_token().map(mask))
            .finish()
    }
}

/// Masks a secret for logging, keeping a short prefix and suffix.
pub fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "*********".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}
