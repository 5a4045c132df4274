//! Credential resolution from the `--login USER[,PASSWORD]` argument

use std::fmt;

/// Whether the connection may ask the user for a missing password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// Ask interactively when the server rejects the request
    PromptIfNeeded,
    /// Never ask; fail authentication instead
    DoNotPrompt,
}

/// Basic credential for the version control server.
///
/// An empty user with a password is how personal access tokens are sent.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub user: String,
    pub password: Option<String>,
    pub prompt: PromptMode,
}

impl Credential {
    /// Resolve a `user[,password]` login string.
    ///
    /// Returns `None` for an empty login, meaning the connection uses the
    /// ambient identity. The string is split at the first comma; without a
    /// comma the password is absent and the credential prompts if needed.
    pub fn parse_login(login: &str) -> Option<Self> {
        if login.is_empty() {
            return None;
        }
        let (user, password) = match login.split_once(',') {
            Some((user, password)) => (user, Some(password.to_string())),
            None => (login, None),
        };
        Some(Self::new(user, password))
    }

    /// Build a credential; prompting is enabled exactly when no password is given.
    pub fn new(user: impl Into<String>, password: Option<String>) -> Self {
        let prompt = if password.is_none() {
            PromptMode::PromptIfNeeded
        } else {
            PromptMode::DoNotPrompt
        };
        Self {
            user: user.into(),
            password,
            prompt,
        }
    }

    pub fn may_prompt(&self) -> bool {
        self.prompt == PromptMode::PromptIfNeeded
    }

    /// Same user with an interactively supplied password. The result never prompts again.
    pub fn with_password(&self, password: String) -> Self {
        Self {
            user: self.user.clone(),
            password: Some(password),
            prompt: PromptMode::DoNotPrompt,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("prompt", &self.prompt)
            .finish()
    }
}
