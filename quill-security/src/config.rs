use quill_core::{ConfigError, QuillConfig};

/// Session cookie settings.
///
/// Read from `security.session.cookie_name` (default `quillsession`),
/// `security.session.secret` (required) and
/// `security.session.max_age_secs` (default 86400).
#[derive(Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub secret: String,
    pub max_age_secs: u64,
}

impl SessionConfig {
    pub const DEFAULT_COOKIE_NAME: &'static str = "quillsession";
    pub const DEFAULT_MAX_AGE_SECS: u64 = 86400;

    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            cookie_name: Self::DEFAULT_COOKIE_NAME.to_string(),
            secret: secret.into(),
            max_age_secs: Self::DEFAULT_MAX_AGE_SECS,
        }
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    pub fn with_max_age(mut self, secs: u64) -> Self {
        self.max_age_secs = secs;
        self
    }

    pub fn from_config(config: &QuillConfig) -> Result<Self, ConfigError> {
        let secret: String = config.get("security.session.secret")?;
        let mut session = Self::new(secret);
        if let Some(name) = config.get_opt("security.session.cookie_name")? {
            session.cookie_name = name;
        }
        if let Some(secs) = config.get_opt("security.session.max_age_secs")? {
            session.max_age_secs = secs;
        }
        Ok(session)
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("cookie_name", &self.cookie_name)
            .field("secret", &"***")
            .field("max_age_secs", &self.max_age_secs)
            .finish()
    }
}
