use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A secret value (password, token) that redacts itself in debug output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    /// Returns the wrapped value. Call sites should pass it straight to the
    /// transport and never log it.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Secret(value.to_string())
    }
}

/// A named connection to one remote CMIS repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Base URL of the repository's browser binding endpoint.
    pub url: String,
    /// Repository id within the endpoint, when the server hosts several.
    #[serde(default)]
    pub repository_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<Secret>,
}

/// Capability toggles the host may use to narrow the driver capabilities.
///
/// Toggles can only switch a capability off; the driver never gains a
/// capability it does not natively have.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CapabilityToggles {
    #[serde(default = "default_true")]
    pub browsable: bool,
    #[serde(default = "default_true")]
    pub writable: bool,
    #[serde(default = "default_true")]
    pub public: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CapabilityToggles {
    fn default() -> Self {
        CapabilityToggles {
            browsable: true,
            writable: true,
            public: true,
        }
    }
}

/// Top-level configuration for one repository-backed storage.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub name: Option<String>,
    /// Name of the connection this storage talks to.
    #[serde(default)]
    pub repository: Option<String>,
    /// Identifier of the root folder. When unset the driver falls back to
    /// the well-known shared folder under the connection root.
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub capabilities: CapabilityToggles,
    #[serde(default)]
    pub connections: IndexMap<String, ConnectionConfig>,
    /// Free-form options exposed through the host's `getOption` surface.
    #[serde(default)]
    pub options: IndexMap<String, String>,
}

impl StorageConfig {
    /// Look up one option by name. The typed `repository` and `folder`
    /// fields shadow entries of the same name in the free-form map.
    pub fn option(&self, name: &str) -> Option<&str> {
        match name {
            "repository" => self.repository.as_deref(),
            "folder" => self.folder.as_deref(),
            _ => self.options.get(name).map(String::as_str),
        }
    }

    /// Look up one option, falling back to `default` when unset or empty.
    pub fn option_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        match self.option(name) {
            Some(value) if !value.is_empty() => value,
            _ => default,
        }
    }

    /// The connection configuration this storage is bound to, if any.
    pub fn connection(&self) -> Option<&ConnectionConfig> {
        self.repository
            .as_deref()
            .and_then(|name| self.connections.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_redacts_debug() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{:?}", secret), "Secret(***)");
        assert_eq!(format!("{}", secret), "***");
        assert_eq!(secret.expose(), "hunter2");
    }

    #[test]
    fn test_option_lookup() {
        let mut config = StorageConfig {
            repository: Some("default".to_string()),
            folder: Some("root-id".to_string()),
            ..Default::default()
        };
        config
            .options
            .insert("case_sensitive".to_string(), "1".to_string());

        assert_eq!(config.option("repository"), Some("default"));
        assert_eq!(config.option("folder"), Some("root-id"));
        assert_eq!(config.option("case_sensitive"), Some("1"));
        assert_eq!(config.option("missing"), None);
        assert_eq!(config.option_or("missing", "fallback"), "fallback");
    }

    #[test]
    fn test_option_or_ignores_empty() {
        let config = StorageConfig {
            folder: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(config.option_or("folder", "fallback"), "fallback");
    }

    #[test]
    fn test_capability_toggles_default_on() {
        let toggles = CapabilityToggles::default();
        assert!(toggles.browsable && toggles.writable && toggles.public);
    }

    #[test]
    fn test_connection_lookup() {
        let yaml = r#"
repository: alfresco
connections:
  alfresco:
    url: https://cmis.example.com/browser
    username: admin
    password: secret
"#;
        let config = StorageConfig::from_yaml(yaml).unwrap();
        let connection = config.connection().unwrap();
        assert_eq!(connection.url, "https://cmis.example.com/browser");
        assert_eq!(connection.password.as_ref().unwrap().expose(), "secret");
    }
}
