use crate::types::StorageConfig;
use crate::ConfigError;

impl StorageConfig {
    /// Validate the configuration and return a list of errors.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let storage_name = self.name.clone().unwrap_or_else(|| "cmisfs".to_string());

        if let Some(ref repository) = self.repository {
            if !self.connections.contains_key(repository) {
                errors.push(ConfigError::UndefinedConnection(
                    repository.clone(),
                    storage_name.clone(),
                ));
            }
        }

        for (name, connection) in &self.connections {
            if !connection.url.starts_with("http://") && !connection.url.starts_with("https://") {
                errors.push(ConfigError::InvalidConnectionUrl(
                    name.clone(),
                    connection.url.clone(),
                ));
            }
        }

        if let Some(ref folder) = self.folder {
            if folder.contains(';') {
                errors.push(ConfigError::InvalidConfig(format!(
                    "Root folder identifier '{}' must not carry a version suffix",
                    folder
                )));
            }
        }

        errors
    }

    /// Validate and return Ok(()) if valid, or Err with the first error.
    pub fn validate_or_err(&self) -> Result<(), ConfigError> {
        match self.validate().into_iter().next() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConnectionConfig;

    #[test]
    fn test_undefined_connection() {
        let config = StorageConfig {
            repository: Some("missing".to_string()),
            ..Default::default()
        };

        let errors = config.validate();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::UndefinedConnection(_, _))));
    }

    #[test]
    fn test_invalid_connection_url() {
        let mut config = StorageConfig::default();
        config.connections.insert(
            "bad".to_string(),
            ConnectionConfig {
                url: "ftp://cmis.example.com".to_string(),
                repository_id: None,
                username: None,
                password: None,
            },
        );

        let errors = config.validate();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidConnectionUrl(_, _))));
    }

    #[test]
    fn test_versioned_root_folder_rejected() {
        let config = StorageConfig {
            folder: Some("abc-123;1.0".to_string()),
            ..Default::default()
        };

        let errors = config.validate();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn test_valid_config_passes() {
        let yaml = r#"
repository: default
folder: root-folder-id
connections:
  default:
    url: https://cmis.example.com/browser
"#;
        let config = StorageConfig::from_yaml(yaml).unwrap();
        assert!(config.validate_or_err().is_ok());
    }
}
