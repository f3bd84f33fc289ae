use std::collections::HashMap;
use std::sync::Arc;

use cmisfs_config::StorageConfig;
use cmisfs_core::{Session, SessionError, SessionProvider};

use crate::browser::BrowserSession;

/// Provider that hands out one fixed session regardless of connection name.
///
/// Used in tests and single-repository deployments.
pub struct SingleSessionProvider {
    session: Arc<dyn Session>,
}

impl SingleSessionProvider {
    pub fn new(session: Arc<dyn Session>) -> Self {
        SingleSessionProvider { session }
    }
}

impl SessionProvider for SingleSessionProvider {
    fn session(&self, _connection: Option<&str>) -> Result<Arc<dyn Session>, SessionError> {
        Ok(self.session.clone())
    }
}

/// Provider building one [`BrowserSession`] per configured connection.
pub struct ConfigSessionProvider {
    sessions: HashMap<String, Arc<dyn Session>>,
    default_connection: Option<String>,
}

impl ConfigSessionProvider {
    /// Construct sessions for every connection in the configuration.
    pub fn from_config(config: &StorageConfig) -> Result<Self, SessionError> {
        let mut sessions: HashMap<String, Arc<dyn Session>> = HashMap::new();
        for (name, connection) in &config.connections {
            sessions.insert(name.clone(), Arc::new(BrowserSession::new(connection)?));
        }
        Ok(ConfigSessionProvider {
            sessions,
            default_connection: config.repository.clone(),
        })
    }
}

impl SessionProvider for ConfigSessionProvider {
    fn session(&self, connection: Option<&str>) -> Result<Arc<dyn Session>, SessionError> {
        let name = connection
            .or(self.default_connection.as_deref())
            .ok_or_else(|| {
                SessionError::Protocol("No repository connection configured".to_string())
            })?;
        self.sessions.get(name).cloned().ok_or_else(|| {
            SessionError::Protocol(format!("Unknown repository connection '{}'", name))
        })
    }
}
