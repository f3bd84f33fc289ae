//! Selector lists for storage configuration forms.

use cmisfs_config::StorageConfig;
use cmisfs_core::DriverError;

use crate::driver::CmisFilesystemDriver;

/// One entry of a configuration form selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        SelectOption {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Options for the repository selector: one entry per configured
/// connection, labeled with its endpoint URL.
pub fn repository_options(config: &StorageConfig) -> Vec<SelectOption> {
    config
        .connections
        .iter()
        .map(|(name, connection)| {
            SelectOption::new(format!("{} ({})", name, connection.url), name.clone())
        })
        .collect()
}

/// Options for the root folder selector: every folder directly under the
/// connection root, labeled by name and valued by identifier.
pub async fn root_folder_options(
    driver: &CmisFilesystemDriver,
) -> Result<Vec<SelectOption>, DriverError> {
    let session = driver.session()?;
    let root = session.root_folder().await?;
    let mut options: Vec<SelectOption> = session
        .children(&root.id)
        .await?
        .into_iter()
        .filter(|child| child.is_folder())
        .map(|folder| SelectOption::new(folder.name, folder.id))
        .collect();
    options.sort_by(|a, b| a.label.cmp(&b.label));
    Ok(options)
}
