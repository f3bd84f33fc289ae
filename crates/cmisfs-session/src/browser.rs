use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::debug;

use cmisfs_config::ConnectionConfig;
use cmisfs_core::{
    property, Action, DocumentSpec, FolderSpec, ObjectKind, OperationContext, RepositoryObject,
    Session, SessionError,
};

/// Session speaking the CMIS Browser Binding (JSON over HTTP).
///
/// Reads use `cmisselector` GET queries, mutations use `cmisaction`
/// multipart POSTs against the repository root URL.
pub struct BrowserSession {
    client: Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl BrowserSession {
    /// Create a session for one configured connection.
    pub fn new(config: &ConnectionConfig) -> Result<Self, SessionError> {
        let client = Client::builder().build().map_err(|e| {
            SessionError::Protocol(format!("Failed to create HTTP client: {}", e))
        })?;

        let mut base_url = config.url.trim_end_matches('/').to_string();
        if let Some(ref repository_id) = config.repository_id {
            base_url = format!("{}/{}", base_url, repository_id);
        }

        Ok(BrowserSession {
            client,
            base_url,
            username: config.username.clone(),
            password: config.password.as_ref().map(|p| p.expose().to_string()),
        })
    }

    fn root_url(&self) -> String {
        format!("{}/root", self.base_url)
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let req = self.client.get(url);
        if let Some(ref username) = self.username {
            req.basic_auth(username, self.password.as_deref())
        } else {
            req
        }
    }

    fn post(&self, form: Form) -> reqwest::RequestBuilder {
        let req = self.client.post(self.root_url()).multipart(form);
        if let Some(ref username) = self.username {
            req.basic_auth(username, self.password.as_deref())
        } else {
            req
        }
    }

    async fn fetch_json(&self, url: &str, id: &str) -> Result<Value, SessionError> {
        let response = self
            .get(url)
            .send()
            .await
            .map_err(|e| connection_failed(&self.base_url, e))?;

        match response.status() {
            status if status == reqwest::StatusCode::NOT_FOUND => {
                Err(SessionError::NotFound(id.to_string()))
            }
            status if !status.is_success() => Err(SessionError::Protocol(format!(
                "GET {} returned status {}",
                url, status
            ))),
            _ => response
                .json::<Value>()
                .await
                .map_err(|e| SessionError::Protocol(format!("Invalid JSON response: {}", e))),
        }
    }

    async fn send_action(&self, form: Form, id: &str) -> Result<Value, SessionError> {
        let response = self
            .post(form)
            .send()
            .await
            .map_err(|e| connection_failed(&self.base_url, e))?;

        match response.status() {
            status if status == reqwest::StatusCode::NOT_FOUND => {
                Err(SessionError::NotFound(id.to_string()))
            }
            status if status == reqwest::StatusCode::CONFLICT => {
                Err(SessionError::Conflict(id.to_string()))
            }
            status if !status.is_success() => Err(SessionError::Protocol(format!(
                "cmisaction for {} returned status {}",
                id, status
            ))),
            _ => response
                .json::<Value>()
                .await
                .map_err(|e| SessionError::Protocol(format!("Invalid JSON response: {}", e))),
        }
    }
}

fn connection_failed(connection: &str, source: reqwest::Error) -> SessionError {
    if source.is_timeout() {
        SessionError::Timeout {
            operation: "http".to_string(),
            object: connection.to_string(),
        }
    } else {
        SessionError::ConnectionFailed {
            connection: connection.to_string(),
            source: Box::new(source),
        }
    }
}

/// Build a multipart form carrying a cmisaction plus indexed properties.
fn action_form(action: &str, object_id: &str, properties: &[(&str, String)]) -> Form {
    let mut form = Form::new()
        .text("cmisaction", action.to_string())
        .text("objectId", object_id.to_string())
        .text("succinct", "true".to_string());
    for (index, (id, value)) in properties.iter().enumerate() {
        form = form
            .text(format!("propertyId[{}]", index), id.to_string())
            .text(format!("propertyValue[{}]", index), value.clone());
    }
    form
}

fn object_id_of(value: &Value) -> Result<String, SessionError> {
    succinct(value)
        .get(property::OBJECT_ID)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| SessionError::Protocol("Response carries no cmis:objectId".to_string()))
}

fn succinct(value: &Value) -> &Value {
    value.get("succinctProperties").unwrap_or(value)
}

fn parse_date(value: Option<&Value>) -> Option<DateTime<Utc>> {
    value
        .and_then(Value::as_i64)
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
}

fn parse_action(name: &str) -> Option<Action> {
    match name {
        "canGetProperties" => Some(Action::CanGetProperties),
        "canCreateDocument" => Some(Action::CanCreateDocument),
        "canCreateFolder" => Some(Action::CanCreateFolder),
        "canDeleteObject" => Some(Action::CanDeleteObject),
        "canSetContentStream" => Some(Action::CanSetContentStream),
        "canGetContentStream" => Some(Action::CanGetContentStream),
        _ => None,
    }
}

/// Decode one succinct object description into a handle.
fn parse_object(value: &Value) -> Result<RepositoryObject, SessionError> {
    let props = succinct(value);
    let id = props
        .get(property::OBJECT_ID)
        .and_then(Value::as_str)
        .ok_or_else(|| SessionError::Protocol("Object carries no cmis:objectId".to_string()))?;
    let name = props
        .get(property::NAME)
        .and_then(Value::as_str)
        .unwrap_or_default();
    let kind = match props.get(property::BASE_TYPE_ID).and_then(Value::as_str) {
        Some(cmisfs_core::TYPE_FOLDER) => ObjectKind::Folder,
        _ => ObjectKind::Document,
    };
    let allowed_actions = value.get("allowableActions").and_then(Value::as_object).map(
        |actions: &Map<String, Value>| {
            actions
                .iter()
                .filter(|(_, enabled)| enabled.as_bool().unwrap_or(false))
                .filter_map(|(name, _)| parse_action(name))
                .collect()
        },
    );

    Ok(RepositoryObject {
        id: id.to_string(),
        name: name.to_string(),
        parent_id: props
            .get(property::PARENT_ID)
            .and_then(Value::as_str)
            .map(str::to_string),
        kind,
        size: props
            .get(property::CONTENT_STREAM_LENGTH)
            .and_then(Value::as_u64),
        mime_type: props
            .get(property::CONTENT_STREAM_MIME_TYPE)
            .and_then(Value::as_str)
            .map(str::to_string),
        created: parse_date(props.get(property::CREATION_DATE)),
        modified: parse_date(props.get(property::LAST_MODIFICATION_DATE)),
        allowed_actions,
        content_url: value
            .get("contentUrl")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

#[async_trait]
impl Session for BrowserSession {
    async fn object(
        &self,
        id: &str,
        context: Option<&OperationContext>,
    ) -> Result<RepositoryObject, SessionError> {
        let mut url = format!(
            "{}?cmisselector=object&objectId={}&succinct=true&includeAllowableActions=true",
            self.root_url(),
            id
        );
        if let Some(filter) = context.and_then(|c| c.rendition_filter.as_deref()) {
            url = format!("{}&renditionFilter={}", url, filter);
        }
        debug!(id = %id, "fetching object");
        let value = self.fetch_json(&url, id).await?;
        parse_object(&value)
    }

    async fn root_folder(&self) -> Result<RepositoryObject, SessionError> {
        let url = format!("{}?cmisselector=object&succinct=true", self.root_url());
        let value = self.fetch_json(&url, "root").await?;
        parse_object(&value)
    }

    async fn children(&self, folder_id: &str) -> Result<Vec<RepositoryObject>, SessionError> {
        let url = format!(
            "{}?cmisselector=children&objectId={}&succinct=true",
            self.root_url(),
            folder_id
        );
        let value = self.fetch_json(&url, folder_id).await?;
        let entries = value
            .get("objects")
            .and_then(Value::as_array)
            .ok_or_else(|| SessionError::Protocol("children response has no objects".to_string()))?;
        entries
            .iter()
            .map(|entry| parse_object(entry.get("object").unwrap_or(entry)))
            .collect()
    }

    async fn create_folder(
        &self,
        spec: &FolderSpec,
        parent_id: &str,
    ) -> Result<String, SessionError> {
        let form = action_form(
            "createFolder",
            parent_id,
            &[
                (property::OBJECT_TYPE_ID, cmisfs_core::TYPE_FOLDER.to_string()),
                (property::NAME, spec.name.clone()),
            ],
        );
        let value = self.send_action(form, parent_id).await?;
        object_id_of(&value)
    }

    async fn create_document(
        &self,
        spec: &DocumentSpec,
        parent_id: &str,
        content: Option<Vec<u8>>,
    ) -> Result<String, SessionError> {
        let mut properties = vec![
            (
                property::OBJECT_TYPE_ID,
                cmisfs_core::TYPE_DOCUMENT.to_string(),
            ),
            (property::NAME, spec.name.clone()),
        ];
        for (id, value) in &spec.properties {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            properties.push((id.as_str(), rendered));
        }

        let mut form = action_form("createDocument", parent_id, &properties);
        if let Some(bytes) = content {
            let mut part = Part::bytes(bytes).file_name(spec.name.clone());
            if let Some(ref mime) = spec.mime_type {
                part = part
                    .mime_str(mime)
                    .map_err(|e| SessionError::Protocol(format!("Invalid mime type: {}", e)))?;
            }
            form = form.part("content", part);
        }
        let value = self.send_action(form, parent_id).await?;
        object_id_of(&value)
    }

    async fn update_properties(
        &self,
        id: &str,
        properties: Map<String, Value>,
    ) -> Result<RepositoryObject, SessionError> {
        let rendered: Vec<(&str, String)> = properties
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.as_str(), text)
            })
            .collect();
        let form = action_form("update", id, &rendered);
        let value = self.send_action(form, id).await?;
        parse_object(&value)
    }

    async fn set_content(
        &self,
        id: &str,
        content: Vec<u8>,
        overwrite: bool,
    ) -> Result<(), SessionError> {
        let form = action_form("setContent", id, &[])
            .text("overwriteFlag", overwrite.to_string())
            .part("content", Part::bytes(content));
        self.send_action(form, id).await?;
        Ok(())
    }

    async fn content(&self, id: &str) -> Result<Option<Vec<u8>>, SessionError> {
        let url = format!(
            "{}?cmisselector=content&objectId={}",
            self.root_url(),
            id
        );
        let response = self
            .get(&url)
            .send()
            .await
            .map_err(|e| connection_failed(&self.base_url, e))?;

        match response.status() {
            // Repositories answer 404 for a document without a content
            // stream; absence of content is not an error at this layer.
            status if status == reqwest::StatusCode::NOT_FOUND => Ok(None),
            status if status == reqwest::StatusCode::CONFLICT => Ok(None),
            status if !status.is_success() => Err(SessionError::Protocol(format!(
                "content fetch for {} returned status {}",
                id, status
            ))),
            _ => response
                .bytes()
                .await
                .map(|b| Some(b.to_vec()))
                .map_err(|e| SessionError::Protocol(format!("content read failed: {}", e))),
        }
    }

    async fn copy(&self, id: &str, target_folder_id: &str) -> Result<String, SessionError> {
        let form = action_form("createDocumentFromSource", target_folder_id, &[])
            .text("sourceId", id.to_string());
        let value = self.send_action(form, id).await?;
        object_id_of(&value)
    }

    async fn move_object(
        &self,
        id: &str,
        source_folder_id: &str,
        target_folder_id: &str,
    ) -> Result<String, SessionError> {
        let form = action_form("move", id, &[])
            .text("sourceFolderId", source_folder_id.to_string())
            .text("targetFolderId", target_folder_id.to_string());
        let value = self.send_action(form, id).await?;
        object_id_of(&value)
    }

    async fn delete(&self, id: &str) -> Result<(), SessionError> {
        let form = Form::new()
            .text("cmisaction", "delete".to_string())
            .text("objectId", id.to_string());
        let response = self
            .post(form)
            .send()
            .await
            .map_err(|e| connection_failed(&self.base_url, e))?;
        match response.status() {
            status if status == reqwest::StatusCode::NOT_FOUND => {
                Err(SessionError::NotFound(id.to_string()))
            }
            status if !status.is_success() => Err(SessionError::Protocol(format!(
                "delete of {} returned status {}",
                id, status
            ))),
            _ => Ok(()),
        }
    }

    async fn delete_tree(&self, id: &str) -> Result<Vec<String>, SessionError> {
        let form = Form::new()
            .text("cmisaction", "deleteTree".to_string())
            .text("objectId", id.to_string())
            .text("allVersions", "true".to_string())
            .text("unfileObjects", "unfile".to_string());
        let value = self.send_action(form, id).await?;
        let failed = value
            .get("ids")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(failed)
    }

    async fn create_relationship(
        &self,
        type_id: &str,
        source_id: &str,
        target_id: &str,
    ) -> Result<String, SessionError> {
        let form = action_form(
            "createRelationship",
            source_id,
            &[
                (property::OBJECT_TYPE_ID, type_id.to_string()),
                (property::SOURCE_ID, source_id.to_string()),
                (property::TARGET_ID, target_id.to_string()),
            ],
        );
        let value = self.send_action(form, source_id).await?;
        object_id_of(&value)
    }
}
