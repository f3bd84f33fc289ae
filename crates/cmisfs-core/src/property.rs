//! CMIS property identifiers used in creation and update property bags.

pub const NAME: &str = "cmis:name";
pub const OBJECT_ID: &str = "cmis:objectId";
pub const OBJECT_TYPE_ID: &str = "cmis:objectTypeId";
pub const PARENT_ID: &str = "cmis:parentId";
pub const BASE_TYPE_ID: &str = "cmis:baseTypeId";
pub const CONTENT_STREAM_LENGTH: &str = "cmis:contentStreamLength";
pub const CONTENT_STREAM_MIME_TYPE: &str = "cmis:contentStreamMimeType";
pub const CREATION_DATE: &str = "cmis:creationDate";
pub const LAST_MODIFICATION_DATE: &str = "cmis:lastModificationDate";
pub const SECONDARY_OBJECT_TYPE_IDS: &str = "cmis:secondaryObjectTypeIds";
pub const SOURCE_ID: &str = "cmis:sourceId";
pub const TARGET_ID: &str = "cmis:targetId";

/// Aspect marking a document as originating from the host filesystem layer.
pub const ASPECT_HOST_FILE: &str = "P:cmisfs:hostFile";
/// Emulated path the document was created under.
pub const RAW_DATA: &str = "cmisfs:rawData";
/// Host-side table a relation source record lives in.
pub const SOURCE_TABLE: &str = "cmisfs:sourceTable";
/// Host-side record uid for relation sources.
pub const SOURCE_UID: &str = "cmisfs:sourceUid";
