mod error;
mod object;
pub mod property;
mod session;

pub use error::{DriverError, SessionError};
pub use object::{Action, FolderRole, ObjectKind, RepositoryObject};
pub use session::{DocumentSpec, FolderSpec, OperationContext, Session, SessionProvider};

/// Reserved folder holding processed file variants (resized images etc.).
pub const FOLDER_PROCESSED: &str = "_processed_";
/// Reserved folder new files are put into when no target is given.
pub const FOLDER_DEFAULT: &str = "user_upload";
/// Reserved folder for temporary files.
pub const FOLDER_TEMP: &str = "_temp_";
/// Reserved folder for deleted files awaiting final removal.
pub const FOLDER_RECYCLER: &str = "_recycler_";
/// Well-known folder name used as the storage root when none is configured.
pub const FOLDER_SHARED: &str = "Shared";

/// CMIS base type id for folders.
pub const TYPE_FOLDER: &str = "cmis:folder";
/// CMIS base type id for documents.
pub const TYPE_DOCUMENT: &str = "cmis:document";
/// Relationship type used to link host records to repository documents.
pub const TYPE_FILE_RELATION: &str = "R:cmisfs:references";
