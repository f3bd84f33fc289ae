//! Filesystem driver adapting a remote CMIS repository to a host storage
//! subsystem.
//!
//! The central type is [`CmisFilesystemDriver`]: a facade over one repository
//! connection that translates host filesystem calls (create, move, copy,
//! delete, metadata extraction) into repository operations. Identifiers are
//! dual-form: an opaque repository UUID (possibly carrying a `;MAJ.MIN`
//! version suffix) or an emulated slash path rooted at the storage's root
//! folder. Every public operation accepts both forms.

mod assertion;
mod capabilities;
mod creation;
mod deletion;
mod driver;
mod index;
mod info;
mod modification;
mod options;
mod resolve;
mod resolving;
mod transfer;

pub use capabilities::Capabilities;
pub use driver::CmisFilesystemDriver;
pub use index::{execute_relation_index, FileRelationJob, LocalObjectResolver};
pub use info::FileInfoKey;
pub use options::{repository_options, root_folder_options, SelectOption};
pub use resolve::strip_version;
pub use resolving::Permissions;
