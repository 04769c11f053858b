// Remote storage: blob containers and the metadata table.
// Both are addressed by SAS URLs; no other credential is used.

pub mod blob;
pub mod sas;
pub mod table;

pub use blob::{BlobClient, BlobStore};
pub use table::{list_resumes, MetadataStore, TableClient};
