/**
 * Tenant bucket resolution.
 *  Maps an inbound `Host` header and request path
 *  onto a sandboxed location under the storage root.
 */
pub mod bucket;
/**
 * Browsable ZIP archives.
 *  Listing a stored archive's central directory,
 *  extracting it into a scoped scratch workspace and
 *  serving single entries addressed by a locator token.
 */
pub mod archive;
/**
 * Thin async wrapper around the filesystem
 *  that holds tenant objects.
 */
pub mod store;
/**
 * Content type detection from a byte payload.
 */
pub mod sniff;

pub mod prelude {
    pub use crate::archive::{
        extract_to_workspace, list_entries, ArchiveEntry, ArchiveError, ArchiveLimits, Locator,
        ServedEntry, Workspace,
    };
    pub use crate::bucket::{BucketResolver, Resolved, ResolveError, SelfHosts};
    pub use crate::sniff::detect_content_type;
    pub use crate::store::{DirEntry, ObjectMeta, ObjectStore, StoreError};
}
