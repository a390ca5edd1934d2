//! Root-prefixed key/blob storage.
//!
//! A [`KeyStorage`] is bound to one backend container and one root prefix.
//! Callers address objects by relative keys such as `"foo/bar.txt"`; the
//! storage rewrites them to `"<root>/foo/bar.txt"` before delegating to a
//! [`BlobBackend`], and strips the root back off listings.
//!
//! # Operations
//!
//! - `put` / `put_str` -- write bytes or UTF-8 text, overwriting
//! - `get` -- read bytes; a missing key is [`StorageError::DoesNotExist`]
//! - `list` / `list_recursive` -- keys under a prefix, root stripped
//! - `delete` -- idempotent removal
//! - `put_path` -- upload a file, or mirror a directory minus whatever its
//!   `.replicateignore` excludes
//!
//! # Backends
//!
//! All backends implement the [`BlobBackend`] trait and are injected into the
//! storage constructor:
//!
//! - [`InMemoryBackend`] -- `HashMap`-based store for tests and embedding
//! - [`DiskBackend`] -- containers as subdirectories of a local directory
//!
//! # Design Rules
//!
//! 1. The storage instance holds no mutable state; share it freely.
//! 2. Only "object absent" on `get` is translated; every other backend error
//!    is passed through unchanged.
//! 3. No retries, timeouts or rollback at this layer.

pub mod backend;
pub mod config;
pub mod disk;
pub mod error;
pub mod key;
pub mod memory;
pub mod storage;

pub use backend::BlobBackend;
pub use config::StorageConfig;
pub use disk::DiskBackend;
pub use error::{BackendError, BackendResult, StorageError, StorageResult};
pub use memory::InMemoryBackend;
pub use storage::{KeyStorage, PutPathSummary};
