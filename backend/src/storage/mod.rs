//! # Storage Layer
//!
//! Document-store abstraction used by the domain services, with a SQLite
//! implementation.

pub mod batch;
pub mod connection;
pub mod error;
pub mod paths;
pub mod repository;
pub mod traits;

pub use batch::{WriteBatch, WriteOp};
pub use connection::DbConnection;
pub use error::{StoreError, StoreResult};
pub use paths::{CollectionPath, DocumentPath, StorePaths};
pub use repository::{field_value, Document, Repository};
pub use traits::{ChangeEvent, ChangeKind, DocumentStore, Subscription};
