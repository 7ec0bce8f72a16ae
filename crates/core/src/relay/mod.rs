//! Relay service: upload to a document host, map a public id, serve it back.
//!
//! ```text
//! upload:   files ─► validate ─► allocate id ─► host.send_document ─► store.put
//! download: id ─► store.get ─► host.resolve ─► host.fetch ─► byte stream
//! ```
//!
//! Batches are processed sequentially and abort on the first failure.

mod config;
mod error;
mod service;
mod types;

pub use config::{IdGenerator, RelaySettings};
pub use error::{RelayError, Stage};
pub use service::RelayService;
pub use types::{IncomingFile, StoredFile};
