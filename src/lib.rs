//! docshelf - Document catalog service.
//!
//! Clients upload office/text files; docshelf stores each file's bytes in a
//! blob area, records metadata in a durable index, and exposes
//! search/sort/paginated listing, streaming download, bulk delete, and
//! on-the-fly zip archive export over HTTP.

pub mod config;
pub mod error;
pub mod logging;
pub mod store;
pub mod web;

pub use config::Config;
pub use error::{DocshelfError, Result};
pub use store::{
    BlobStore, DocumentRecord, DocumentStore, IngestFile, ListPage, ListParams, MetadataIndex,
    SortBy, SortOrder, StreamMode,
};
pub use web::WebServer;
