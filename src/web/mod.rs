//! Web API module for docshelf.
//!
//! Thin HTTP collaborator over the document store: each route translates a
//! request into one store operation and streams or JSON-serializes the
//! result back. The store never talks to the network directly.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
