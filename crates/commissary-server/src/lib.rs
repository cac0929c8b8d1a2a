//! # commissary-server
//!
//! Local HTTP surface for the Commissary ingestion pipeline.
//!
//! The GUI shell talks to this server for everything the pipeline does:
//! polling the mailbox, repairing the image cache, and serving cached
//! images back for rendering.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
mod handlers;
mod routes;
mod state;

pub use error::{ApiError, ErrorBody};
pub use routes::{create_router, serve};
pub use state::AppState;
