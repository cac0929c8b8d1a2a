//! # commissary-mail
//!
//! Mail-provider access for the Commissary intake pipeline.
//!
//! This crate provides:
//! - The [`MailProvider`] trait: the abstract contract the pipeline
//!   consumes (list unread, fetch message, fetch attachment, mark read)
//! - The [`CredentialProvider`] trait and expiry-aware [`AccessToken`]
//! - [`RestMailClient`]: a client for Gmail-style REST mail APIs
//! - URL-safe Base64 decoding for message bodies and attachment payloads

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod client;
pub mod encoding;
mod error;
pub mod provider;
pub mod types;

pub use auth::{AccessToken, CredentialProvider, StaticCredentials};
pub use client::RestMailClient;
pub use error::{Error, Result};
pub use provider::MailProvider;
pub use types::{AttachmentLocator, FullMessage, MessagePart, MessageQuery, MessageSummary, PartBody};
