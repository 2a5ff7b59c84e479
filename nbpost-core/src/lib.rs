#![doc = "nbpost-core: core publish pipeline for nbpost."]

//! This crate contains the logic for turning a local HTML file or notebook into
//! a blog post without creating duplicates: document loading, rendering, the
//! title search across post lifecycle states and the create-or-update decision.
//! Transport (HTTP, OAuth) is not included here; it is plugged in through the
//! traits in [`contract`].
//!
//! # Usage
//! Load a [`document::Document`], then hand it to [`publish::publish`] together
//! with a [`contract::SessionProvider`] and a way to build a
//! [`contract::BlogDirectory`] from the session.

pub mod config;
pub mod contract;
pub mod document;
pub mod error;
pub mod finder;
pub mod notebook;
pub mod publish;
pub mod render;

pub use config::PublishConfig;
pub use error::PublishError;
