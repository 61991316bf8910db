#![doc = "cdn-catalog-core: core logic library for cdn-catalog."]

//! This crate holds the catalog build pipeline: conditional download of the
//! upstream package feed, streaming reduction of the feed into catalog
//! entries, version ordering, catalog encodings and build numbering.
//!
//! # Usage
//! Construct a [`config::CatalogConfig`], pick a [`contract::Fetcher`]
//! (usually [`download::HttpFetcher`]) and call [`pipeline::build_catalog`].

pub mod catalog;
pub mod config;
pub mod contract;
pub mod download;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod state;
pub mod transform;
pub mod version;
pub mod walker;

pub use error::CatalogError;
