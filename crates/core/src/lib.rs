//! Core library for arcrest
//!
//! This crate implements the **Functional Core** of the arcrest application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`arcrest_core`** (this crate): Pure logic with zero I/O
//! - **`arcrest`**: HTTP transport, orchestration and the CLI (the Imperative Shell)
//!
//! The two algorithms with real control flow, discovering the folder tree and
//! paging through a layer's features, are written as sans-IO state machines.
//! They say which request to make next and consume its result; the shell
//! performs the request. That keeps every branch of both loops testable with
//! plain JSON fixtures.
//!
//! # Module Organization
//!
//! - [`endpoint`]: Base URL validation and request URL construction
//! - [`catalog`]: Folder/service model, listing parsing and flattened views
//! - [`walker`]: Hierarchy walker producing a [`catalog::FolderNode`] tree
//! - [`pager`]: Paginated feature query loop
//! - [`layers`]: Layer list projection of a MapServer descriptor
//! - [`error`]: Failure taxonomy
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use arcrest_core::endpoint::validate_endpoint;
//! use arcrest_core::pager::{FeaturePager, FeatureQuery};
//!
//! let endpoint = validate_endpoint("https://example.com/arcgis/rest/services")?;
//! let query = FeatureQuery::all("Roads", 0);
//! let mut pager = FeaturePager::new(query.page_size);
//!
//! while let Some(cursor) = pager.next_page() {
//!     let url = endpoint.layer_query_url(&query.service, query.layer_id);
//!     pager.accept(fetch(&url, &query.params(&cursor)));
//! }
//!
//! let collection = pager.finish();
//! ```

pub mod catalog;
pub mod endpoint;
pub mod error;
pub mod layers;
pub mod pager;
pub mod walker;
