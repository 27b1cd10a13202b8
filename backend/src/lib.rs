//! # Sky Catalog
//!
//! Catalog aggregation and spatial-query engine for an interactive sky viewer.
//!
//! The crate fans searches out to several catalog providers, merges and
//! deduplicates their answers, and caches results behind an expiring LRU.
//! Around that core it offers the geometry a sky viewer needs: coordinate
//! parsing and formatting, sky ↔ pixel projections, RA-wrapping bounding
//! boxes and a named-region lookup.
//!
//! ## Architecture
//!
//! - [`models`]: coordinates, bounding boxes, categories and object summaries
//! - [`coords`]: free-text coordinate parsing, sexagesimal formatting, separations
//! - [`projection`]: gnomonic and equirectangular sky ↔ image transforms
//! - [`spatial`]: RA-wrapping bounding-box predicates
//! - [`cache`]: TTL + LRU cache with an injectable clock and background sweeper
//! - [`adapters`]: the provider trait, bundled providers and the aggregating registry
//! - [`resolve`]: free-text query → sky position
//! - [`regions`]: sky position → most specific named region
//! - [`config`]: TOML/env configuration
//! - [`error`]: crate error type

#![allow(clippy::result_large_err)]

pub mod adapters;
pub mod cache;
pub mod config;
pub mod coords;
pub mod error;
pub mod models;
pub mod projection;
pub mod regions;
pub mod resolve;
pub mod spatial;

pub use adapters::{
    AdapterError, AdapterRegistry, CatalogAdapter, LookupResult, RegistryBuilder, SearchPage,
    SearchQuery,
};
pub use config::CatalogConfig;
pub use error::{CatalogError, CatalogResult};
pub use models::{BoundingBox, Category, ObjectSummary, SkyCoordinate};
pub use projection::{Projection, ProjectionConfig, ProjectionKind};
pub use regions::{Region, RegionResolver};
pub use resolve::{QueryResolver, Resolution};
