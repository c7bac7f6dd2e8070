// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CityModel Model - Shared types and collaborator traits for city-model documents
//!
//! This crate provides the core abstractions for streaming over a city-model
//! document one item at a time. Concrete encodings implement the traits defined
//! here, so transformation code never depends on a specific file format.
//!
//! # Architecture
//!
//! - [`DocumentFormat`] - Opens readers and writers for a file, and runs the
//!   geometry template pre-scan
//! - [`DocumentReader`] - Pull-based source of [`DocumentItem`]s
//! - [`DocumentWriter`] - Sink receiving metadata, header, then items
//!
//! # Example
//!
//! ```ignore
//! use citymodel_model::{DocumentFormat, DocumentItem, SkipFilter};
//!
//! let format: &dyn DocumentFormat = get_format();
//! let mut reader = format.open_reader(path, &SkipFilter::none())?;
//! while let Some(item) = reader.next_item()? {
//!     if let DocumentItem::Feature(feature) = item {
//!         println!("{} {}", feature.kind, feature.id);
//!     }
//! }
//! ```

pub mod error;
pub mod feature;
pub mod geometry;
pub mod traits;
pub mod types;

// Re-export all public types
pub use error::*;
pub use feature::*;
pub use geometry::*;
pub use traits::*;
pub use types::*;
