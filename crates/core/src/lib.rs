//! # Matrix Core
//!
//! Projection of sparse N-dimensional task results onto 1-D/2-D display tables.
//!
//! A test task varies K parameters. Every finished subtask lands at one
//! coordinate (one value index per parameter) and the results service ships
//! the whole thing as a sparse map from comma-joined keys to cells. This
//! crate turns that map into a table the user can read: pick one or two
//! dimensions as axes, pin the rest with filters, get a dense grid back.
//!
//! ## Architecture
//!
//! ```text
//! MatrixPayload
//!     │
//!     ├──> Dimension Discovery (once per payload)
//!     │      ├─ Dimension count from the longest key
//!     │      ├─ Observed value set per dimension (sentinel -1 excluded)
//!     │      └─ Names/labels from variables_map
//!     │
//!     ├──> Coordinate Space (immutable snapshot)
//!     │      ├─ Canonical key codec (contiguous prefix from dimension 0)
//!     │      └─ Cells resolved to Success / Error / Pending / Absent
//!     │
//!     └──> Axis Projector (re-run on every axis/filter change)
//!            ├─ Resolve filters (defaults for anything missing/invalid)
//!            ├─ Walk axis values in ascending index order
//!            └─ DisplayTable (rows x columns of DisplayCell)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use matrix_core::{discover_payload, AxisProjector, AxisSelection, CoordinateSpace};
//! use matrix_protocol::MatrixPayload;
//!
//! let payload = MatrixPayload::from_json_slice(br#"{
//!     "variables_map": {"v0": {"name": "style", "values": ["a", "b", "c"]}},
//!     "coordinates_by_indices": {"0": "img0.png", "1": "img1.png", "2": "img2.png"}
//! }"#).unwrap();
//!
//! let space = CoordinateSpace::from_payload(&payload);
//! let report = discover_payload(&payload);
//! let axes = AxisSelection::default_for(&report.dimensions);
//! let table = AxisProjector::new(&space, &report.dimensions).project(axes, &[]);
//!
//! assert_eq!(table.columns, vec!["a", "b", "c"]);
//! assert_eq!(table.valid_cells(), 3);
//! ```

mod cell;
mod config;
mod discovery;
mod error;
mod key;
mod projector;
mod space;
mod summary;
mod table;

pub use cell::{CellMeta, CellResult, ERROR_MARKER};
pub use config::ProjectorConfig;
pub use discovery::{
    analyze, discover, discover_payload, named_dimensions, Dimension, DiscoveryReport,
    NamedDimension, NamedDimensions,
};
pub use error::{MatrixError, Result};
pub use key::{dimension_key, parse_dimension_ref, CoordinateKey, Coordinates};
pub use projector::{
    default_filters, project, resolve_filters, AxisProjector, AxisSelection, DimensionFilter,
};
pub use space::CoordinateSpace;
pub use summary::{MatrixSummary, ResultStatistics};
pub use table::{DisplayCell, DisplayRow, DisplayTable, EmptyReason, SortDirection};
