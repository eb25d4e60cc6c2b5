//! Lens Core - Scene graph and CAD document import.
//!
//! This crate provides:
//!
//! - **Scene graph types**: `Model`, `SceneNode`, `Mesh`, `Texture`
//! - **Typed metadata**: `PropertyGroup` and `PropertyValue`
//! - **FCStd support**: `.FCStd` container import into a `Model`
//!
//! # Example
//!
//! ```ignore
//! use lens_core::fcstd::{FcstdImporter, ImportOptions};
//!
//! let importer = FcstdImporter::new(kernel, ImportOptions::default());
//! let report = importer.import_path("assembly.FCStd")?;
//! println!("Imported {} nodes, {} triangles",
//!     report.model.node_count(),
//!     report.model.total_triangle_count());
//! ```

pub mod fcstd;
pub mod mesh;
pub mod property;
pub mod scene;
pub mod texture;

// Re-export commonly used types
pub use fcstd::{FcstdImporter, GeometryKernel, ImportOptions, ImportReport};
pub use mesh::Mesh;
pub use property::{Placement, Property, PropertyGroup, PropertyValue};
pub use scene::{Color, Model, NodeKind, RenderPayload, SceneNode, Transform};
pub use texture::Texture;
