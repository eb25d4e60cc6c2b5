//! `.FCStd` document import.
//!
//! An `.FCStd` file is a ZIP archive holding `Document.xml` (objects and
//! their properties), an optional `GuiDocument.xml` (visibility and color),
//! BREP shape files and embedded images. Import runs in two passes: shapes
//! and image planes are converted per object, then assemblies take
//! ownership of their members' nodes.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use lens_core::fcstd::{FcstdImporter, ImportOptions};
//!
//! let importer = FcstdImporter::new(Arc::new(my_kernel), ImportOptions::default());
//! let report = importer.import_path("bracket.FCStd")?;
//! println!("{} top-level nodes", report.model.node_count());
//! ```

mod appearance;
mod assembly;
mod cancel;
mod container;
mod filter;
mod geometry;
mod image_plane;
mod importer;
mod metadata;
mod options;
mod presentation;
mod registry;
mod xml;

#[cfg(test)]
pub(crate) mod test_support;

pub use appearance::{parse_packed_color, read_material_list, AppearanceError, Material};
pub use assembly::AssemblyBuilder;
pub use cancel::CancellationToken;
pub use container::{Container, ContainerError, ContainerResult};
pub use filter::eligible;
pub use geometry::{
    ConvertedShapes, DecodedShape, GeometryConverter, GeometryError, GeometryKernel, KernelError,
    SkipReason,
};
pub use image_plane::{ImageJob, ImageOutcome, PendingImages};
pub use importer::{
    FcstdImporter, ImportDiagnostic, ImportError, ImportReport, ImportResult, ImportStatus,
    FCSTD_EXTENSION,
};
pub use metadata::{
    decode_properties, is_supported_type, MetadataError, MetadataParser, ParsedDocument,
    DOCUMENT_XML, EXCLUDED_TYPES,
};
pub use options::{default_naming_schemes, ImportOptions, NamingScheme, BREP_EXTENSIONS};
pub use presentation::{apply as apply_presentation, GUI_DOCUMENT_XML};
pub use registry::{FileRef, ObjectRecord, RecordId, Registry};
pub use xml::{parse_document, XmlElement, XmlError};
