//! Import orchestration: container bytes in, `Model` out.
//!
//! Only container-level problems abort an import. Objects that can't be
//! converted are skipped and reported as diagnostics.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use super::assembly::AssemblyBuilder;
use super::cancel::CancellationToken;
use super::container::{Container, ContainerError};
use super::filter::eligible;
use super::geometry::{GeometryConverter, GeometryError, GeometryKernel, KernelError, SkipReason};
use super::image_plane::{self, ImageJob, ImageOutcome, PendingImages};
use super::metadata::{MetadataError, MetadataParser, ParsedDocument};
use super::options::ImportOptions;
use super::presentation;
use super::registry::ObjectRecord;
use super::xml::XmlError;
use crate::scene::Model;

/// File extension handled by this importer (compared case-insensitively).
pub const FCSTD_EXTENSION: &str = "fcstd";

/// Errors that abort an import.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("container unreadable: {0}")]
    Container(#[from] ContainerError),

    #[error("malformed document metadata: {0}")]
    MalformedMetadata(#[source] XmlError),

    #[error(transparent)]
    KernelUnavailable(#[from] KernelError),

    #[error("import cancelled")]
    Cancelled,
}

pub type ImportResult<T> = Result<T, ImportError>;

/// How an import that didn't fail ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportStatus {
    Success,
    /// The container has no `Document.xml`; the model is empty
    NoDocumentMetadata,
}

/// Non-fatal findings from an import.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportDiagnostic {
    /// No registered object passed the convertibility filter
    NoConvertibleObjects,
    /// A shape record produced no node
    ShapeSkipped { name: String, reason: SkipReason },
}

/// Everything an import produced.
#[derive(Debug)]
pub struct ImportReport {
    pub status: ImportStatus,
    pub model: Model,
    pub diagnostics: Vec<ImportDiagnostic>,

    /// Image planes still converting. Not part of `model` until joined.
    pub pending_images: PendingImages,
}

impl ImportReport {
    fn new(status: ImportStatus, model: Model) -> Self {
        Self {
            status,
            model,
            diagnostics: Vec::new(),
            pending_images: PendingImages::empty(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ImportStatus::Success
    }

    /// Wait for outstanding image planes and append the ones that decoded
    /// to the model's top level.
    pub fn join_images(mut self) -> Self {
        let pending = std::mem::replace(&mut self.pending_images, PendingImages::empty());
        let nodes = pending.wait().into_iter().filter_map(ImageOutcome::into_node);
        self.model.nodes.extend(nodes);
        self
    }
}

/// Imports `.FCStd` documents.
pub struct FcstdImporter {
    kernel: Arc<dyn GeometryKernel>,
    options: ImportOptions,
}

impl FcstdImporter {
    pub fn new(kernel: Arc<dyn GeometryKernel>, options: ImportOptions) -> Self {
        Self { kernel, options }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    pub fn can_import_extension(extension: &str) -> bool {
        extension.eq_ignore_ascii_case(FCSTD_EXTENSION)
    }

    /// Read and import a document from disk.
    pub fn import_path<P: AsRef<Path>>(&self, path: P) -> ImportResult<ImportReport> {
        let bytes = std::fs::read(path.as_ref())?;
        self.import_container(&bytes)
    }

    pub fn import_container(&self, bytes: &[u8]) -> ImportResult<ImportReport> {
        self.import_container_with_cancel(bytes, &CancellationToken::new())
    }

    /// Import, checking `cancel` between records. A cancelled import returns
    /// `ImportError::Cancelled` and no partial model.
    pub fn import_container_with_cancel(
        &self,
        bytes: &[u8],
        cancel: &CancellationToken,
    ) -> ImportResult<ImportReport> {
        let container = Container::from_bytes(bytes)?;

        let mut document = match MetadataParser::new(&container, &self.options.naming_schemes).parse() {
            Ok(document) => document,
            Err(MetadataError::NoDocumentMetadata) => {
                log::warn!("Container has no document metadata, nothing to import");
                return Ok(ImportReport::new(ImportStatus::NoDocumentMetadata, Model::default()));
            }
            Err(MetadataError::Xml(e)) => return Err(ImportError::MalformedMetadata(e)),
        };

        presentation::apply(&container, &mut document.registry);

        let mut report = self.convert(&container, &document, cancel)?;
        if self.options.join_images {
            report = report.join_images();
        }
        if cancel.is_cancelled() {
            return Err(ImportError::Cancelled);
        }

        log::info!(
            "Imported {} top-level nodes ({} triangles), {} image planes pending, {} diagnostics",
            report.model.node_count(),
            report.model.total_triangle_count(),
            report.pending_images.remaining(),
            report.diagnostics.len()
        );
        Ok(report)
    }

    fn convert(
        &self,
        container: &Container,
        document: &ParsedDocument,
        cancel: &CancellationToken,
    ) -> ImportResult<ImportReport> {
        let registry = &document.registry;
        let mut model = Model::new(document.properties.clone());
        model.property_bag = document.property_bag().cloned();
        model.linked_files = document.linked_files.clone();

        let records: Vec<&ObjectRecord> = registry
            .iter()
            .map(|(_, record)| record)
            .filter(|record| eligible(record, registry))
            .collect();

        if records.is_empty() {
            log::info!("No convertible objects in document");
            let mut report = ImportReport::new(ImportStatus::Success, model);
            report.diagnostics.push(ImportDiagnostic::NoConvertibleObjects);
            return Ok(report);
        }

        // Every image plane is rendered, hidden or linked ones included.
        let image_jobs: Vec<ImageJob> = registry
            .iter()
            .map(|(_, record)| record)
            .filter(|record| record.is_image_plane())
            .filter_map(|record| {
                let bytes = container.get(record.image_file()?)?;
                Some(ImageJob {
                    record: record.clone(),
                    bytes: bytes.to_vec(),
                })
            })
            .collect();
        let pending_images = image_plane::spawn_all(image_jobs, self.options.default_color, cancel);

        let converted = GeometryConverter::new(self.kernel.as_ref(), container, self.options.default_color)
            .with_parallel(self.options.parallel_decode)
            .convert_all(&records, cancel)
            .map_err(|e| match e {
                GeometryError::Kernel(e) => ImportError::KernelUnavailable(e),
                GeometryError::Cancelled => ImportError::Cancelled,
            })?;

        let order: Vec<String> = converted.nodes.iter().map(|n| n.name.clone()).collect();
        let mut by_name: HashMap<_, _> = converted
            .nodes
            .into_iter()
            .map(|n| (n.name.clone(), n))
            .collect();

        let groups = AssemblyBuilder::new(registry, self.options.default_color)
            .build(&mut by_name, cancel)
            .ok_or(ImportError::Cancelled)?;

        for name in &order {
            if let Some(node) = by_name.remove(name) {
                model.add_node(node);
            }
        }
        for group in groups {
            model.add_node(group);
        }

        let mut report = ImportReport::new(ImportStatus::Success, model);
        report.pending_images = pending_images;
        report.diagnostics = converted
            .skipped
            .into_iter()
            .map(|(name, reason)| ImportDiagnostic::ShapeSkipped { name, reason })
            .collect();
        Ok(report)
    }
}
