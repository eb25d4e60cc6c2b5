//! Shape conversion through the external geometry kernel.
//!
//! The kernel turns BREP bytes into triangle fragments. Everything it
//! returns for one record becomes a single scene node. A record the kernel
//! can't handle is skipped without affecting the rest of the batch.

use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;

use super::cancel::CancellationToken;
use super::container::Container;
use super::registry::ObjectRecord;
use crate::mesh::Mesh;
use crate::scene::{Color, NodeKind, RenderPayload, SceneNode};

/// Errors raised by a geometry kernel.
#[derive(Error, Debug)]
pub enum KernelError {
    #[error("geometry kernel failed to initialize: {0}")]
    Initialization(String),
}

/// Result of decoding one BREP payload.
#[derive(Clone, Debug, Default)]
pub struct DecodedShape {
    pub success: bool,

    /// One mesh per tessellated fragment
    pub meshes: Vec<Mesh>,
}

impl DecodedShape {
    pub fn success(meshes: Vec<Mesh>) -> Self {
        Self { success: true, meshes }
    }

    pub fn failure() -> Self {
        Self::default()
    }
}

/// The BREP tessellator the importer delegates to.
///
/// `decode_brep` only reads kernel state, so calls may run concurrently
/// once `initialize` has returned.
pub trait GeometryKernel: Send + Sync {
    /// Prepare the kernel. Called once per import batch before any decode.
    fn initialize(&self) -> Result<(), KernelError>;

    fn decode_brep(&self, bytes: &[u8]) -> DecodedShape;
}

/// Errors that abort a conversion batch.
#[derive(Error, Debug)]
pub enum GeometryError {
    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error("conversion cancelled")]
    Cancelled,
}

pub type GeometryResult<T> = Result<T, GeometryError>;

/// Why a shape record produced no node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Referenced file vanished from the container
    FileMissing,
    /// Kernel reported failure
    DecodeFailed,
    /// Kernel succeeded but produced no fragments
    NoFragments,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::FileMissing => write!(f, "shape file missing"),
            SkipReason::DecodeFailed => write!(f, "decode failed"),
            SkipReason::NoFragments => write!(f, "no mesh fragments"),
        }
    }
}

/// Output of a conversion batch, in input order.
#[derive(Debug, Default)]
pub struct ConvertedShapes {
    pub nodes: Vec<SceneNode>,

    /// Records that were skipped, with the reason
    pub skipped: Vec<(String, SkipReason)>,
}

/// Build a node carrying a record's identity, label, properties and color.
pub(crate) fn node_from_record(
    record: &ObjectRecord,
    kind: NodeKind,
    payload: RenderPayload,
    default_color: Color,
) -> SceneNode {
    let mut node = SceneNode::new(record.name.clone(), kind, payload);
    node.label = record.label.clone();
    node.properties = record.properties.clone();
    node.color = record.color_or(default_color);
    node
}

/// Converts shape records into mesh nodes.
pub struct GeometryConverter<'a> {
    kernel: &'a dyn GeometryKernel,
    container: &'a Container,
    default_color: Color,
    parallel: bool,
}

impl<'a> GeometryConverter<'a> {
    pub fn new(kernel: &'a dyn GeometryKernel, container: &'a Container, default_color: Color) -> Self {
        Self {
            kernel,
            container,
            default_color,
            parallel: false,
        }
    }

    /// Decode on the rayon pool. Output order is unchanged.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Convert every record that carries a shape file. Records without one
    /// are ignored.
    pub fn convert_all(
        &self,
        records: &[&ObjectRecord],
        cancel: &CancellationToken,
    ) -> GeometryResult<ConvertedShapes> {
        let shapes: Vec<&ObjectRecord> = records
            .iter()
            .copied()
            .filter(|r| r.shape_file().is_some())
            .collect();
        if shapes.is_empty() {
            return Ok(ConvertedShapes::default());
        }

        self.kernel.initialize()?;

        let outcomes: Vec<Option<Result<SceneNode, SkipReason>>> = if self.parallel {
            shapes
                .par_iter()
                .map(|record| (!cancel.is_cancelled()).then(|| self.convert(record)))
                .collect()
        } else {
            let mut outcomes = Vec::with_capacity(shapes.len());
            for record in &shapes {
                if cancel.is_cancelled() {
                    break;
                }
                outcomes.push(Some(self.convert(record)));
            }
            outcomes
        };

        if cancel.is_cancelled() {
            return Err(GeometryError::Cancelled);
        }

        let mut converted = ConvertedShapes::default();
        for (record, outcome) in shapes.iter().zip(outcomes.into_iter().flatten()) {
            match outcome {
                Ok(node) => converted.nodes.push(node),
                Err(reason) => {
                    log::debug!("Skipping '{}': {reason}", record.name);
                    converted.skipped.push((record.name.clone(), reason));
                }
            }
        }

        Ok(converted)
    }

    /// Decode one record's shape file into a node.
    pub fn convert(&self, record: &ObjectRecord) -> Result<SceneNode, SkipReason> {
        let bytes = record
            .shape_file()
            .and_then(|f| self.container.get(f))
            .ok_or(SkipReason::FileMissing)?;

        let decoded = self.kernel.decode_brep(bytes);
        if !decoded.success {
            return Err(SkipReason::DecodeFailed);
        }
        if decoded.meshes.is_empty() {
            return Err(SkipReason::NoFragments);
        }

        let meshes = decoded
            .meshes
            .into_iter()
            .map(|mut mesh| {
                mesh.ensure_normals();
                Arc::new(mesh)
            })
            .collect();

        Ok(node_from_record(
            record,
            NodeKind::Shape,
            RenderPayload::Meshes(meshes),
            self.default_color,
        ))
    }
}
