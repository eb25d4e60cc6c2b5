//! Image planes: a raster embedded in the document, shown as a textured
//! rectangle.
//!
//! Decoding runs on the rayon pool and reports back over a channel. The
//! importer returns without waiting unless asked to, so callers that want
//! the planes drain `PendingImages` themselves.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;

use super::cancel::CancellationToken;
use super::geometry::node_from_record;
use super::registry::ObjectRecord;
use crate::mesh::Mesh;
use crate::scene::{Color, NodeKind, RenderPayload, SceneNode, Transform};
use crate::texture::{Texture, TextureError, TextureResult};

/// Result of one image-plane conversion.
#[derive(Debug)]
pub enum ImageOutcome {
    Ready(SceneNode),
    Failed { name: String, error: TextureError },
    Cancelled(String),
}

impl ImageOutcome {
    pub fn name(&self) -> &str {
        match self {
            ImageOutcome::Ready(node) => &node.name,
            ImageOutcome::Failed { name, .. } | ImageOutcome::Cancelled(name) => name,
        }
    }

    pub fn into_node(self) -> Option<SceneNode> {
        match self {
            ImageOutcome::Ready(node) => Some(node),
            _ => None,
        }
    }
}

/// One image record and its payload, owned so it can cross threads.
#[derive(Clone, Debug)]
pub struct ImageJob {
    pub record: ObjectRecord,
    pub bytes: Vec<u8>,
}

/// Build the textured plane for an image record.
///
/// The plane is `XSize` x `YSize` (0 when absent) in the XY plane,
/// rotated by the record's placement and then translated.
pub fn convert(record: &ObjectRecord, bytes: &[u8], default_color: Color) -> TextureResult<SceneNode> {
    let file_name = record.image_file().unwrap_or(&record.name);
    let texture = Texture::decode(bytes, file_name)?;

    let width = record.properties.number_or_zero("XSize") as f32;
    let height = record.properties.number_or_zero("YSize") as f32;
    let mesh = Mesh::plane(width, height);

    let placement = record
        .properties
        .placement("Placement")
        .copied()
        .unwrap_or_default();

    let mut node = node_from_record(
        record,
        NodeKind::Image,
        RenderPayload::TexturedPlane {
            mesh: Arc::new(mesh),
            texture: Arc::new(texture),
        },
        default_color,
    );
    node.transform = Transform {
        translation: placement.translation,
        rotation: placement.rotation(),
    };
    Ok(node)
}

/// Start converting every job on the rayon pool.
pub fn spawn_all(jobs: Vec<ImageJob>, default_color: Color, cancel: &CancellationToken) -> PendingImages {
    let (tx, rx) = mpsc::channel();
    let remaining = jobs.len();

    for (index, job) in jobs.into_iter().enumerate() {
        let tx = tx.clone();
        let cancel = cancel.clone();
        rayon::spawn(move || {
            let outcome = if cancel.is_cancelled() {
                ImageOutcome::Cancelled(job.record.name)
            } else {
                match convert(&job.record, &job.bytes, default_color) {
                    Ok(node) => ImageOutcome::Ready(node),
                    Err(error) => {
                        log::warn!("Image plane '{}' failed: {error}", job.record.name);
                        ImageOutcome::Failed {
                            name: job.record.name,
                            error,
                        }
                    }
                }
            };
            // Receiver may already be gone; nobody is waiting then.
            let _ = tx.send((index, outcome));
        });
    }

    PendingImages {
        receiver: rx,
        remaining,
        received: Vec::new(),
    }
}

/// Image conversions still in flight.
#[derive(Debug)]
pub struct PendingImages {
    receiver: Receiver<(usize, ImageOutcome)>,
    remaining: usize,
    received: Vec<(usize, ImageOutcome)>,
}

impl PendingImages {
    /// A handle with nothing to wait for.
    pub fn empty() -> Self {
        let (_, rx) = mpsc::channel();
        Self {
            receiver: rx,
            remaining: 0,
            received: Vec::new(),
        }
    }

    /// Conversions that have not reported yet.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    /// Outcomes that have arrived since the last call, without blocking.
    pub fn try_collect(&mut self) -> Vec<ImageOutcome> {
        loop {
            match self.receiver.try_recv() {
                Ok(item) => self.received.push(item),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        self.remaining -= self.received.len().min(self.remaining);
        take_sorted(&mut self.received)
    }

    /// Block until every remaining conversion has reported. Outcomes are in
    /// declaration order.
    pub fn wait(mut self) -> Vec<ImageOutcome> {
        while self.received.len() < self.remaining {
            match self.receiver.recv() {
                Ok(item) => self.received.push(item),
                Err(_) => break,
            }
        }
        take_sorted(&mut self.received)
    }
}

fn take_sorted(received: &mut Vec<(usize, ImageOutcome)>) -> Vec<ImageOutcome> {
    received.sort_by_key(|(index, _)| *index);
    received.drain(..).map(|(_, outcome)| outcome).collect()
}
