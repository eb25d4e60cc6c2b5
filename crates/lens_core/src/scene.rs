//! Scene graph types produced by the importers.
//!
//! A `Model` owns an ordered list of top-level `SceneNode`s. Assembly nodes
//! own their children; every node records its parent by identity only, so
//! the graph never forms ownership cycles.

use std::collections::BTreeMap;
use std::sync::Arc;

use lens_math::{Aabb, Mat4, Quat, Vec3};
use serde::Serialize;

use crate::mesh::Mesh;
use crate::property::PropertyGroup;
use crate::texture::Texture;

/// Linear RGBA color, 0-1 per channel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Decode a color packed as `0xRRGGBBAA`.
    pub fn from_packed(packed: u32) -> Self {
        let channel = |shift: u32| ((packed >> shift) & 0xff) as f32 / 255.0;
        Self {
            r: channel(24),
            g: channel(16),
            b: channel(8),
            a: channel(0),
        }
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }
}

impl Default for Color {
    /// Neutral grey used for objects without a resolved color.
    fn default() -> Self {
        Self::rgb(0.8, 0.8, 0.8)
    }
}

/// Local transform of a node relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Transform {
    /// Rotation only, no translation.
    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            ..Default::default()
        }
    }

    /// Convert to a 4x4 matrix. Order: rotate, then translate.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation)
    }
}

/// What a scene node represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    /// Tessellated solid from a BREP shape
    Shape,
    /// Textured image plane
    Image,
    /// Grouping node with children
    Assembly,
}

/// Drawable content of a node.
#[derive(Clone, Debug)]
pub enum RenderPayload {
    /// One mesh per decoded shape fragment, all sharing the node color
    Meshes(Vec<Arc<Mesh>>),

    /// A rectangle carrying a texture; drawn double sided, tinted by the node color
    TexturedPlane { mesh: Arc<Mesh>, texture: Arc<Texture> },

    /// No geometry of its own (assemblies)
    Group,
}

/// A node in the imported scene graph.
#[derive(Clone, Debug)]
pub struct SceneNode {
    /// Stable identity (the document's object name)
    pub name: String,

    /// User-facing label, when the document has one
    pub label: Option<String>,

    pub kind: NodeKind,

    pub properties: PropertyGroup,

    /// Resolved display color
    pub color: Color,

    pub payload: RenderPayload,

    pub transform: Transform,

    /// Owned children (assemblies only)
    pub children: Vec<SceneNode>,

    /// Identity of the owning assembly, if reparented
    pub parent: Option<String>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, kind: NodeKind, payload: RenderPayload) -> Self {
        Self {
            name: name.into(),
            label: None,
            kind,
            properties: PropertyGroup::new("Properties"),
            color: Color::default(),
            payload,
            transform: Transform::default(),
            children: Vec::new(),
            parent: None,
        }
    }

    /// Label if present, identity otherwise.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Meshes carried directly by this node (not its children).
    pub fn meshes(&self) -> Vec<&Arc<Mesh>> {
        match &self.payload {
            RenderPayload::Meshes(meshes) => meshes.iter().collect(),
            RenderPayload::TexturedPlane { mesh, .. } => vec![mesh],
            RenderPayload::Group => Vec::new(),
        }
    }

    /// Vertices carried by this node and all descendants.
    pub fn vertex_count(&self) -> usize {
        let own: usize = self.meshes().iter().map(|m| m.vertex_count()).sum();
        own + self.children.iter().map(SceneNode::vertex_count).sum::<usize>()
    }

    /// Triangles carried by this node and all descendants.
    pub fn triangle_count(&self) -> usize {
        let own: usize = self.meshes().iter().map(|m| m.triangle_count()).sum();
        own + self.children.iter().map(SceneNode::triangle_count).sum::<usize>()
    }

    /// Bounds in the parent's space.
    pub fn bounds(&self, parent_matrix: Mat4) -> Aabb {
        let matrix = parent_matrix * self.transform.to_matrix();
        let own = self
            .meshes()
            .iter()
            .fold(Aabb::EMPTY, |acc, m| Aabb::surrounding(&acc, &m.bounds.transformed(&matrix)));

        self.children
            .iter()
            .fold(own, |acc, child| Aabb::surrounding(&acc, &child.bounds(matrix)))
    }

    /// Depth-first search by identity through this node and its descendants.
    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }
}

/// The result of importing a document.
#[derive(Clone, Debug, Default)]
pub struct Model {
    /// Document-level properties
    pub properties: PropertyGroup,

    /// Top-level nodes, in output order
    pub nodes: Vec<SceneNode>,

    /// Properties of the document's `PropertyBag` object, if it has one
    pub property_bag: Option<PropertyGroup>,

    /// External files referenced by link objects, keyed by object name
    pub linked_files: BTreeMap<String, String>,
}

impl Model {
    pub fn new(properties: PropertyGroup) -> Self {
        Self {
            properties,
            ..Default::default()
        }
    }

    pub fn add_node(&mut self, node: SceneNode) {
        self.nodes.push(node);
    }

    /// Number of top-level nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find a node anywhere in the graph by identity.
    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        self.nodes.iter().find_map(|n| n.find(name))
    }

    /// Total triangle count across the whole graph.
    pub fn total_triangle_count(&self) -> usize {
        self.nodes.iter().map(SceneNode::triangle_count).sum()
    }

    /// Bounds of everything in the model.
    pub fn world_bounds(&self) -> Aabb {
        self.nodes
            .iter()
            .fold(Aabb::EMPTY, |acc, n| Aabb::surrounding(&acc, &n.bounds(Mat4::IDENTITY)))
    }
}
