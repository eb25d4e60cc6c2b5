//! Triangle mesh representation for the Lens scene graph.
//!
//! Meshes are produced by the geometry kernel (one per decoded shape
//! fragment) or synthesized by the importer (image planes). They are
//! renderer-agnostic: uploading to the GPU is the viewer's job.

use lens_math::{Aabb, Vec2, Vec3};

/// A mesh consisting of vertex positions, optional normals and UVs, and
/// triangle indices.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Vertex normals (optional - see `ensure_normals`)
    pub normals: Option<Vec<Vec3>>,

    /// UV coordinates (optional - one per vertex)
    pub uvs: Option<Vec<Vec2>>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Axis-aligned bounding box
    pub bounds: Aabb,
}

impl Mesh {
    /// Create a new mesh from positions and indices, optionally with normals.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>, normals: Option<Vec<Vec3>>) -> Self {
        let bounds = Aabb::from_positions(&positions);
        Self {
            positions,
            normals,
            uvs: None,
            indices,
            bounds,
        }
    }

    /// Build a mesh from the flat `f32`/`u32` buffers geometry kernels emit
    /// (xyz triples for positions and normals).
    pub fn from_flat_buffers(positions: &[f32], normals: Option<&[f32]>, indices: Vec<u32>) -> Self {
        let to_vec3 = |flat: &[f32]| -> Vec<Vec3> {
            flat.chunks_exact(3)
                .map(|c| Vec3::new(c[0], c[1], c[2]))
                .collect()
        };
        Self::new(to_vec3(positions), indices, normals.map(to_vec3))
    }

    /// A `width` x `height` rectangle centered at the origin in the XY plane,
    /// facing +Z, with UVs spanning the full [0, 1] range.
    ///
    /// Zero sizes are allowed and produce a degenerate plane.
    pub fn plane(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        let positions = vec![
            Vec3::new(-hw, hh, 0.0),
            Vec3::new(hw, hh, 0.0),
            Vec3::new(-hw, -hh, 0.0),
            Vec3::new(hw, -hh, 0.0),
        ];
        let uvs = vec![
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
        ];

        let mut mesh = Self::new(positions, vec![0, 2, 1, 2, 3, 1], Some(vec![Vec3::Z; 4]));
        mesh.uvs = Some(uvs);
        mesh
    }

    /// Compute smooth vertex normals by averaging face normals.
    ///
    /// Triangles are counter-clockwise when viewed from the front, which is
    /// what tessellated BREP output uses. Degenerate vertices get +Z.
    pub fn compute_normals(&mut self) {
        let vertex_count = self.positions.len();
        let mut normals = vec![Vec3::ZERO; vertex_count];

        for face in self.indices.chunks_exact(3) {
            let (i0, i1, i2) = (face[0] as usize, face[1] as usize, face[2] as usize);
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }

            let p0 = self.positions[i0];
            let face_normal = (self.positions[i1] - p0).cross(self.positions[i2] - p0);

            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for normal in &mut normals {
            *normal = normal.try_normalize().unwrap_or(Vec3::Z);
        }

        self.normals = Some(normals);
    }

    /// Ensure the mesh has one normal per vertex, computing them if needed.
    pub fn ensure_normals(&mut self) {
        let vertex_count = self.positions.len();
        match &self.normals {
            Some(normals) if normals.len() == vertex_count => {}
            Some(normals) => {
                log::debug!(
                    "Normals array length ({}) doesn't match vertex count ({}), computing smooth normals",
                    normals.len(),
                    vertex_count
                );
                self.compute_normals();
            }
            None => self.compute_normals(),
        }
    }

    /// Check if the mesh has normals.
    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    /// Check if the mesh has UV coordinates.
    pub fn has_uvs(&self) -> bool {
        self.uvs.is_some()
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// True if the mesh has nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.len() < 3
    }
}
