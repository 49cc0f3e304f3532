//! Non-indexed triangle geometry with flat normals and bounds.

use crate::error::StlError;
use crate::stl::Triangle;
use glam::Vec3;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
        Some(Self { min, max })
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Radius of the sphere through the box corners.
    pub fn bounding_radius(&self) -> f32 {
        self.size().length() * 0.5
    }
}

/// Unit normal by the right-hand rule; zero for degenerate faces.
pub fn face_normal(tri: &Triangle) -> Vec3 {
    let n = (tri[1] - tri[0]).cross(tri[2] - tri[0]);
    let len2 = n.length_squared();
    if len2 <= f32::EPSILON || !len2.is_finite() {
        return Vec3::ZERO;
    }
    n / len2.sqrt()
}

/// Loaded geometry. Three positions per face; each face's normal repeated for its vertices.
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    bounds: Aabb,
}

impl TriangleMesh {
    pub fn from_triangles(triangles: Vec<Triangle>) -> Result<Self, StlError> {
        let positions: Vec<Vec3> = triangles.iter().flatten().copied().collect();
        let bounds = Aabb::from_points(positions.iter().filter(|p| p.is_finite()))
            .ok_or(StlError::Empty)?;
        let mut mesh = Self {
            positions,
            normals: Vec::new(),
            bounds,
        };
        mesh.compute_normals();
        Ok(mesh)
    }

    /// Decode STL bytes into a mesh.
    pub fn from_stl(bytes: &[u8]) -> Result<Self, StlError> {
        Self::from_triangles(crate::stl::parse_stl(bytes)?)
    }

    pub fn compute_normals(&mut self) {
        self.normals = self
            .positions
            .chunks_exact(3)
            .flat_map(|t| {
                let n = face_normal(&[t[0], t[1], t[2]]);
                [n, n, n]
            })
            .collect();
    }

    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// `(vertices, face normal)` per triangle.
    pub fn faces(&self) -> impl Iterator<Item = ([Vec3; 3], Vec3)> + '_ {
        self.positions
            .chunks_exact(3)
            .zip(self.normals.chunks_exact(3))
            .map(|(p, n)| ([p[0], p[1], p[2]], n[0]))
    }
}
