//! Scene to 2D draw primitives.
//!
//! Projects the mesh through the camera, shades faces with one ambient term and one
//! directional light, and sorts them back to front. Drawing is left to the shell.

use crate::camera::OrbitCamera;
use crate::mesh::TriangleMesh;
use glam::{Vec2, Vec3};

/// RGBA, 8 bits per channel.
pub type Rgba = [u8; 4];

/// Material colour (#3b82f6).
pub const MESH_COLOR: Rgba = [0x3b, 0x82, 0xf6, 0xff];
/// Clear colour (#0f172a).
pub const BACKGROUND_COLOR: Rgba = [0x0f, 0x17, 0x2a, 0xff];
pub const AXES_LENGTH: f32 = 20.0;

const AMBIENT: f32 = 0.5;
const DIRECTIONAL: f32 = 1.5;
const LIGHT_POSITION: Vec3 = Vec3::new(10.0, 20.0, 10.0);

const AXIS_X: Rgba = [0xef, 0x44, 0x44, 0xff];
const AXIS_Y: Rgba = [0x22, 0xc5, 0x5e, 0xff];
const AXIS_Z: Rgba = [0x3b, 0x82, 0xf6, 0xff];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadedTriangle {
    pub points: [Vec2; 3],
    pub color: Rgba,
    /// Mean view depth, larger is farther.
    pub depth: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub from: Vec2,
    pub to: Vec2,
    pub color: Rgba,
}

/// Everything to draw for one repaint.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// No mesh: show the idle message.
    Placeholder { message: &'static str },
    Scene {
        /// Back to front. Empty in wireframe mode.
        triangles: Vec<ShadedTriangle>,
        /// Triangle edges in wireframe mode.
        edges: Vec<LineSegment>,
        axes: Vec<LineSegment>,
    },
}

pub const PLACEHOLDER_MESSAGE: &str = "Model viewer ready";

fn shade(color: Rgba, normal: Vec3) -> Rgba {
    // Double sided: faces lit from behind use the flipped normal.
    let light = LIGHT_POSITION.normalize();
    let intensity = (AMBIENT + DIRECTIONAL * normal.dot(light).abs()).min(1.0);
    let scale = |c: u8| (c as f32 * intensity).round().clamp(0.0, 255.0) as u8;
    [scale(color[0]), scale(color[1]), scale(color[2]), color[3]]
}

pub fn build_frame(
    mesh: Option<&TriangleMesh>,
    camera: &OrbitCamera,
    wireframe: bool,
    size: Vec2,
) -> Frame {
    let Some(mesh) = mesh else {
        return Frame::Placeholder {
            message: PLACEHOLDER_MESSAGE,
        };
    };

    let view_proj = camera.view_projection_matrix(size.x / size.y.max(1.0));
    let project = |p: Vec3| camera.project(&view_proj, p, size);

    let mut triangles = Vec::new();
    let mut edges = Vec::new();
    for (verts, normal) in mesh.faces() {
        let (Some(a), Some(b), Some(c)) = (project(verts[0]), project(verts[1]), project(verts[2]))
        else {
            continue;
        };
        if wireframe {
            for (from, to) in [(a.0, b.0), (b.0, c.0), (c.0, a.0)] {
                edges.push(LineSegment {
                    from,
                    to,
                    color: MESH_COLOR,
                });
            }
        } else {
            triangles.push(ShadedTriangle {
                points: [a.0, b.0, c.0],
                color: shade(MESH_COLOR, normal),
                depth: (a.1 + b.1 + c.1) / 3.0,
            });
        }
    }
    triangles.sort_by(|l, r| r.depth.total_cmp(&l.depth));

    let axes = [(Vec3::X, AXIS_X), (Vec3::Y, AXIS_Y), (Vec3::Z, AXIS_Z)]
        .into_iter()
        .filter_map(|(dir, color)| {
            let (from, _) = project(Vec3::ZERO)?;
            let (to, _) = project(dir * AXES_LENGTH)?;
            Some(LineSegment { from, to, color })
        })
        .collect();

    Frame::Scene {
        triangles,
        edges,
        axes,
    }
}
