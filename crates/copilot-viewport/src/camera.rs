//! Orbit camera with fit-to-bounds framing.
//!
//! Spherical coordinates around a target point, Y up.

use crate::mesh::Aabb;
use glam::{Mat4, Vec2, Vec3};
use std::f32::consts::{FRAC_PI_4, PI};

/// Framing margin applied on top of the bounding sphere.
pub const FIT_MARGIN: f32 = 1.2;

const MIN_PHI: f32 = 0.01;
const MAX_PHI: f32 = PI - 0.01;
const MIN_RADIUS: f32 = 0.01;

#[derive(Clone, Debug, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    /// Distance from target.
    pub radius: f32,
    /// Azimuth around Y, radians.
    pub theta: f32,
    /// Polar angle from +Y, radians.
    pub phi: f32,
    /// Vertical field of view, radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            radius: 86.6,
            theta: FRAC_PI_4,
            phi: FRAC_PI_4,
            fov_y: 45f32.to_radians(),
            near: 0.1,
            far: 2000.0,
        }
    }
}

impl OrbitCamera {
    pub fn eye_position(&self) -> Vec3 {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        self.target
            + Vec3::new(
                self.radius * sin_phi * sin_theta,
                self.radius * cos_phi,
                self.radius * sin_phi * cos_theta,
            )
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye_position(), self.target, Vec3::Y)
    }

    pub fn view_projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect.max(1e-3), self.near, self.far) * self.view_matrix()
    }

    pub fn orbit(&mut self, delta_theta: f32, delta_phi: f32) {
        self.theta += delta_theta;
        self.phi = (self.phi + delta_phi).clamp(MIN_PHI, MAX_PHI);
    }

    /// Positive `delta` moves closer. Multiplicative so the feel is scale independent.
    pub fn zoom(&mut self, delta: f32) {
        let factor = (1.0 - delta * 0.1).max(0.05);
        self.radius = (self.radius * factor).max(MIN_RADIUS);
        self.fit_clip_planes();
    }

    /// Centers on `bounds` and backs off until the bounding sphere, grown by
    /// [`FIT_MARGIN`], fills the vertical field of view. Orientation is untouched.
    pub fn fit_to_bounds(&mut self, bounds: &Aabb) {
        let sphere = (bounds.bounding_radius() * FIT_MARGIN).max(MIN_RADIUS);
        self.target = bounds.center();
        self.radius = sphere / (self.fov_y * 0.5).sin();
        self.fit_clip_planes();
    }

    pub fn reset_orientation(&mut self) {
        self.theta = FRAC_PI_4;
        self.phi = FRAC_PI_4;
    }

    fn fit_clip_planes(&mut self) {
        self.near = (self.radius * 0.001).max(1e-4);
        self.far = (self.radius * 100.0).max(2000.0);
    }

    /// Projects a world point into a `size`-pixel viewport (origin top-left).
    /// Returns the screen position and view depth, or `None` behind the camera.
    pub fn project(&self, view_proj: &Mat4, point: Vec3, size: Vec2) -> Option<(Vec2, f32)> {
        let clip = *view_proj * point.extend(1.0);
        if clip.w <= self.near {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let screen = Vec2::new((ndc.x + 1.0) * 0.5 * size.x, (1.0 - ndc.y) * 0.5 * size.y);
        Some((screen, clip.w))
    }
}
