//! copilot-viewport: the 3D preview behind the CAD Copilot studio.
//!
//! Loads STL meshes asynchronously, frames them with an orbit camera and produces
//! back-to-front draw lists the shell paints with whatever 2D backend it has.

mod camera;
mod error;
mod fetch;
mod mesh;
mod render;
mod stl;
mod viewport;

pub use camera::{OrbitCamera, FIT_MARGIN};
pub use error::{StlError, ViewportError, ViewportResult};
pub use fetch::{HttpMeshFetcher, MeshFetcher, MeshSource};
pub use mesh::{face_normal, Aabb, TriangleMesh};
pub use render::{
    build_frame, Frame, LineSegment, Rgba, ShadedTriangle, AXES_LENGTH, BACKGROUND_COLOR,
    MESH_COLOR, PLACEHOLDER_MESSAGE,
};
pub use stl::{encode_binary, parse_stl, Triangle};
pub use viewport::{MeshViewport, ViewportEvent};
