//! STL decoding (binary and ASCII) and binary encoding.
//!
//! Binary layout: 80-byte header, little-endian `u32` triangle count, then 50 bytes
//! per triangle (normal, three vertices, `u16` attribute). The stored normal is
//! ignored; normals are recomputed from the vertices after load.

use crate::error::StlError;
use glam::Vec3;

pub type Triangle = [Vec3; 3];

const HEADER_LEN: usize = 80;
const PREAMBLE_LEN: usize = HEADER_LEN + 4;
const TRIANGLE_LEN: usize = 50;

/// Decodes binary or ASCII STL.
///
/// A file whose size matches its declared triangle count exactly is binary. Otherwise
/// `solid` near the start means ASCII; anything else is treated as binary.
pub fn parse_stl(bytes: &[u8]) -> Result<Vec<Triangle>, StlError> {
    let triangles = if is_binary(bytes) {
        parse_binary(bytes)?
    } else {
        parse_ascii(bytes)?
    };
    if triangles.is_empty() {
        return Err(StlError::Empty);
    }
    Ok(triangles)
}

fn is_binary(bytes: &[u8]) -> bool {
    if let Some(count) = declared_count(bytes) {
        if PREAMBLE_LEN + count as usize * TRIANGLE_LEN == bytes.len() {
            return true;
        }
    }
    // Some exporters pad the keyword with leading bytes.
    !(0..5).any(|off| bytes.get(off..off + 5) == Some(b"solid".as_slice()))
}

fn declared_count(bytes: &[u8]) -> Option<u32> {
    let raw: [u8; 4] = bytes.get(HEADER_LEN..PREAMBLE_LEN)?.try_into().ok()?;
    Some(u32::from_le_bytes(raw))
}

fn read_vec3(chunk: &[u8]) -> Vec3 {
    let f = |i: usize| f32::from_le_bytes([chunk[i], chunk[i + 1], chunk[i + 2], chunk[i + 3]]);
    Vec3::new(f(0), f(4), f(8))
}

fn parse_binary(bytes: &[u8]) -> Result<Vec<Triangle>, StlError> {
    let declared = declared_count(bytes).ok_or(StlError::MissingHeader(bytes.len()))?;
    let available = (bytes.len() - PREAMBLE_LEN) / TRIANGLE_LEN;
    if (declared as usize) > available {
        return Err(StlError::Truncated {
            declared,
            available,
        });
    }

    let body = &bytes[PREAMBLE_LEN..];
    Ok(body
        .chunks_exact(TRIANGLE_LEN)
        .take(declared as usize)
        .map(|tri| {
            // Skip the 12-byte stored normal.
            [
                read_vec3(&tri[12..24]),
                read_vec3(&tri[24..36]),
                read_vec3(&tri[36..48]),
            ]
        })
        .collect())
}

fn parse_ascii(bytes: &[u8]) -> Result<Vec<Triangle>, StlError> {
    let text = String::from_utf8_lossy(bytes);
    let mut vertices = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let mut parts = line.split_whitespace();
        if parts.next() != Some("vertex") {
            continue;
        }
        let mut coord = || -> Result<f32, StlError> {
            let raw = parts.next().ok_or_else(|| StlError::Ascii {
                line: idx + 1,
                message: "vertex needs three coordinates".to_string(),
            })?;
            raw.parse::<f32>().map_err(|e| StlError::Ascii {
                line: idx + 1,
                message: format!("bad coordinate {:?}: {}", raw, e),
            })
        };
        let v = Vec3::new(coord()?, coord()?, coord()?);
        vertices.push(v);
    }

    if vertices.len() % 3 != 0 {
        return Err(StlError::Ascii {
            line: text.lines().count(),
            message: format!("{} vertices do not form whole triangles", vertices.len()),
        });
    }
    Ok(vertices
        .chunks_exact(3)
        .map(|v| [v[0], v[1], v[2]])
        .collect())
}

/// Encodes triangles as binary STL with right-hand-rule normals.
pub fn encode_binary(triangles: &[Triangle], header_name: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(PREAMBLE_LEN + triangles.len() * TRIANGLE_LEN);

    let mut header = [0u8; HEADER_LEN];
    let name = header_name.as_bytes();
    let n = name.len().min(HEADER_LEN);
    header[..n].copy_from_slice(&name[..n]);
    out.extend_from_slice(&header);
    out.extend_from_slice(&(triangles.len() as u32).to_le_bytes());

    for tri in triangles {
        let normal = crate::mesh::face_normal(tri);
        for v in std::iter::once(&normal).chain(tri.iter()) {
            for c in v.to_array() {
                out.extend_from_slice(&c.to_le_bytes());
            }
        }
        out.extend_from_slice(&0u16.to_le_bytes());
    }
    out
}
