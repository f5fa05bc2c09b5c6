//! Procedural meshes for the four geometry kinds.
//!
//! Meshes are unindexed triangle lists. Boxes and the rocket stand on
//! `y = 0` and grow upward (box) or hang downward (rocket body), so a box
//! under a rocket lines up with its thruster.

use glam::Vec3;
use orbital_common::GeometryKind;
use std::f32::consts::PI;

/// Floats per packed vertex: position, normal, color.
pub const FLOATS_PER_VERTEX: usize = 9;

/// Upper bound on latitude/longitude bands of a sphere.
pub const MAX_SPHERE_BANDS: f32 = 100.0;

#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("{kind:?} needs a positive finite size, got {size}")]
    InvalidSize { kind: GeometryKind, size: f32 },
}

/// Triangle-list mesh with one normal per vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Interleave into `[px, py, pz, nx, ny, nz, r, g, b]` per vertex.
    pub fn pack(&self, color: Vec3) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.vertex_count() * FLOATS_PER_VERTEX);
        for (p, n) in self.positions.iter().zip(&self.normals) {
            out.extend_from_slice(&[p.x, p.y, p.z, n.x, n.y, n.z, color.x, color.y, color.z]);
        }
        out
    }

    fn triangle(&mut self, corners: [Vec3; 3], normal: Vec3) {
        let normal = normal.normalize();
        for corner in corners {
            self.positions.push(corner);
            self.normals.push(normal);
        }
    }

    /// Two triangles over corners given in winding order.
    fn quad(&mut self, [a, b, c, d]: [Vec3; 4], normal: Vec3) {
        self.triangle([a, b, c], normal);
        self.triangle([a, c, d], normal);
    }
}

/// Build the mesh for `kind` at `size` (radius for spheres, edge length
/// otherwise).
pub fn build_mesh(kind: GeometryKind, size: f32) -> Result<Mesh, GeometryError> {
    if !size.is_finite() || size <= 0.0 {
        return Err(GeometryError::InvalidSize { kind, size });
    }
    Ok(match kind {
        GeometryKind::Sphere => sphere(size),
        GeometryKind::Box => open_box(size),
        GeometryKind::Triangle => triangle(size),
        GeometryKind::Rocket => rocket(size),
    })
}

/// Bands used for a sphere of `radius`: larger spheres get finer
/// tessellation, capped at [`MAX_SPHERE_BANDS`].
pub fn sphere_bands(radius: f32) -> f32 {
    (10.0 + radius).min(MAX_SPHERE_BANDS)
}

fn sphere(radius: f32) -> Mesh {
    let bands = sphere_bands(radius);
    let steps = bands.floor() as u32;
    let unit = |lat: u32, long: u32| {
        let theta = lat as f32 * PI / bands;
        let phi = long as f32 * 2.0 * PI / bands;
        Vec3::new(phi.cos() * theta.sin(), theta.cos(), phi.sin() * theta.sin())
    };

    let mut mesh = Mesh::default();
    for lat in 0..=steps {
        for long in 0..=steps {
            let corners = [
                unit(lat, long),
                unit(lat + 1, long),
                unit(lat, long + 1),
                unit(lat + 1, long),
                unit(lat + 1, long + 1),
                unit(lat, long + 1),
            ];
            for n in corners {
                mesh.positions.push(n * radius);
                mesh.normals.push(n);
            }
        }
    }
    mesh
}

/// Box of edge `s` on the `y = 0` plane, `s / 2` tall, without a bottom.
fn open_box(s: f32) -> Mesh {
    let h = s / 2.0;
    let v = Vec3::new;
    let mut mesh = Mesh::default();
    mesh.quad([v(h, h, -h), v(h, 0.0, -h), v(-h, 0.0, -h), v(-h, h, -h)], Vec3::NEG_Z);
    mesh.quad([v(h, h, h), v(h, 0.0, h), v(-h, 0.0, h), v(-h, h, h)], Vec3::Z);
    mesh.quad([v(h, h, h), v(h, 0.0, h), v(h, 0.0, -h), v(h, h, -h)], Vec3::X);
    mesh.quad([v(-h, h, h), v(-h, 0.0, h), v(-h, 0.0, -h), v(-h, h, -h)], Vec3::NEG_X);
    mesh.quad([v(-h, h, -h), v(h, h, -h), v(h, h, h), v(-h, h, h)], Vec3::Y);
    mesh
}

fn triangle(s: f32) -> Mesh {
    let h = s / 2.0;
    let mut mesh = Mesh::default();
    mesh.triangle(
        [Vec3::new(0.0, h, 0.0), Vec3::new(h, 0.0, 0.0), Vec3::new(-h, 0.0, 0.0)],
        Vec3::NEG_Z,
    );
    mesh
}

/// Four-sided pyramid `apex` over a square of half-width `w` at height `y`.
fn pyramid(mesh: &mut Mesh, apex: Vec3, y: f32, w: f32, tilt: f32) {
    let v = Vec3::new;
    mesh.triangle([apex, v(w, y, w), v(-w, y, w)], v(0.0, tilt, 1.0));
    mesh.triangle([apex, v(w, y, -w), v(w, y, w)], v(1.0, tilt, 0.0));
    mesh.triangle([apex, v(w, y, -w), v(-w, y, -w)], v(0.0, tilt, -1.0));
    mesh.triangle([apex, v(-w, y, -w), v(-w, y, w)], v(-1.0, tilt, 0.0));
}

/// Nose cone above `y = 0`, body of edge `2s/3.5` down to `y = -s`, and a
/// thruster bell below the body.
fn rocket(s: f32) -> Mesh {
    let nose = s / 2.0;
    let body = s / 3.5;
    let bell = s / 4.0;
    let v = Vec3::new;
    let mut mesh = Mesh::default();

    pyramid(&mut mesh, v(0.0, nose, 0.0), 0.0, nose, 1.0);
    mesh.quad([v(-nose, 0.0, nose), v(nose, 0.0, nose), v(nose, 0.0, -nose), v(-nose, 0.0, -nose)], Vec3::NEG_Y);

    mesh.quad([v(body, 0.0, body), v(body, 0.0, -body), v(body, -s, -body), v(body, -s, body)], Vec3::X);
    mesh.quad([v(-body, 0.0, body), v(-body, 0.0, -body), v(-body, -s, -body), v(-body, -s, body)], Vec3::NEG_X);
    mesh.quad([v(body, 0.0, body), v(-body, 0.0, body), v(-body, -s, body), v(body, -s, body)], Vec3::Z);
    mesh.quad([v(body, 0.0, -body), v(-body, 0.0, -body), v(-body, -s, -body), v(body, -s, -body)], Vec3::NEG_Z);
    mesh.quad([v(-body, -s, body), v(body, -s, body), v(body, -s, -body), v(-body, -s, -body)], Vec3::NEG_Y);

    pyramid(&mut mesh, v(0.0, -s + s / 5.0, 0.0), -s - body, bell, -1.0);
    mesh
}
