use glam::Mat4;
use orbital_common::{Appearance, EntityId, GeometryKind};
use std::collections::BTreeMap;
use std::fmt;

use crate::frame::RenderFrame;
use crate::geometry::{self, FLOATS_PER_VERTEX};
use crate::renderer::Renderer;

/// Which buffer an entity draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum BufferKey {
    /// One buffer per geometry kind and size, never released per entity.
    Shared(GeometryKind, u32),
    Owned(EntityId),
}

impl BufferKey {
    fn for_entity(id: EntityId, appearance: &Appearance) -> Option<Self> {
        let kind = appearance.geometry?;
        Some(if appearance.shared_geometry {
            Self::Shared(kind, appearance.size.to_bits())
        } else {
            Self::Owned(id)
        })
    }
}

/// Packed vertex data ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexBuffer {
    pub data: Vec<f32>,
}

impl VertexBuffer {
    pub fn vertex_count(&self) -> usize {
        self.data.len() / FLOATS_PER_VERTEX
    }
}

/// What one frame cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub draw_calls: usize,
    pub vertices: usize,
    pub buffers_built: usize,
    pub buffers_released: usize,
    pub live_buffers: usize,
}

impl fmt::Display for DrawStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "draws={} vertices={} built={} released={} live={}",
            self.draw_calls, self.vertices, self.buffers_built, self.buffers_released, self.live_buffers
        )
    }
}

/// Vertex-buffer bookkeeping backend.
///
/// Builds buffers for added entities, shares one buffer per (kind, size)
/// between entities flagged `shared_geometry`, and releases an entity's own
/// buffer when it is removed. Draws are issued in frame order with the
/// frame's final transforms.
#[derive(Debug, Default)]
pub struct GeometryCache {
    buffers: BTreeMap<BufferKey, VertexBuffer>,
    last_draws: Vec<(EntityId, Mat4)>,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn owns_buffer(&self, id: EntityId) -> bool {
        self.buffers.contains_key(&BufferKey::Owned(id))
    }

    /// Entity and model matrix of every draw issued by the last frame.
    pub fn last_draws(&self) -> &[(EntityId, Mat4)] {
        &self.last_draws
    }

    fn ensure(&mut self, key: BufferKey, appearance: &Appearance) -> Option<bool> {
        if self.buffers.contains_key(&key) {
            return Some(false);
        }
        let kind = appearance.geometry?;
        match geometry::build_mesh(kind, appearance.size) {
            Ok(mesh) => {
                let data = mesh.pack(appearance.color);
                tracing::debug!(?key, vertices = mesh.vertex_count(), "vertex buffer built");
                self.buffers.insert(key, VertexBuffer { data });
                Some(true)
            }
            Err(err) => {
                tracing::warn!(?key, %err, "skipping entity without a valid mesh");
                None
            }
        }
    }
}

impl Renderer for GeometryCache {
    type Output = DrawStats;

    fn render(&mut self, frame: &RenderFrame) -> DrawStats {
        let mut stats = DrawStats::default();

        for &id in &frame.removed {
            if self.buffers.remove(&BufferKey::Owned(id)).is_some() {
                stats.buffers_released += 1;
            }
        }

        self.last_draws.clear();
        for d in &frame.drawables {
            let Some(key) = BufferKey::for_entity(d.entity, &d.appearance) else {
                continue;
            };
            match self.ensure(key, &d.appearance) {
                Some(true) => stats.buffers_built += 1,
                Some(false) => {}
                None => continue,
            }
            if let Some(buffer) = self.buffers.get(&key) {
                stats.draw_calls += 1;
                stats.vertices += buffer.vertex_count();
                self.last_draws.push((d.entity, d.transform));
            }
        }

        stats.live_buffers = self.buffers.len();
        stats
    }
}
