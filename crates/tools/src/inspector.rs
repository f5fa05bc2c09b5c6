use glam::{EulerRot, Vec3};
use orbital_common::{EntityId, GeometryKind};
use orbital_kernel::Simulation;

/// Read-only queries against a simulation for debugging and the CLI.
///
/// Positions are read through the finalized-transform path, so inspecting
/// never resolves dirty transforms or otherwise disturbs the world.
pub struct WorldInspector;

impl WorldInspector {
    pub fn summary(sim: &Simulation) -> SimSummary {
        let world = &sim.world;
        SimSummary {
            ticks: sim.ticks(),
            steps: sim.steps(),
            elapsed: sim.elapsed(),
            time_scale: sim.context.time_scale,
            halted: sim.is_halted(),
            entity_count: world.entity_count(),
            pending_added: world.added().len(),
            pending_removed: world.removed().len(),
        }
    }

    pub fn inspect_entity(sim: &Simulation, id: EntityId) -> Option<EntityInfo> {
        let entity = sim.world.get(id)?;
        let world_position = sim
            .world
            .finalized_transform(id)
            .map(|m| m.w_axis.truncate());
        let (x, y, z) = entity.rotation().to_euler(EulerRot::XYZ);
        Some(EntityInfo {
            id,
            geometry: entity.appearance.geometry,
            size: entity.appearance.size,
            parent: entity.parent(),
            children: entity.children().len(),
            position: entity.position(),
            world_position,
            rotation_euler: Vec3::new(x, y, z),
            velocity: entity.velocity,
            mass: entity.mass,
            orbit_parent: entity.orbit_parent,
        })
    }

    /// All live entity ids in insertion order.
    pub fn list_entities(sim: &Simulation) -> Vec<EntityId> {
        sim.world.ids()
    }
}

/// Summary of simulation state for the inspector.
#[derive(Debug, Clone, PartialEq)]
pub struct SimSummary {
    pub ticks: u64,
    pub steps: u64,
    pub elapsed: f64,
    pub time_scale: u32,
    pub halted: bool,
    pub entity_count: usize,
    pub pending_added: usize,
    pub pending_removed: usize,
}

impl std::fmt::Display for SimSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Simulation: ticks={} steps={} t={:.2}s scale=x{} halted={} entities={} pending=+{}/-{}",
            self.ticks,
            self.steps,
            self.elapsed,
            self.time_scale,
            self.halted,
            self.entity_count,
            self.pending_added,
            self.pending_removed
        )
    }
}

/// Detailed info about a single entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityInfo {
    pub id: EntityId,
    pub geometry: Option<GeometryKind>,
    pub size: f32,
    pub parent: Option<EntityId>,
    pub children: usize,
    /// Local position relative to the parent.
    pub position: Vec3,
    /// `None` while the entity's transform is dirty.
    pub world_position: Option<Vec3>,
    /// Local rotation as XYZ Euler angles, radians.
    pub rotation_euler: Vec3,
    pub velocity: Vec3,
    pub mass: f32,
    pub orbit_parent: Option<EntityId>,
}

impl std::fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.geometry {
            Some(kind) => write!(f, "Entity {} {:?}({})", self.id, kind, self.size)?,
            None => write!(f, "Entity {} node", self.id)?,
        }
        if let Some(parent) = self.parent {
            write!(f, " parent={parent}")?;
        }
        let p = self.world_position.unwrap_or(self.position);
        write!(
            f,
            " pos=({:.2}, {:.2}, {:.2}) vel=({:.2}, {:.2}, {:.2}) mass={}",
            p.x, p.y, p.z, self.velocity.x, self.velocity.y, self.velocity.z, self.mass
        )?;
        if let Some(orbit) = self.orbit_parent {
            write!(f, " orbits={orbit}")?;
        }
        Ok(())
    }
}
