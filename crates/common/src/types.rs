use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for an entity in the world.
///
/// Ids are handed out monotonically by the world that owns the entity and are
/// never reused within a run, so ordering by id is insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Procedural geometry an entity is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    Sphere,
    Box,
    Triangle,
    Rocket,
}

/// Shader program an entity is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderTag {
    #[default]
    Planet,
    Sun,
    Halo,
    Pad,
    Particle,
    Ship,
    Sky,
}

/// Errors from parsing render tags out of configuration text.
#[derive(Debug, thiserror::Error)]
pub enum TagError {
    #[error("unknown geometry kind {0:?}")]
    UnknownGeometry(String),
    #[error("unknown shader {0:?}")]
    UnknownShader(String),
}

impl FromStr for GeometryKind {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sphere" => Ok(Self::Sphere),
            "box" => Ok(Self::Box),
            "triangle" => Ok(Self::Triangle),
            "rocket" => Ok(Self::Rocket),
            other => Err(TagError::UnknownGeometry(other.to_owned())),
        }
    }
}

impl FromStr for ShaderTag {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planet" => Ok(Self::Planet),
            "sun" => Ok(Self::Sun),
            "halo" => Ok(Self::Halo),
            "pad" => Ok(Self::Pad),
            "particle" => Ok(Self::Particle),
            "ship" => Ok(Self::Ship),
            "sky" => Ok(Self::Sky),
            other => Err(TagError::UnknownShader(other.to_owned())),
        }
    }
}

/// Render metadata carried on an entity. Opaque to the scene graph and physics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    /// `None` for invisible nodes (pivots, cameras, spawn points).
    pub geometry: Option<GeometryKind>,
    /// Size parameter for the procedural geometry (radius, edge length...).
    pub size: f32,
    pub shader: ShaderTag,
    pub color: Vec3,
    /// Geometry is owned by the render layer and shared between entities of
    /// the same kind and size; it must not be released per entity.
    pub shared_geometry: bool,
}

impl Appearance {
    /// An appearance with the given geometry and defaults for everything else.
    pub fn new(geometry: Option<GeometryKind>, size: f32) -> Self {
        Self {
            geometry,
            size,
            ..Self::default()
        }
    }

    pub fn is_visible(&self) -> bool {
        self.geometry.is_some()
    }
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            geometry: None,
            size: 0.0,
            shader: ShaderTag::Planet,
            color: Vec3::ONE,
            shared_geometry: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ids_order_by_value() {
        assert!(EntityId(1) < EntityId(2));
        assert_eq!(EntityId(7).to_string(), "#7");
    }

    #[test]
    fn appearance_default_is_invisible_white() {
        let a = Appearance::default();
        assert!(!a.is_visible());
        assert_eq!(a.color, Vec3::ONE);
        assert_eq!(a.shader, ShaderTag::Planet);
    }

    #[test]
    fn geometry_kind_parses_known_tags() {
        assert_eq!("rocket".parse::<GeometryKind>().unwrap(), GeometryKind::Rocket);
        assert!(matches!(
            "cylinder".parse::<GeometryKind>(),
            Err(TagError::UnknownGeometry(_))
        ));
    }

    #[test]
    fn shader_tag_round_trips_through_serde_names() {
        assert_eq!("sky".parse::<ShaderTag>().unwrap(), ShaderTag::Sky);
        assert!("glow".parse::<ShaderTag>().is_err());
    }
}
