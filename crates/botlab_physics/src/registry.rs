//! Registry of secondary collision meshes
//!
//! Platforms, props and other dynamic geometry are registered by name. Each
//! entry owns its collision mesh (and therefore its BVH) and can be switched
//! on and off without being removed.

use std::collections::HashMap;
use std::fmt;

use botlab_math::{Quat, Transform3, Vec3};
use slotmap::{new_key_type, SlotMap};

use crate::bvh::CollisionMesh;
use crate::shapes::Triangle;

new_key_type! {
    /// Key to a collider in the registry
    ///
    /// Generational: a key to a removed collider never resolves to a
    /// collider registered later in the same slot.
    pub struct ColliderKey;
}

/// Opaque id of the scene object a collider was generated from
///
/// The registry never owns or dereferences the scene object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SceneObjectId(pub u64);

/// A registered collider
#[derive(Clone, Debug)]
pub struct ColliderEntry {
    pub name: String,
    pub source: SceneObjectId,
    pub mesh: CollisionMesh,
    pub enabled: bool,
    /// Platform velocity carried onto a player standing on it
    pub velocity: Vec3,
}

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// Collider name was empty
    EmptyName,
    /// A collider with this name already exists
    DuplicateName(String),
    /// Source geometry had no usable triangles
    EmptyGeometry(String),
    /// No collider with this name
    NotFound(String),
    /// The owning session was disposed
    Disposed,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::EmptyName => write!(f, "Collider name must not be empty"),
            RegistryError::DuplicateName(name) => write!(f, "Collider already registered: {}", name),
            RegistryError::EmptyGeometry(name) => write!(f, "Collider has no triangles: {}", name),
            RegistryError::NotFound(name) => write!(f, "Collider not found: {}", name),
            RegistryError::Disposed => write!(f, "Collider registry has been disposed"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Keyed set of secondary colliders
#[derive(Default)]
pub struct ColliderRegistry {
    colliders: SlotMap<ColliderKey, ColliderEntry>,
    by_name: HashMap<String, ColliderKey>,
}

impl ColliderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collider built from `triangles` (local space) placed at `transform`
    ///
    /// Degenerate triangles are dropped before the BVH is built. Nothing is
    /// mutated when the input is rejected.
    pub fn add_collider(
        &mut self,
        name: &str,
        source: SceneObjectId,
        triangles: Vec<Triangle>,
        transform: Transform3,
    ) -> Result<ColliderKey, RegistryError> {
        if name.is_empty() {
            log::warn!("Rejected collider registration with an empty name");
            return Err(RegistryError::EmptyName);
        }
        if self.by_name.contains_key(name) {
            log::warn!("Rejected duplicate collider '{}'", name);
            return Err(RegistryError::DuplicateName(name.to_string()));
        }

        let triangles: Vec<Triangle> = triangles.into_iter().filter(|t| !t.is_degenerate()).collect();
        if triangles.is_empty() {
            log::warn!("Rejected collider '{}': no usable triangles", name);
            return Err(RegistryError::EmptyGeometry(name.to_string()));
        }

        let triangle_count = triangles.len();
        let key = self.colliders.insert(ColliderEntry {
            name: name.to_string(),
            source,
            mesh: CollisionMesh::new(triangles, transform),
            enabled: true,
            velocity: Vec3::ZERO,
        });
        self.by_name.insert(name.to_string(), key);
        log::debug!("Registered collider '{}' ({} triangles)", name, triangle_count);
        Ok(key)
    }

    /// Remove a collider, returning its entry
    pub fn remove_collider(&mut self, name: &str) -> Option<ColliderEntry> {
        let key = self.by_name.remove(name)?;
        let entry = self.colliders.remove(key);
        if entry.is_some() {
            log::debug!("Removed collider '{}'", name);
        }
        entry
    }

    /// Enable or disable a collider's participation in collision queries
    pub fn toggle_collider_physics(&mut self, name: &str, enabled: bool) -> Result<(), RegistryError> {
        let entry = self.get_mut(name)?;
        entry.enabled = enabled;
        if !enabled {
            // A disabled platform stops carrying anyone
            entry.velocity = Vec3::ZERO;
        }
        Ok(())
    }

    /// Move a collider's world transform
    pub fn update_collider_position(
        &mut self,
        name: &str,
        position: Vec3,
        rotation: Quat,
    ) -> Result<(), RegistryError> {
        let entry = self.get_mut(name)?;
        entry.mesh.transform = Transform3::new(position, rotation.normalized());
        Ok(())
    }

    /// Set the velocity a player standing on this collider inherits
    pub fn set_collider_velocity(&mut self, name: &str, velocity: Vec3) -> Result<(), RegistryError> {
        self.get_mut(name)?.velocity = velocity;
        Ok(())
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut ColliderEntry, RegistryError> {
        self.by_name
            .get(name)
            .and_then(|&key| self.colliders.get_mut(key))
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn key_of(&self, name: &str) -> Option<ColliderKey> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, key: ColliderKey) -> Option<&ColliderEntry> {
        self.colliders.get(key)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&ColliderEntry> {
        self.key_of(name).and_then(|key| self.colliders.get(key))
    }

    /// Iterate over enabled colliders
    pub fn enabled(&self) -> impl Iterator<Item = (ColliderKey, &ColliderEntry)> + '_ {
        self.colliders.iter().filter(|(_, entry)| entry.enabled)
    }

    /// Iterate over every collider
    pub fn iter(&self) -> impl Iterator<Item = (ColliderKey, &ColliderEntry)> + '_ {
        self.colliders.iter()
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Remove everything, returning the removed entries
    pub fn clear(&mut self) -> Vec<ColliderEntry> {
        self.by_name.clear();
        self.colliders.drain().map(|(_, entry)| entry).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Vec<Triangle> {
        let a = Vec3::new(-1.0, 0.0, -1.0);
        let b = Vec3::new(-1.0, 0.0, 1.0);
        let c = Vec3::new(1.0, 0.0, 1.0);
        let d = Vec3::new(1.0, 0.0, -1.0);
        vec![Triangle::new(a, b, c), Triangle::new(a, c, d)]
    }

    #[test]
    fn test_add_and_lookup() {
        let mut registry = ColliderRegistry::new();
        let key = registry
            .add_collider("platform", SceneObjectId(7), quad(), Transform3::IDENTITY)
            .expect("valid collider");

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.key_of("platform"), Some(key));
        let entry = registry.get(key).expect("present");
        assert_eq!(entry.source, SceneObjectId(7));
        assert!(entry.enabled);
        assert!(entry.mesh.has_index());
    }

    #[test]
    fn test_rejects_empty_name() {
        let mut registry = ColliderRegistry::new();
        let err = registry.add_collider("", SceneObjectId(1), quad(), Transform3::IDENTITY);
        assert_eq!(err, Err(RegistryError::EmptyName));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_rejects_duplicate() {
        let mut registry = ColliderRegistry::new();
        registry
            .add_collider("a", SceneObjectId(1), quad(), Transform3::IDENTITY)
            .unwrap();
        let err = registry.add_collider("a", SceneObjectId(2), quad(), Transform3::IDENTITY);
        assert_eq!(err, Err(RegistryError::DuplicateName("a".to_string())));
        assert_eq!(registry.get_by_name("a").unwrap().source, SceneObjectId(1));
    }

    #[test]
    fn test_rejects_degenerate_geometry() {
        let mut registry = ColliderRegistry::new();
        let sliver = vec![Triangle::new(Vec3::ZERO, Vec3::X, Vec3::X * 2.0)];
        let err = registry.add_collider("sliver", SceneObjectId(1), sliver, Transform3::IDENTITY);
        assert_eq!(err, Err(RegistryError::EmptyGeometry("sliver".to_string())));
    }

    #[test]
    fn test_toggle_and_enabled_iter() {
        let mut registry = ColliderRegistry::new();
        registry.add_collider("a", SceneObjectId(1), quad(), Transform3::IDENTITY).unwrap();
        registry.add_collider("b", SceneObjectId(2), quad(), Transform3::IDENTITY).unwrap();

        registry.toggle_collider_physics("a", false).unwrap();
        let enabled: Vec<&str> = registry.enabled().map(|(_, e)| e.name.as_str()).collect();
        assert_eq!(enabled, vec!["b"]);

        assert_eq!(
            registry.toggle_collider_physics("missing", true),
            Err(RegistryError::NotFound("missing".to_string()))
        );
    }

    #[test]
    fn test_update_position() {
        let mut registry = ColliderRegistry::new();
        registry.add_collider("lift", SceneObjectId(3), quad(), Transform3::IDENTITY).unwrap();
        registry
            .update_collider_position("lift", Vec3::new(0.0, 4.0, 0.0), Quat::IDENTITY)
            .unwrap();
        let entry = registry.get_by_name("lift").unwrap();
        assert_eq!(entry.mesh.transform.position, Vec3::new(0.0, 4.0, 0.0));
    }

    #[test]
    fn test_remove_invalidates_key() {
        let mut registry = ColliderRegistry::new();
        let key = registry.add_collider("a", SceneObjectId(1), quad(), Transform3::IDENTITY).unwrap();
        let removed = registry.remove_collider("a").expect("was registered");
        assert_eq!(removed.name, "a");
        assert!(registry.get(key).is_none());
        assert!(registry.remove_collider("a").is_none());

        // Reusing the name yields a fresh key
        let new_key = registry.add_collider("a", SceneObjectId(1), quad(), Transform3::IDENTITY).unwrap();
        assert_ne!(key, new_key);
        assert!(registry.get(key).is_none());
    }

    #[test]
    fn test_disable_clears_velocity() {
        let mut registry = ColliderRegistry::new();
        registry.add_collider("belt", SceneObjectId(1), quad(), Transform3::IDENTITY).unwrap();
        registry.set_collider_velocity("belt", Vec3::X).unwrap();
        registry.toggle_collider_physics("belt", false).unwrap();
        assert_eq!(registry.get_by_name("belt").unwrap().velocity, Vec3::ZERO);
    }

    #[test]
    fn test_error_display() {
        let msg = format!("{}", RegistryError::NotFound("lift".to_string()));
        assert!(msg.contains("not found"));
        assert!(msg.contains("lift"));
    }
}
