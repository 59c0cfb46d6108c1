//! Scene graph interface and an in-memory implementation

use botlab_math::{Transform3, Vec3};
use botlab_physics::SceneObjectId;
use slotmap::{new_key_type, Key, KeyData, SlotMap};

/// What a scene object represents
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SceneObjectKind {
    /// The animated character model
    PlayerModel,
    /// Debug capsule matching the collision shape
    PlayerCapsule,
    /// Geometry backing a registered collider
    Collider,
    /// Anything else (decoration, pickups)
    Prop,
}

/// Where the player appears on spawn and respawn
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnPose {
    /// Body position (top of the capsule axis)
    pub position: Vec3,
    pub yaw: f32,
}

impl SpawnPose {
    pub fn new(position: Vec3, yaw: f32) -> Self {
        Self { position, yaw }
    }
}

impl Default for SpawnPose {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 2.0, 0.0), 0.0)
    }
}

/// The parts of a scene graph the player core needs
///
/// Unknown ids are ignored.
pub trait SceneGraph {
    fn add_object(&mut self, kind: SceneObjectKind, name: &str, transform: Transform3) -> SceneObjectId;
    fn remove_object(&mut self, id: SceneObjectId);
    fn set_visible(&mut self, id: SceneObjectId, visible: bool);
    fn set_transform(&mut self, id: SceneObjectId, transform: Transform3);
}

new_key_type! {
    /// Key to an object in [`SceneObjects`]
    pub struct SceneKey;
}

/// An object in [`SceneObjects`]
#[derive(Clone, Debug, PartialEq)]
pub struct SceneObject {
    pub kind: SceneObjectKind,
    pub name: String,
    pub transform: Transform3,
    pub visible: bool,
}

/// Flat in-memory scene graph
#[derive(Default)]
pub struct SceneObjects {
    objects: SlotMap<SceneKey, SceneObject>,
}

impl SceneObjects {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(id: SceneObjectId) -> SceneKey {
        SceneKey::from(KeyData::from_ffi(id.0))
    }

    fn id(key: SceneKey) -> SceneObjectId {
        SceneObjectId(key.data().as_ffi())
    }

    pub fn get(&self, id: SceneObjectId) -> Option<&SceneObject> {
        self.objects.get(Self::key(id))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects of one kind
    pub fn of_kind(&self, kind: SceneObjectKind) -> impl Iterator<Item = (SceneObjectId, &SceneObject)> + '_ {
        self.objects
            .iter()
            .filter(move |(_, o)| o.kind == kind)
            .map(|(k, o)| (Self::id(k), o))
    }
}

impl SceneGraph for SceneObjects {
    fn add_object(&mut self, kind: SceneObjectKind, name: &str, transform: Transform3) -> SceneObjectId {
        let key = self.objects.insert(SceneObject {
            kind,
            name: name.to_string(),
            transform,
            visible: true,
        });
        Self::id(key)
    }

    fn remove_object(&mut self, id: SceneObjectId) {
        self.objects.remove(Self::key(id));
    }

    fn set_visible(&mut self, id: SceneObjectId, visible: bool) {
        if let Some(object) = self.objects.get_mut(Self::key(id)) {
            object.visible = visible;
        }
    }

    fn set_transform(&mut self, id: SceneObjectId, transform: Transform3) {
        if let Some(object) = self.objects.get_mut(Self::key(id)) {
            object.transform = transform;
        }
    }
}
