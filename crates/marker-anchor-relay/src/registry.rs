use std::collections::BTreeMap;

use nalgebra::Matrix4;

/// One replicated sphere instance.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SphereNode {
    /// World transform; `None` until the first transform update arrives.
    pub world_transform: Option<Matrix4<f64>>,
}

/// Replicated scene state: the peer camera avatar plus all sphere instances.
///
/// Sphere ids are allocated in creation order and announced over the channel
/// so peers allocate the same index. A remotely announced id advances the
/// local allocator past it, and updates for unknown ids create the instance,
/// so an id collision degrades to last-write-wins on one shared instance.
#[derive(Clone, Debug, Default)]
pub struct SceneRegistry {
    camera_avatar: Option<Matrix4<f64>>,
    spheres: BTreeMap<u32, SphereNode>,
    next_id: u32,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next sphere id in creation order.
    pub fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Create the instance if it does not exist yet.
    ///
    /// Returns `true` when a new instance was created. Existing instances
    /// (and their transforms) are left untouched.
    pub fn create_sphere(&mut self, id: u32) -> bool {
        self.next_id = self.next_id.max(id.saturating_add(1));
        match self.spheres.entry(id) {
            std::collections::btree_map::Entry::Vacant(e) => {
                e.insert(SphereNode::default());
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    /// Set a sphere's world transform, creating the instance if needed.
    pub fn set_sphere_transform(&mut self, id: u32, world: Matrix4<f64>) {
        self.create_sphere(id);
        if let Some(node) = self.spheres.get_mut(&id) {
            node.world_transform = Some(world);
        }
    }

    pub fn sphere(&self, id: u32) -> Option<&SphereNode> {
        self.spheres.get(&id)
    }

    pub fn sphere_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.spheres.keys().copied()
    }

    pub fn sphere_count(&self) -> usize {
        self.spheres.len()
    }

    pub fn set_camera_avatar(&mut self, world: Matrix4<f64>) {
        self.camera_avatar = Some(world);
    }

    pub fn camera_avatar(&self) -> Option<&Matrix4<f64>> {
        self.camera_avatar.as_ref()
    }

    /// Drop all replicated state (session restart).
    pub fn clear(&mut self) {
        self.camera_avatar = None;
        self.spheres.clear();
        self.next_id = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn ids_are_allocated_in_creation_order() {
        let mut reg = SceneRegistry::new();
        assert_eq!(reg.allocate_id(), 0);
        assert_eq!(reg.allocate_id(), 1);
        assert_eq!(reg.allocate_id(), 2);
    }

    #[test]
    fn remote_creation_advances_the_allocator() {
        let mut reg = SceneRegistry::new();
        assert!(reg.create_sphere(5));
        assert_eq!(reg.allocate_id(), 6);
    }

    #[test]
    fn repeated_creation_is_idempotent() {
        let mut reg = SceneRegistry::new();
        let world = Matrix4::new_translation(&Vector3::new(1.0, 0.0, 0.0));
        reg.set_sphere_transform(3, world);
        assert!(!reg.create_sphere(3));
        assert_eq!(reg.sphere_count(), 1);
        assert_eq!(reg.sphere(3).expect("exists").world_transform, Some(world));
    }

    #[test]
    fn update_for_unknown_id_creates_the_instance() {
        let mut reg = SceneRegistry::new();
        let world = Matrix4::new_translation(&Vector3::new(0.0, 2.0, 0.0));
        reg.set_sphere_transform(9, world);
        assert_eq!(reg.sphere_ids().collect::<Vec<_>>(), vec![9]);
    }

    #[test]
    fn clear_resets_everything() {
        let mut reg = SceneRegistry::new();
        reg.set_camera_avatar(Matrix4::identity());
        reg.set_sphere_transform(0, Matrix4::identity());
        reg.clear();
        assert!(reg.camera_avatar().is_none());
        assert_eq!(reg.sphere_count(), 0);
        assert_eq!(reg.allocate_id(), 0);
    }
}
