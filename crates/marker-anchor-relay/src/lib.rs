//! Cross-device transform relay.
//!
//! Tracked objects are broadcast as full-state snapshots relative to the
//! shared axes frame: the sender re-expresses an object's world transform in
//! the axes frame and serializes it as whitespace-separated decimal text; the
//! receiver recomposes the matrix and converts it back into its own world
//! space with its local axes transform. Delivery is fire-and-forget,
//! last-write-wins; messages that match no recognized shape are dropped.

mod registry;
mod relay;
mod wire;

pub use registry::{SceneRegistry, SphereNode};
pub use relay::{
    apply_message, encode_camera_transform, encode_sphere_transform, relative_to_axes,
    world_from_relative, Applied,
};
pub use wire::{decode, encode_create_sphere, NodeKind, WireMessage};
