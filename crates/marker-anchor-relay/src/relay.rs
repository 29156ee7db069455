use log::debug;
use nalgebra::Matrix4;

use crate::registry::SceneRegistry;
use crate::wire::{encode_update, NodeKind, WireMessage};

/// Transform of `world` expressed in the axes frame.
///
/// `None` when the axes transform is not invertible (it always is for the
/// rigid transforms produced by the pose composer).
pub fn relative_to_axes(world: &Matrix4<f64>, axes: &Matrix4<f64>) -> Option<Matrix4<f64>> {
    axes.try_inverse().map(|inv| inv * world)
}

/// Re-express a received axes-relative transform in local world space.
pub fn world_from_relative(relative: &Matrix4<f64>, axes: &Matrix4<f64>) -> Matrix4<f64> {
    axes * relative
}

/// Encode the local camera transform for broadcast.
pub fn encode_camera_transform(world: &Matrix4<f64>, axes: &Matrix4<f64>) -> Option<String> {
    let relative = relative_to_axes(world, axes)?;
    Some(encode_update(NodeKind::Camera, None, &relative))
}

/// Encode a sphere instance transform for broadcast.
pub fn encode_sphere_transform(
    id: u32,
    world: &Matrix4<f64>,
    axes: &Matrix4<f64>,
) -> Option<String> {
    let relative = relative_to_axes(world, axes)?;
    Some(encode_update(NodeKind::Sphere, Some(id), &relative))
}

/// Effect of applying one decoded message to the registry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Applied {
    CameraMoved,
    SphereMoved(u32),
    SphereCreated(u32),
    Ignored,
}

/// Apply a decoded message: convert the relative transform back into world
/// space with the local axes transform and route it to the camera avatar or
/// the named sphere instance (created on demand).
pub fn apply_message(
    message: &WireMessage,
    axes: &Matrix4<f64>,
    registry: &mut SceneRegistry,
) -> Applied {
    match message {
        WireMessage::TransformUpdate {
            kind: NodeKind::Camera,
            relative,
            ..
        } => {
            registry.set_camera_avatar(world_from_relative(relative, axes));
            Applied::CameraMoved
        }
        WireMessage::TransformUpdate {
            kind: NodeKind::Sphere,
            id: Some(id),
            relative,
        } => {
            registry.set_sphere_transform(*id, world_from_relative(relative, axes));
            Applied::SphereMoved(*id)
        }
        WireMessage::TransformUpdate {
            kind: NodeKind::Sphere,
            id: None,
            ..
        } => {
            debug!("sphere update without instance id dropped");
            Applied::Ignored
        }
        WireMessage::CreateSphere { id } => {
            if registry.create_sphere(*id) {
                Applied::SphereCreated(*id)
            } else {
                Applied::Ignored
            }
        }
    }
}
