use std::fmt::Write as _;

use nalgebra::Matrix4;

const CREATE_TAG: &str = "addNode";

/// Replicated object kinds on the wire.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum NodeKind {
    Camera,
    Sphere,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Camera => "cameraNode",
            NodeKind::Sphere => "sphereNode",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "cameraNode" => Some(NodeKind::Camera),
            "sphereNode" => Some(NodeKind::Sphere),
            _ => None,
        }
    }
}

/// A decoded peer message.
#[derive(Clone, Debug, PartialEq)]
pub enum WireMessage {
    /// Full-state transform of a replicated object, relative to the axes
    /// frame.
    TransformUpdate {
        kind: NodeKind,
        /// Sphere instance id; `None` for the camera avatar.
        id: Option<u32>,
        relative: Matrix4<f64>,
    },
    /// Announcement of a newly created sphere instance.
    CreateSphere { id: u32 },
}

/// Serialize the sixteen matrix components.
///
/// The transform is written column-major, which places the translation at
/// token positions 13..15 -- the m41 m42 m43 slots of the wire layout.
fn push_matrix(out: &mut String, m: &Matrix4<f64>) {
    for v in m.as_slice() {
        let _ = write!(out, "{v} ");
    }
}

pub(crate) fn encode_update(kind: NodeKind, id: Option<u32>, relative: &Matrix4<f64>) -> String {
    let mut out = String::new();
    push_matrix(&mut out, relative);
    match id {
        Some(id) => {
            let _ = write!(out, "{} {id}", kind.as_str());
        }
        None => out.push_str(kind.as_str()),
    }
    out
}

/// Creation command for a new sphere instance: `addNode sphereNode <id>`.
pub fn encode_create_sphere(id: u32) -> String {
    format!("{CREATE_TAG} {} {id}", NodeKind::Sphere.as_str())
}

/// Parse a peer message.
///
/// Returns `None` for anything that matches neither recognized shape;
/// unrecognized messages are ignored by the relay, never an error.
pub fn decode(message: &str) -> Option<WireMessage> {
    let tokens: Vec<&str> = message.split_whitespace().collect();

    if tokens.len() > 16 {
        let mut components = [0.0f64; 16];
        for (slot, token) in components.iter_mut().zip(&tokens[..16]) {
            *slot = token.parse().ok()?;
        }
        let relative = Matrix4::from_column_slice(&components);

        let kind = NodeKind::from_token(tokens[16])?;
        let id = match kind {
            NodeKind::Camera => None,
            NodeKind::Sphere => Some(tokens.get(17)?.parse().ok()?),
        };
        return Some(WireMessage::TransformUpdate { kind, id, relative });
    }

    if let [CREATE_TAG, kind, id] = tokens[..] {
        if NodeKind::from_token(kind) == Some(NodeKind::Sphere) {
            return Some(WireMessage::CreateSphere {
                id: id.parse().ok()?,
            });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn translation(x: f64, y: f64, z: f64) -> Matrix4<f64> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    #[test]
    fn camera_update_round_trips_exactly() {
        let m = translation(0.125, -3.5, 0.1) * Matrix4::new_rotation(Vector3::y() * 0.7);
        let encoded = encode_update(NodeKind::Camera, None, &m);
        match decode(&encoded) {
            Some(WireMessage::TransformUpdate {
                kind: NodeKind::Camera,
                id: None,
                relative,
            }) => assert_eq!(relative, m),
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn sphere_update_round_trips_exactly() {
        let m = translation(1.0, 2.0, 3.0);
        let encoded = encode_update(NodeKind::Sphere, Some(7), &m);
        match decode(&encoded) {
            Some(WireMessage::TransformUpdate {
                kind: NodeKind::Sphere,
                id: Some(7),
                relative,
            }) => assert_eq!(relative, m),
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn translation_lands_in_m41_to_m43_slots() {
        let encoded = encode_update(NodeKind::Camera, None, &translation(1.0, 0.0, 0.0));
        let tokens: Vec<&str> = encoded.split_whitespace().collect();
        assert_eq!(tokens.len(), 17);
        assert_eq!(tokens[12], "1");
        assert_eq!(tokens[13], "0");
        assert_eq!(tokens[14], "0");
        assert_eq!(tokens[16], "cameraNode");
    }

    #[test]
    fn create_command_round_trips() {
        let encoded = encode_create_sphere(3);
        assert_eq!(encoded, "addNode sphereNode 3");
        assert_eq!(decode(&encoded), Some(WireMessage::CreateSphere { id: 3 }));
    }

    #[test]
    fn short_messages_decode_to_none() {
        assert_eq!(decode(""), None);
        assert_eq!(decode("hello"), None);
        // sixteen bare floats with no kind tag
        let sixteen = vec!["0.5"; 16].join(" ");
        assert_eq!(decode(&sixteen), None);
    }

    #[test]
    fn sphere_update_without_id_decodes_to_none() {
        let encoded = encode_update(NodeKind::Camera, None, &translation(0.0, 0.0, 0.0))
            .replace("cameraNode", "sphereNode");
        assert_eq!(decode(&encoded), None);
    }

    #[test]
    fn non_numeric_components_decode_to_none() {
        let mut tokens = vec!["1.0"; 16];
        tokens[4] = "abc";
        tokens.push("cameraNode");
        assert_eq!(decode(&tokens.join(" ")), None);
    }

    #[test]
    fn unknown_kind_tag_decodes_to_none() {
        let mut tokens = vec!["1.0"; 16];
        tokens.push("cubeNode");
        assert_eq!(decode(&tokens.join(" ")), None);
    }

    #[test]
    fn create_command_for_unknown_kind_decodes_to_none() {
        assert_eq!(decode("addNode cubeNode 3"), None);
        assert_eq!(decode("addNode sphereNode nan"), None);
    }
}
