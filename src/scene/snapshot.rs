use std::collections::BTreeMap;

use crate::foundation::core::{Affine, FrameIndex, Point, Transform2D, Vec2};
use crate::foundation::error::{StrobeError, StrobeResult};
use crate::foundation::math::Fnv1a64;
use crate::scene::graph::{NodeId, NodeKind, PropValue, SceneGraph, SceneNode};
use crate::spline::curve::VisibleRange;
use crate::timeline::driver::FrameTick;

/// Evaluated state of one node for one frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct NodeSnapshot {
    /// Node id.
    pub id: NodeId,
    /// Node name.
    pub name: String,
    /// Drawable kind.
    pub kind: NodeKind,
    /// Distance from the root.
    pub depth: usize,
    /// Parent world transform composed with the local transform.
    pub world: Affine,
    /// Opacity multiplied down from the root, in `[0, 1]`.
    pub opacity: f64,
    /// Every evaluated property, plus `path` for spline nodes.
    pub props: BTreeMap<String, PropValue>,
}

impl NodeSnapshot {
    /// Property value by name.
    pub fn prop(&self, name: &str) -> Option<&PropValue> {
        self.props.get(name)
    }

    /// Numeric property, or `default` when absent.
    pub fn number_or(&self, name: &str, default: f64) -> StrobeResult<f64> {
        match self.props.get(name) {
            None => Ok(default),
            Some(PropValue::Number(v)) => Ok(*v),
            Some(other) => Err(self.type_error(name, "number", other)),
        }
    }

    fn type_error(&self, prop: &str, expected: &str, got: &PropValue) -> StrobeError {
        StrobeError::validation(format!(
            "node '{}': property '{prop}' must be a {expected}, got {}",
            self.name,
            got.type_name()
        ))
    }
}

/// Immutable property table for one frame, in painter's order.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FrameSnapshot {
    /// Frame index.
    pub frame: FrameIndex,
    /// Master time of the frame.
    pub time_secs: f64,
    /// Nodes in pre-order (parents before children, siblings in insertion order).
    pub nodes: Vec<NodeSnapshot>,
}

impl FrameSnapshot {
    /// Stable 64-bit FNV-1a hash of the JSON encoding.
    pub fn fingerprint(&self) -> u64 {
        let mut h = Fnv1a64::new_default();
        match serde_json::to_vec(self) {
            Ok(bytes) => h.write_bytes(&bytes),
            Err(e) => tracing::warn!(error = %e, "snapshot could not be encoded for hashing"),
        }
        h.finish()
    }

    /// First node named `name`.
    pub fn node(&self, name: &str) -> Option<&NodeSnapshot> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

impl SceneGraph {
    /// Evaluate every node at the current master time.
    ///
    /// Each node is visited once, top-down; bound signals are read through the runtime
    /// cache, so repeated calls at the same time yield identical snapshots.
    pub fn snapshot(&self, tick: FrameTick) -> StrobeResult<FrameSnapshot> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(NodeId, Affine, f64, usize)> =
            vec![(self.root(), Affine::IDENTITY, 1.0, 0)];

        while let Some((id, parent_world, parent_opacity, depth)) = stack.pop() {
            let node = &self.nodes[id.index()];
            let mut props = BTreeMap::new();
            for (key, binding) in &node.props {
                let value = binding.eval().map_err(|e| in_node(e, &node.name, key))?;
                props.insert(key.clone(), value);
            }

            let local = local_transform(node, &props)?;
            let opacity = match props.get("opacity") {
                None => 1.0,
                Some(PropValue::Number(v)) => v.clamp(0.0, 1.0),
                Some(other) => return Err(prop_type_error(node, "opacity", "number", other)),
            };

            if node.kind == NodeKind::Spline {
                let path = spline_path(node, &props)?;
                props.insert("path".to_owned(), PropValue::Path(path));
            }

            let snap = NodeSnapshot {
                id,
                name: node.name.clone(),
                kind: node.kind,
                depth,
                world: parent_world * local,
                opacity: parent_opacity * opacity,
                props,
            };
            for child in node.children.iter().rev() {
                stack.push((*child, snap.world, snap.opacity, depth + 1));
            }
            out.push(snap);
        }

        Ok(FrameSnapshot {
            frame: tick.index,
            time_secs: tick.time_secs,
            nodes: out,
        })
    }
}

fn local_transform(node: &SceneNode, props: &BTreeMap<String, PropValue>) -> StrobeResult<Affine> {
    let number = |key: &str| -> StrobeResult<f64> {
        match props.get(key) {
            None => Ok(0.0),
            Some(PropValue::Number(v)) => Ok(*v),
            Some(other) => Err(prop_type_error(node, key, "number", other)),
        }
    };

    let vec2 = |key: &str| -> StrobeResult<Vec2> {
        match props.get(key) {
            None => Ok(Vec2::ZERO),
            Some(PropValue::Vec2(v)) => Ok(*v),
            Some(other) => Err(prop_type_error(node, key, "vec2", other)),
        }
    };

    let scale = match props.get("scale") {
        None => Vec2::new(1.0, 1.0),
        Some(PropValue::Number(s)) => Vec2::new(*s, *s),
        Some(PropValue::Vec2(v)) => *v,
        Some(other) => return Err(prop_type_error(node, "scale", "number or vec2", other)),
    };

    Ok(Transform2D {
        translate: vec2("position")? + Vec2::new(number("x")?, number("y")?),
        rotation_rad: number("rotation")?,
        scale,
        anchor: vec2("anchor")?,
    }
    .to_affine())
}

fn spline_path(
    node: &SceneNode,
    props: &BTreeMap<String, PropValue>,
) -> StrobeResult<crate::foundation::core::BezPath> {
    let points: &[Point] = match props.get("points") {
        Some(PropValue::Points(p)) => p,
        None => {
            return Err(StrobeError::validation(format!(
                "spline node '{}' has no 'points' property",
                node.name
            )));
        }
        Some(other) => return Err(prop_type_error(node, "points", "points", other)),
    };
    let number_or = |key: &str, default: f64| -> StrobeResult<f64> {
        match props.get(key) {
            None => Ok(default),
            Some(PropValue::Number(v)) => Ok(*v),
            Some(other) => Err(prop_type_error(node, key, "number", other)),
        }
    };
    let closed = match props.get("closed") {
        None => false,
        Some(PropValue::Bool(b)) => *b,
        Some(other) => return Err(prop_type_error(node, "closed", "bool", other)),
    };

    let smoothness = number_or("smoothness", 0.5)?;
    let range = VisibleRange::new(number_or("start", 0.0)?, number_or("end", 1.0)?)
        .map_err(|e| in_node(e, &node.name, "start/end"))?;

    let curve = node
        .spline_cache
        .borrow_mut()
        .get(points, smoothness, closed)
        .map_err(|e| in_node(e, &node.name, "points"))?;
    Ok(curve.path_in(range))
}

fn prop_type_error(node: &SceneNode, prop: &str, expected: &str, got: &PropValue) -> StrobeError {
    StrobeError::validation(format!(
        "node '{}': property '{prop}' must be a {expected}, got {}",
        node.name,
        got.type_name()
    ))
}

// Prefix message-carrying errors with the node and property; structured faults pass through.
fn in_node(err: StrobeError, node: &str, prop: &str) -> StrobeError {
    match err {
        StrobeError::Validation(msg) => {
            StrobeError::Validation(format!("node '{node}', property '{prop}': {msg}"))
        }
        StrobeError::Render(msg) => {
            StrobeError::Render(format!("node '{node}', property '{prop}': {msg}"))
        }
        other => {
            tracing::debug!(node, prop, error = %other, "binding failed");
            other
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/snapshot.rs"]
mod tests;
