use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::foundation::color::Color;
use crate::foundation::core::{BezPath, Point, Vec2};
use crate::foundation::error::{StrobeError, StrobeResult};
use crate::scene::builder::Scope;
use crate::signal::handle::Signal;
use crate::spline::cache::SplineCache;

/// Index of a node inside its [`SceneGraph`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct NodeId(pub u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Drawable kind of a scene node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Transform/opacity container without geometry.
    Group,
    /// Axis-aligned rectangle centred on the node origin (`width`, `height`, `radius`).
    Rect,
    /// Circle centred on the node origin (`radius`).
    Circle,
    /// Smooth curve (`points`, `smoothness`, `closed`, `start`, `end`).
    Spline,
    /// Text label (`text`, `size`).
    Text,
}

/// Evaluated property value.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropValue {
    /// Scalar.
    Number(f64),
    /// 2D vector.
    Vec2(Vec2),
    /// Straight-alpha color.
    Color(Color),
    /// String.
    Text(String),
    /// Flag.
    Bool(bool),
    /// List of points.
    Points(Vec<Point>),
    /// Geometry produced for spline nodes.
    Path(BezPath),
}

impl PropValue {
    /// Short type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Vec2(_) => "vec2",
            Self::Color(_) => "color",
            Self::Text(_) => "text",
            Self::Bool(_) => "bool",
            Self::Points(_) => "points",
            Self::Path(_) => "path",
        }
    }

    /// Scalar payload, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }
}

macro_rules! prop_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for PropValue {
                fn from(v: $ty) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

prop_from! {
    f64 => Number,
    Vec2 => Vec2,
    Color => Color,
    String => Text,
    &str => Text,
    bool => Bool,
    Vec<Point> => Points,
    BezPath => Path,
}

impl From<Point> for PropValue {
    fn from(p: Point) -> Self {
        Self::Vec2(p.to_vec2())
    }
}

type BindingFn = Rc<dyn Fn() -> StrobeResult<PropValue>>;

/// Source of a node property: a constant or a signal evaluated per frame.
#[derive(Clone)]
pub enum Binding {
    /// Fixed value.
    Constant(PropValue),
    /// Read from a signal each frame.
    Signal(BindingFn),
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            Self::Signal(_) => f.write_str("Signal(..)"),
        }
    }
}

impl Binding {
    /// Bind to a closure, typically reading one or more signals.
    pub fn from_fn<F, T>(f: F) -> Self
    where
        F: Fn() -> StrobeResult<T> + 'static,
        T: Into<PropValue>,
    {
        Self::Signal(Rc::new(move || f().map(Into::into)))
    }

    pub(crate) fn eval(&self) -> StrobeResult<PropValue> {
        match self {
            Self::Constant(v) => Ok(v.clone()),
            Self::Signal(f) => f(),
        }
    }
}

/// Conversion into a [`Binding`]; implemented for constants and signals.
pub trait IntoBinding {
    /// Convert into a binding.
    fn into_binding(self) -> Binding;
}

impl IntoBinding for Binding {
    fn into_binding(self) -> Binding {
        self
    }
}

impl IntoBinding for PropValue {
    fn into_binding(self) -> Binding {
        Binding::Constant(self)
    }
}

macro_rules! constant_binding {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoBinding for $ty {
                fn into_binding(self) -> Binding {
                    Binding::Constant(self.into())
                }
            }
        )*
    };
}

constant_binding!(f64, Vec2, Point, Color, String, &str, bool, Vec<Point>);

impl<T> IntoBinding for Signal<T>
where
    T: Into<PropValue> + Clone + 'static,
{
    fn into_binding(self) -> Binding {
        Binding::Signal(Rc::new(move || self.read().map(Into::into)))
    }
}

impl<T> IntoBinding for &Signal<T>
where
    T: Into<PropValue> + Clone + 'static,
{
    fn into_binding(self) -> Binding {
        self.clone().into_binding()
    }
}

pub(crate) struct SceneNode {
    pub(crate) name: String,
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) props: BTreeMap<String, Binding>,
    pub(crate) spline_cache: RefCell<SplineCache>,
}

/// Tree of nodes whose properties are bound to constants or signals.
///
/// Nodes can only be attached under an existing parent, so the tree is acyclic by
/// construction. Node 0 is the root group.
pub struct SceneGraph {
    pub(crate) nodes: Vec<SceneNode>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SceneGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneGraph")
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

impl SceneGraph {
    /// Create a graph holding only the root group.
    pub fn new() -> Self {
        Self {
            nodes: vec![SceneNode {
                name: "root".to_owned(),
                kind: NodeKind::Group,
                parent: None,
                children: Vec::new(),
                props: BTreeMap::new(),
                spline_cache: RefCell::new(SplineCache::new()),
            }],
        }
    }

    /// Root node id.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`; the root is always present.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, id: NodeId) -> StrobeResult<&SceneNode> {
        self.nodes
            .get(id.index())
            .ok_or_else(|| StrobeError::validation(format!("unknown scene node #{}", id.0)))
    }

    fn node_mut(&mut self, id: NodeId) -> StrobeResult<&mut SceneNode> {
        self.nodes
            .get_mut(id.index())
            .ok_or_else(|| StrobeError::validation(format!("unknown scene node #{}", id.0)))
    }

    /// Append a child node under `parent`.
    pub fn add_node(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        kind: NodeKind,
    ) -> StrobeResult<NodeId> {
        self.node(parent)?;
        Ok(self.push_node(parent, name.into(), kind))
    }

    pub(crate) fn push_node(&mut self, parent: NodeId, name: String, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SceneNode {
            name,
            kind,
            parent: Some(parent),
            children: Vec::new(),
            props: BTreeMap::new(),
            spline_cache: RefCell::new(SplineCache::new()),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Bind property `prop` of `node`, replacing any previous binding.
    pub fn bind(
        &mut self,
        node: NodeId,
        prop: impl Into<String>,
        binding: impl IntoBinding,
    ) -> StrobeResult<()> {
        self.node_mut(node)?
            .props
            .insert(prop.into(), binding.into_binding());
        Ok(())
    }

    /// Builder scope whose children are attached under `node`.
    pub fn scope(&mut self, node: NodeId) -> StrobeResult<Scope<'_>> {
        let depth = self.depth_of(node)?;
        Ok(Scope::new(self, node, depth))
    }

    /// Distance from the root.
    pub fn depth_of(&self, node: NodeId) -> StrobeResult<usize> {
        let mut depth = 0;
        let mut cur = self.node(node)?.parent;
        while let Some(p) = cur {
            depth += 1;
            cur = self.nodes[p.index()].parent;
        }
        Ok(depth)
    }

    /// Node name.
    pub fn name_of(&self, node: NodeId) -> StrobeResult<&str> {
        Ok(&self.node(node)?.name)
    }

    /// Node kind.
    pub fn kind_of(&self, node: NodeId) -> StrobeResult<NodeKind> {
        Ok(self.node(node)?.kind)
    }

    /// Children of `node` in insertion order.
    pub fn children_of(&self, node: NodeId) -> StrobeResult<&[NodeId]> {
        Ok(&self.node(node)?.children)
    }

    /// First node named `name`, in insertion order.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.name == name)
            .map(|i| NodeId(i as u32))
    }

    /// Names of the properties bound on `node`.
    pub fn props_of(&self, node: NodeId) -> StrobeResult<Vec<&str>> {
        Ok(self.node(node)?.props.keys().map(String::as_str).collect())
    }

    /// Number of spline fits performed for `node` so far.
    pub fn spline_builds(&self, node: NodeId) -> StrobeResult<u64> {
        Ok(self.node(node)?.spline_cache.borrow().builds())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/graph.rs"]
mod tests;
