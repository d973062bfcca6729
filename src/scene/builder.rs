use crate::scene::graph::{IntoBinding, NodeId, NodeKind, SceneGraph};

/// Construction scope attaching nodes under one parent.
///
/// Scopes are passed down explicitly while a scene is built; nested content is declared with
/// [`NodeBuilder::children`].
pub struct Scope<'g> {
    graph: &'g mut SceneGraph,
    parent: NodeId,
    depth: usize,
}

impl<'g> Scope<'g> {
    pub(crate) fn new(graph: &'g mut SceneGraph, parent: NodeId, depth: usize) -> Self {
        Self {
            graph,
            parent,
            depth,
        }
    }

    /// Parent new nodes are attached to.
    pub fn parent(&self) -> NodeId {
        self.parent
    }

    /// Depth of the parent below the root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Add a child node and return its builder.
    pub fn add(&mut self, name: impl Into<String>, kind: NodeKind) -> NodeBuilder<'_> {
        let id = self.graph.push_node(self.parent, name.into(), kind);
        NodeBuilder {
            graph: &mut *self.graph,
            id,
            depth: self.depth + 1,
        }
    }

    /// Shorthand for `add(name, NodeKind::Group)`.
    pub fn group(&mut self, name: impl Into<String>) -> NodeBuilder<'_> {
        self.add(name, NodeKind::Group)
    }
}

/// Builder for one node: bind properties, then declare children.
pub struct NodeBuilder<'s> {
    graph: &'s mut SceneGraph,
    id: NodeId,
    depth: usize,
}

impl NodeBuilder<'_> {
    /// Bind a property to a constant or a signal.
    pub fn prop(self, name: impl Into<String>, binding: impl IntoBinding) -> Self {
        if let Some(node) = self.graph.nodes.get_mut(self.id.index()) {
            node.props.insert(name.into(), binding.into_binding());
        }
        self
    }

    /// Declare child nodes inside a nested scope.
    pub fn children(self, f: impl FnOnce(&mut Scope<'_>)) -> Self {
        let mut scope = Scope::new(&mut *self.graph, self.id, self.depth);
        f(&mut scope);
        self
    }

    /// Id of the node being built.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Finish building and return the node id.
    pub fn finish(self) -> NodeId {
        self.id
    }
}
