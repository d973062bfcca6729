use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::foundation::error::{StrobeError, StrobeResult};
use crate::signal::handle::Signal;

pub(crate) type AnyValue = Rc<dyn Any>;
type ComputeFn = Rc<dyn Fn() -> StrobeResult<AnyValue>>;

/// Index of a signal inside its [`Runtime`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct SignalId(pub u32);

impl SignalId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

enum SignalKind {
    Source,
    Derived { compute: ComputeFn, volatile: bool },
}

struct SignalNode {
    name: String,
    kind: SignalKind,
    value: Option<AnyValue>,
    dirty: bool,
    evaluating: bool,
    // Signals read during the last evaluation, in first-read order.
    sources: Vec<SignalId>,
    // Non-owning back-references used for invalidation.
    dependents: BTreeSet<SignalId>,
}

pub(crate) struct RuntimeInner {
    nodes: RefCell<Vec<SignalNode>>,
    stack: RefCell<Vec<SignalId>>,
    tick: Cell<u64>,
    recomputes: Cell<u64>,
}

/// Arena owning every signal of one scene.
///
/// A runtime is single-threaded: it is created, evaluated and dropped on the worker that renders
/// its scene. [`Signal`] handles hold a weak reference, so dropping the last `Runtime` clone frees
/// all cached values and closures.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("signals", &self.len())
            .field("tick", &self.tick())
            .finish()
    }
}

impl Runtime {
    /// Create an empty runtime.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                nodes: RefCell::new(Vec::new()),
                stack: RefCell::new(Vec::new()),
                tick: Cell::new(0),
                recomputes: Cell::new(0),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Rc<RuntimeInner>) -> Self {
        Self { inner }
    }

    /// Create a writable source signal holding `value`.
    pub fn source<T>(&self, name: impl Into<String>, value: T) -> Signal<T>
    where
        T: Clone + 'static,
    {
        let id = self.inner.register(SignalNode {
            name: name.into(),
            kind: SignalKind::Source,
            value: Some(Rc::new(value)),
            dirty: false,
            evaluating: false,
            sources: Vec::new(),
            dependents: BTreeSet::new(),
        });
        Signal::new(Rc::downgrade(&self.inner), id)
    }

    /// Create a derived signal computed lazily from other signals.
    ///
    /// Every signal read inside `f` becomes a dependency; the set is rebuilt on each
    /// recomputation.
    pub fn derived<T, F>(&self, name: impl Into<String>, f: F) -> Signal<T>
    where
        T: Clone + 'static,
        F: Fn() -> StrobeResult<T> + 'static,
    {
        self.register_derived(name.into(), f, false)
    }

    /// Create a derived signal that is also invalidated on every [`Runtime::advance_tick`].
    pub fn volatile<T, F>(&self, name: impl Into<String>, f: F) -> Signal<T>
    where
        T: Clone + 'static,
        F: Fn() -> StrobeResult<T> + 'static,
    {
        self.register_derived(name.into(), f, true)
    }

    fn register_derived<T, F>(&self, name: String, f: F, volatile: bool) -> Signal<T>
    where
        T: Clone + 'static,
        F: Fn() -> StrobeResult<T> + 'static,
    {
        let compute: ComputeFn = Rc::new(move || f().map(|v| Rc::new(v) as AnyValue));
        let id = self.inner.register(SignalNode {
            name,
            kind: SignalKind::Derived { compute, volatile },
            value: None,
            dirty: true,
            evaluating: false,
            sources: Vec::new(),
            dependents: BTreeSet::new(),
        });
        Signal::new(Rc::downgrade(&self.inner), id)
    }

    /// Advance the evaluation tick, invalidating volatile signals and their dependents.
    pub fn advance_tick(&self) {
        self.inner.tick.set(self.inner.tick.get() + 1);
        let mut nodes = self.inner.nodes.borrow_mut();
        let volatile: Vec<SignalId> = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| matches!(n.kind, SignalKind::Derived { volatile: true, .. }))
            .map(|(i, _)| SignalId(i as u32))
            .collect();
        for id in volatile {
            nodes[id.index()].dirty = true;
            mark_dependents_dirty(&mut nodes, id);
        }
    }

    /// Current evaluation tick.
    pub fn tick(&self) -> u64 {
        self.inner.tick.get()
    }

    /// Total number of derived recomputations performed so far.
    pub fn recompute_count(&self) -> u64 {
        self.inner.recomputes.get()
    }

    /// Number of registered signals.
    pub fn len(&self) -> usize {
        self.inner.nodes.borrow().len()
    }

    /// Return `true` when no signal has been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mark every derived signal dirty so the next read recomputes from scratch.
    pub fn invalidate_all(&self) {
        for node in self.inner.nodes.borrow_mut().iter_mut() {
            if matches!(node.kind, SignalKind::Derived { .. }) {
                node.dirty = true;
            }
        }
    }

    /// Return `true` when no evaluation is in progress.
    pub fn is_idle(&self) -> bool {
        self.inner.stack.borrow().is_empty()
            && self.inner.nodes.borrow().iter().all(|n| !n.evaluating)
    }

    /// Signals read by `id` during its last evaluation.
    pub fn dependencies_of(&self, id: SignalId) -> Vec<SignalId> {
        self.inner
            .nodes
            .borrow()
            .get(id.index())
            .map(|n| n.sources.clone())
            .unwrap_or_default()
    }

    /// Signals currently subscribed to `id`.
    pub fn dependents_of(&self, id: SignalId) -> Vec<SignalId> {
        self.inner
            .nodes
            .borrow()
            .get(id.index())
            .map(|n| n.dependents.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl RuntimeInner {
    fn register(&self, node: SignalNode) -> SignalId {
        let mut nodes = self.nodes.borrow_mut();
        let id = SignalId(nodes.len() as u32);
        nodes.push(node);
        id
    }

    pub(crate) fn name_of(&self, id: SignalId) -> String {
        self.nodes
            .borrow()
            .get(id.index())
            .map(|n| n.name.clone())
            .unwrap_or_else(|| format!("#{}", id.0))
    }

    pub(crate) fn is_dirty(&self, id: SignalId) -> bool {
        self.nodes
            .borrow()
            .get(id.index())
            .is_some_and(|n| n.dirty)
    }

    pub(crate) fn read(&self, id: SignalId) -> StrobeResult<AnyValue> {
        self.track(id)?;

        let compute = {
            let nodes = self.nodes.borrow();
            let node = &nodes[id.index()];
            match &node.kind {
                SignalKind::Source => {
                    return node.value.clone().ok_or_else(|| {
                        StrobeError::validation(format!(
                            "source signal '{}' has no value",
                            node.name
                        ))
                    });
                }
                SignalKind::Derived { compute, .. } => {
                    if !node.dirty
                        && let Some(v) = &node.value
                    {
                        return Ok(v.clone());
                    }
                    compute.clone()
                }
            }
        };

        self.recompute(id, compute)
    }

    pub(crate) fn write(&self, id: SignalId, value: AnyValue) -> StrobeResult<()> {
        if let Some(&reader) = self.stack.borrow().last() {
            return Err(StrobeError::validation(format!(
                "signal '{}' written while '{}' was being evaluated; derived signals must be pure",
                self.name_of(id),
                self.name_of(reader)
            )));
        }

        let mut nodes = self.nodes.borrow_mut();
        let node = &mut nodes[id.index()];
        if !matches!(node.kind, SignalKind::Source) {
            return Err(StrobeError::validation(format!(
                "signal '{}' is derived; only source signals can be written",
                node.name
            )));
        }
        node.value = Some(value);
        mark_dependents_dirty(&mut nodes, id);
        Ok(())
    }

    // Registers `id` as a dependency of the signal on top of the evaluation stack.
    fn track(&self, id: SignalId) -> StrobeResult<()> {
        let stack = self.stack.borrow();
        let mut nodes = self.nodes.borrow_mut();

        if nodes[id.index()].evaluating {
            let start = stack.iter().position(|s| *s == id).unwrap_or(0);
            let mut chain: Vec<String> = stack[start..]
                .iter()
                .map(|s| nodes[s.index()].name.clone())
                .collect();
            chain.push(nodes[id.index()].name.clone());
            return Err(StrobeError::CyclicDependency { chain });
        }

        if let Some(&reader) = stack.last() {
            let reader_node = &mut nodes[reader.index()];
            if !reader_node.sources.contains(&id) {
                reader_node.sources.push(id);
            }
            nodes[id.index()].dependents.insert(reader);
        }
        Ok(())
    }

    fn recompute(&self, id: SignalId, compute: ComputeFn) -> StrobeResult<AnyValue> {
        {
            let mut nodes = self.nodes.borrow_mut();
            let old = std::mem::take(&mut nodes[id.index()].sources);
            for s in old {
                nodes[s.index()].dependents.remove(&id);
            }
            nodes[id.index()].evaluating = true;
        }

        let result = {
            let _frame = EvalFrame::enter(self, id);
            compute()
        };

        let mut nodes = self.nodes.borrow_mut();
        let node = &mut nodes[id.index()];
        match result {
            Ok(v) => {
                node.value = Some(v.clone());
                node.dirty = false;
                self.recomputes.set(self.recomputes.get() + 1);
                Ok(v)
            }
            Err(e) => {
                node.dirty = true;
                Err(e)
            }
        }
    }
}

fn mark_dependents_dirty(nodes: &mut [SignalNode], id: SignalId) {
    let mut seen = vec![false; nodes.len()];
    let mut pending: Vec<SignalId> = nodes[id.index()].dependents.iter().copied().collect();
    while let Some(next) = pending.pop() {
        if std::mem::replace(&mut seen[next.index()], true) {
            continue;
        }
        let node = &mut nodes[next.index()];
        node.dirty = true;
        pending.extend(node.dependents.iter().copied());
    }
}

// Evaluation stack entry; popped on drop so errors and panics leave the runtime re-readable.
struct EvalFrame<'a> {
    rt: &'a RuntimeInner,
    id: SignalId,
}

impl<'a> EvalFrame<'a> {
    fn enter(rt: &'a RuntimeInner, id: SignalId) -> Self {
        rt.stack.borrow_mut().push(id);
        Self { rt, id }
    }
}

impl Drop for EvalFrame<'_> {
    fn drop(&mut self) {
        if let Ok(mut stack) = self.rt.stack.try_borrow_mut() {
            let popped = stack.pop();
            debug_assert_eq!(popped, Some(self.id), "evaluation stack mismatch");
        }
        if let Ok(mut nodes) = self.rt.nodes.try_borrow_mut()
            && let Some(node) = nodes.get_mut(self.id.index())
        {
            node.evaluating = false;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/signal/runtime.rs"]
mod tests;
