use std::collections::BTreeMap;
use std::sync::Arc;

use crate::animation::ease::Ease;
use crate::foundation::cancel::CancelToken;
use crate::foundation::core::{FrameIndex, Fps, Resolution};
use crate::foundation::error::{StrobeError, StrobeResult};
use crate::scene::builder::Scope;
use crate::scene::graph::SceneGraph;
use crate::scene::snapshot::FrameSnapshot;
use crate::signal::handle::Signal;
use crate::signal::runtime::Runtime;
use crate::timeline::driver::{FrameTick, Step, TimelineDriver};
use crate::timeline::thread::{BoxThread, Thread, Tween};

/// Thread-safe recipe for building a scene.
///
/// Descriptors are shared between workers; each job calls [`SceneDescriptor::build`] on its
/// own thread to create a fresh, single-threaded signal graph.
pub trait SceneDescriptor: Send + Sync {
    /// Registry name.
    fn name(&self) -> &str;

    /// Populate the scene graph and register sub-timelines.
    fn build(&self, ctx: &mut SceneContext) -> StrobeResult<()>;
}

/// [`SceneDescriptor`] backed by a closure.
pub struct FnScene<F> {
    name: String,
    f: F,
}

impl<F> FnScene<F>
where
    F: Fn(&mut SceneContext) -> StrobeResult<()> + Send + Sync,
{
    /// Wrap `f` under `name`.
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> SceneDescriptor for FnScene<F>
where
    F: Fn(&mut SceneContext) -> StrobeResult<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn build(&self, ctx: &mut SceneContext) -> StrobeResult<()> {
        (self.f)(ctx)
    }
}

/// Timing and canvas parameters a scene is built for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneParams {
    /// Timeline duration.
    pub duration_secs: f64,
    /// Frame rate.
    pub fps: Fps,
    /// Output canvas size.
    pub resolution: Resolution,
}

/// Build-time context handed to [`SceneDescriptor::build`].
pub struct SceneContext {
    runtime: Runtime,
    time: Signal<f64>,
    graph: SceneGraph,
    threads: Vec<BoxThread>,
    params: SceneParams,
    progress: Option<Signal<f64>>,
}

impl SceneContext {
    fn new(params: SceneParams) -> Self {
        let runtime = Runtime::new();
        let time = runtime.source("time", 0.0_f64);
        Self {
            runtime,
            time,
            graph: SceneGraph::new(),
            threads: Vec::new(),
            params,
            progress: None,
        }
    }

    /// Signal runtime of the scene.
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Master time in seconds.
    pub fn time(&self) -> Signal<f64> {
        self.time.clone()
    }

    /// Timing and canvas parameters.
    pub fn params(&self) -> SceneParams {
        self.params
    }

    /// Scope attaching nodes under the root group.
    pub fn root(&mut self) -> Scope<'_> {
        let root = self.graph.root();
        Scope::new(&mut self.graph, root, 0)
    }

    /// Direct access to the scene graph.
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    /// Register a sub-timeline with the scene's driver.
    pub fn spawn(&mut self, thread: impl Thread + 'static) {
        self.threads.push(Box::new(thread));
    }

    /// Normalized progress tweened linearly from 0 to 1 over the whole duration.
    ///
    /// Created on first use; later calls return the same signal.
    pub fn progress(&mut self) -> StrobeResult<Signal<f64>> {
        if let Some(p) = &self.progress {
            return Ok(p.clone());
        }
        let p = self.runtime.source("progress", 0.0_f64);
        let tween = Tween::new(p.clone(), 0.0, 1.0, self.params.duration_secs, Ease::Linear)?;
        self.spawn(tween);
        self.progress = Some(p.clone());
        Ok(p)
    }
}

/// A scene instantiated for one job.
pub struct BuiltScene {
    /// Signal runtime owning every binding.
    pub runtime: Runtime,
    /// Master time signal.
    pub time: Signal<f64>,
    /// Scene graph.
    pub graph: SceneGraph,
    /// Driver stepping `time`.
    pub driver: TimelineDriver,
}

impl std::fmt::Debug for BuiltScene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltScene")
            .field("graph", &self.graph)
            .field("driver", &self.driver)
            .finish()
    }
}

impl BuiltScene {
    /// Snapshot the graph for `tick`.
    pub fn snapshot(&self, tick: FrameTick) -> StrobeResult<FrameSnapshot> {
        self.graph.snapshot(tick)
    }

    /// Advance the driver up to and including `frame`, returning its tick.
    pub fn seek(&mut self, frame: FrameIndex) -> StrobeResult<FrameTick> {
        loop {
            match self.driver.resume()? {
                Step::Frame(tick) if tick.index == frame => return Ok(tick),
                Step::Frame(_) => {}
                Step::Done => {
                    return Err(StrobeError::validation(format!(
                        "frame {} is past the end of the timeline ({} frames)",
                        frame.0,
                        self.driver.total_frames()
                    )));
                }
            }
        }
    }
}

/// Build a fresh scene from `descriptor`.
#[tracing::instrument(skip_all, fields(scene = descriptor.name()))]
pub fn instantiate(
    descriptor: &dyn SceneDescriptor,
    params: SceneParams,
    cancel: Option<CancelToken>,
) -> StrobeResult<BuiltScene> {
    let mut ctx = SceneContext::new(params);
    descriptor.build(&mut ctx)?;

    let SceneContext {
        runtime,
        time,
        graph,
        threads,
        ..
    } = ctx;
    let mut driver = TimelineDriver::new(
        runtime.clone(),
        time.clone(),
        params.duration_secs,
        params.fps,
    )?;
    if let Some(token) = cancel {
        driver = driver.with_cancel(token);
    }
    for thread in threads {
        driver.spawn_boxed(thread);
    }

    tracing::debug!(
        nodes = graph.len(),
        signals = runtime.len(),
        frames = driver.total_frames(),
        "scene instantiated"
    );
    Ok(BuiltScene {
        runtime,
        time,
        graph,
        driver,
    })
}

/// Name-indexed set of scene descriptors.
#[derive(Clone, Default)]
pub struct SceneRegistry {
    scenes: BTreeMap<String, Arc<dyn SceneDescriptor>>,
}

impl std::fmt::Debug for SceneRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.scenes.keys()).finish()
    }
}

impl SceneRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `scene` under its own name; duplicates are rejected.
    pub fn register(&mut self, scene: Arc<dyn SceneDescriptor>) -> StrobeResult<()> {
        let name = scene.name().to_owned();
        if self.scenes.contains_key(&name) {
            return Err(StrobeError::validation(format!(
                "scene '{name}' is already registered"
            )));
        }
        self.scenes.insert(name, scene);
        Ok(())
    }

    /// Look up a scene by name.
    pub fn get(&self, name: &str) -> StrobeResult<Arc<dyn SceneDescriptor>> {
        self.scenes.get(name).cloned().ok_or_else(|| {
            StrobeError::validation(format!(
                "unknown scene '{name}' (known: {})",
                self.names().join(", ")
            ))
        })
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.scenes.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/descriptor.rs"]
mod tests;
