//! Strobe is a deterministic procedural animation engine.
//!
//! Scenes are trees of nodes whose properties are constants or reactive signals. A timeline
//! driver steps a master time signal frame by frame; each frame the scene graph is
//! snapshotted, rasterized and streamed into an encoder. Batches of jobs run on a bounded
//! worker pool with per-job fault isolation:
//!
//! - Describe a scene with a [`SceneDescriptor`]
//! - Wrap it in [`JobSpec`]s (or load a [`RenderManifest`])
//! - Run them with an [`Orchestrator`] and inspect the [`RenderReport`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod animation;
mod assets;
mod encode;
mod foundation;
mod orchestrator;
mod render;
mod scene;
mod signal;
mod spline;
mod timeline;

/// Built-in demo scenes.
pub mod scenes;

pub use crate::animation::ease::Ease;
pub use crate::animation::lerp::Lerp;
pub use crate::assets::resolver::{AssetResolver, DirAssetResolver, MemoryAssetResolver};
pub use crate::encode::ffmpeg::{
    FfmpegEncoder, FfmpegEncoderFactory, FfmpegEncoderOpts, ensure_parent_dir, is_ffmpeg_on_path,
};
pub use crate::encode::png::{PngSequenceEncoder, PngSequenceEncoderFactory, write_png};
pub use crate::encode::sink::{EncodeConfig, EncoderFactory, InMemoryEncoder, MediaEncoder};
pub use crate::foundation::cancel::CancelToken;
pub use crate::foundation::color::Color;
pub use crate::foundation::core::{
    Affine, BezPath, Fps, FrameIndex, Point, Resolution, Transform2D, Vec2,
};
pub use crate::foundation::error::{FaultKind, StrobeError, StrobeResult};
pub use crate::foundation::math::{smoothstep, wrap01};
pub use crate::orchestrator::job::{
    JobId, JobObserver, JobOutcome, JobReport, JobSpec, JobState, RenderReport,
};
pub use crate::orchestrator::manifest::{ManifestJob, RenderManifest};
pub use crate::orchestrator::runner::{Orchestrator, OrchestratorOpts, StageLimits};
pub use crate::orchestrator::slots::{SlotGuard, WorkerSlots};
pub use crate::render::backend::{
    CpuRendererFactory, FrameRGBA, FrameRenderer, RenderSettings, RendererFactory,
};
pub use crate::render::cpu::CpuRenderer;
pub use crate::scene::builder::{NodeBuilder, Scope};
pub use crate::scene::descriptor::{
    BuiltScene, FnScene, SceneContext, SceneDescriptor, SceneParams, SceneRegistry, instantiate,
};
pub use crate::scene::graph::{Binding, IntoBinding, NodeId, NodeKind, PropValue, SceneGraph};
pub use crate::scene::snapshot::{FrameSnapshot, NodeSnapshot};
pub use crate::signal::handle::Signal;
pub use crate::signal::runtime::{Runtime, SignalId};
pub use crate::spline::cache::{SplineCache, spline_signal};
pub use crate::spline::curve::{SplineCurve, SplineSample, VisibleRange};
pub use crate::timeline::driver::{DriverState, FrameTick, Step, TimelineDriver};
pub use crate::timeline::thread::{
    All, BoxThread, FnThread, Sequence, Thread, ThreadCtx, ThreadState, Tween, WaitFor,
};
