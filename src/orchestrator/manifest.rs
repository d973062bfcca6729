use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::core::{Fps, Resolution};
use crate::foundation::error::{StrobeError, StrobeResult};
use crate::orchestrator::job::JobSpec;
use crate::scene::descriptor::SceneRegistry;

/// JSON batch description consumed by `strobe render`.
///
/// Relative `out` and `assets_root` paths are resolved against the manifest's directory.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderManifest {
    /// Directory audio asset names are resolved against. Defaults to the manifest directory.
    #[serde(default)]
    pub assets_root: Option<PathBuf>,
    /// Maximum number of jobs in flight.
    #[serde(default = "default_parallelism")]
    pub max_parallelism: usize,
    /// Jobs in submission order.
    pub jobs: Vec<ManifestJob>,
    #[serde(skip)]
    base_dir: PathBuf,
}

/// One job entry of a [`RenderManifest`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestJob {
    /// Display name; defaults to the scene name.
    #[serde(default)]
    pub name: Option<String>,
    /// Registered scene name.
    pub scene: String,
    /// Output path.
    pub out: PathBuf,
    /// Output canvas size.
    #[serde(default)]
    pub resolution: Resolution,
    /// Integer frame rate.
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Timeline duration in seconds.
    #[serde(default = "default_duration")]
    pub duration_secs: f64,
    /// Audio asset name.
    #[serde(default)]
    pub audio: Option<String>,
}

fn default_parallelism() -> usize {
    1
}

fn default_fps() -> u32 {
    JobSpec::DEFAULT_FPS
}

fn default_duration() -> f64 {
    JobSpec::DEFAULT_DURATION_SECS
}

impl RenderManifest {
    /// Parse a manifest from JSON; relative paths resolve against `base_dir`.
    pub fn from_json(json: &str, base_dir: impl Into<PathBuf>) -> StrobeResult<Self> {
        let mut manifest: Self = serde_json::from_str(json)
            .map_err(|e| StrobeError::serde(format!("invalid render manifest: {e}")))?;
        manifest.base_dir = base_dir.into();
        Ok(manifest)
    }

    /// Read and parse the manifest at `path`.
    pub fn from_path(path: &Path) -> StrobeResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest '{}'", path.display()))?;
        let base = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::from_json(&json, base)
    }

    /// Check batch-level constraints.
    pub fn validate(&self) -> StrobeResult<()> {
        if self.max_parallelism == 0 {
            return Err(StrobeError::validation("max_parallelism must be >= 1"));
        }
        if self.jobs.is_empty() {
            return Err(StrobeError::validation("manifest has no jobs"));
        }
        let mut outs = BTreeSet::new();
        for (i, job) in self.jobs.iter().enumerate() {
            if job.fps == 0 {
                return Err(StrobeError::validation(format!("jobs[{i}]: fps must be > 0")));
            }
            if !job.duration_secs.is_finite() || job.duration_secs <= 0.0 {
                return Err(StrobeError::validation(format!(
                    "jobs[{i}]: duration_secs must be finite and > 0"
                )));
            }
            if job.resolution.width == 0 || job.resolution.height == 0 {
                return Err(StrobeError::validation(format!(
                    "jobs[{i}]: resolution must be non-zero"
                )));
            }
            if !outs.insert(self.resolve(&job.out)) {
                return Err(StrobeError::validation(format!(
                    "jobs[{i}]: output '{}' is used by another job",
                    job.out.display()
                )));
            }
        }
        Ok(())
    }

    /// Directory asset names resolve against.
    pub fn assets_root(&self) -> PathBuf {
        match &self.assets_root {
            Some(root) => self.resolve(root),
            None => self.base_dir.clone(),
        }
    }

    /// Validate and turn every entry into a [`JobSpec`].
    pub fn to_jobs(&self, registry: &SceneRegistry) -> StrobeResult<Vec<JobSpec>> {
        self.validate()?;
        self.jobs
            .iter()
            .map(|job| {
                let scene = registry.get(&job.scene)?;
                let mut spec = JobSpec::new(scene, self.resolve(&job.out))
                    .with_resolution(job.resolution)
                    .with_fps(Fps::integer(job.fps)?)
                    .with_duration(job.duration_secs);
                if let Some(name) = &job.name {
                    spec = spec.with_name(name.clone());
                }
                if let Some(audio) = &job.audio {
                    spec = spec.with_audio(audio.clone());
                }
                Ok(spec)
            })
            .collect()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrator/manifest.rs"]
mod tests;
