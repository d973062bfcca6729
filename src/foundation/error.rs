/// Convenience result type used across strobe.
pub type StrobeResult<T> = Result<T, StrobeError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum StrobeError {
    /// Invalid user-provided input (job specs, scene construction, API misuse).
    #[error("validation error: {0}")]
    Validation(String),

    /// A derived signal transitively read itself while being recomputed.
    #[error("cyclic dependency: {}", chain.join(" -> "))]
    CyclicDependency {
        /// Signal names from the first re-entered signal back to itself.
        chain: Vec<String>,
    },

    /// A spline was built from fewer than two control points.
    #[error("insufficient points: a spline needs at least 2 control points, got {got}")]
    InsufficientPoints {
        /// Number of points supplied.
        got: usize,
    },

    /// The frame renderer failed.
    #[error("render fault: {0}")]
    Render(String),

    /// The media encoder failed.
    #[error("encode fault: {0}")]
    Encode(String),

    /// An asset could not be resolved.
    #[error("asset not found: '{name}': {reason}")]
    AssetNotFound {
        /// Logical asset name as requested.
        name: String,
        /// Resolver-specific detail.
        reason: String,
    },

    /// Work was cancelled before it completed.
    #[error("cancelled")]
    Cancelled,

    /// A collaborator call exceeded its caller-supplied deadline.
    #[error("timeout: {stage} exceeded {limit_ms} ms")]
    Timeout {
        /// Pipeline stage that overran (`render` or `encode`).
        stage: &'static str,
        /// Configured limit in milliseconds.
        limit_ms: u128,
    },

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StrobeError {
    /// Build a [`StrobeError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StrobeError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`StrobeError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`StrobeError::AssetNotFound`] value.
    pub fn asset_not_found(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AssetNotFound {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`StrobeError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Classify this error for job reports.
    pub fn kind(&self) -> FaultKind {
        match self {
            Self::Validation(_) => FaultKind::Validation,
            Self::CyclicDependency { .. } => FaultKind::CyclicDependency,
            Self::InsufficientPoints { .. } => FaultKind::InsufficientPoints,
            Self::Render(_) => FaultKind::RenderFault,
            Self::Encode(_) => FaultKind::EncodeFault,
            Self::AssetNotFound { .. } => FaultKind::AssetNotFound,
            Self::Cancelled => FaultKind::Cancelled,
            Self::Timeout { .. } => FaultKind::Timeout,
            Self::Serde(_) | Self::Other(_) => FaultKind::Other,
        }
    }
}

/// Coarse fault classification recorded against failed jobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FaultKind {
    /// See [`StrobeError::Validation`].
    Validation,
    /// See [`StrobeError::CyclicDependency`].
    CyclicDependency,
    /// See [`StrobeError::InsufficientPoints`].
    InsufficientPoints,
    /// See [`StrobeError::Render`].
    RenderFault,
    /// See [`StrobeError::Encode`].
    EncodeFault,
    /// See [`StrobeError::AssetNotFound`].
    AssetNotFound,
    /// See [`StrobeError::Cancelled`].
    Cancelled,
    /// See [`StrobeError::Timeout`].
    Timeout,
    /// Serialization and wrapped lower-level errors.
    Other,
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Validation => "Validation",
            Self::CyclicDependency => "CyclicDependency",
            Self::InsufficientPoints => "InsufficientPoints",
            Self::RenderFault => "RenderFault",
            Self::EncodeFault => "EncodeFault",
            Self::AssetNotFound => "AssetNotFound",
            Self::Cancelled => "Cancelled",
            Self::Timeout => "Timeout",
            Self::Other => "Other",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
