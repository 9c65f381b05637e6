//! Error types surfaced by the pipeline and the wildcard-detection engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A named pipeline stage, attached to [`PipelineError::Stage`] so the orchestrator
/// can report which phase failed without the caller having to parse a message string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Workspace,
    Resolvers,
    Source,
    MassResolvePublic,
    WildcardFilter,
    MassResolveTrusted,
    Emit,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Workspace => "workspace",
            Stage::Resolvers => "resolvers",
            Stage::Source => "source",
            Stage::MassResolvePublic => "mass-resolve (public)",
            Stage::WildcardFilter => "wildcard-filter",
            Stage::MassResolveTrusted => "mass-resolve (trusted)",
            Stage::Emit => "emit",
        };
        f.write_str(name)
    }
}

/// The error type returned by every fallible operation in this crate.
///
/// Resolver-level failures never reach this type: the resolver client converts them
/// to empty answer sets before they can escape a detection task.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("precondition failed: resolver binary {bin:?} is not usable ({reason})")]
    PreconditionFailed { bin: PathBuf, reason: String },

    #[error("workspace error: {0}")]
    Workspace(#[source] io::Error),

    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    pub fn invalid_options(msg: impl Into<String>) -> Self {
        PipelineError::InvalidOptions(msg.into())
    }

    pub fn precondition_failed(bin: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        PipelineError::PreconditionFailed {
            bin: bin.into(),
            reason: reason.into(),
        }
    }

    pub fn workspace(err: io::Error) -> Self {
        PipelineError::Workspace(err)
    }

    pub fn stage(stage: Stage, source: io::Error) -> Self {
        PipelineError::Stage { stage, source }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
