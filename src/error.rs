//! Pipeline errors, one variant per way a run can stop.

use crate::artifact::{ArtifactKind, Envelope};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Prefix that marks a failure in the plain-text invocation interface
pub const FAILURE_PREFIX: &str = "Error: ";

/// Where a pipeline run currently is (or where it stopped)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    Generating,
    Reading,
    Converting,
    Validating,
    Assembling,
    Writing,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Generating => "generating",
            PipelineStage::Reading => "reading",
            PipelineStage::Converting => "converting",
            PipelineStage::Validating => "validating",
            PipelineStage::Assembling => "assembling",
            PipelineStage::Writing => "writing",
            PipelineStage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum KeyboxError {
    #[error(
        "Cannot generate a sample ``keybox.xml`` file since {failed} PEM {} not generated successfully.",
        pem_files_phrase(.failed)
    )]
    Generation { failed: usize },

    #[error("Failed to read the PEM file \"{}\". Details are as follows.\n{source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Cannot convert the {from} to the PKCS#1 RSA private key.")]
    Conversion { from: Envelope },

    #[error(
        "An invalid {artifact} is detected. Please try to use the latest key generation tools to solve this issue."
    )]
    Validation { artifact: ArtifactKind },

    #[error("Failed to write the keybox to {}. Details:\n{source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

fn pem_files_phrase(failed: &usize) -> &'static str {
    if *failed > 1 {
        "files were"
    } else {
        "file was"
    }
}

impl KeyboxError {
    /// The stage the run was in when it failed.
    pub fn stage(&self) -> PipelineStage {
        match self {
            KeyboxError::Generation { .. } => PipelineStage::Generating,
            KeyboxError::Read { .. } => PipelineStage::Reading,
            KeyboxError::Conversion { .. } => PipelineStage::Converting,
            KeyboxError::Validation { .. } => PipelineStage::Validating,
            KeyboxError::Write { .. } => PipelineStage::Writing,
        }
    }

    /// Render as the `Error: ...` string used by text-only callers.
    pub fn to_failure_string(&self) -> String {
        format!("{}{}", FAILURE_PREFIX, self)
    }
}
