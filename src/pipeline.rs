//! Keybox generation pipeline
//!
//! One run goes `Generating → Reading → (Converting)? → Validating → Assembling → Done`
//! and stops at the first failing stage. Nothing is written to the document path
//! unless every artifact passed validation.
//!
//! Runs share nothing, but two runs pointed at the same paths will overwrite each
//! other's PEM files. Callers that run concurrently must serialize per path set or
//! hand each run its own paths.

use crate::configs::OutputPaths;
use crate::device_id::DeviceId;
use crate::error::{KeyboxError, PipelineStage};
use crate::keybox::Keybox;
use crate::normalizer::RawArtifacts;
use crate::orchestrator;
use crate::toolkit::ToolRunner;
use log::{debug, info};
use rand::Rng;
use std::fs;
use std::path::PathBuf;

/// Paths for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub ec_private_key_path: PathBuf,
    pub certificate_path: PathBuf,
    pub rsa_private_key_path: PathBuf,
    /// `None` returns the document instead of writing it
    pub keybox_path: Option<PathBuf>,
}

impl GenerationRequest {
    pub fn from_output_paths(paths: &OutputPaths) -> Self {
        Self {
            ec_private_key_path: paths.ec_private_key_path.clone(),
            certificate_path: paths.certificate_path.clone(),
            rsa_private_key_path: paths.rsa_private_key_path.clone(),
            keybox_path: Some(paths.keybox_path.clone()),
        }
    }

    /// Default file names placed under `dir`, document returned in memory.
    #[cfg(test)]
    pub(crate) fn in_dir(dir: &std::path::Path) -> Self {
        let defaults = OutputPaths::default();
        Self {
            ec_private_key_path: dir.join(defaults.ec_private_key_path),
            certificate_path: dir.join(defaults.certificate_path),
            rsa_private_key_path: dir.join(defaults.rsa_private_key_path),
            keybox_path: None,
        }
    }

    pub fn with_keybox_path(mut self, keybox_path: Option<PathBuf>) -> Self {
        self.keybox_path = keybox_path;
        self
    }
}

/// What a successful run handed back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutput {
    Written { path: PathBuf, keybox: Keybox },
    Document(Keybox),
}

pub struct KeyboxGenerator<R: ToolRunner> {
    runner: R,
}

impl<R: ToolRunner> KeyboxGenerator<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Generate, normalize, validate and assemble a keybox.
    pub fn generate(&self, request: &GenerationRequest) -> Result<Keybox, KeyboxError> {
        self.generate_with_rng(request, &mut rand::thread_rng())
    }

    pub fn generate_with_rng<G: Rng + ?Sized>(
        &self,
        request: &GenerationRequest,
        rng: &mut G,
    ) -> Result<Keybox, KeyboxError> {
        debug!("stage: {}", PipelineStage::Generating);
        orchestrator::generate_artifacts(&self.runner, request)?;

        debug!("stage: {}", PipelineStage::Reading);
        let mut raw = RawArtifacts::read(request)?;

        raw.normalize_rsa_key(&self.runner)?;

        debug!("stage: {}", PipelineStage::Validating);
        let artifacts = raw.validate()?;

        debug!("stage: {}", PipelineStage::Assembling);
        let keybox = Keybox::new(DeviceId::generate_with(rng), artifacts);
        debug!("stage: {}", PipelineStage::Done);
        Ok(keybox)
    }

    /// Generate a keybox and, when the request names a document path, write it there.
    pub fn run(&self, request: &GenerationRequest) -> Result<PipelineOutput, KeyboxError> {
        let keybox = self.generate(request)?;
        match &request.keybox_path {
            Some(path) => {
                debug!("stage: {}", PipelineStage::Writing);
                fs::write(path, keybox.to_xml()).map_err(|source| KeyboxError::Write {
                    path: path.clone(),
                    source,
                })?;
                info!("Keybox with DeviceID {} written to {}", keybox.device_id, path.display());
                Ok(PipelineOutput::Written {
                    path: path.clone(),
                    keybox,
                })
            }
            None => Ok(PipelineOutput::Document(keybox)),
        }
    }

    /// Text-only entry point for callers that branch on a string prefix.
    ///
    /// # Returns
    /// * `"Successfully wrote the keybox to PATH."` when a document path was given
    /// * the document itself when it was not
    /// * a string starting with [`crate::error::FAILURE_PREFIX`] on any failure
    pub fn invoke(&self, request: &GenerationRequest) -> String {
        match self.run(request) {
            Ok(PipelineOutput::Written { path, .. }) => {
                format!("Successfully wrote the keybox to {}.", path.display())
            }
            Ok(PipelineOutput::Document(keybox)) => keybox.to_xml(),
            Err(e) => e.to_failure_string(),
        }
    }
}
