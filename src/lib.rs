//! Keybox Gen - Synthetic Attestation Keybox Generator
//!
//! Produces test `keybox.xml` documents (the `AndroidAttestation` layout) by driving the
//! openssl command line toolkit. The identifiers and key material are throwaway: nothing
//! here is hardware-backed and nothing is verified beyond PEM envelope checks.
//!
//! # Overview
//!
//! One pipeline run goes through three stages:
//!
//! ```text
//! Orchestrator   openssl ecparam / req -x509 / genrsa  → three PEM files
//!     │
//! Normalizer     read back, convert the RSA key to PKCS#1 if needed, validate envelopes
//!     │
//! Assembler      random DeviceID + the three PEM blobs → keybox document
//! ```
//!
//! Any failing stage stops the run; no document is produced from partial output.
//!
//! # Quick Start
//!
//! ```bash
//! cargo build --release
//! ./target/release/keybox-gen generate            # writes keybox.xml
//! ./target/release/keybox-gen generate --stdout   # prints it instead
//! ```
//!
//! # As a Library
//!
//! ```no_run
//! use keybox_gen::configs::AppConfig;
//! use keybox_gen::pipeline::{GenerationRequest, KeyboxGenerator};
//! use keybox_gen::toolkit::{SystemToolRunner, Toolkit};
//!
//! let config = AppConfig::default();
//! let runner = SystemToolRunner::new(Toolkit::new(config.toolkit, config.certificate));
//! let generator = KeyboxGenerator::new(runner);
//!
//! let request = GenerationRequest::from_output_paths(&config.output);
//! let keybox = generator.generate(&request)?;
//! println!("{}", keybox.to_xml());
//! # Ok::<(), keybox_gen::error::KeyboxError>(())
//! ```
//!
//! # Module Overview
//!
//! - [`toolkit`]: typed toolkit commands and the [`toolkit::ToolRunner`] seam
//! - [`orchestrator`]: the three generation commands
//! - [`normalizer`]: read-back, RSA envelope conversion, validation
//! - [`keybox`]: document layout
//! - [`pipeline`]: the end-to-end run and the plain-text invocation interface
//! - [`external_interface`] / [`protocol`]: Unix socket front end

pub mod artifact;
pub mod configs;
pub mod device_id;
pub mod error;
pub mod external_interface;
pub mod keybox;
pub mod normalizer;
pub mod orchestrator;
pub mod pipeline;
pub mod protocol;
pub mod toolkit;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{KeyboxError, PipelineStage};
pub use keybox::Keybox;
pub use pipeline::{GenerationRequest, KeyboxGenerator, PipelineOutput};
