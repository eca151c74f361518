//! Format Normalizer
//!
//! Reads the generated PEM files back, bridges the RSA key envelope differences
//! between toolkit versions, then checks every artifact against the envelope the
//! keybox schema needs.
//!
//! openssl 1.x `genrsa` writes `BEGIN RSA PRIVATE KEY` (PKCS#1), 3.x writes
//! `BEGIN PRIVATE KEY` (PKCS#8), and some environments hand back OpenSSH keys.
//! The keybox only accepts PKCS#1, so the RSA key is sniffed against
//! [`CONVERSION_RULES`] and rewritten in place when needed.

use crate::artifact::{
    check_envelope, ArtifactKind, Envelope, KeyArtifact, OPENSSH_PRIVATE_KEY, PKCS8_PRIVATE_KEY,
};
use crate::error::{KeyboxError, PipelineStage};
use crate::pipeline::GenerationRequest;
use crate::toolkit::{ToolCommand, ToolRunner};
use log::{debug, info, warn};
use std::path::PathBuf;

/// An RSA key envelope that must be rewritten, and the command that does it
#[derive(Debug)]
pub struct ConversionRule {
    pub envelope: Envelope,
    pub command: fn(PathBuf) -> ToolCommand,
}

/// Checked first to last; the first matching envelope wins.
pub static CONVERSION_RULES: [ConversionRule; 2] = [
    ConversionRule {
        envelope: PKCS8_PRIVATE_KEY,
        command: ToolCommand::ConvertPkcs8ToTraditional,
    },
    ConversionRule {
        envelope: OPENSSH_PRIVATE_KEY,
        command: ToolCommand::ConvertOpenSshToPem,
    },
];

/// Find the conversion an RSA key needs, if any.
pub fn select_conversion(rsa_pem: &str) -> Option<&'static ConversionRule> {
    CONVERSION_RULES
        .iter()
        .find(|rule| rule.envelope.wraps(rsa_pem))
}

/// The three artifacts as read from disk, before validation
#[derive(Debug, Clone)]
pub struct RawArtifacts {
    pub ec_private_key: KeyArtifact,
    pub certificate: KeyArtifact,
    pub rsa_private_key: KeyArtifact,
}

impl RawArtifacts {
    pub fn read(request: &GenerationRequest) -> Result<Self, KeyboxError> {
        Ok(Self {
            ec_private_key: KeyArtifact::read(
                ArtifactKind::EcPrivateKey,
                &request.ec_private_key_path,
            )?,
            certificate: KeyArtifact::read(ArtifactKind::Certificate, &request.certificate_path)?,
            rsa_private_key: KeyArtifact::read(
                ArtifactKind::RsaPrivateKey,
                &request.rsa_private_key_path,
            )?,
        })
    }

    /// Rewrite the RSA key into the legacy envelope if it is in one of the
    /// envelopes listed in [`CONVERSION_RULES`].
    ///
    /// # Returns
    /// * `Ok(Some(envelope))` - The envelope that was converted from
    /// * `Ok(None)` - No conversion was needed
    pub fn normalize_rsa_key<R: ToolRunner>(
        &mut self,
        runner: &R,
    ) -> Result<Option<Envelope>, KeyboxError> {
        let Some(rule) = select_conversion(&self.rsa_private_key.pem) else {
            debug!("RSA private key needs no conversion");
            return Ok(None);
        };

        debug!("stage: {}", PipelineStage::Converting);
        info!(
            "Converting the {} at {} to a PKCS#1 RSA private key",
            rule.envelope,
            self.rsa_private_key.path.display()
        );
        let status = runner.run(&(rule.command)(self.rsa_private_key.path.clone()));
        if !status.success() {
            warn!("Conversion from {} failed: {}", rule.envelope, status);
            return Err(KeyboxError::Conversion {
                from: rule.envelope,
            });
        }

        // converters overwrite their input, so the new key is only on disk
        self.rsa_private_key.reload()?;
        info!("Finished converting the {}", rule.envelope);
        Ok(Some(rule.envelope))
    }

    /// Check the final envelopes: EC key, then certificate, then RSA key.
    pub fn validate(self) -> Result<ValidatedArtifacts, KeyboxError> {
        ValidatedArtifacts::from_pem(
            self.ec_private_key.pem,
            self.certificate.pem,
            self.rsa_private_key.pem,
        )
    }
}

/// Artifacts that passed their envelope checks; the only input the assembler takes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedArtifacts {
    ec_private_key: String,
    certificate: String,
    rsa_private_key: String,
}

impl ValidatedArtifacts {
    pub fn from_pem(
        ec_private_key: String,
        certificate: String,
        rsa_private_key: String,
    ) -> Result<Self, KeyboxError> {
        check_envelope(ArtifactKind::EcPrivateKey, &ec_private_key)?;
        check_envelope(ArtifactKind::Certificate, &certificate)?;
        check_envelope(ArtifactKind::RsaPrivateKey, &rsa_private_key)?;
        Ok(Self {
            ec_private_key,
            certificate,
            rsa_private_key,
        })
    }

    pub fn ec_private_key(&self) -> &str {
        &self.ec_private_key
    }

    pub fn certificate(&self) -> &str {
        &self.certificate
    }

    pub fn rsa_private_key(&self) -> &str {
        &self.rsa_private_key
    }
}
