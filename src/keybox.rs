//! Document Assembler
//!
//! Interpolates validated artifacts into the `AndroidAttestation` keybox layout.
//! Downstream consumers compare the layout byte for byte, so whitespace and tag
//! nesting below must not change. Each PEM blob brings its own trailing newline
//! and is followed directly by its closing tag.

use crate::device_id::DeviceId;
use crate::normalizer::ValidatedArtifacts;
use std::fmt;

/// One keybox: a device id plus the validated key material
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keybox {
    pub device_id: DeviceId,
    pub artifacts: ValidatedArtifacts,
}

impl Keybox {
    pub fn new(device_id: DeviceId, artifacts: ValidatedArtifacts) -> Self {
        Self {
            device_id,
            artifacts,
        }
    }

    /// Render the full document.
    pub fn to_xml(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Keybox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            concat!(
                "<?xml version=\"1.0\"?>\n",
                "<AndroidAttestation>\n",
                "<NumberOfKeyboxes>1</NumberOfKeyboxes>\n",
                "<Keybox DeviceID=\"{device_id}\">\n",
                "<Key algorithm=\"ecdsa\">\n",
                "<PrivateKey format=\"pem\">\n",
                "{ec_private_key}</PrivateKey>\n",
                "<CertificateChain>\n",
                "<NumberOfCertificates>1</NumberOfCertificates>\n",
                "<Certificate format=\"pem\">\n",
                "{certificate}</Certificate>\n",
                "</CertificateChain>\n",
                "</Key>\n",
                "<Key algorithm=\"rsa\">\n",
                "<PrivateKey format=\"pem\">\n",
                "{rsa_private_key}</PrivateKey>\n",
                "</Key>\n",
                "</Keybox>\n",
                "</AndroidAttestation>\n",
            ),
            device_id = self.device_id,
            ec_private_key = self.artifacts.ec_private_key(),
            certificate = self.artifacts.certificate(),
            rsa_private_key = self.artifacts.rsa_private_key(),
        )
    }
}
