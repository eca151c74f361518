//! First phase: mint the EC key, the self-signed certificate and the RSA key.

use crate::error::KeyboxError;
use crate::pipeline::GenerationRequest;
use crate::toolkit::{ToolCommand, ToolRunner};
use log::warn;

/// The three generation commands, in the order they must run.
pub fn generation_commands(request: &GenerationRequest) -> [ToolCommand; 3] {
    [
        ToolCommand::GenerateEcKey(request.ec_private_key_path.clone()),
        ToolCommand::SelfSignCertificate {
            key: request.ec_private_key_path.clone(),
            out: request.certificate_path.clone(),
        },
        ToolCommand::GenerateRsaKey(request.rsa_private_key_path.clone()),
    ]
}

/// Run every generation command, then fail if any of them did.
///
/// A failed command does not stop the ones after it, so the reported count
/// covers all three artifacts.
pub fn generate_artifacts<R: ToolRunner>(
    runner: &R,
    request: &GenerationRequest,
) -> Result<(), KeyboxError> {
    let mut failed = 0;
    for command in generation_commands(request) {
        let status = runner.run(&command);
        if !status.success() {
            warn!("{:?} did not complete: {}", command, status);
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(KeyboxError::Generation { failed });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeToolRunner, Step};
    use crate::toolkit::ToolStatus;

    #[test]
    fn test_all_commands_run_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let request = GenerationRequest::in_dir(dir.path());
        let runner = FakeToolRunner::legacy();

        generate_artifacts(&runner, &request).unwrap();

        assert_eq!(runner.calls(), generation_commands(&request).to_vec());
        assert!(request.ec_private_key_path.exists());
        assert!(request.certificate_path.exists());
        assert!(request.rsa_private_key_path.exists());
    }

    #[test]
    fn test_single_failure_is_counted() {
        let dir = tempfile::tempdir().unwrap();
        let request = GenerationRequest::in_dir(dir.path());
        let runner = FakeToolRunner::legacy().fail_on(Step::Certificate, ToolStatus::Exited(1));

        let err = generate_artifacts(&runner, &request).unwrap_err();

        assert!(matches!(err, KeyboxError::Generation { failed: 1 }));
        assert!(err.to_string().contains("1 PEM file was"));
        // later commands still ran
        assert_eq!(runner.calls().len(), 3);
    }

    #[test]
    fn test_every_failure_is_counted() {
        let dir = tempfile::tempdir().unwrap();
        let request = GenerationRequest::in_dir(dir.path());
        let runner = FakeToolRunner::legacy()
            .fail_on(Step::EcKey, ToolStatus::Exited(1))
            .fail_on(Step::Certificate, ToolStatus::Exited(1))
            .fail_on(Step::RsaKey, ToolStatus::NotStarted("no such file".into()));

        let err = generate_artifacts(&runner, &request).unwrap_err();

        assert!(matches!(err, KeyboxError::Generation { failed: 3 }));
        assert!(err.to_string().contains("3 PEM files were"));
    }
}
