//! External Toolkit Module
//!
//! Every call into openssl or ssh-keygen is described by a typed [`ToolCommand`],
//! rendered into a [`ToolInvocation`] (program plus argument list) and executed by a
//! [`ToolRunner`]. The pipeline only ever looks at the exit status; stdout and stderr
//! go straight to the operator's terminal.

use crate::configs::{CertificateSettings, ToolkitSettings};
use log::info;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// One of the toolkit operations the pipeline knows how to ask for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCommand {
    /// `openssl ecparam -genkey` writing an EC private key
    GenerateEcKey(PathBuf),
    /// `openssl req -x509` self-signing a certificate for an existing EC key
    SelfSignCertificate { key: PathBuf, out: PathBuf },
    /// `openssl genrsa` writing an RSA private key
    GenerateRsaKey(PathBuf),
    /// `openssl rsa -traditional`, rewriting a PKCS#8 key as PKCS#1 in place
    ConvertPkcs8ToTraditional(PathBuf),
    /// `ssh-keygen -p -m PEM`, rewriting an OpenSSH key as PEM in place
    ConvertOpenSshToPem(PathBuf),
    /// `openssl version`
    ToolkitVersion,
}

/// A concrete process to spawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// How a toolkit process ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
    Exited(i32),
    /// Killed by a signal, no exit code
    Terminated,
    /// The process could not be spawned at all
    NotStarted(String),
}

impl ToolStatus {
    pub fn success(&self) -> bool {
        matches!(self, ToolStatus::Exited(0))
    }
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolStatus::Exited(code) => write!(f, "exit status {}", code),
            ToolStatus::Terminated => f.write_str("terminated by signal"),
            ToolStatus::NotStarted(reason) => write!(f, "not started: {}", reason),
        }
    }
}

/// Capability to run one toolkit command to completion
pub trait ToolRunner {
    fn run(&self, command: &ToolCommand) -> ToolStatus;
}

impl<R: ToolRunner + ?Sized> ToolRunner for &R {
    fn run(&self, command: &ToolCommand) -> ToolStatus {
        (**self).run(command)
    }
}

/// Renders [`ToolCommand`]s into command lines for the configured binaries
#[derive(Debug, Clone)]
pub struct Toolkit {
    pub settings: ToolkitSettings,
    pub certificate: CertificateSettings,
}

impl Toolkit {
    pub fn new(settings: ToolkitSettings, certificate: CertificateSettings) -> Self {
        Self {
            settings,
            certificate,
        }
    }

    pub fn invocation(&self, command: &ToolCommand) -> ToolInvocation {
        let openssl = |args: Vec<String>| ToolInvocation {
            program: self.settings.openssl.clone(),
            args,
        };
        match command {
            ToolCommand::GenerateEcKey(out) => openssl(vec![
                "ecparam".into(),
                "-name".into(),
                self.certificate.curve.clone(),
                "-genkey".into(),
                "-noout".into(),
                "-out".into(),
                path_arg(out),
            ]),
            ToolCommand::SelfSignCertificate { key, out } => openssl(vec![
                "req".into(),
                "-new".into(),
                "-x509".into(),
                "-key".into(),
                path_arg(key),
                "-out".into(),
                path_arg(out),
                "-days".into(),
                self.certificate.validity_days.to_string(),
                "-subj".into(),
                self.certificate.subject.clone(),
            ]),
            ToolCommand::GenerateRsaKey(out) => openssl(vec![
                "genrsa".into(),
                "-out".into(),
                path_arg(out),
                self.certificate.rsa_bits.to_string(),
            ]),
            ToolCommand::ConvertPkcs8ToTraditional(key) => openssl(vec![
                "rsa".into(),
                "-in".into(),
                path_arg(key),
                "-out".into(),
                path_arg(key),
                "-traditional".into(),
            ]),
            ToolCommand::ConvertOpenSshToPem(key) => ToolInvocation {
                program: self.settings.ssh_keygen.clone(),
                args: vec![
                    "-p".into(),
                    "-m".into(),
                    "PEM".into(),
                    "-f".into(),
                    path_arg(key),
                    "-N".into(),
                    String::new(),
                ],
            },
            ToolCommand::ToolkitVersion => openssl(vec!["version".into()]),
        }
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Runs commands as child processes, inheriting stdio
#[derive(Debug, Clone)]
pub struct SystemToolRunner {
    toolkit: Toolkit,
}

impl SystemToolRunner {
    pub fn new(toolkit: Toolkit) -> Self {
        Self { toolkit }
    }
}

impl ToolRunner for SystemToolRunner {
    fn run(&self, command: &ToolCommand) -> ToolStatus {
        let invocation = self.toolkit.invocation(command);
        info!("$ {}", invocation);

        match Command::new(&invocation.program)
            .args(&invocation.args)
            .status()
        {
            Ok(status) => match status.code() {
                Some(code) => ToolStatus::Exited(code),
                None => ToolStatus::Terminated,
            },
            Err(e) => ToolStatus::NotStarted(e.to_string()),
        }
    }
}

/// Check that the toolkit binary answers `openssl version`.
pub fn probe_toolkit<R: ToolRunner>(runner: &R) -> ToolStatus {
    runner.run(&ToolCommand::ToolkitVersion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::AppConfig;

    fn toolkit() -> Toolkit {
        let config = AppConfig::default();
        Toolkit::new(config.toolkit, config.certificate)
    }

    #[test]
    fn test_ec_key_command_line() {
        let inv = toolkit().invocation(&ToolCommand::GenerateEcKey(PathBuf::from("ec.pem")));
        assert_eq!(inv.program, "openssl");
        assert_eq!(
            inv.args,
            ["ecparam", "-name", "prime256v1", "-genkey", "-noout", "-out", "ec.pem"]
        );
    }

    #[test]
    fn test_certificate_command_line() {
        let inv = toolkit().invocation(&ToolCommand::SelfSignCertificate {
            key: PathBuf::from("ec.pem"),
            out: PathBuf::from("cert.pem"),
        });
        assert_eq!(
            inv.to_string(),
            "openssl req -new -x509 -key ec.pem -out cert.pem -days 3650 -subj /CN=Keybox"
        );
    }

    #[test]
    fn test_rsa_conversion_rewrites_in_place() {
        let inv = toolkit().invocation(&ToolCommand::ConvertPkcs8ToTraditional(PathBuf::from(
            "rsa.pem",
        )));
        assert_eq!(inv.args, ["rsa", "-in", "rsa.pem", "-out", "rsa.pem", "-traditional"]);
    }

    #[test]
    fn test_ssh_keygen_gets_empty_passphrase() {
        let inv = toolkit().invocation(&ToolCommand::ConvertOpenSshToPem(PathBuf::from(
            "my key.pem",
        )));
        assert_eq!(inv.program, "ssh-keygen");
        assert_eq!(inv.args.last().map(String::as_str), Some(""));
        assert_eq!(inv.to_string(), "ssh-keygen -p -m PEM -f \"my key.pem\" -N \"\"");
    }

    #[test]
    fn test_missing_binary_is_not_success() {
        let mut toolkit = toolkit();
        toolkit.settings.openssl = "/nonexistent/openssl-binary".to_string();
        let runner = SystemToolRunner::new(toolkit);
        let status = probe_toolkit(&runner);
        assert!(matches!(status, ToolStatus::NotStarted(_)));
        assert!(!status.success());
    }

    #[test]
    fn test_status_success_only_on_zero() {
        assert!(ToolStatus::Exited(0).success());
        assert!(!ToolStatus::Exited(1).success());
        assert!(!ToolStatus::Terminated.success());
    }
}
