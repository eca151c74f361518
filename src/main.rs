//! Keybox Gen - command line front end
//!
//! ```bash
//! keybox-gen generate [--output keybox.xml | --stdout]
//! keybox-gen probe
//! keybox-gen serve --socket /tmp/keybox_socket
//! keybox-gen request --socket /tmp/keybox_socket --output keybox.xml
//! ```
//!
//! Logging goes through `env_logger`; set `RUST_LOG=debug` to see every pipeline stage.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use keybox_gen::configs::AppConfig;
use keybox_gen::external_interface;
use keybox_gen::pipeline::{GenerationRequest, KeyboxGenerator, PipelineOutput};
use keybox_gen::protocol::{Request, Response};
use keybox_gen::toolkit::{probe_toolkit, SystemToolRunner, Toolkit};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "keybox-gen", version, about = "Generate synthetic attestation keyboxes")]
struct Cli {
    /// TOML configuration file; built-in defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the pipeline once
    Generate {
        #[arg(long)]
        ec_key: Option<PathBuf>,
        #[arg(long)]
        certificate: Option<PathBuf>,
        #[arg(long)]
        rsa_key: Option<PathBuf>,
        /// Where to write the keybox
        #[arg(short, long, conflicts_with = "stdout")]
        output: Option<PathBuf>,
        /// Print the keybox instead of writing it
        #[arg(long)]
        stdout: bool,
    },
    /// Check that the openssl binary can be run
    Probe,
    /// Serve keybox requests on a Unix socket
    Serve {
        #[arg(short, long)]
        socket: Option<PathBuf>,
    },
    /// Ask a running server for a keybox
    Request {
        #[arg(short, long)]
        socket: Option<PathBuf>,
        /// Write the keybox here instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let runner = SystemToolRunner::new(Toolkit::new(
        config.toolkit.clone(),
        config.certificate.clone(),
    ));
    let generator = KeyboxGenerator::new(runner);

    match cli.command {
        Command::Generate {
            ec_key,
            certificate,
            rsa_key,
            output,
            stdout,
        } => {
            let mut request = GenerationRequest::from_output_paths(&config.output);
            if let Some(path) = ec_key {
                request.ec_private_key_path = path;
            }
            if let Some(path) = certificate {
                request.certificate_path = path;
            }
            if let Some(path) = rsa_key {
                request.rsa_private_key_path = path;
            }
            if stdout {
                request.keybox_path = None;
            } else if output.is_some() {
                request.keybox_path = output;
            }
            generate(&generator, &request)
        }
        Command::Probe => {
            let status = probe_toolkit(generator.runner());
            if status.success() {
                println!("✓ openssl is available");
                Ok(())
            } else {
                Err(anyhow!("✗ openssl is not usable ({})", status))
            }
        }
        Command::Serve { socket } => {
            let socket_path = socket.unwrap_or(config.server.socket_path);
            let request = GenerationRequest::from_output_paths(&config.output);
            let read_timeout = Duration::from_secs(config.server.read_timeout_secs);
            external_interface::start_socket_server(
                &generator,
                &request,
                &socket_path,
                read_timeout,
            )
        }
        Command::Request { socket, output } => {
            let socket_path = socket.unwrap_or(config.server.socket_path);
            request_keybox(&socket_path, output)
        }
    }
}

fn generate(generator: &KeyboxGenerator<SystemToolRunner>, request: &GenerationRequest) -> Result<()> {
    match generator.run(request) {
        Ok(PipelineOutput::Written { path, keybox }) => {
            println!(
                "✓ Keybox (DeviceID {}) written to {}",
                keybox.device_id,
                path.display()
            );
            Ok(())
        }
        Ok(PipelineOutput::Document(keybox)) => {
            print!("{}", keybox.to_xml());
            Ok(())
        }
        Err(e) => Err(anyhow!(e.to_failure_string())),
    }
}

fn request_keybox(socket_path: &std::path::Path, output: Option<PathBuf>) -> Result<()> {
    match external_interface::send_request(socket_path, &Request::GenerateKeybox)? {
        Response::KeyboxGenerated { device_id, keybox } => match output {
            Some(path) => {
                fs::write(&path, keybox)
                    .context(format!("Failed to write keybox to {}", path.display()))?;
                println!("✓ Keybox (DeviceID {}) written to {}", device_id, path.display());
                Ok(())
            }
            None => {
                print!("{}", keybox);
                Ok(())
            }
        },
        Response::Error { message, .. } => Err(anyhow!(message)),
        other => Err(anyhow!("Unexpected response from server: {:?}", other)),
    }
}
