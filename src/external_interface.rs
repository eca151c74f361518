//! External Interface Module
//!
//! Provides Unix socket-based IPC so other front ends (chat bots, web hooks) can ask for
//! keyboxes without linking the crate. Connections are served one at a time, which
//! keeps runs on the configured PEM paths from overwriting each other.

use crate::error::KeyboxError;
use crate::pipeline::{GenerationRequest, KeyboxGenerator};
use crate::protocol::{read_frame, write_frame, Request, Response};
use crate::toolkit::{probe_toolkit, ToolRunner};
use anyhow::{Context, Result};
use log::{error, info, warn};
use std::fs;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::time::Duration;

/// Bind the socket at `socket_path` and serve requests until the listener fails.
///
/// # Arguments
/// * `generator` - Pipeline used for every `GenerateKeybox` request
/// * `request` - PEM paths to generate into; the document is always returned, not written
/// * `socket_path` - Where to bind; a stale socket file is removed first
/// * `read_timeout` - How long a client may take to send its request
pub fn start_socket_server<R: ToolRunner>(
    generator: &KeyboxGenerator<R>,
    request: &GenerationRequest,
    socket_path: &Path,
    read_timeout: Duration,
) -> Result<()> {
    let listener = bind(socket_path)?;

    println!("✓ Unix socket server started at {}", socket_path.display());
    println!("  Listening for keybox requests...\n");

    serve(&listener, generator, request, read_timeout)
}

/// Remove any stale socket file and bind a fresh listener.
pub fn bind(socket_path: &Path) -> Result<UnixListener> {
    if socket_path.exists() {
        fs::remove_file(socket_path).context(format!(
            "Failed to remove existing socket at {}",
            socket_path.display()
        ))?;
    }

    UnixListener::bind(socket_path).context(format!(
        "Failed to bind Unix socket at {}",
        socket_path.display()
    ))
}

/// Accept connections forever, handling each to completion before the next.
pub fn serve<R: ToolRunner>(
    listener: &UnixListener,
    generator: &KeyboxGenerator<R>,
    request: &GenerationRequest,
    read_timeout: Duration,
) -> Result<()> {
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                if let Err(e) = handle_client(stream, generator, request, read_timeout) {
                    error!("Error handling client request: {:#}", e);
                }
            }
            Err(e) => {
                warn!("Error accepting connection: {}", e);
            }
        }
    }

    Ok(())
}

/// Handle an individual client connection
pub fn handle_client<R: ToolRunner>(
    mut stream: UnixStream,
    generator: &KeyboxGenerator<R>,
    request: &GenerationRequest,
    read_timeout: Duration,
) -> Result<()> {
    stream
        .set_read_timeout(Some(read_timeout))
        .context("Failed to set client read timeout")?;
    let incoming: Request = read_frame(&mut stream).context("Failed to read client request")?;
    info!("Received request: {:?}", incoming);

    let response = match incoming {
        Request::GenerateKeybox => handle_generate(generator, request),
        Request::ProbeToolkit => handle_probe(generator.runner()),
        Request::SocketTest => Response::SocketTestResponse {
            message: "Socket is working".to_string(),
        },
    };

    write_frame(&mut stream, &response).context("Failed to send response")?;
    Ok(())
}

fn handle_generate<R: ToolRunner>(
    generator: &KeyboxGenerator<R>,
    request: &GenerationRequest,
) -> Response {
    // the document travels back over the socket, never to the server's disk
    let request = request.clone().with_keybox_path(None);
    match generator.generate(&request) {
        Ok(keybox) => Response::KeyboxGenerated {
            device_id: keybox.device_id.to_string(),
            keybox: keybox.to_xml(),
        },
        Err(e) => error_response(&e),
    }
}

fn handle_probe<R: ToolRunner>(runner: &R) -> Response {
    let status = probe_toolkit(runner);
    Response::ToolkitStatus {
        available: status.success(),
        message: format!("openssl version: {}", status),
    }
}

fn error_response(err: &KeyboxError) -> Response {
    warn!("Keybox generation failed while {}: {}", err.stage(), err);
    Response::Error {
        stage: err.stage(),
        message: err.to_failure_string(),
    }
}

/// Send one request to a running server and wait for its response.
pub fn send_request(socket_path: &Path, request: &Request) -> Result<Response> {
    let mut stream = UnixStream::connect(socket_path).context(format!(
        "Failed to connect to keybox server at {}",
        socket_path.display()
    ))?;
    write_frame(&mut stream, request)?;
    read_frame(&mut stream).context("Failed to read server response")
}
