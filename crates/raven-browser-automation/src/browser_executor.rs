use std::{
    io::{Read, Write},
    path::Path,
    process::{ChildStdin, Command, Output, Stdio},
    thread::JoinHandle,
    time::Duration,
};

use anyhow::{bail, Context, Result};
use raven_session::{BrowserCookie, SessionRecord};
use serde::{Deserialize, Serialize};
use wait_timeout::ChildExt;

use crate::error::BrowserLoginError;

pub const DEFAULT_LOGIN_URL: &str = "https://www.instagram.com/accounts/login/";
pub const DEFAULT_LOGIN_TIMEOUT_MS: u64 = 300_000;
pub const DEFAULT_SCREENSHOT_TIMEOUT_MS: u64 = 60_000;

const SCREENSHOT_FILE_NAME: &str = "capture.png";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Payload for one interactive login attempt.
pub struct BrowserLoginRequest {
    pub login_url: String,
    pub timeout_ms: u64,
}

/// Cookies and user agent reported by the browser once the user has signed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserLoginCapture {
    pub cookies: Vec<BrowserCookie>,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Payload for an authenticated page screenshot.
pub struct ScreenshotRequest {
    pub url: String,
    pub user_agent: String,
    pub cookies: Vec<BrowserCookie>,
    pub timeout_ms: u64,
}

impl ScreenshotRequest {
    pub fn for_session(url: impl Into<String>, session: &SessionRecord, timeout_ms: u64) -> Self {
        Self {
            url: url.into(),
            user_agent: session.user_agent.clone(),
            cookies: session.cookies.clone(),
            timeout_ms,
        }
    }
}

/// Drives a real browser for login and page capture.
pub trait BrowserSessionExecutor {
    fn login(
        &self,
        request: &BrowserLoginRequest,
    ) -> Result<BrowserLoginCapture, BrowserLoginError>;
    /// Best effort: any failure is `None`.
    fn capture_screenshot(&self, request: &ScreenshotRequest) -> Option<Vec<u8>>;
}

#[derive(Debug, Serialize)]
struct ScreenshotPayload<'a> {
    #[serde(flatten)]
    request: &'a ScreenshotRequest,
    output_path: &'a Path,
}

enum Invocation {
    Completed(Output),
    TimedOut,
}

#[derive(Debug)]
/// Runs an external automation CLI as `<cli> login` / `<cli> screenshot`.
///
/// The JSON request is written to the child's stdin, never to argv, since
/// screenshot requests carry session cookies.
pub struct PlaywrightCliExecutor {
    cli_path: String,
}

impl PlaywrightCliExecutor {
    pub fn new(cli_path: impl Into<String>) -> Result<Self> {
        let cli_path = cli_path.into();
        if cli_path.trim().is_empty() {
            bail!("browser automation cli path cannot be empty");
        }
        Ok(Self { cli_path })
    }

    pub fn cli_path(&self) -> &str {
        self.cli_path.trim()
    }

    fn invoke_bounded(
        &self,
        subcommand: &str,
        payload: &str,
        timeout: Duration,
    ) -> Result<Invocation> {
        let mut child = Command::new(self.cli_path())
            .arg(subcommand)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| {
                format!(
                    "failed to launch browser automation executor '{}'",
                    self.cli_path
                )
            })?;

        // Feed stdin and drain both pipes while waiting so neither side blocks on a full buffer.
        let stdin_writer = spawn_stdin_writer(child.stdin.take(), payload.as_bytes().to_vec());
        let stdout_reader = spawn_pipe_reader(child.stdout.take());
        let stderr_reader = spawn_pipe_reader(child.stderr.take());

        let status = match child
            .wait_timeout(timeout)
            .context("failed while waiting for browser automation executor")?
        {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                join_stdin_writer(stdin_writer);
                return Ok(Invocation::TimedOut);
            }
        };
        join_stdin_writer(stdin_writer);

        Ok(Invocation::Completed(Output {
            status,
            stdout: join_pipe_reader(stdout_reader),
            stderr: join_pipe_reader(stderr_reader),
        }))
    }
}

impl BrowserSessionExecutor for PlaywrightCliExecutor {
    fn login(
        &self,
        request: &BrowserLoginRequest,
    ) -> Result<BrowserLoginCapture, BrowserLoginError> {
        let payload = serde_json::to_string(request).map_err(|error| {
            BrowserLoginError::Backend(format!("failed to encode login request: {error}"))
        })?;
        tracing::info!(
            login_url = %request.login_url,
            timeout_ms = request.timeout_ms,
            "launching interactive login"
        );

        let invocation = self
            .invoke_bounded("login", &payload, Duration::from_millis(request.timeout_ms))
            .map_err(|error| BrowserLoginError::Backend(format!("{error:#}")))?;
        let output = match invocation {
            Invocation::Completed(output) => output,
            Invocation::TimedOut => {
                return Err(BrowserLoginError::LoginTimeout {
                    timeout_ms: request.timeout_ms,
                })
            }
        };
        if !output.status.success() {
            return Err(BrowserLoginError::Backend(format!(
                "browser executor subcommand 'login' failed: {}",
                failure_detail(&output)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str::<BrowserLoginCapture>(stdout.trim()).map_err(|error| {
            BrowserLoginError::InvalidCapture(format!("login output is not a capture: {error}"))
        })
    }

    fn capture_screenshot(&self, request: &ScreenshotRequest) -> Option<Vec<u8>> {
        let result = tempfile::Builder::new()
            .prefix("raven-screenshot-")
            .tempdir()
            .context("failed to create private screenshot directory")
            .and_then(|scratch| {
                // The directory is owner-only and removed when `scratch` drops.
                self.screenshot_into(request, &scratch.path().join(SCREENSHOT_FILE_NAME))
            });
        match result {
            Ok(bytes) => Some(bytes),
            Err(error) => {
                tracing::warn!(
                    url = %request.url,
                    error = %format!("{error:#}"),
                    "screenshot capture failed"
                );
                None
            }
        }
    }
}

impl PlaywrightCliExecutor {
    fn screenshot_into(
        &self,
        request: &ScreenshotRequest,
        output_path: &Path,
    ) -> Result<Vec<u8>> {
        let payload = serde_json::to_string(&ScreenshotPayload {
            request,
            output_path,
        })
        .context("serialize screenshot request payload")?;
        let output = match self.invoke_bounded(
            "screenshot",
            &payload,
            Duration::from_millis(request.timeout_ms),
        )? {
            Invocation::Completed(output) => output,
            Invocation::TimedOut => bail!("screenshot timed out after {} ms", request.timeout_ms),
        };
        if !output.status.success() {
            bail!(
                "browser executor subcommand 'screenshot' failed: {}",
                failure_detail(&output)
            );
        }
        let bytes = std::fs::read(output_path)
            .with_context(|| format!("failed to read screenshot {}", output_path.display()))?;
        if bytes.is_empty() {
            bail!("screenshot {} is empty", output_path.display());
        }
        Ok(bytes)
    }
}

fn spawn_stdin_writer(stdin: Option<ChildStdin>, payload: Vec<u8>) -> Option<JoinHandle<()>> {
    stdin.map(|mut stdin| {
        std::thread::spawn(move || {
            // A child that exits without reading closes the pipe; that is not a failure here.
            let _ = stdin.write_all(&payload);
            let _ = stdin.write_all(b"\n");
        })
    })
}

fn join_stdin_writer(writer: Option<JoinHandle<()>>) {
    if let Some(handle) = writer {
        let _ = handle.join();
    }
}

fn spawn_pipe_reader<R>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = pipe.read_to_end(&mut buffer);
            buffer
        })
    })
}

fn join_pipe_reader(reader: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

fn failure_detail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !stderr.is_empty() {
        stderr
    } else if !stdout.is_empty() {
        stdout
    } else {
        format!("exited with {}", output.status)
    }
}
