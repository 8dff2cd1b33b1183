//! The cmake instance: environment handling, subprocess spawning and
//! output supervision.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{ChildStderr, ChildStdout, Stdio};
use std::sync::mpsc;
use std::{env, fmt, mem, process, thread};

use tracing::{debug, info, warn};

use crate::command::Command;
use crate::error::{CmakeError, Result};
use crate::options::RawArgs;

/// Stderr lines starting with this marker dispatch to
/// [`Worker::on_error`]; every other stderr line is a warning.
const ERROR_MARKER: &str = "CMake Error:";

const PATH_LIST_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerId(u32);

impl WorkerId {
    pub fn random() -> Self {
        Self(rand::random_range(1..=999))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A listener receiving events during a cmake invocation.
///
/// Line callbacks receive every line captured so far on that stream along
/// with the current one. Lines arrive in the order the child produced them,
/// and [`on_exit`](Self::on_exit) fires strictly after the last line, all
/// on the single background reader.
pub trait Worker: Send {
    fn id(&self) -> WorkerId;

    /// A line of the child's stdout.
    fn on_output(&mut self, lines: &[String], current: &str);

    /// A stderr line carrying the cmake error marker.
    fn on_error(&mut self, _lines: &[String], _current: &str) {}

    /// Any other stderr line.
    fn on_warning(&mut self, _lines: &[String], _current: &str) {}

    /// The child's exit code, after all output has been forwarded.
    fn on_exit(&mut self, code: i32);
}

/// An instance of cmake.
///
/// Workers, environment overrides and extra search paths are scoped to a
/// single call: [`invoke`](Self::invoke) clears all three on every exit,
/// success or failure.
pub struct CMake {
    executable: PathBuf,
    version: String,
    base_environ: BTreeMap<String, String>,

    scope_workers: Vec<Box<dyn Worker>>,
    scope_environ: BTreeMap<String, String>,
    scope_paths: Vec<PathBuf>,
}

impl CMake {
    /// Wraps an already-resolved executable. The process environment is
    /// captured here and reused as the base for every invocation.
    pub fn new(executable: PathBuf, version: String) -> Self {
        Self {
            executable,
            version,
            base_environ: env::vars().collect(),
            scope_workers: Vec::new(),
            scope_environ: BTreeMap::new(),
            scope_paths: Vec::new(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Registers a listener for the next invocation. Registering a worker
    /// whose id is already present is a no-op.
    pub fn register_worker(&mut self, worker: Box<dyn Worker>) -> &mut Self {
        let id = worker.id();
        if self.scope_workers.iter().any(|known| known.id() == id) {
            warn!("worker (id {id}) already registered");
            return self;
        }
        debug!("registering a new worker (id {id})");
        self.scope_workers.push(worker);
        self
    }

    /// Adds environment overrides for the next invocation.
    ///
    /// Fails with [`CmakeError::ForbiddenOverride`] if any key is `PATH` in
    /// any letter case, without registering anything from the batch.
    pub fn add_env_overrides<I, K, V>(&mut self, vars: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: Vec<(String, String)> = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        if let Some((key, _)) = vars.iter().find(|(key, _)| key.eq_ignore_ascii_case("PATH")) {
            return Err(CmakeError::ForbiddenOverride(key.clone()));
        }
        self.scope_environ.extend(vars);
        Ok(self)
    }

    /// Appends directories to the `PATH` seen by the next invocation.
    ///
    /// Candidates that do not name an existing directory are dropped, and
    /// candidates already registered (compared case-insensitively) are
    /// skipped.
    pub fn add_search_paths<I, P>(&mut self, paths: I) -> &mut Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        for path in paths {
            let path = path.into();
            if !path.is_dir() {
                debug!("dropping search path {}: not a directory", path.display());
                continue;
            }
            let lowered = path.display().to_string().to_lowercase();
            let known = self
                .scope_paths
                .iter()
                .any(|existing| existing.display().to_string().to_lowercase() == lowered);
            if !known {
                self.scope_paths.push(path);
            }
        }
        self
    }

    /// Invokes the executable with `command`'s compiled arguments followed
    /// by `raw` passthrough arguments, blocking until the child and its
    /// output reader have both finished.
    ///
    /// The child's exit code is delivered to workers via
    /// [`Worker::on_exit`], never turned into an error here. Stdout is
    /// forwarded line-by-line as it arrives; stderr is drained after stdout
    /// reaches end-of-stream, so a child that fills the stderr pipe buffer
    /// while stdout is still open can stall the invocation.
    pub fn invoke(&mut self, command: &Command, raw: &RawArgs) -> Result<&mut Self> {
        let outcome = self.run(command, raw);
        self.clear_scope();
        outcome?;
        Ok(self)
    }

    fn run(&mut self, command: &Command, raw: &RawArgs) -> Result<()> {
        debug!("validating arguments");
        command.validate()?;

        let mut args = command.compile()?;
        args.extend(raw.iter().cloned());
        let environ = self.merged_environment();

        info!(
            command = command.name(),
            "invoking {} with arguments {args:?}",
            self.executable.display()
        );
        let mut child = process::Command::new(&self.executable)
            .args(&args)
            .env_clear()
            .envs(&environ)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let workers = mem::take(&mut self.scope_workers);
        let (code_tx, code_rx) = mpsc::channel();

        let pump_name = format!("cmkit output pump #{}", rand::random_range(1..=99));
        debug!("starting {pump_name} and waiting for the executable to finish");
        let pump = thread::Builder::new()
            .name(pump_name)
            .spawn(move || pump_output(stdout, stderr, workers, code_rx))?;

        let status = child.wait()?;
        let code = status.code().unwrap_or(-1);
        let _ = code_tx.send(code);
        if pump.join().is_err() {
            warn!("output pump terminated abnormally");
        }

        debug!("process ended with code {code}");
        Ok(())
    }

    fn clear_scope(&mut self) {
        debug!("cleaning workers, environ and paths");
        self.scope_workers.clear();
        self.scope_environ.clear();
        self.scope_paths.clear();
    }

    /// Base environment with scoped overrides applied and scoped search
    /// paths appended to `PATH` (matched case-insensitively, as on
    /// Windows).
    fn merged_environment(&self) -> BTreeMap<String, String> {
        let mut environ = self.base_environ.clone();
        for (key, value) in &self.scope_environ {
            environ.insert(key.clone(), value.clone());
        }

        if !self.scope_paths.is_empty() {
            let key = environ
                .keys()
                .find(|key| key.eq_ignore_ascii_case("PATH"))
                .cloned()
                .unwrap_or_else(|| "PATH".to_string());
            let extra = self
                .scope_paths
                .iter()
                .map(|path| path.display().to_string())
                .collect::<Vec<_>>()
                .join(&PATH_LIST_SEPARATOR.to_string());
            let current = environ.get(&key).cloned().unwrap_or_default();
            let appended = if current.is_empty() {
                extra
            } else {
                format!("{current}{PATH_LIST_SEPARATOR}{extra}")
            };
            environ.insert(key, appended);
        }

        environ
    }
}

/// Drains the child's output and dispatches it to the workers.
///
/// Runs on the one background reader per invocation: stdout line-by-line
/// until end-of-stream, then stderr with error/warning classification, then
/// the exit code received from the foreground.
fn pump_output(
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    mut workers: Vec<Box<dyn Worker>>,
    code_rx: mpsc::Receiver<i32>,
) {
    debug!("listening output");

    let mut out_lines: Vec<String> = Vec::new();
    if let Some(stdout) = stdout {
        for line in BufReader::new(stdout).lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!("stdout read failed: {err}");
                    break;
                }
            };
            debug!("{line}");
            out_lines.push(line.clone());
            for worker in workers.iter_mut() {
                worker.on_output(&out_lines, &line);
            }
        }
    }

    let mut err_lines: Vec<String> = Vec::new();
    if let Some(stderr) = stderr {
        for line in BufReader::new(stderr).lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!("stderr read failed: {err}");
                    break;
                }
            };
            debug!("{line}");
            err_lines.push(line.clone());
            for worker in workers.iter_mut() {
                if line.starts_with(ERROR_MARKER) {
                    worker.on_error(&err_lines, &line);
                } else {
                    worker.on_warning(&err_lines, &line);
                }
            }
        }
    }

    let code = code_rx.recv().unwrap_or(-1);
    debug!("forwarding exit code {code} to {} workers", workers.len());
    for worker in workers.iter_mut() {
        worker.on_exit(code);
    }
}
