/*
 * analyzer.rs
 * Part of the gammon-knight project
 * Created Date: Friday, February 28th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Tue Jul 15 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

//! Driver for the external GNU Backgammon CLI.
//!
//! Each analysis writes a deterministic command script to a temp file
//! and invokes `gnubg -t -c <script>`, capturing combined
//! stdout/stderr. Workers never share state beyond the executable on
//! disk: concurrent analyses are separate subprocesses with their own
//! script files, which makes the fan-out a bounded process pool rather
//! than shared-memory threading.

use std::{
    cmp,
    io::{Read, Write},
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Stdio},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use backgammon::{decision::DecisionKind, gnuid::decode_gnuid, xgid::decode_xgid};
use log::{debug, warn};
use rayon::prelude::*;
use regex::Regex;
use thiserror::Error;
use wait_timeout::ChildExt;

/// Upper bound on concurrent analyzer subprocesses.
pub const MAX_WORKERS: usize = 8;
/// Parallel dispatch is not worth the pool below this batch size.
const SERIAL_CUTOFF: usize = 2;

const HINT_TIMEOUT: Duration = Duration::from_secs(120);
const MATCH_TIMEOUT: Duration = Duration::from_secs(600);
/// Granularity of the wait loop; bounds cancellation latency.
const WAIT_SLICE: Duration = Duration::from_millis(100);

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("failed to launch analyzer `{}`: {source}", path.display())]
    SpawnFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("analyzer timed out after {}s", timeout.as_secs())]
    Timeout { timeout: Duration },
    #[error("analyzer exited with {status}: {detail}")]
    NonZeroExit { status: ExitStatus, detail: String },
    #[error("analysis cancelled")]
    Cancelled,
    #[error("i/o failure while driving the analyzer: {0}")]
    Io(std::io::Error),
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
    #[error("match export produced no analyzed games: {0}")]
    ExportFailed(String),
    #[error("analysis of input {index} ({id}) failed: {source}")]
    Task {
        index: usize,
        id: String,
        #[source]
        source: Box<AnalyzerError>,
    },
}

/// Cooperative cancellation handle for a batch. Cancelling abandons
/// queued tasks, terminates in-flight subprocesses and discards any
/// results already collected.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Raw analyzer output paired with the decision kind the input id
/// implied.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub output: String,
    pub kind: DecisionKind,
}

/// Per-game text exports of a full-match analysis. The files live in
/// the carried temp directory and disappear with it.
#[derive(Debug)]
pub struct MatchExport {
    pub temp_dir: tempfile::TempDir,
    pub game_files: Vec<PathBuf>,
}

pub struct Analyzer {
    executable: PathBuf,
    plies: u8,
    hint_timeout: Duration,
    match_timeout: Duration,
}

impl Analyzer {
    pub fn new(executable: impl Into<PathBuf>, plies: u8) -> Result<Self, AnalyzerError> {
        let executable = executable.into();
        if !executable.exists() {
            return Err(AnalyzerError::SpawnFailed {
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
                path: executable,
            });
        }
        Ok(Analyzer {
            executable,
            plies,
            hint_timeout: HINT_TIMEOUT,
            match_timeout: MATCH_TIMEOUT,
        })
    }

    /// Overrides the per-hint timeout; tests use very small values.
    pub fn with_hint_timeout(mut self, timeout: Duration) -> Self {
        self.hint_timeout = timeout;
        self
    }

    /// Classifies a position id by its metadata: rolled dice mean a
    /// checker play, otherwise the decision is about the cube.
    pub fn classify(position_id: &str) -> DecisionKind {
        if let Ok((_, info)) = decode_xgid(position_id) {
            return if info.dice.is_some() {
                DecisionKind::CheckerPlay
            } else {
                DecisionKind::CubeAction
            };
        }
        if let Ok((_, info)) = decode_gnuid(position_id) {
            return if info.dice.is_some() {
                DecisionKind::CheckerPlay
            } else {
                DecisionKind::CubeAction
            };
        }
        DecisionKind::CubeAction
    }

    /// Analyzes one position id (XGID or GNUID).
    pub fn analyze_position(&self, position_id: &str) -> Result<Analysis, AnalyzerError> {
        self.analyze_with_cancel(position_id, None)
    }

    fn analyze_with_cancel(
        &self,
        position_id: &str,
        cancel: Option<&CancelToken>,
    ) -> Result<Analysis, AnalyzerError> {
        let kind = Self::classify(position_id);
        let script = self.hint_script(position_id);
        let output = self.run_script(&script, self.hint_timeout, cancel)?;
        Ok(Analysis { output, kind })
    }

    /// Analyzes a batch of position ids on a bounded process pool.
    ///
    /// Results come back in input order regardless of completion order.
    /// The progress callback fires once per completed task, serialized
    /// on an internal lock. Any task failure fails the whole batch with
    /// the offending input named; cancellation terminates in-flight
    /// subprocesses and returns [`AnalyzerError::Cancelled`].
    pub fn analyze_batch(
        &self,
        position_ids: &[String],
        progress: Option<&(dyn Fn(usize, usize) + Sync)>,
        cancel: Option<&CancelToken>,
    ) -> Result<Vec<Analysis>, AnalyzerError> {
        if position_ids.is_empty() {
            return Ok(Vec::new());
        }
        let total = position_ids.len();
        let completed = AtomicUsize::new(0);
        let progress_gate = Mutex::new(());
        let report = |_guard: &Mutex<()>| {
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(callback) = progress {
                let _lock = _guard.lock();
                callback(done, total);
            }
        };

        if total <= SERIAL_CUTOFF {
            let mut results = Vec::with_capacity(total);
            for (index, id) in position_ids.iter().enumerate() {
                if cancel.is_some_and(CancelToken::is_cancelled) {
                    return Err(AnalyzerError::Cancelled);
                }
                let analysis = self
                    .analyze_with_cancel(id, cancel)
                    .map_err(|error| wrap_task_error(error, index, id))?;
                results.push(analysis);
                report(&progress_gate);
            }
            return Ok(results);
        }

        let workers = cmp::min(num_cpus::get(), MAX_WORKERS);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| AnalyzerError::WorkerPool(e.to_string()))?;
        debug!("analyzing {total} positions on {workers} workers");

        // Once one task fails, queued tasks bail out instead of
        // spawning more subprocesses.
        let abandon = CancelToken::new();
        let outcomes: Vec<Result<Analysis, AnalyzerError>> = pool.install(|| {
            position_ids
                .par_iter()
                .enumerate()
                .map(|(index, id)| {
                    if cancel.is_some_and(CancelToken::is_cancelled) || abandon.is_cancelled() {
                        return Err(AnalyzerError::Cancelled);
                    }
                    let result = self.analyze_with_cancel(id, cancel);
                    match result {
                        Ok(analysis) => {
                            report(&progress_gate);
                            Ok(analysis)
                        }
                        Err(error) => {
                            abandon.cancel();
                            Err(wrap_task_error(error, index, id))
                        }
                    }
                })
                .collect()
        });

        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(AnalyzerError::Cancelled);
        }
        // Surface the first real failure in input order; abandoned
        // tasks only carry placeholder cancellations.
        let mut results = Vec::with_capacity(total);
        let mut abandoned = false;
        let mut first_failure: Option<AnalyzerError> = None;
        for outcome in outcomes {
            match outcome {
                Ok(analysis) => results.push(analysis),
                Err(AnalyzerError::Cancelled) => abandoned = true,
                Err(error) => {
                    if first_failure.is_none() {
                        first_failure = Some(error);
                    }
                }
            }
        }
        if let Some(error) = first_failure {
            return Err(error);
        }
        if abandoned {
            return Err(AnalyzerError::Cancelled);
        }
        Ok(results)
    }

    /// Runs a full-match analysis: import the transcript, analyse every
    /// decision, export per-game text files. Uses the long timeout.
    pub fn analyze_match_file(
        &self,
        match_file: &Path,
        max_moves: u32,
    ) -> Result<MatchExport, AnalyzerError> {
        let temp_dir = tempfile::Builder::new()
            .prefix("gnubg-match-")
            .tempdir()
            .map_err(AnalyzerError::Io)?;
        let output_base = temp_dir.path().join("analyzed_match.txt");

        let commands = [
            "set automatic game off".to_string(),
            "set automatic roll off".to_string(),
            format!("set analysis chequerplay evaluation plies {}", self.plies),
            format!("set analysis cubedecision evaluation plies {}", self.plies),
            format!("set export moves number {max_moves}"),
            format!("import mat {}", quoted(match_file)),
            "analyse match".to_string(),
            format!("export match text {}", quoted(&output_base)),
        ]
        .join("\n")
            + "\n";

        self.run_script(&commands, self.match_timeout, None)?;

        let mut game_files = Vec::new();
        if output_base.exists() {
            game_files.push(output_base.clone());
        }
        let mut game_number = 2;
        loop {
            let next = temp_dir
                .path()
                .join(format!("analyzed_match_{game_number:03}.txt"));
            if !next.exists() {
                break;
            }
            game_files.push(next);
            game_number += 1;
        }
        if game_files.is_empty() {
            return Err(AnalyzerError::ExportFailed(
                "no export files were created".to_string(),
            ));
        }

        // The export succeeds even when `analyse match` silently did
        // nothing; require at least one per-move error marker.
        let marker = Regex::new(r"Rolled \d\d \([+-]?\d+\.\d+\):").map_err(|e| {
            AnalyzerError::ExportFailed(e.to_string())
        })?;
        let preview = read_prefix(&game_files[0], 5000).map_err(AnalyzerError::Io)?;
        if !marker.is_match(&preview) {
            warn!("match export is missing analysis markers");
            return Err(AnalyzerError::ExportFailed(
                "exported games contain no analysis".to_string(),
            ));
        }

        Ok(MatchExport {
            temp_dir,
            game_files,
        })
    }

    /// The deterministic hint script for one position id.
    pub(crate) fn hint_script(&self, position_id: &str) -> String {
        let set_command = if decode_xgid(position_id).is_ok() {
            let body = position_id.trim();
            let body = body.strip_prefix("XGID=").unwrap_or(body);
            format!("set xgid XGID={body}")
        } else {
            format!("set gnubgid {}", position_id.trim())
        };
        [
            "set automatic game off".to_string(),
            "set automatic roll off".to_string(),
            set_command,
            format!("set analysis chequerplay evaluation plies {}", self.plies),
            format!("set analysis cubedecision evaluation plies {}", self.plies),
            "set output matchpc off".to_string(),
            "hint".to_string(),
        ]
        .join("\n")
            + "\n"
    }

    /// Writes the command script to a temp file, runs the analyzer on
    /// it and returns combined stdout/stderr. The script file is
    /// removed on every exit path.
    fn run_script(
        &self,
        commands: &str,
        timeout: Duration,
        cancel: Option<&CancelToken>,
    ) -> Result<String, AnalyzerError> {
        let mut script = tempfile::Builder::new()
            .prefix("gnubg-commands-")
            .suffix(".txt")
            .tempfile()
            .map_err(AnalyzerError::Io)?;
        script
            .write_all(commands.as_bytes())
            .map_err(AnalyzerError::Io)?;
        script.flush().map_err(AnalyzerError::Io)?;

        let mut child = Command::new(&self.executable)
            .arg("-t")
            .arg("-c")
            .arg(script.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| AnalyzerError::SpawnFailed {
                path: self.executable.clone(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_reader = std::thread::spawn(move || read_all(stdout));
        let stderr_reader = std::thread::spawn(move || read_all(stderr));

        let start = Instant::now();
        let status = loop {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AnalyzerError::Cancelled);
            }
            let Some(remaining) = timeout.checked_sub(start.elapsed()) else {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AnalyzerError::Timeout { timeout });
            };
            match child
                .wait_timeout(remaining.min(WAIT_SLICE))
                .map_err(AnalyzerError::Io)?
            {
                Some(status) => break status,
                None => continue,
            }
        };

        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();
        let mut output = stdout;
        if !stderr.is_empty() {
            output.push('\n');
            output.push_str(&stderr);
        }

        if !status.success() {
            let detail: String = output.chars().take(500).collect();
            return Err(AnalyzerError::NonZeroExit { status, detail });
        }
        Ok(output)
    }
}

fn wrap_task_error(error: AnalyzerError, index: usize, id: &str) -> AnalyzerError {
    match error {
        AnalyzerError::Cancelled => AnalyzerError::Cancelled,
        other => AnalyzerError::Task {
            index,
            id: id.to_string(),
            source: Box::new(other),
        },
    }
}

fn read_all(stream: Option<impl Read>) -> String {
    let mut buffer = String::new();
    if let Some(mut stream) = stream {
        let _ = stream.read_to_string(&mut buffer);
    }
    buffer
}

fn read_prefix(path: &Path, limit: usize) -> std::io::Result<String> {
    let content = std::fs::read_to_string(path)?;
    Ok(content.chars().take(limit).collect())
}

fn quoted(path: &Path) -> String {
    let text = path.display().to_string();
    if text.contains(' ') {
        format!("\"{text}\"")
    } else {
        text
    }
}
