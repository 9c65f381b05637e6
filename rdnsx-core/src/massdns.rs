//! External mass-resolver child-process driver (§4.3).
//!
//! Grounded on `pkg/massdns/linereader.go` (the rate-governor formula and its fixed
//! 100ms pacing sleep), `runner.go` (exact CLI argument template), and `resolver.go`.
//! Fully synchronous, like the donor: callers on the async orchestrator run it
//! through `tokio::task::spawn_blocking`.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::{PipelineError, Result, Stage};

/// Paces line emission to at most `rate` lines/second, tracking a running count of
/// lines emitted so the caller can sample progress mid-run. `rate == 0` means
/// unlimited.
pub struct LineRateGovernor {
    rate: f64,
    start: Mutex<Option<Instant>>,
    count: AtomicU32,
}

impl LineRateGovernor {
    pub fn new(rate: u32) -> Arc<Self> {
        Arc::new(Self {
            rate: rate as f64,
            start: Mutex::new(None),
            count: AtomicU32::new(0),
        })
    }

    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    /// `⌊rate × (elapsed_since_first_call + 1s)⌋ − lines_already_emitted`, clamped
    /// to `i64::MAX` when unlimited.
    fn can_send(&self) -> i64 {
        if self.rate == 0.0 {
            return i64::MAX;
        }
        let mut start = self.start.lock();
        let started = *start.get_or_insert_with(Instant::now);
        let elapsed = started.elapsed().as_secs_f64();
        (self.rate * (elapsed + 1.0)) as i64 - self.count.load(Ordering::Relaxed) as i64
    }
}

/// Copies lines from `reader` to `writer` under `governor`'s pacing. A fixed
/// 100ms sleep follows every read cycle while rate-limited, regardless of how
/// many lines that cycle emitted (`linereader.go`'s `Read`).
fn pump(reader: &mut dyn BufRead, writer: &mut dyn Write, governor: &LineRateGovernor) -> io::Result<()> {
    loop {
        let mut allowed = governor.can_send();

        while allowed > 0 {
            let mut line = String::new();
            let bytes = reader.read_line(&mut line)?;
            if bytes == 0 {
                writer.flush()?;
                return Ok(());
            }
            writer.write_all(line.as_bytes())?;
            if line.ends_with('\n') {
                governor.count.fetch_add(1, Ordering::Relaxed);
            }
            allowed -= 1;
        }

        if governor.rate > 0.0 {
            std::thread::sleep(Duration::from_millis(100));
        }
    }
}

/// Drives the external resolver binary against one candidate stream, mirroring
/// `runner.go`'s invocation exactly.
pub struct MassResolver {
    bin_path: std::path::PathBuf,
}

impl MassResolver {
    pub fn new(bin_path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            bin_path: bin_path.into(),
        }
    }

    fn args(resolvers_path: &Path, out_path: &Path, qps: u32) -> Vec<String> {
        let mut args = vec![
            "-q".to_string(),
            "-r".to_string(),
            resolvers_path.display().to_string(),
            "-o".to_string(),
            "Snl".to_string(),
            "-t".to_string(),
            "A".to_string(),
            "--root".to_string(),
            "--retry".to_string(),
            "REFUSED".to_string(),
            "--retry".to_string(),
            "SERVFAIL".to_string(),
            "-w".to_string(),
            out_path.display().to_string(),
        ];
        if qps > 0 {
            args.push("-s".to_string());
            args.push(qps.to_string());
        }
        args
    }

    fn spawn(&self, resolvers_path: &Path, out_path: &Path, qps: u32, stage: Stage) -> Result<Child> {
        Command::new(&self.bin_path)
            .args(Self::args(resolvers_path, out_path, qps))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| PipelineError::stage(stage, e))
    }

    /// Runs one full resolve pass: spawns the binary, feeds `reader` to its stdin
    /// under a line-rate governor, and waits for it to exit. Returns the governor
    /// so the caller can read the final emitted-line count.
    pub fn resolve(
        &self,
        mut reader: Box<dyn BufRead + Send>,
        resolvers_path: &Path,
        out_path: &Path,
        qps: u32,
        stage: Stage,
    ) -> Result<Arc<LineRateGovernor>> {
        let mut child = self.spawn(resolvers_path, out_path, qps, stage)?;
        let mut stdin = child.stdin.take().expect("stdin was piped at spawn");
        let governor = LineRateGovernor::new(qps);

        let pump_result = pump(&mut *reader, &mut stdin, &governor);
        drop(stdin);
        pump_result.map_err(|e| PipelineError::stage(stage, e))?;

        let status = child.wait().map_err(|e| PipelineError::stage(stage, e))?;
        if !status.success() {
            return Err(PipelineError::stage(
                stage,
                io::Error::other(format!(
                    "{} exited with {status}",
                    self.bin_path.display()
                )),
            ));
        }

        Ok(governor)
    }
}

/// Verifies the resolver binary is present and runnable (`requirementchecker.go`).
pub fn check_binary(bin_path: &Path) -> Result<()> {
    match Command::new(bin_path)
        .arg("--help")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(PipelineError::precondition_failed(
            bin_path,
            format!("exited with {status}"),
        )),
        Err(e) => Err(PipelineError::precondition_failed(bin_path, e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn args_include_sampling_flag_only_when_qps_is_positive() {
        let unlimited = MassResolver::args(Path::new("r.txt"), Path::new("out.txt"), 0);
        assert!(!unlimited.iter().any(|a| a == "-s"));

        let limited = MassResolver::args(Path::new("r.txt"), Path::new("out.txt"), 50);
        let pos = limited.iter().position(|a| a == "-s").unwrap();
        assert_eq!(limited[pos + 1], "50");
    }

    #[test]
    fn unlimited_governor_never_blocks_mid_pump() {
        let governor = LineRateGovernor::new(0);
        let mut reader: Box<dyn BufRead> = Box::new(Cursor::new(b"a\nb\nc\n".to_vec()));
        let mut out = Vec::new();
        pump(&mut *reader, &mut out, &governor).unwrap();
        assert_eq!(governor.count(), 3);
        assert_eq!(out, b"a\nb\nc\n");
    }
}
