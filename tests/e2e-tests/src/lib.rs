// E2E Test Framework for HSU graceful process exit


use std::env;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Get the path to the TESTEXE (testexe) binary
pub fn get_testexe_path() -> PathBuf {
    let mut path = env::current_exe()
        .expect("Failed to get current exe path")
        .parent()
        .expect("Failed to get parent dir")
        .to_path_buf();

    // If we're in deps/, go up one level
    if path.ends_with("deps") {
        path.pop();
    }

    #[cfg(windows)]
    path.push("testexe.exe");

    #[cfg(not(windows))]
    path.push("testexe");

    if !path.exists() {
        panic!("TESTEXE binary not found at: {}", path.display());
    }

    path
}

/// A running TESTEXE instance. Killed on drop if still running.
pub struct TestExe {
    child: Child,
}

impl TestExe {
    /// Spawn TESTEXE sleeping for `sleep` and wait until its signal handlers
    /// are installed.
    pub fn spawn_sleep(sleep: Duration) -> Self {
        Self::spawn(&["--sleep-ms", &sleep.as_millis().to_string()])
    }

    /// Spawn TESTEXE that only stops when forcibly terminated or after
    /// `sleep`.
    pub fn spawn_stubborn(sleep: Duration) -> Self {
        Self::spawn(&["--sleep-ms", &sleep.as_millis().to_string(), "--ignore-signals"])
    }

    pub fn spawn(args: &[&str]) -> Self {
        let mut cmd = Command::new(get_testexe_path());
        cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::null());

        // Give each instance its own console, so a Ctrl+C broadcast into it
        // reaches nothing else.
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;
            cmd.creation_flags(CREATE_NEW_CONSOLE);
        }

        let mut child = cmd.spawn().expect("Failed to spawn TESTEXE");

        let stdout = child.stdout.take().expect("TESTEXE stdout not captured");
        let mut line = String::new();
        BufReader::new(stdout)
            .read_line(&mut line)
            .expect("Failed to read TESTEXE readiness line");
        assert_eq!(line.trim(), "ready", "TESTEXE did not report readiness");

        Self { child }
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Wait for TESTEXE to exit, failing if it is still running after
    /// `timeout`.
    pub fn wait(&mut self, timeout: Duration) -> Result<ExitStatus, String> {
        match self.child.wait_timeout(timeout) {
            Ok(Some(status)) => Ok(status),
            Ok(None) => Err(format!("TESTEXE (PID {}) still running after {:?}", self.pid(), timeout)),
            Err(e) => Err(format!("Failed to wait for TESTEXE: {}", e)),
        }
    }
}

impl Drop for TestExe {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Exit code of a finished process, using the shell convention
/// `128 + signal` for processes ended by a signal on Unix.
pub fn exit_code(status: &ExitStatus) -> Result<i32, String> {
    if let Some(code) = status.code() {
        return Ok(code);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Ok(128 + signal);
        }
    }

    Err(format!("unable to analyze process state: {:?}", status))
}

/// Exit code reported for a process ended by `force_terminate`.
pub fn forced_exit_code() -> i32 {
    if cfg!(windows) {
        hsu_process::FORCED_EXIT_CODE as i32
    } else {
        hsu_process::expected_exit_code(hsu_process::SIGKILL)
    }
}

/// A PID that belonged to a process which has exited and been reaped.
pub fn reaped_pid() -> u32 {
    let mut child = TestExe::spawn_sleep(Duration::ZERO);
    let pid = child.pid();
    child.wait(Duration::from_secs(10)).expect("TESTEXE did not exit");
    pid
}
