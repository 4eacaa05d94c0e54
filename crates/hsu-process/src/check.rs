//! Process lookup and existence checking.
//!
//! [`ProcessHandle::open`] resolves a PID into a live reference that both the
//! cooperative and the forced exit paths operate on. On Windows this is a
//! real process handle opened with the minimal rights needed to wait on and
//! terminate the process; it is closed when the `ProcessHandle` is dropped.
//! On Unix the reference is the validated PID itself.

use hsu_common::{ExitError, ExitResult, NativeError};

/// A live reference to a process that is not owned by the caller.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: u32,
    #[cfg(windows)]
    handle: windows::Win32::Foundation::HANDLE,
}

impl ProcessHandle {
    /// Resolves `pid` into a handle, failing with [`ExitError::InvalidTarget`]
    /// and the platform's own error text when the PID does not name an
    /// accessible running process.
    pub fn open(pid: u32) -> ExitResult<Self> {
        #[cfg(unix)]
        {
            open_unix(pid)
        }

        #[cfg(windows)]
        {
            open_windows(pid)
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Non-blocking check whether the process has terminated.
    pub fn has_exited(&self) -> ExitResult<bool> {
        #[cfg(unix)]
        {
            has_exited_unix(self.pid)
        }

        #[cfg(windows)]
        {
            has_exited_windows(self)
        }
    }

    #[cfg(unix)]
    pub(crate) fn nix_pid(&self) -> nix::unistd::Pid {
        nix::unistd::Pid::from_raw(self.pid as i32)
    }

    #[cfg(windows)]
    pub(crate) fn raw(&self) -> windows::Win32::Foundation::HANDLE {
        self.handle
    }
}

#[cfg(windows)]
impl Drop for ProcessHandle {
    fn drop(&mut self) {
        use windows::Win32::Foundation::CloseHandle;

        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}

/// Check if a process with the given PID exists and is running.
///
/// On Unix this uses `kill(pid, 0)`, which delivers nothing but reports
/// whether the process exists. A process we lack permission to signal still
/// exists. On Linux, zombies (exited but not yet reaped) count as gone.
/// On Windows it opens the process with query rights and checks whether it
/// is still active.
///
/// # Examples
///
/// ```rust,no_run
/// use hsu_process::process_exists;
///
/// if process_exists(1234).unwrap() {
///     println!("Process 1234 is running");
/// }
/// ```
pub fn process_exists(pid: u32) -> ExitResult<bool> {
    #[cfg(unix)]
    {
        process_exists_unix(pid)
    }

    #[cfg(windows)]
    {
        process_exists_windows(pid)
    }
}

#[cfg(unix)]
pub(crate) fn errno_error(operation: &'static str, errno: nix::errno::Errno) -> NativeError {
    NativeError::new(operation, errno.to_string(), Some(errno as i32))
}

#[cfg(windows)]
pub(crate) fn win32_error(operation: &'static str, error: &windows::core::Error) -> NativeError {
    let message = error.message().to_string();
    NativeError::new(operation, message.trim_end(), Some(error.code().0))
}

/// Rejects PIDs that `kill` would interpret as a process group or as
/// "every process".
#[cfg(unix)]
fn checked_pid(pid: u32) -> ExitResult<nix::unistd::Pid> {
    use nix::errno::Errno;

    match i32::try_from(pid) {
        Ok(raw) if raw > 0 => Ok(nix::unistd::Pid::from_raw(raw)),
        _ => Err(ExitError::invalid_target(pid, errno_error("kill", Errno::EINVAL))),
    }
}

#[cfg(unix)]
fn open_unix(pid: u32) -> ExitResult<ProcessHandle> {
    use nix::sys::signal::kill;

    let nix_pid = checked_pid(pid)?;
    kill(nix_pid, None).map_err(|errno| ExitError::invalid_target(pid, errno_error("kill", errno)))?;

    Ok(ProcessHandle { pid })
}

#[cfg(unix)]
fn has_exited_unix(pid: u32) -> ExitResult<bool> {
    process_exists_unix(pid).map(|exists| !exists)
}

#[cfg(unix)]
fn process_exists_unix(pid: u32) -> ExitResult<bool> {
    use nix::errno::Errno;
    use nix::sys::signal::kill;

    let nix_pid = match checked_pid(pid) {
        Ok(nix_pid) => nix_pid,
        Err(_) => return Ok(false),
    };

    match kill(nix_pid, None) {
        Ok(()) => Ok(!is_zombie(pid)),
        Err(Errno::ESRCH) => Ok(false),
        // Exists, but owned by someone else.
        Err(Errno::EPERM) => Ok(true),
        Err(errno) => Err(ExitError::invalid_target(pid, errno_error("kill", errno))),
    }
}

/// Reads the state field of `/proc/<pid>/stat`.
///
/// The command name is wrapped in parentheses and may itself contain spaces
/// or parentheses, so the state is taken after the *last* `)`.
#[cfg(target_os = "linux")]
fn is_zombie(pid: u32) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    stat.rfind(')')
        .and_then(|idx| stat[idx + 1..].split_whitespace().next())
        .map(|state| state == "Z")
        .unwrap_or(false)
}

#[cfg(all(unix, not(target_os = "linux")))]
fn is_zombie(_pid: u32) -> bool {
    false
}

#[cfg(windows)]
fn open_windows(pid: u32) -> ExitResult<ProcessHandle> {
    use windows::Win32::System::Threading::{
        OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION, PROCESS_SYNCHRONIZE, PROCESS_TERMINATE,
    };

    let rights = PROCESS_QUERY_LIMITED_INFORMATION | PROCESS_TERMINATE | PROCESS_SYNCHRONIZE;
    let handle = unsafe { OpenProcess(rights, false, pid) }
        .map_err(|e| ExitError::invalid_target(pid, win32_error("OpenProcess", &e)))?;

    Ok(ProcessHandle { pid, handle })
}

#[cfg(windows)]
fn has_exited_windows(process: &ProcessHandle) -> ExitResult<bool> {
    use windows::Win32::Foundation::{WAIT_FAILED, WAIT_OBJECT_0};
    use windows::Win32::System::Threading::WaitForSingleObject;

    let status = unsafe { WaitForSingleObject(process.raw(), 0) };
    if status == WAIT_OBJECT_0 {
        Ok(true)
    } else if status == WAIT_FAILED {
        let e = windows::core::Error::from_win32();
        Err(ExitError::invalid_target(process.pid, win32_error("WaitForSingleObject", &e)))
    } else {
        Ok(false)
    }
}

#[cfg(windows)]
fn process_exists_windows(pid: u32) -> ExitResult<bool> {
    use windows::Win32::Foundation::{CloseHandle, ERROR_ACCESS_DENIED, ERROR_INVALID_PARAMETER, STILL_ACTIVE};
    use windows::Win32::System::Threading::{GetExitCodeProcess, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION};

    unsafe {
        let handle = match OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) {
            Ok(h) => h,
            Err(e) if e.code() == ERROR_INVALID_PARAMETER.to_hresult() => return Ok(false),
            // Exists, but owned by someone else.
            Err(e) if e.code() == ERROR_ACCESS_DENIED.to_hresult() => return Ok(true),
            Err(e) => return Err(ExitError::invalid_target(pid, win32_error("OpenProcess", &e))),
        };

        let mut exit_code = 0u32;
        let result = GetExitCodeProcess(handle, &mut exit_code);
        let _ = CloseHandle(handle);

        match result {
            Ok(()) => Ok(exit_code == STILL_ACTIVE.0 as u32),
            Err(e) => Err(ExitError::invalid_target(pid, win32_error("GetExitCodeProcess", &e))),
        }
    }
}
