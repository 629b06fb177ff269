/// Forced termination of a child and everything it spawned
use std::process::Child;

/// SIGKILL the child's process group, then the child itself.
///
/// Children are spawned as group leaders, so the group id equals the pid.
/// No graceful-shutdown negotiation: submitted code gets no SIGTERM window.
pub fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    kill_group(child.id());

    if let Err(e) = child.kill() {
        // InvalidInput means it was already reaped
        if e.kind() != std::io::ErrorKind::InvalidInput {
            log::debug!("kill({}) failed: {}", child.id(), e);
        }
    }
}

/// Best-effort SIGKILL of a whole process group
#[cfg(unix)]
pub fn kill_group(pgid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    match killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => log::warn!("killpg({}) failed: {}", pgid, e),
    }
}
