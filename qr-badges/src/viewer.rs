//! Hand the finished document to the desktop's default application.

use std::path::Path;
use std::process::{Command, Stdio};

/// The platform opener and its leading arguments.
fn opener() -> (&'static str, &'static [&'static str]) {
    if cfg!(target_os = "macos") {
        ("open", &[])
    } else if cfg!(target_os = "windows") {
        // The empty argument is the window title `start` expects first.
        ("cmd", &["/C", "start", ""])
    } else {
        ("xdg-open", &[])
    }
}

pub fn viewer_command(path: &Path) -> Command {
    let (program, args) = opener();
    let mut command = Command::new(program);
    command
        .args(args)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    command
}

/// Spawn the viewer without waiting for it. Returns whether it started.
pub fn open_in_viewer(path: &Path) -> bool {
    let mut command = viewer_command(path);
    match command.spawn() {
        Ok(_) => {
            log::debug!("Opened {} with {:?}", path.display(), command.get_program());
            true
        }
        Err(e) => {
            log::warn!("Could not open {}: {}", path.display(), e);
            false
        }
    }
}
