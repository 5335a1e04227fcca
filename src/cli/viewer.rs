use std::{path::Path, process::Command};

use anyhow::{bail, Context, Result};

/// Opens the ledger with whatever application the system associates with the
/// file. A failure to launch is reported to the caller and is never fatal.
pub fn open_store_file(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("There is no data yet, {} does not exist", path.display());
    }

    let status = viewer_command(path)
        .status()
        .with_context(|| format!("Could not launch a viewer for {}", path.display()))?;
    if !status.success() {
        bail!("Viewer exited with {status} for {}", path.display());
    }
    Ok(())
}

fn viewer_command(path: &Path) -> Command {
    cfg_if::cfg_if! {
        if #[cfg(target_os = "windows")] {
            let mut command = Command::new("cmd");
            // An empty string swallows the title argument of start.
            command.args(["/C", "start", ""]).arg(path);
            command
        } else if #[cfg(target_os = "macos")] {
            let mut command = Command::new("open");
            command.arg(path);
            command
        } else {
            let mut command = Command::new("xdg-open");
            command.arg(path);
            command
        }
    }
}
