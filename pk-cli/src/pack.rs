use std::time::Duration;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use pk_core::ProgressState;

use crate::CreateArchiveCommand;

pub fn create_archive(cmd: &CreateArchiveCommand) -> anyhow::Result<()> {
    // resolved up front so the bar has a total; the writer resolves the
    // same set again itself
    let files = pk_core::write::resolve_sources(&cmd.sources).context("Failed to resolve sources")?;
    if files.is_empty() {
        anyhow::bail!("No input files found");
    }

    let bar = ProgressBar::new(files.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{pos}/{len} files packed {wide_bar}")
            .unwrap(),
    );
    bar.enable_steady_tick(Duration::from_millis(100));

    let bar1 = bar.clone();
    let archive = pk_core::write::create_archive(
        &cmd.destination,
        &cmd.name,
        &cmd.sources,
        Some(move |state| {
            if let ProgressState::Packed(n) = state {
                bar1.set_position(n as u64);
            }
        }),
    )
    .context("Failed to create archive")?;

    bar.println(format!("Output file: `{}`", archive.display()));
    bar.println("Done.");
    bar.finish();

    Ok(())
}
