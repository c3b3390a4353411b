use std::time::Duration;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use pk_core::ProgressState;
use pk_core::header::HEADER_LEN;

use crate::{FullUnpackCommand, ListContentCommand, UnpackCommand};

pub fn list_content(cmd: &ListContentCommand) -> anyhow::Result<()> {
    let headers = pk_core::read::list_content(&cmd.archive).context("Failed to list archive")?;

    let mut total = 0u64;
    for header in &headers {
        println!("{:>10}  {}", header.size(), header.name());
        total += HEADER_LEN as u64 + header.size();
    }
    println!("{} entries, {} bytes", headers.len(), total);

    Ok(())
}

pub fn full_unpack(cmd: &FullUnpackCommand) -> anyhow::Result<()> {
    let headers = pk_core::read::list_content(&cmd.archive).context("Failed to read archive")?;

    let bar = progress_bar(headers.len() as u64);
    bar.println(format!("Output directory: `{}`", cmd.destination.display()));

    let bar1 = bar.clone();
    let written = pk_core::extract::full_unpack(
        &cmd.archive,
        &cmd.destination,
        Some(move |state| {
            if let ProgressState::Wrote(n) = state {
                bar1.set_position(n as u64);
            }
        }),
    )
    .context("Failed to unpack archive")?;

    bar.println(format!("{} files written.", written.len()));
    bar.finish();

    Ok(())
}

pub fn unpack(cmd: &UnpackCommand) -> anyhow::Result<()> {
    let bar = progress_bar(cmd.files.len() as u64);
    bar.println(format!("Output directory: `{}`", cmd.destination.display()));

    let bar1 = bar.clone();
    let written = pk_core::extract::unpack(
        &cmd.archive,
        &cmd.destination,
        &cmd.files,
        Some(move |state| {
            if let ProgressState::Wrote(n) = state {
                bar1.set_position(n as u64);
            }
        }),
    )
    .context("Failed to unpack archive")?;

    bar.println(format!("{} files written.", written.len()));
    bar.finish();

    Ok(())
}

fn progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{pos}/{len} files written {wide_bar}")
            .unwrap(),
    );
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}
