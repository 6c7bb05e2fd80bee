//! Example downloading the URLs given on the command line, with progress bars.
//!
//! Every URL is requested twice to show that a second request joins the
//! running transfer. Set `RUST_LOG=convoy=debug` to see what the registry does.

use color_eyre::{eyre::eyre, Result};
use convoy::{DownloadRequest, ProgressBarOpts, ProgressDisplay, RegistryBuilder};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut urls: Vec<String> = std::env::args().skip(1).collect();
    if urls.is_empty() {
        urls.push(
            "https://github.com/seanmonstar/reqwest/archive/refs/tags/v0.11.9.zip".to_string(),
        );
    }

    let registry = RegistryBuilder::new()
        .directory(PathBuf::from("downloads"))
        .build()?;
    let display = ProgressDisplay::new(ProgressBarOpts::new(
        Some(ProgressBarOpts::TEMPLATE_PERCENT.into()),
        Some(ProgressBarOpts::CHARS_FINE.into()),
        true,
        false,
    ));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut expected = 0;
    for url in &urls {
        let done = tx.clone();
        let label = url.clone();
        registry.request(display.track(DownloadRequest::new(url.as_str()).on_complete(
            move |completed| {
                let _ = done.send((label.clone(), completed));
            },
        )))?;
        // Joins the transfer started above
        registry.request(DownloadRequest::new(url.as_str()))?;
        expected += 1;
    }
    drop(tx);

    let mut failed = 0;
    for _ in 0..expected {
        let (url, completed) = rx.recv().await.ok_or_else(|| eyre!("downloads were cancelled"))?;
        if !completed {
            display.multi().println(format!("failed: {url}"))?;
            failed += 1;
        }
    }

    println!(
        "\nDownloaded {} of {} files into {:?}.",
        expected - failed,
        expected,
        registry.directory()
    );
    Ok(())
}
