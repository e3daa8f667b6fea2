use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tokio::sync::mpsc;

use ytcsv_core::{
    batch::{prepare, Batch, Prepared, RecordStage},
    downloader::Downloader,
    search::YouTubeSearch,
};

pub async fn run(input: &Path, config_path: Option<&Path>) -> Result<()> {
    let Prepared {
        settings,
        records,
        output_dir,
    } = prepare(input, config_path).await?;
    let api_key = settings.api_key().context("No YouTube API key configured!")?;

    if records.is_empty() {
        println!("No songs found in {}", input.display());
        return Ok(());
    }

    let converter = Downloader::locate(&settings);
    let search = YouTubeSearch::new(api_key);

    let total = records.len();
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {bar:30.cyan/blue} {msg}")?
            .progress_chars("=>-"),
    );

    // Spawn progress handler
    let (tx, mut rx) = mpsc::channel(32);
    let progress = pb.clone();
    let progress_handle = tokio::spawn(async move {
        while let Some(stage) = rx.recv().await {
            match stage {
                RecordStage::Resolving { query, .. } => {
                    progress.set_message(format!("Searching: {}", truncate(&query, 40)));
                    progress.enable_steady_tick(std::time::Duration::from_millis(100));
                }
                RecordStage::Downloading { url, title, .. } => {
                    let label = title.unwrap_or(url);
                    progress.set_message(format!("Downloading: {}", truncate(&label, 40)));
                }
                RecordStage::Done { .. }
                | RecordStage::Skipped { .. }
                | RecordStage::Failed { .. } => progress.inc(1),
            }
        }
    });

    let batch = Batch::new(&settings, &search, &converter, output_dir).with_progress(tx);
    let report = batch.run(records).await;
    drop(batch);

    progress_handle.await?;
    pb.finish_with_message(format!(
        "Done in {:.1}s: {} downloaded, {} not found, {} failed",
        report.duration.as_secs_f32(),
        report.downloaded(),
        report.skipped(),
        report.failed()
    ));

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer song title", 10), "a much ...");
        assert_eq!(truncate("Ünïcödé Sóng Tïtle", 10), "Ünïcödé...");
    }
}
