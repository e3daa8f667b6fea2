//! Sequential batch orchestration: resolve each record, then download it

use crate::config::{Settings, API_KEY_ENV};
use crate::downloader::Converter;
use crate::error::InputError;
use crate::input::{read_records, Record};
use crate::search::VideoSearch;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Per-record progress events
#[derive(Debug, Clone, PartialEq)]
pub enum RecordStage {
    Resolving { index: usize, query: String },
    Downloading { index: usize, url: String, title: Option<String> },
    Done { index: usize },
    Skipped { index: usize, reason: String },
    Failed { index: usize, error: String },
}

/// How a single record ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Downloaded { url: String },
    Skipped { reason: String },
    Failed { url: String, error: String },
}

#[derive(Debug, Default)]
pub struct BatchReport {
    /// Outcomes in input order
    pub outcomes: Vec<(Record, RecordOutcome)>,
    pub duration: Duration,
}

impl BatchReport {
    pub fn downloaded(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Downloaded { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&RecordOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Output directory for an input file: `<input dir>/<input stem>`
pub fn output_dir_for(input: &Path) -> Result<PathBuf, InputError> {
    let stem = input
        .file_stem()
        .ok_or_else(|| InputError::NoOutputDir(input.to_path_buf()))?;
    let parent = input.parent().unwrap_or_else(|| Path::new(""));
    Ok(parent.join(stem))
}

/// Create the output directory if it is missing. Failure is logged, not fatal.
pub async fn ensure_output_dir(dir: &Path) -> bool {
    info!("Creating output directory {}", dir.display());
    match tokio::fs::create_dir_all(dir).await {
        Ok(()) => true,
        Err(e) => {
            warn!(
                "Error creating output directory {}: {}. Continuing...",
                dir.display(),
                e
            );
            false
        }
    }
}

/// Everything a run needs once the fatal startup checks have passed
#[derive(Debug)]
pub struct Prepared {
    pub settings: Settings,
    pub records: Vec<Record>,
    pub output_dir: PathBuf,
}

/// Load settings, read the input and create the output directory, in that
/// order. Any error here ends the run before a search is made.
pub async fn prepare(input: &Path, config_path: Option<&Path>) -> crate::Result<Prepared> {
    prepare_with_env(input, config_path, std::env::var(API_KEY_ENV).ok()).await
}

pub async fn prepare_with_env(
    input: &Path,
    config_path: Option<&Path>,
    env_api_key: Option<String>,
) -> crate::Result<Prepared> {
    let settings = Settings::load_with_env(config_path, env_api_key)?;
    let records = read_records(input).await?;
    let output_dir = output_dir_for(input)?;
    ensure_output_dir(&output_dir).await;

    Ok(Prepared {
        settings,
        records,
        output_dir,
    })
}

/// Drives records through search and conversion, one at a time
pub struct Batch<'a> {
    settings: &'a Settings,
    search: &'a dyn VideoSearch,
    converter: &'a dyn Converter,
    output_dir: PathBuf,
    progress_tx: Option<mpsc::Sender<RecordStage>>,
}

impl<'a> Batch<'a> {
    pub fn new(
        settings: &'a Settings,
        search: &'a dyn VideoSearch,
        converter: &'a dyn Converter,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            settings,
            search,
            converter,
            output_dir,
            progress_tx: None,
        }
    }

    pub fn with_progress(mut self, progress_tx: mpsc::Sender<RecordStage>) -> Self {
        self.progress_tx = Some(progress_tx);
        self
    }

    async fn emit(&self, stage: RecordStage) {
        if let Some(ref tx) = self.progress_tx {
            let _ = tx.send(stage).await;
        }
    }

    /// Process every record in order. Per-record failures never abort the run.
    pub async fn run(&self, records: Vec<Record>) -> BatchReport {
        let start_time = Instant::now();
        info!("Downloading files to {}", self.output_dir.display());

        let mut outcomes = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let outcome = self.process(index, &record).await;
            outcomes.push((record, outcome));
        }

        BatchReport {
            outcomes,
            duration: start_time.elapsed(),
        }
    }

    async fn process(&self, index: usize, record: &Record) -> RecordOutcome {
        let query = record.query();
        self.emit(RecordStage::Resolving {
            index,
            query: query.clone(),
        })
        .await;

        let found = match self.search.search(&query).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Skipping {:?} (line {}): {}", query, record.line, e);
                let reason = e.to_string();
                self.emit(RecordStage::Skipped {
                    index,
                    reason: reason.clone(),
                })
                .await;
                return RecordOutcome::Skipped { reason };
            }
        };

        self.emit(RecordStage::Downloading {
            index,
            url: found.url.clone(),
            title: found.title.clone(),
        })
        .await;

        match self
            .converter
            .convert(&found.url, self.settings, &self.output_dir)
            .await
        {
            Ok(()) => {
                self.emit(RecordStage::Done { index }).await;
                RecordOutcome::Downloaded { url: found.url }
            }
            Err(e) => {
                error!("Error downloading YouTube audio for {:?}: {}", query, e);
                let error = e.to_string();
                self.emit(RecordStage::Failed {
                    index,
                    error: error.clone(),
                })
                .await;
                RecordOutcome::Failed {
                    url: found.url,
                    error,
                }
            }
        }
    }
}
