//! Batch certificate generation
//!
//! A run moves through `Idle -> Validating -> Running -> Completed` (or
//! `Cancelled`). Validation happens before anything is written; once
//! running, every row is rendered independently and a bad row only fails
//! itself.

use crate::config::PipelineConfig;
use crate::dataset::{record_from_row, Dataset, Row};
use crate::single::certificate_file_name;
use crate::{BatchError, RecordError};
use pdf_core::Finalize;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use template::{AssetSet, Renderer, TemplateId};

/// Columns every dataset must have, matched exactly
pub const REQUIRED_COLUMNS: [&str; 3] = ["Name", "Course", "Date"];

/// What happens when two rows map to the same file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// One file; the row later in the source wins, as if run sequentially
    #[default]
    Overwrite,
    /// Later rows get `_2`, `_3`, ... appended in source order
    Suffix,
}

/// Observable lifecycle of a batch pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Validating,
    Running,
    Completed {
        succeeded: usize,
        total: usize,
    },
    Cancelled {
        succeeded: usize,
        completed: usize,
        total: usize,
    },
}

/// Shared flag checked before each record starts
///
/// Once cancelled the token stays cancelled until [`CancelToken::reset`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Cancel and report whether this call was the one that did it
    fn cancel_first(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }
}

/// Reported after each record finishes, successfully or not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub name: String,
}

/// A row that produced no certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    /// Zero-based row index in the dataset
    pub index: usize,
    pub name: String,
    pub error: String,
}

/// Outcome of one batch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    /// Records that finished, successfully or not
    pub completed: usize,
    pub total: usize,
    pub cancelled: bool,
    pub failures: Vec<RecordFailure>,
    /// Files on disk after the run, in source order
    pub written: Vec<PathBuf>,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Successfully generated {} of {} certificates.",
            self.succeeded, self.total
        )
    }
}

enum Outcome {
    Written(PathBuf),
    /// Rendered, but a later row owns the file
    Superseded,
    Failed(RecordFailure),
    Skipped,
}

fn row_name(row: &Row) -> String {
    row.get("Name").map(|n| n.trim().to_string()).unwrap_or_default()
}

/// Output path for every row, in source order
fn plan_paths(dataset: &Dataset, output_dir: &Path, policy: CollisionPolicy) -> Vec<PathBuf> {
    let mut used = HashSet::new();
    dataset
        .rows()
        .iter()
        .map(|row| {
            let file_name = certificate_file_name(&row_name(row));
            let mut path = output_dir.join(&file_name);
            if policy == CollisionPolicy::Suffix {
                let stem = file_name.strip_suffix(".pdf").unwrap_or(&file_name);
                let mut n = 2;
                while used.contains(&path) {
                    path = output_dir.join(format!("{stem}_{n}.pdf"));
                    n += 1;
                }
            }
            used.insert(path.clone());
            path
        })
        .collect()
}

/// Certificate generation over a whole dataset
pub struct BatchPipeline {
    renderer: Renderer,
    workers: usize,
    collision_policy: CollisionPolicy,
    cancel: CancelToken,
    state: Mutex<BatchState>,
}

impl BatchPipeline {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            renderer: Renderer::new().with_options(config.render_options()),
            workers: config.worker_count(),
            collision_policy: config.collision_policy,
            cancel: CancelToken::new(),
            state: Mutex::new(BatchState::Idle),
        }
    }

    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Token that stops the current run before its next record
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> BatchState {
        match self.state.lock() {
            Ok(state) => state.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_state(&self, state: BatchState) {
        match self.state.lock() {
            Ok(mut guard) => *guard = state,
            Err(poisoned) => *poisoned.into_inner() = state,
        }
    }

    /// Check the run can start, creating the output directory if needed
    fn validate(&self, dataset: &Dataset, output_dir: Option<&Path>) -> Result<PathBuf, BatchError> {
        let output_dir = output_dir.ok_or(BatchError::NoOutputDirectory)?;
        let missing = dataset.missing_columns(&REQUIRED_COLUMNS);
        if !missing.is_empty() {
            return Err(BatchError::MissingColumns(missing));
        }
        if !output_dir.is_dir() {
            std::fs::create_dir_all(output_dir)?;
            log::info!("created output directory {}", output_dir.display());
        }
        Ok(output_dir.to_path_buf())
    }

    /// Generate one certificate per dataset row
    ///
    /// # Arguments
    /// * `dataset` - Rows with `Name`, `Course`, `Date` and optionally
    ///   `Description` columns
    /// * `template` - Layout used for every row
    /// * `assets` - Logo and signature shared by every row
    /// * `output_dir` - Destination directory, created if missing
    /// * `progress` - Called after each record with the running count
    ///
    /// # Errors
    /// Only for problems with the run as a whole. Individual rows that
    /// fail are listed in [`BatchSummary::failures`].
    pub fn run(
        &self,
        dataset: &Dataset,
        template: TemplateId,
        assets: &AssetSet,
        output_dir: Option<&Path>,
        progress: &(dyn Fn(&Progress) + Send + Sync),
    ) -> Result<BatchSummary, BatchError> {
        self.set_state(BatchState::Validating);
        let output_dir = match self.validate(dataset, output_dir) {
            Ok(dir) => dir,
            Err(e) => {
                log::error!("batch rejected: {e}");
                self.set_state(BatchState::Idle);
                return Err(e);
            }
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("certgen-batch-{i}"))
            .build()
            .map_err(|e| {
                self.set_state(BatchState::Idle);
                BatchError::Pool(e.to_string())
            })?;

        let total = dataset.len();
        let paths = plan_paths(dataset, &output_dir, self.collision_policy);
        let locks: HashMap<&Path, Mutex<Option<usize>>> = paths
            .iter()
            .map(|p| (p.as_path(), Mutex::new(None)))
            .collect();
        let completed = AtomicUsize::new(0);
        let succeeded = AtomicUsize::new(0);

        self.set_state(BatchState::Running);
        log::info!(
            "batch: {total} records, {template}, {} workers, output {}",
            self.workers,
            output_dir.display()
        );

        let outcomes: Vec<Outcome> = pool.install(|| {
            dataset
                .rows()
                .par_iter()
                .enumerate()
                .map(|(index, row)| {
                    if self.cancel.is_cancelled() {
                        return Outcome::Skipped;
                    }
                    if !output_dir.is_dir() {
                        if self.cancel.cancel_first() {
                            log::error!(
                                "output directory {} disappeared; cancelling",
                                output_dir.display()
                            );
                        }
                        return Outcome::Skipped;
                    }

                    let name = row_name(row);
                    let path = &paths[index];
                    let outcome = match self.process(template, row, assets, index, path, &locks) {
                        Ok(true) => Outcome::Written(path.clone()),
                        Ok(false) => Outcome::Superseded,
                        Err(e) => {
                            log::warn!("row {index} ({name}): {e}");
                            Outcome::Failed(RecordFailure {
                                index,
                                name: name.clone(),
                                error: e.to_string(),
                            })
                        }
                    };
                    if !matches!(outcome, Outcome::Failed(_)) {
                        succeeded.fetch_add(1, Ordering::SeqCst);
                    }
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress(&Progress {
                        completed: done,
                        total,
                        name,
                    });
                    outcome
                })
                .collect()
        });

        let mut failures = Vec::new();
        let mut written = Vec::new();
        for outcome in outcomes {
            match outcome {
                Outcome::Written(path) => {
                    if !written.contains(&path) {
                        written.push(path);
                    }
                }
                Outcome::Failed(failure) => failures.push(failure),
                Outcome::Superseded | Outcome::Skipped => {}
            }
        }

        let summary = BatchSummary {
            succeeded: succeeded.load(Ordering::SeqCst),
            completed: completed.load(Ordering::SeqCst),
            total,
            cancelled: self.cancel.is_cancelled(),
            failures,
            written,
        };
        if summary.cancelled {
            log::warn!("batch cancelled after {} of {total} records", summary.completed);
            self.set_state(BatchState::Cancelled {
                succeeded: summary.succeeded,
                completed: summary.completed,
                total,
            });
        } else {
            log::info!("{summary}");
            self.set_state(BatchState::Completed {
                succeeded: summary.succeeded,
                total,
            });
        }
        Ok(summary)
    }

    /// Render one row and write it unless a later row already owns the path
    ///
    /// Returns whether the file was written.
    fn process(
        &self,
        template: TemplateId,
        row: &Row,
        assets: &AssetSet,
        index: usize,
        path: &Path,
        locks: &HashMap<&Path, Mutex<Option<usize>>>,
    ) -> Result<bool, RecordError> {
        let record = record_from_row(row)?;
        let document = self
            .renderer
            .render(template, &record, assets, Finalize::Final)?;

        let Some(lock) = locks.get(path) else {
            std::fs::write(path, document.bytes())?;
            return Ok(true);
        };
        let mut owner = match lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match *owner {
            Some(later) if later > index => {
                log::warn!(
                    "row {index}: {} already written by row {later}; keeping the later row",
                    path.display()
                );
                return Ok(false);
            }
            Some(earlier) => log::warn!(
                "row {index}: overwriting {} from row {earlier}",
                path.display()
            ),
            None => {}
        }
        std::fs::write(path, document.bytes())?;
        *owner = Some(index);
        log::debug!("row {index}: wrote {}", path.display());
        Ok(true)
    }
}
