//! Shortlist pipeline
//!
//! Runs the three shortlist stages in order:
//! - Featurize: compute descriptors for the shortlisted dataset
//! - Split: assign split UUIDs to the shortlist
//! - Search: launch the hyperparameter search and collect trained models
//!
//! Each stage is one submission followed by a wait on the file it produces.
//! Featurize and split timeouts are logged and the pipeline carries on; the
//! search stage decides the result.

use anyhow::{Context, Result};
use shortlist_core::domain::job::{ExpectedJobs, JobSpec};
use shortlist_core::domain::params::PipelineParams;
use shortlist_core::domain::perf::PerfRecord;
use shortlist_core::domain::poll::PollOutcome;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::context::Workspace;
use crate::probe::{CsvExistsProbe, CsvRowsProbe, CsvTable, PerfResultsProbe};
use crate::scheduler::JobPoller;

const FEATURIZE_SCRIPT: &str = "featurize_shortlist.py";
const SEARCH_WRAPPER: &str = "utils/hyperparam_search_wrapper.py";

/// Shortlist featurize/split/search driver
pub struct ShortlistPipeline {
    config: Config,
    workspace: Arc<Workspace>,
    poller: JobPoller,
}

impl ShortlistPipeline {
    pub fn new(config: Config, workspace: Arc<Workspace>) -> Self {
        let poller = JobPoller::new(config.clone(), Arc::clone(&workspace));
        Self {
            config,
            workspace,
            poller,
        }
    }

    /// Runs all stages
    ///
    /// # Arguments
    /// * `split_config` - Pipeline config for featurization and splitting
    /// * `search_config` - Pipeline config for the hyperparameter search
    ///
    /// # Returns
    /// The performance records, or `None` if the search did not finish in time
    /// or submitted no jobs
    pub async fn run(
        &self,
        split_config: &Path,
        search_config: &Path,
    ) -> Result<Option<Vec<PerfRecord>>> {
        let split_config = self.workspace.resolve(split_config);
        let search_config = self.workspace.resolve(search_config);

        let params = PipelineParams::load(&split_config).context("Failed to load split config")?;
        let script_dir = self.workspace.resolve(&params.script_dir);
        let shortlist_dir = script_dir.join(&self.config.shortlist_dir);
        let stem = params.shortlist_stem();

        let shortlist_path = shortlist_dir.join(format!("{}.csv", stem));
        info!("Shortlist: {}", shortlist_path.display());

        self.featurize(&params, &shortlist_dir, &shortlist_path, &split_config)
            .await?;

        let with_uuids = shortlist_dir.join(format!("{}_with_uuids.csv", stem));
        self.split(&params, &script_dir, &with_uuids, &split_config)
            .await?;

        self.search(&params, &script_dir, &search_config).await
    }

    async fn featurize(
        &self,
        params: &PipelineParams,
        shortlist_dir: &Path,
        shortlist_path: &Path,
        split_config: &Path,
    ) -> Result<()> {
        let shortlist = CsvTable::read(shortlist_path)?;
        let dataset_key = shortlist.last_value("dataset_key").with_context(|| {
            format!(
                "{} has no dataset_key to featurize",
                shortlist_path.display()
            )
        })?;
        let feat_path = self
            .workspace
            .resolve(&params.featurized_dataset_path(dataset_key)?);

        info!("Submitting batch featurization job");
        let spec = JobSpec::new(
            arg(&params.python_path),
            [
                arg(&shortlist_dir.join(FEATURIZE_SCRIPT)),
                arg(shortlist_path),
                arg(split_config),
            ],
        );

        let outcome = self
            .poller
            .await_completion(&spec, &ExpectedJobs::Fixed(1), &CsvRowsProbe::new(&feat_path))
            .await
            .context("Featurization stage failed")?;
        log_stage("featurization", &outcome);
        Ok(())
    }

    async fn split(
        &self,
        params: &PipelineParams,
        script_dir: &Path,
        with_uuids: &Path,
        split_config: &Path,
    ) -> Result<()> {
        info!("Submitting shortlist split job");
        let spec = search_wrapper(params, script_dir, split_config);

        let outcome = self
            .poller
            .await_completion(&spec, &ExpectedJobs::Fixed(1), &CsvExistsProbe::new(with_uuids))
            .await
            .context("Split stage failed")?;
        log_stage("splitting", &outcome);
        Ok(())
    }

    async fn search(
        &self,
        params: &PipelineParams,
        script_dir: &Path,
        search_config: &Path,
    ) -> Result<Option<Vec<PerfRecord>>> {
        let spec = search_wrapper(params, script_dir, search_config);
        info!("Hyperparameter command: {}", spec);

        let probe = PerfResultsProbe::new(
            self.workspace.resolve(&params.result_dir),
            Some(params.prediction_type.clone()),
        );
        let outcome = self
            .poller
            .await_completion(
                &spec,
                &ExpectedJobs::Marker(self.config.job_marker.clone()),
                &probe,
            )
            .await
            .context("Hyperparameter search stage failed")?;
        log_stage("hyperparameter search", &outcome);

        Ok(outcome.into_artifact())
    }
}

fn search_wrapper(params: &PipelineParams, script_dir: &Path, config: &Path) -> JobSpec {
    JobSpec::new(
        arg(&params.python_path),
        [
            arg(&script_dir.join(SEARCH_WRAPPER)),
            "--config_file".to_string(),
            arg(config),
        ],
    )
}

fn arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn log_stage<A>(stage: &str, outcome: &PollOutcome<A>) {
    let state = outcome.state();
    match outcome {
        PollOutcome::Completed { .. } => info!(
            "Shortlist {} finished after {}s",
            stage,
            state.time_waited.as_secs()
        ),
        PollOutcome::TimedOut { .. } => warn!(
            "Shortlist {} did not finish within {} ({} of {} found), continuing",
            stage, state.max_wait, state.jobs_found, state.jobs_expected
        ),
        PollOutcome::NothingSubmitted { .. } => {
            warn!("Shortlist {} submitted no jobs, continuing", stage)
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::archive::tests::{metadata_json, write_archive};
    use shortlist_core::domain::poll::MaxWait;
    use std::fs;
    use std::time::Duration;

    struct Fixture {
        root: tempfile::TempDir,
    }

    impl Fixture {
        /// Lays out a fake pipeline checkout driven by `sh` instead of python
        fn new() -> Self {
            let root = tempfile::tempdir().unwrap();
            let base = root.path();
            let shortlist_dir = base.join("ampl/test/integrative/shortlist_test");
            fs::create_dir_all(&shortlist_dir).unwrap();
            fs::create_dir_all(base.join("ampl/utils")).unwrap();
            fs::create_dir_all(base.join("staged")).unwrap();
            fs::create_dir_all(base.join("data")).unwrap();

            let dataset = base.join("data/MRP3_dataset.csv");
            fs::write(
                shortlist_dir.join("test_shortlist.csv"),
                format!("dataset_key,bucket\n{},public\n", dataset.display()),
            )
            .unwrap();

            let feat_path = base.join("data/scaled_descriptors/MRP3_dataset_with_rdkit_raw_descriptors.csv");
            fs::write(
                shortlist_dir.join(FEATURIZE_SCRIPT),
                format!(
                    "mkdir -p {dir}\nprintf 'compound_id,d1\\nc1,0.5\\n' > {feat}\n",
                    dir = base.join("data/scaled_descriptors").display(),
                    feat = feat_path.display(),
                ),
            )
            .unwrap();

            fs::write(
                base.join("ampl").join(SEARCH_WRAPPER),
                format!(
                    "case \"$2\" in\n\
                     *split.json) printf 'dataset_key,split_uuid\\nx,y\\n' > {uuids} ;;\n\
                     *search.json) mkdir -p {results}; cp {staged}/*.tar.gz {results}/ 2>/dev/null; \
                     echo 'Submitted batch job 11'; echo 'Submitted batch job 12' ;;\n\
                     esac\n",
                    uuids = shortlist_dir.join("test_shortlist_with_uuids.csv").display(),
                    results = base.join("results").display(),
                    staged = base.join("staged").display(),
                ),
            )
            .unwrap();

            let config = format!(
                r#"{{
                    "script_dir": "{}",
                    "python_path": "sh",
                    "result_dir": "results",
                    "prediction_type": "regression",
                    "shortlist_key": "test_shortlist.csv",
                    "descriptor_type": "rdkit_raw"
                }}"#,
                base.join("ampl").display()
            );
            fs::write(base.join("split.json"), &config).unwrap();
            fs::write(base.join("search.json"), &config).unwrap();

            Self { root }
        }

        fn stage_models(&self, count: usize) {
            for i in 0..count {
                let metadata = metadata_json(
                    &format!("6a1e2a7c-4d4b-4c36-9a8b-0f3f6d2b9e{:02}", i),
                    "RF",
                    "regression",
                );
                write_archive(
                    &self.root.path().join("staged"),
                    &format!("model_{}.tar.gz", i),
                    &[("model_metadata.json", metadata.as_str())],
                );
            }
        }

        fn pipeline(&self, max_wait: MaxWait) -> ShortlistPipeline {
            let config = Config {
                workdir: self.root.path().to_path_buf(),
                wait_interval: Duration::from_millis(10),
                max_wait,
                ..Config::default()
            };
            ShortlistPipeline::new(config, Arc::new(Workspace::new(self.root.path())))
        }
    }

    #[tokio::test]
    async fn test_full_pipeline_collects_models() {
        let fixture = Fixture::new();
        fixture.stage_models(2);

        let records = fixture
            .pipeline(MaxWait::Limit(Duration::from_secs(5)))
            .run(Path::new("split.json"), Path::new("search.json"))
            .await
            .unwrap()
            .expect("search should finish");

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.model_type == "RF"));
        assert!(
            fixture
                .root
                .path()
                .join("ampl/test/integrative/shortlist_test/test_shortlist_with_uuids.csv")
                .is_file()
        );
    }

    #[tokio::test]
    async fn test_search_timeout_returns_none() {
        let fixture = Fixture::new();

        let records = fixture
            .pipeline(MaxWait::Limit(Duration::ZERO))
            .run(Path::new("split.json"), Path::new("search.json"))
            .await
            .unwrap();

        assert!(records.is_none());
    }

    #[tokio::test]
    async fn test_search_without_submitted_jobs_returns_none() {
        let fixture = Fixture::new();
        fixture.stage_models(1);
        let wrapper = fixture.root.path().join("ampl").join(SEARCH_WRAPPER);
        let script = fs::read_to_string(&wrapper).unwrap().replace(
            "echo 'Submitted batch job 11'; echo 'Submitted batch job 12'",
            "echo 'queue is full'",
        );
        fs::write(&wrapper, script).unwrap();

        let records = tokio::time::timeout(
            Duration::from_secs(10),
            fixture
                .pipeline(MaxWait::Unlimited)
                .run(Path::new("split.json"), Path::new("search.json")),
        )
        .await
        .expect("search with no submitted jobs should return")
        .unwrap();

        assert!(records.is_none());
    }

    #[tokio::test]
    async fn test_shortlist_without_rows_fails() {
        let fixture = Fixture::new();
        fs::write(
            fixture
                .root
                .path()
                .join("ampl/test/integrative/shortlist_test/test_shortlist.csv"),
            "dataset_key,bucket\n",
        )
        .unwrap();

        let result = fixture
            .pipeline(MaxWait::Limit(Duration::from_secs(1)))
            .run(Path::new("split.json"), Path::new("search.json"))
            .await;

        assert!(result.is_err());
    }
}
