//! The per-test execution and caching lifecycle

use crate::agent::{AgentReport, EvalRequest, ExecutionAgent, ProcessAgent};
use crate::policy;
use crate::stats::{Counters, RunnerStats};
use crate::transpiler::{
    CommandTranspiler, PassthroughTranspiler, TranspileError, TranspileOptions, Transpiler,
};
use conformer_cache::{cache_key, content_hash, CacheStore, CompressionConfig};
use conformer_config::RunnerConfig;
use conformer_core::{CacheRecord, Error, Outcome, Result, TestDescriptor};
use conformer_utils::deadline::{race, Raced};
use conformer_utils::tracing::{cache_event, test_completed, test_span};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Runs single tests against a shared cache store and execution agent.
///
/// Invocations may run concurrently. Each owns its own state; the store, the
/// transpiler and the agent are shared. Cache access is read-then-write with
/// no lock across the two, so concurrent runs of one test both evaluate and
/// the last write wins.
pub struct TestRunner {
    config: RunnerConfig,
    store: Arc<CacheStore>,
    transpiler: Arc<dyn Transpiler>,
    agent: Arc<dyn ExecutionAgent>,
    counters: Counters,
}

impl TestRunner {
    pub fn new(
        config: RunnerConfig,
        store: Arc<CacheStore>,
        transpiler: Arc<dyn Transpiler>,
        agent: Arc<dyn ExecutionAgent>,
    ) -> Self {
        Self {
            config,
            store,
            transpiler,
            agent,
            counters: Counters::default(),
        }
    }

    /// Open the cache store under `config.cache_dir` and build a runner
    pub fn setup(
        config: RunnerConfig,
        transpiler: Arc<dyn Transpiler>,
        agent: Arc<dyn ExecutionAgent>,
    ) -> Result<Self> {
        let compression = if config.compression {
            CompressionConfig::default()
        } else {
            CompressionConfig::disabled()
        };
        let store = CacheStore::open(&config.cache_dir, compression)?;

        tracing::debug!(
            store = %store.path().display(),
            entries = store.len(),
            timeout_ms = config.timeout.as_millis() as u64,
            "test runner ready"
        );

        Ok(Self::new(config, Arc::new(store), transpiler, agent))
    }

    /// Build a runner from the commands named in `config`: a
    /// [`ProcessAgent`] plus a [`CommandTranspiler`] when one is configured.
    pub fn from_config(config: RunnerConfig) -> Result<Self> {
        let agent = config
            .agent
            .clone()
            .ok_or_else(|| Error::configuration("no execution agent command configured"))?;

        let transpiler: Arc<dyn Transpiler> = match config.transpiler.clone() {
            Some(command) => Arc::new(CommandTranspiler::new(command)),
            None => Arc::new(PassthroughTranspiler),
        };

        Self::setup(config, transpiler, Arc::new(ProcessAgent::new(agent)))
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    pub fn stats(&self) -> RunnerStats {
        self.counters.snapshot()
    }

    /// Run `test` with the configured deadline
    pub async fn run(&self, test: &TestDescriptor) -> Result<Outcome> {
        self.run_with_timeout(test, self.config.timeout).await
    }

    /// Run `test`, terminating the agent if it takes longer than `timeout`.
    ///
    /// Errors are infrastructure failures (unreadable test file, broken
    /// store, agent that cannot start). Anything the test itself does is an
    /// [`Outcome`].
    pub async fn run_with_timeout(&self, test: &TestDescriptor, timeout: Duration) -> Result<Outcome> {
        self.execute(test, timeout)
            .instrument(test_span(&test.file))
            .await
    }

    async fn execute(&self, test: &TestDescriptor, timeout: Duration) -> Result<Outcome> {
        let started = Instant::now();
        Counters::bump(&self.counters.invocations);

        let path = self.config.resolve_test_path(test.path());
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Error::file_system(&path, "read test file", e))?;

        let cacheable = match policy::side_effect_token(&raw) {
            Some(token) => {
                tracing::debug!(token, "side effect token found, bypassing cache");
                Counters::bump(&self.counters.bypassed);
                false
            }
            None => true,
        };

        let key = cache_key(&test.attrs, &test.file)?;

        let options = TranspileOptions {
            features: test.attrs.features.clone(),
            is_module: test.attrs.is_module(),
            is_strict: false,
        };
        let transpiled = match self.transpiler.transpile(&test.contents, &options) {
            Ok(source) => source,
            Err(TranspileError::Rejected { message, .. }) => {
                Counters::bump(&self.counters.parse_failures);
                let outcome = Outcome::ParseFailure { error: message };
                test_completed(&test.file, outcome.kind(), elapsed_ms(started), false);
                return Ok(outcome);
            }
            Err(TranspileError::Unavailable { message }) => {
                tracing::error!(error = %message, "transpiler unavailable");
                return Err(Error::transpiler(message));
            }
        };
        let hash = content_hash(&transpiled);

        if cacheable {
            match self.store.get(&key)? {
                Some(record) => match record.reuse_for(&hash) {
                    Some(outcome) => {
                        Counters::bump(&self.counters.cache_hits);
                        cache_event(&test.file, true, "content hash matched");
                        test_completed(&test.file, outcome.kind(), elapsed_ms(started), true);
                        return Ok(outcome.clone());
                    }
                    None => {
                        Counters::bump(&self.counters.cache_misses);
                        cache_event(&test.file, false, "content hash changed");
                    }
                },
                None => {
                    Counters::bump(&self.counters.cache_misses);
                    cache_event(&test.file, false, "no record");
                }
            }
        }

        let request = EvalRequest {
            attrs: test.attrs.clone(),
            contents: transpiled,
            file: path,
        };
        let outcome = self.evaluate(request, &test.file, timeout).await?;

        if cacheable && outcome.is_cacheable() {
            self.store.put(&key, &CacheRecord::new(hash, outcome.clone()))?;
        }

        test_completed(&test.file, outcome.kind(), elapsed_ms(started), false);
        Ok(outcome)
    }

    async fn evaluate(&self, request: EvalRequest, file: &str, timeout: Duration) -> Result<Outcome> {
        Counters::bump(&self.counters.evaluations);
        let cancel = CancellationToken::new();

        match race(self.agent.evaluate(request, cancel.clone()), timeout).await {
            Raced::Settled(report) => Ok(classify(report?)),
            Raced::Expired(pending) => {
                cancel.cancel();
                self.agent.terminate();
                drop(pending);
                Counters::bump(&self.counters.timeouts);

                let ms = timeout.as_millis();
                tracing::warn!(timeout_ms = ms as u64, "evaluation timed out, agent terminated");
                Ok(Outcome::TimeoutFailure {
                    error: format!("test {file} timed out after {ms} ms"),
                })
            }
        }
    }
}

impl std::fmt::Debug for TestRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestRunner")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

fn classify(report: AgentReport) -> Outcome {
    match report.error {
        Some(error) => Outcome::RuntimeFailure { error },
        None => Outcome::Success {
            output: report.stdout.unwrap_or_default(),
        },
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
