use clap::Args;
use conformer_config::{CommandSpec, RunnerConfig};
use conformer_core::{Outcome, TestAttributes, TestDescriptor, TestFlags};
use conformer_task::TestRunner;
use eyre::WrapErr;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Directory test paths are relative to
    #[arg(long, value_name = "DIR")]
    test_root: Option<PathBuf>,

    /// Directory holding cache.store
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Treat the tests as modules
    #[arg(long)]
    module: bool,

    /// Feature the tests exercise (repeatable)
    #[arg(long = "feature", value_name = "FEATURE")]
    features: Vec<String>,

    /// Per-test deadline in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Store cache records uncompressed
    #[arg(long)]
    no_compression: bool,

    /// Host command that evaluates a test script
    #[arg(long, value_name = "CMD")]
    agent: Option<String>,

    /// Extra argument for the agent command (repeatable)
    #[arg(long = "agent-arg", value_name = "ARG", allow_hyphen_values = true)]
    agent_args: Vec<String>,

    /// Command that transpiles sources from stdin to stdout
    #[arg(long, value_name = "CMD")]
    transpiler: Option<String>,

    /// Extra argument for the transpiler command (repeatable)
    #[arg(long = "transpiler-arg", value_name = "ARG", allow_hyphen_values = true)]
    transpiler_args: Vec<String>,

    /// Test files, relative to the test root
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,
}

/// One line of run output: the file plus its flattened outcome
#[derive(Serialize)]
struct Report<'a> {
    file: &'a str,
    #[serde(flatten)]
    outcome: &'a Outcome,
}

impl RunArgs {
    pub async fn execute(self, config: RunnerConfig) -> eyre::Result<()> {
        let config = self.apply(config);
        let runner = TestRunner::from_config(config)?;

        let attrs = TestAttributes {
            flags: TestFlags {
                module: self.module,
                ..TestFlags::default()
            },
            features: self.features.clone(),
            ..TestAttributes::default()
        };

        let mut failed = 0usize;
        for file in &self.files {
            let test = self.descriptor(runner.config(), file, &attrs)?;
            let outcome = runner.run(&test).await?;
            if !outcome.is_success() {
                failed += 1;
            }

            let line = serde_json::to_string(&Report {
                file: &test.file,
                outcome: &outcome,
            })?;
            println!("{line}");
        }

        let stats = runner.stats();
        tracing::info!(
            tests = stats.invocations,
            failed,
            evaluated = stats.evaluations,
            cache_hits = stats.cache_hits,
            bypassed = stats.bypassed,
            timeouts = stats.timeouts,
            parse_failures = stats.parse_failures,
            "run finished"
        );
        Ok(())
    }

    /// Layer command-line flags over the loaded configuration
    fn apply(&self, mut config: RunnerConfig) -> RunnerConfig {
        if let Some(root) = &self.test_root {
            config.test_root = root.clone();
        }
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = dir.clone();
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout = Duration::from_millis(ms);
        }
        if self.no_compression {
            config.compression = false;
        }
        if let Some(program) = &self.agent {
            config.agent = Some(CommandSpec {
                program: program.clone(),
                args: self.agent_args.clone(),
            });
        }
        if let Some(program) = &self.transpiler {
            config.transpiler = Some(CommandSpec {
                program: program.clone(),
                args: self.transpiler_args.clone(),
            });
        }
        config
    }

    fn descriptor(
        &self,
        config: &RunnerConfig,
        file: &Path,
        attrs: &TestAttributes,
    ) -> eyre::Result<TestDescriptor> {
        let relative = file.strip_prefix(&config.test_root).unwrap_or(file);
        let path = config.resolve_test_path(relative);
        let contents = std::fs::read_to_string(&path)
            .wrap_err_with(|| format!("failed to read test file '{}'", path.display()))?;

        Ok(TestDescriptor::new(
            attrs.clone(),
            contents,
            relative.to_string_lossy(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: RunArgs,
    }

    #[test]
    fn test_flags_override_config() {
        let harness = Harness::parse_from([
            "run",
            "--test-root",
            "/suite",
            "--timeout-ms",
            "250",
            "--agent",
            "node",
            "--agent-arg",
            "--harmony",
            "--no-compression",
            "a.js",
        ]);

        let config = harness.args.apply(RunnerConfig::default());
        assert_eq!(config.test_root, PathBuf::from("/suite"));
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert!(!config.compression);
        assert_eq!(
            config.agent,
            Some(CommandSpec::new("node").arg("--harmony"))
        );
        assert_eq!(config.transpiler, None);
    }

    #[test]
    fn test_report_flattens_outcome() {
        let outcome = Outcome::Success {
            output: "ok".to_string(),
        };
        let line = serde_json::to_value(Report {
            file: "a.js",
            outcome: &outcome,
        })
        .unwrap();
        assert_eq!(
            line,
            serde_json::json!({"file": "a.js", "result": "success", "output": "ok"})
        );
    }
}
