//! Migration Engine
//!
//! The engine that orchestrates a run end to end:
//! - Plan validation and anchor compilation (at construction)
//! - Loading the document once
//! - Executing the pipeline
//! - Persisting the final buffer, unless in dry run mode
//!
//! A fatal error at any stage means nothing is written.

use std::path::{Path, PathBuf};

use log::info;

use crate::document::Document;
use crate::error::MigrateError;
use crate::migration::MigrationPlan;
use crate::report::PipelineRun;

use super::pipeline::Pipeline;

/// Migration engine bound to one document.
///
/// # Example
///
/// ```rust,no_run
/// use docmigrate::execution::Engine;
/// use docmigrate::migration::load_plan;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let plan = load_plan("migration.yaml")?;
///     let mut engine = Engine::from_plan(&plan, "src/routes.ts")?;
///     engine.set_dry_run(true);
///
///     let run = engine.run()?;
///     println!("{}", run.summary());
///     Ok(())
/// }
/// ```
pub struct Engine {
    pipeline: Pipeline,
    document_path: PathBuf,
    dry_run: bool,
}

impl Engine {
    /// Creates an engine for an already compiled pipeline.
    pub fn new(pipeline: Pipeline, document_path: impl Into<PathBuf>) -> Self {
        Self {
            pipeline,
            document_path: document_path.into(),
            dry_run: false,
        }
    }

    /// Validates the plan and compiles its anchors.
    ///
    /// Configuration errors surface here, before the document is touched.
    pub fn from_plan(
        plan: &MigrationPlan,
        document_path: impl Into<PathBuf>,
    ) -> Result<Self, MigrateError> {
        Ok(Self::new(Pipeline::from_plan(plan)?, document_path))
    }

    /// Enables or disables dry run mode.
    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    pub fn document_path(&self) -> &Path {
        &self.document_path
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Executes the migration.
    ///
    /// # Returns
    ///
    /// * `Ok(PipelineRun)` - Every step ran; individual skips are not failures
    /// * `Err(DocumentLoad)` - The document could not be read; no step ran
    /// * `Err(DocumentWrite)` - The result could not be written; the
    ///   original is untouched and the run is carried in the error
    pub fn run(&self) -> Result<PipelineRun, MigrateError> {
        let document = Document::load(&self.document_path)?;

        info!(
            "Starting migration of {} ({} steps, dry run: {})",
            document.path.display(),
            self.pipeline.len(),
            self.dry_run
        );

        let mut run = self.pipeline.execute(document.content);
        run.document = Some(document.path);
        run.dry_run = self.dry_run;

        if self.dry_run {
            info!("Dry run: document not written");
            return Ok(run);
        }

        self.write_back(run)
    }

    /// Persists the final buffer, handing the run back inside the error if
    /// the write fails.
    fn write_back(&self, mut run: PipelineRun) -> Result<PipelineRun, MigrateError> {
        match Document::persist(&self.document_path, &run.final_content) {
            Ok(()) => {
                run.persisted = true;
                Ok(run)
            }
            Err(source) => Err(MigrateError::DocumentWrite {
                path: self.document_path.clone(),
                source,
                run: Box::new(run),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::AnchorSpec;
    use crate::migration::MigrationStep;
    use crate::report::SkipReason;
    use std::fs;
    use tempfile::tempdir;

    const SCENARIO_INPUT: &str = "start\nSTEP_A_MARK\nend";
    const SCENARIO_OUTPUT: &str = "start\nSTEP_A_MARK\nSTEP_B_MARK\nend";

    fn guarded_step() -> MigrationStep {
        MigrationStep::new(
            "add-step-b",
            AnchorSpec::literal("STEP_A_MARK").with_not_followed_by("\nSTEP_B_MARK"),
            "STEP_A_MARK\nSTEP_B_MARK",
        )
    }

    fn write_doc(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("routes.ts");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_scenario_applies_then_skips() {
        let temp_dir = tempdir().unwrap();
        let path = write_doc(temp_dir.path(), SCENARIO_INPUT);
        let plan = MigrationPlan::from_steps(vec![guarded_step()]);

        let engine = Engine::from_plan(&plan, &path).unwrap();

        let first = engine.run().unwrap();
        assert_eq!(first.applied_steps(), vec!["add-step-b"]);
        assert!(first.persisted);
        assert_eq!(fs::read_to_string(&path).unwrap(), SCENARIO_OUTPUT);

        let second = engine.run().unwrap();
        assert_eq!(second.skipped_steps(), vec!["add-step-b"]);
        assert_eq!(second.final_content, SCENARIO_OUTPUT);
        assert_eq!(fs::read_to_string(&path).unwrap(), SCENARIO_OUTPUT);
    }

    #[test]
    fn test_unguarded_anchor_reapplies() {
        // Known limitation: a replacement that keeps its own anchor intact
        // matches again on every run unless the anchor carries a guard.
        let temp_dir = tempdir().unwrap();
        let path = write_doc(temp_dir.path(), SCENARIO_INPUT);
        let plan = MigrationPlan::from_steps(vec![MigrationStep::new(
            "add-step-b",
            AnchorSpec::literal("STEP_A_MARK"),
            "STEP_A_MARK\nSTEP_B_MARK",
        )]);
        let engine = Engine::from_plan(&plan, &path).unwrap();

        engine.run().unwrap();
        let second = engine.run().unwrap();

        assert_eq!(second.applied_count(), 1);
        assert_eq!(
            second.final_content,
            "start\nSTEP_A_MARK\nSTEP_B_MARK\nSTEP_B_MARK\nend"
        );
    }

    #[test]
    fn test_idempotent_across_runs() {
        let temp_dir = tempdir().unwrap();
        let path = write_doc(temp_dir.path(), "fn main() {\n    legacy_call();\n}\n");
        let plan = MigrationPlan::from_steps(vec![
            MigrationStep::new("rename", AnchorSpec::literal("legacy_call();"), "modern_call();")
                .with_applied_marker("modern_call();"),
            MigrationStep::new(
                "annotate",
                AnchorSpec::literal("    modern_call();").with_not_preceded_by("// migrated\n"),
                "// migrated\n    modern_call();",
            )
            .requires("rename"),
        ]);
        let engine = Engine::from_plan(&plan, &path).unwrap();

        let first = engine.run().unwrap();
        assert_eq!(first.applied_count(), 2);
        let after_first = fs::read_to_string(&path).unwrap();

        let second = engine.run().unwrap();
        assert_eq!(second.applied_count(), 0);
        assert_eq!(second.final_content, after_first);
        assert_eq!(fs::read_to_string(&path).unwrap(), after_first);
        assert_eq!(
            second.outcome("rename").and_then(|o| o.skip_reason.clone()),
            Some(SkipReason::AlreadyApplied)
        );
    }

    #[test]
    fn test_count_mismatch_skips() {
        let temp_dir = tempdir().unwrap();
        let content = "STEP_A_MARK\nSTEP_A_MARK\n";
        let path = write_doc(temp_dir.path(), content);
        let engine =
            Engine::from_plan(&MigrationPlan::from_steps(vec![guarded_step()]), &path).unwrap();

        let run = engine.run().unwrap();

        assert_eq!(run.applied_count(), 0);
        assert_eq!(run.outcomes[0].match_count, 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), content);
    }

    #[test]
    fn test_dry_run_does_not_write() {
        let temp_dir = tempdir().unwrap();
        let path = write_doc(temp_dir.path(), SCENARIO_INPUT);
        let mut engine =
            Engine::from_plan(&MigrationPlan::from_steps(vec![guarded_step()]), &path).unwrap();
        engine.set_dry_run(true);

        let run = engine.run().unwrap();

        assert!(run.dry_run);
        assert!(!run.persisted);
        assert!(run.changed);
        assert_eq!(run.final_content, SCENARIO_OUTPUT);
        assert_eq!(fs::read_to_string(&path).unwrap(), SCENARIO_INPUT);
    }

    #[test]
    fn test_configuration_error_before_document_touched() {
        let temp_dir = tempdir().unwrap();
        let path = write_doc(temp_dir.path(), SCENARIO_INPUT);
        let plan = MigrationPlan::from_steps(vec![
            guarded_step(),
            MigrationStep::new("empty", AnchorSpec::new(Vec::<String>::new()), "x"),
        ]);

        let err = Engine::from_plan(&plan, &path).err().unwrap();

        assert!(matches!(err, MigrateError::Configuration { ref step, .. } if step == "empty"));
        assert_eq!(err.exit_code(), crate::error::EXIT_CONFIGURATION);
        assert_eq!(fs::read_to_string(&path).unwrap(), SCENARIO_INPUT);
    }

    #[test]
    fn test_missing_document() {
        let temp_dir = tempdir().unwrap();
        let engine = Engine::from_plan(
            &MigrationPlan::from_steps(vec![guarded_step()]),
            temp_dir.path().join("absent.ts"),
        )
        .unwrap();

        let err = engine.run().unwrap_err();
        assert!(matches!(err, MigrateError::DocumentLoad { .. }));
        assert_eq!(err.exit_code(), crate::error::EXIT_DOCUMENT);
    }

    fn bundled_plan() -> MigrationPlan {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("plans/repo-migration-routes.yaml");
        crate::migration::load_plan(path).unwrap()
    }

    const E2E_ANCHOR: &str = "    emitAgentCompleted(migrationId, 'e2e-test-validator', e2eTestOutput);\n    logger.info('✅ [E2E TEST VALIDATOR] Complete');\n";

    #[test]
    fn test_bundled_plan_holds_back_dependent_step() {
        let temp_dir = tempdir().unwrap();
        let path = write_doc(temp_dir.path(), E2E_ANCHOR);
        let engine = Engine::from_plan(&bundled_plan(), &path).unwrap();

        let run = engine.run().unwrap();

        assert_eq!(run.applied_count(), 0);
        assert_eq!(
            run.outcome("generate-after-e2e")
                .and_then(|o| o.skip_reason.clone()),
            Some(SkipReason::RequirementNotMet {
                step: "defer-service-generation".to_string()
            })
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), E2E_ANCHOR);
    }

    #[test]
    fn test_bundled_plan_completes_partially_migrated_route() {
        let temp_dir = tempdir().unwrap();
        let content = format!(
            "{}\n{}\n{}\n{}",
            "      serviceGenRawOutput = `Service specifications prepared. Code generation will occur after validation.`;",
            "      frontendGenRawOutput = `Frontend specifications prepared. Code generation will occur after validation.`;",
            "    // ZIP ARCHIVE CREATION MOVED TO END OF WORKFLOW",
            E2E_ANCHOR
        );
        let path = write_doc(temp_dir.path(), &content);
        let engine = Engine::from_plan(&bundled_plan(), &path).unwrap();

        let first = engine.run().unwrap();
        assert_eq!(first.applied_steps(), vec!["generate-after-e2e"]);
        assert_eq!(
            first.outcome("defer-service-generation")
                .and_then(|o| o.skip_reason.clone()),
            Some(SkipReason::AlreadyApplied)
        );
        assert!(first.final_content.contains("// CODE GENERATION STEP"));

        let second = engine.run().unwrap();
        assert_eq!(second.applied_count(), 0);
        assert_eq!(second.final_content, first.final_content);
        assert_eq!(
            second.outcome("generate-after-e2e")
                .and_then(|o| o.skip_reason.clone()),
            Some(SkipReason::AlreadyApplied)
        );
    }

    #[test]
    fn test_write_failure_carries_run() {
        let temp_dir = tempdir().unwrap();
        let path = write_doc(temp_dir.path(), SCENARIO_INPUT);
        let engine =
            Engine::from_plan(&MigrationPlan::from_steps(vec![guarded_step()]), &path).unwrap();
        let run = engine.pipeline().execute(fs::read_to_string(&path).unwrap());

        // A non-empty directory now sits where the document was
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "kept").unwrap();

        let err = engine.write_back(run).unwrap_err();

        assert_eq!(err.exit_code(), crate::error::EXIT_DOCUMENT);
        match err {
            MigrateError::DocumentWrite { path: failed, run, .. } => {
                assert_eq!(failed, path);
                assert_eq!(run.final_content, SCENARIO_OUTPUT);
                assert_eq!(run.applied_steps(), vec!["add-step-b"]);
                assert!(!run.persisted);
            }
            other => panic!("unexpected error: {}", other),
        }

        assert!(path.is_dir());
        assert_eq!(fs::read_to_string(path.join("keep")).unwrap(), "kept");
        let entries: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_bundled_plan_rerun_recognises_ark_frontend_step() {
        let temp_dir = tempdir().unwrap();
        let content = concat!(
            "    if (arkResult.success) {\n",
            "      // Also generate actual files using local generator for download\n",
            "      const mfeGenerator = new AngularMicroFrontendGenerator();\n",
            "      for (const mfe of migrationPlan.microFrontends) {\n",
            "        await mfeGenerator.generateMicroFrontend(outputDir, mfe);\n",
            "      }\n",
            "      }\n",
            "    } else {\n",
            "      fallback();\n",
            "    }\n",
        );
        let path = write_doc(temp_dir.path(), content);
        let engine = Engine::from_plan(&bundled_plan(), &path).unwrap();

        let first = engine.run().unwrap();
        assert_eq!(first.applied_steps(), vec!["defer-frontend-generation-ark"]);
        assert!(!first.final_content.contains("mfeGenerator"));

        let second = engine.run().unwrap();
        assert_eq!(second.applied_count(), 0);
        assert_eq!(
            second
                .outcome("defer-frontend-generation-ark")
                .and_then(|o| o.skip_reason.clone()),
            Some(SkipReason::AlreadyApplied)
        );
        assert_eq!(
            second
                .outcome("defer-service-generation-ark")
                .and_then(|o| o.skip_reason.clone()),
            Some(SkipReason::AnchorNotFound)
        );
    }

    #[test]
    fn test_engine_configuration() {
        let pipeline = Pipeline::new(vec![guarded_step()]).unwrap();
        let mut engine = Engine::new(pipeline, "doc.ts");

        assert!(!engine.dry_run);
        engine.set_dry_run(true);
        assert!(engine.dry_run);
        assert_eq!(engine.document_path(), Path::new("doc.ts"));
        assert_eq!(engine.pipeline().len(), 1);
    }
}
