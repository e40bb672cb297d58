//! Plan Parser
//!
//! Loads migration plans from YAML files. Replacement text kept in
//! separate files (`replacement_file`) is read here, relative to the plan's
//! own directory, so the rest of the engine only ever sees literal text.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::model::MigrationPlan;
use crate::error::MigrateError;

/// Loads a migration plan from a YAML file.
///
/// The plan is parsed and its replacement files are resolved; structural
/// validation and anchor compilation happen later in
/// [`prepare_plan`](super::planner::prepare_plan).
///
/// # Example
///
/// ```rust,no_run
/// use docmigrate::migration::load_plan;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let plan = load_plan("migration.yaml")?;
///     println!("Loaded {} steps", plan.steps.len());
///     Ok(())
/// }
/// ```
pub fn load_plan(path: impl AsRef<Path>) -> Result<MigrationPlan, MigrateError> {
    let path = path.as_ref();
    info!("Loading plan from: {}", path.display());

    let yaml_content = fs::read_to_string(path).map_err(|e| MigrateError::PlanLoad {
        path: path.to_path_buf(),
        reason: format!("{}. Check that the file exists and is readable.", e),
    })?;

    debug!("YAML content loaded ({} bytes)", yaml_content.len());

    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    parse_plan(&yaml_content, &base_dir).map_err(|e| match e {
        MigrateError::PlanLoad { reason, .. } => MigrateError::PlanLoad {
            path: path.to_path_buf(),
            reason,
        },
        other => other,
    })
}

/// Parses plan YAML, resolving replacement files against `base_dir`.
pub fn parse_plan(yaml_content: &str, base_dir: &Path) -> Result<MigrationPlan, MigrateError> {
    let mut plan: MigrationPlan =
        serde_yaml::from_str(yaml_content).map_err(|e| MigrateError::PlanLoad {
            path: PathBuf::new(),
            reason: format!("invalid plan YAML: {}", e),
        })?;

    resolve_replacement_files(&mut plan, base_dir)?;

    info!(
        "Parsed plan '{}' with {} steps",
        plan.name.as_deref().unwrap_or("unnamed"),
        plan.steps.len()
    );

    Ok(plan)
}

/// Inlines every `replacement_file` into its step's `replacement`.
fn resolve_replacement_files(plan: &mut MigrationPlan, base_dir: &Path) -> Result<(), MigrateError> {
    for step in &mut plan.steps {
        let Some(file) = step.replacement_file.take() else {
            continue;
        };

        if !step.replacement.is_empty() {
            return Err(MigrateError::configuration(
                &step.id,
                "sets both replacement and replacement_file",
            ));
        }

        let full_path = base_dir.join(&file);
        step.replacement = fs::read_to_string(&full_path).map_err(|e| MigrateError::PlanLoad {
            path: full_path.clone(),
            reason: format!("replacement for step '{}' is unreadable: {}", step.id, e),
        })?;

        debug!(
            "Step '{}': replacement read from {} ({} bytes)",
            step.id,
            full_path.display(),
            step.replacement.len()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_plan() {
        let yaml = r#"
name: demo
document: doc.txt
steps:
  - id: add-b
    anchor:
      fences: STEP_A_MARK
      not_followed_by: "\nSTEP_B_MARK"
    replacement: "STEP_A_MARK\nSTEP_B_MARK"
"#;
        let plan = parse_plan(yaml, Path::new(".")).unwrap();

        assert_eq!(plan.name.as_deref(), Some("demo"));
        assert_eq!(plan.document, Some(PathBuf::from("doc.txt")));
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].replacement, "STEP_A_MARK\nSTEP_B_MARK");
        assert_eq!(
            plan.steps[0].anchor.not_followed_by.as_deref(),
            Some("\nSTEP_B_MARK")
        );
    }

    #[test]
    fn test_load_plan_file_not_found() {
        let err = load_plan("/nonexistent/path/migration.yaml").unwrap_err();
        assert!(matches!(err, MigrateError::PlanLoad { .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_load_plan_invalid_yaml() {
        let temp_dir = tempdir().unwrap();
        let plan_path = temp_dir.path().join("bad.yaml");
        fs::write(&plan_path, "steps: [[[").unwrap();

        match load_plan(&plan_path).unwrap_err() {
            MigrateError::PlanLoad { path, reason } => {
                assert_eq!(path, plan_path);
                assert!(reason.starts_with("invalid plan YAML"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_load_plan_resolves_replacement_file() {
        let temp_dir = tempdir().unwrap();
        fs::create_dir(temp_dir.path().join("snippets")).unwrap();
        fs::write(temp_dir.path().join("snippets/block.ts"), "const x = 1;\n").unwrap();

        let plan_path = temp_dir.path().join("plan.yaml");
        fs::write(
            &plan_path,
            r#"
steps:
  - id: insert
    anchor: { fences: "// HERE" }
    replacement_file: snippets/block.ts
"#,
        )
        .unwrap();

        let plan = load_plan(&plan_path).unwrap();
        assert_eq!(plan.steps[0].replacement, "const x = 1;\n");
        assert!(plan.steps[0].replacement_file.is_none());
    }

    #[test]
    fn test_missing_replacement_file() {
        let temp_dir = tempdir().unwrap();
        let plan_path = temp_dir.path().join("plan.yaml");
        fs::write(
            &plan_path,
            r#"
steps:
  - id: insert
    anchor: { fences: "// HERE" }
    replacement_file: nowhere.ts
"#,
        )
        .unwrap();

        match load_plan(&plan_path).unwrap_err() {
            MigrateError::PlanLoad { path, reason } => {
                assert_eq!(path, plan_path);
                assert!(reason.contains("insert"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_replacement_and_file_conflict() {
        let yaml = r#"
steps:
  - id: both
    anchor: { fences: "X" }
    replacement: "Y"
    replacement_file: y.txt
"#;
        let err = parse_plan(yaml, Path::new(".")).unwrap_err();
        assert!(matches!(err, MigrateError::Configuration { ref step, .. } if step == "both"));
    }

    #[test]
    fn test_bundled_plan_parses() {
        let plan_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("plans/repo-migration-routes.yaml");
        let plan = load_plan(&plan_path).unwrap();

        assert_eq!(plan.steps.len(), 7);
        assert!(plan.steps.iter().all(|s| !s.replacement.is_empty()));
        assert!(crate::migration::prepare_plan(&plan).is_ok());

        // Every step can tell "already migrated" apart from "never present"
        for step in &plan.steps {
            let marker = step.applied_marker.as_deref().unwrap_or_default();
            assert!(!marker.is_empty(), "step '{}' has no marker", step.id);
            assert!(step.replacement.contains(marker), "step '{}'", step.id);
        }
    }
}
