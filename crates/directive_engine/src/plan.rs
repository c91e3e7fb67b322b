//! Plan construction: directives resolved against filesystem state.
//!
//! Planning is read-only. The only side-effecting work (including creating
//! the working directory itself) belongs to the execution engine; the plan
//! builder just records what exists now and what must exist later.

use std::path::{Path, PathBuf};

use log::debug;

use crate::error::EngineError;
use crate::progress::{ProgressObserver, StepKind};
use crate::types::{Directive, DirectiveKind, ExecutionPlan, PlanItem};

/// Resolves an ordered directive list into an [`ExecutionPlan`].
///
/// Relative file targets resolve against `working_dir`, never against the
/// process-wide current directory. Duplicate same-path directives all stay
/// in the plan in source order; executing them in order makes the last
/// write win while every occurrence still gets its own reported outcome.
///
/// Fails only when `working_dir` already exists as a non-directory, the
/// one turn-fatal precondition. A merely missing working directory is fine:
/// the engine ensures it before any other side effect.
pub fn build_plan(
    directives: &[Directive],
    working_dir: &Path,
    observer: &dyn ProgressObserver,
) -> Result<ExecutionPlan, EngineError> {
    let working_dir_label = working_dir.display().to_string();
    observer.start(StepKind::Analyze, &working_dir_label);

    if working_dir.exists() && !working_dir.is_dir() {
        let error = EngineError::precondition(working_dir, "path exists and is not a directory");
        observer.fail(StepKind::Analyze, &error.to_string());
        return Err(error);
    }

    let mut directories: Vec<PathBuf> = Vec::new();
    let mut files = Vec::new();
    let mut commands = Vec::new();

    for directive in directives {
        match directive.kind {
            DirectiveKind::CreateOrUpdateFile => {
                let resolved = resolve_target(working_dir, &directive.target);
                let parent = resolved
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| working_dir.to_path_buf());

                if !directories.contains(&parent) {
                    directories.push(parent.clone());
                }

                files.push(PlanItem {
                    directive: directive.clone(),
                    existed_before: resolved.exists(),
                    resolved_path: resolved,
                    parent_directory: parent,
                });
            }
            DirectiveKind::RunCommand => commands.push(directive.target.clone()),
        }
    }

    debug!(
        "planned {} dir(s), {} file(s), {} command(s) under {}",
        directories.len(),
        files.len(),
        commands.len(),
        working_dir_label,
    );
    observer.complete(
        StepKind::Analyze,
        &format!("{} file(s), {} command(s)", files.len(), commands.len()),
    );

    Ok(ExecutionPlan {
        working_dir: working_dir.to_path_buf(),
        directories,
        files,
        commands,
    })
}

fn resolve_target(working_dir: &Path, target: &str) -> PathBuf {
    let path = Path::new(target);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::build_plan;
    use crate::progress::NullObserver;
    use crate::types::Directive;

    #[test]
    fn directories_are_deduplicated_and_precede_their_files() {
        let workspace = tempdir().expect("temp workspace");
        let directives = vec![
            Directive::file("src/main.rs", "rust", "fn main() {}"),
            Directive::file("src/lib.rs", "rust", "pub fn hi() {}"),
            Directive::file("README.md", "markdown", "# hi"),
        ];

        let plan = build_plan(&directives, workspace.path(), &NullObserver)
            .expect("plan should build");

        assert_eq!(
            plan.directories,
            vec![workspace.path().join("src"), workspace.path().to_path_buf()]
        );
        assert_eq!(plan.files.len(), 3);
        for item in &plan.files {
            assert!(
                plan.directories.contains(&item.parent_directory),
                "parent of {} must be in the directory list",
                item.resolved_path.display()
            );
        }
    }

    #[test]
    fn commands_are_ordered_after_files_regardless_of_source_interleaving() {
        let workspace = tempdir().expect("temp workspace");
        let directives = vec![
            Directive::command("echo first"),
            Directive::file("a.txt", "", "a"),
            Directive::command("echo second"),
        ];

        let plan = build_plan(&directives, workspace.path(), &NullObserver)
            .expect("plan should build");

        assert_eq!(plan.commands, vec!["echo first", "echo second"]);
        assert_eq!(plan.files.len(), 1);
    }

    #[test]
    fn existed_before_reflects_plan_time_state() {
        let workspace = tempdir().expect("temp workspace");
        std::fs::write(workspace.path().join("existing.txt"), "old").expect("seed file");

        let directives = vec![
            Directive::file("existing.txt", "", "new"),
            Directive::file("fresh.txt", "", "new"),
        ];
        let plan = build_plan(&directives, workspace.path(), &NullObserver)
            .expect("plan should build");

        assert!(plan.files[0].existed_before);
        assert!(!plan.files[1].existed_before);
    }

    #[test]
    fn relative_targets_resolve_against_the_supplied_working_directory() {
        let workspace = tempdir().expect("temp workspace");
        let directives = vec![Directive::file("nested/deep/file.txt", "", "x")];

        let plan = build_plan(&directives, workspace.path(), &NullObserver)
            .expect("plan should build");

        assert_eq!(
            plan.files[0].resolved_path,
            workspace.path().join("nested/deep/file.txt")
        );
    }

    #[test]
    fn working_directory_occupied_by_a_file_is_a_fatal_precondition() {
        let outer = tempdir().expect("outer temp dir");
        let occupied = outer.path().join("occupied");
        std::fs::write(&occupied, "not a directory").expect("seed blocking file");

        let directives = vec![Directive::file("a.txt", "", "a")];
        let error = build_plan(&directives, &occupied, &NullObserver)
            .expect_err("plan must refuse a file-occupied working directory");

        assert!(error.to_string().contains("not a directory"));
    }

    #[test]
    fn missing_working_directory_is_not_a_plan_failure() {
        let outer = tempdir().expect("outer temp dir");
        let missing = outer.path().join("does-not-exist-yet");

        let plan = build_plan(&[Directive::file("a.txt", "", "a")], &missing, &NullObserver)
            .expect("missing working directory is created at execution time");

        assert_eq!(plan.working_dir, missing);
    }
}
