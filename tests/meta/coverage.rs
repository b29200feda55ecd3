//! Checks that the unit test tree mirrors the source tree

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs;
    use std::path::{Path, PathBuf};
    use walkdir::WalkDir;

    const SOURCE_ROOT: &str = "src";
    const UNIT_ROOT: &str = "tests/unit";

    /// Crate roots and module declarations carry no logic of their own
    fn is_wiring(name: &str) -> bool {
        matches!(name, "main.rs" | "lib.rs" | "mod.rs")
    }

    /// Rust files and directories below `root`, relative to it
    fn module_tree(root: &str) -> BTreeSet<PathBuf> {
        let root = Path::new(root);
        WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| {
                entry.file_type().is_dir()
                    || entry.path().extension().is_some_and(|ext| ext == "rs")
            })
            .filter_map(|entry| entry.path().strip_prefix(root).ok().map(Path::to_path_buf))
            .collect()
    }

    fn is_logic(path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| !is_wiring(name))
    }

    fn listing(paths: &[&PathBuf], from: &str, to: &str) -> String {
        paths
            .iter()
            .map(|path| format!("  {from}/{0} has no {to}/{0}", path.display()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_every_module_has_unit_tests() {
        assert!(Path::new(SOURCE_ROOT).is_dir(), "run from the crate root");
        let sources = module_tree(SOURCE_ROOT);
        let units = module_tree(UNIT_ROOT);

        let untested: Vec<_> = sources
            .iter()
            .filter(|path| is_logic(path) && !units.contains(*path))
            .collect();
        assert!(
            untested.is_empty(),
            "Modules without unit tests:\n{}",
            listing(&untested, SOURCE_ROOT, UNIT_ROOT)
        );
    }

    #[test]
    fn test_every_unit_test_has_a_module() {
        let sources = module_tree(SOURCE_ROOT);
        let units = module_tree(UNIT_ROOT);

        let stale: Vec<_> = units
            .iter()
            .filter(|path| is_logic(path) && !sources.contains(*path))
            .collect();
        assert!(
            stale.is_empty(),
            "Unit tests for modules that no longer exist:\n{}",
            listing(&stale, UNIT_ROOT, SOURCE_ROOT)
        );
    }

    #[test]
    fn test_test_files_declare_tests() {
        let empty: Vec<_> = WalkDir::new("tests")
            .into_iter()
            .filter_map(Result::ok)
            .map(walkdir::DirEntry::into_path)
            .filter(|path| path.extension().is_some_and(|ext| ext == "rs") && is_logic(path))
            .filter(|path| {
                !fs::read_to_string(path).is_ok_and(|content| content.contains("#[test]"))
            })
            .collect();

        assert!(
            empty.is_empty(),
            "Test files without a #[test] function:\n{}",
            empty
                .iter()
                .map(|path| format!("  {}", path.display()))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }
}
