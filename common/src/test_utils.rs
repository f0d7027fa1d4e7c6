use std::path::PathBuf;

/// Workspace root, one level above the calling crate's manifest directory.
fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// Returns a fresh, empty directory under `test_output/` for one test.
///
/// Tests run in parallel, so every test passes its own `name`.
pub fn test_output_dir(name: &str) -> PathBuf {
    let dir = workspace_root().join("test_output").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir)
        .unwrap_or_else(|e| panic!("Failed to create test output dir {:?}: {}", dir, e));
    dir
}

