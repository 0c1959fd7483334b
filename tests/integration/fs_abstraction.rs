// tests/integration/fs_abstraction.rs

use std::path::{Path, PathBuf};

use testpool::config::FilesSection;
use testpool::fs::FileSystem;
use testpool::fs::mock::MockFileSystem;
use testpool::index::{FileIndex, FilePatterns, relative_path};

fn default_patterns() -> FilePatterns {
    let files = FilesSection::default();
    FilePatterns::new(&files.match_patterns, &files.ignore_patterns).unwrap()
}

#[test]
fn test_mock_fs_structure() {
    let fs = MockFileSystem::new();
    fs.add_file("./src/math.test.ts");

    assert!(fs.is_dir(Path::new(".")));
    assert!(fs.is_dir(Path::new("./src")));
    assert!(fs.is_file(Path::new("./src/math.test.ts")));
    assert!(!fs.exists(Path::new("./lib")));
    assert_eq!(
        fs.read_dir(Path::new("./src")).unwrap(),
        vec![PathBuf::from("./src/math.test.ts")]
    );
    assert!(fs.read_dir(Path::new("./src/math.test.ts")).is_err());
}

#[test]
fn test_scan_indexes_matching_files_only() {
    let fs = MockFileSystem::new();
    fs.add_file("./src/math.test.ts");
    fs.add_file("./src/math.ts");
    fs.add_file("./spec/io.spec.js");
    fs.add_file("./README.md");
    fs.add_file("./node_modules/dep/index.test.js");
    fs.add_file("./target/debug/build.test.rs");

    let index = FileIndex::scan(&fs, ".", default_patterns()).unwrap();

    let files: Vec<String> = index.files().into_iter().map(|f| f.relative).collect();
    assert_eq!(
        files,
        vec!["spec/io.spec.js".to_string(), "src/math.test.ts".to_string()]
    );
}

#[test]
fn test_lookup_accepts_dot_slash_prefix() {
    let fs = MockFileSystem::new();
    fs.add_file("./src/math.test.ts");

    let index = FileIndex::scan(&fs, ".", default_patterns()).unwrap();

    let by_plain = index.lookup("src/math.test.ts").expect("indexed");
    let by_dotted = index.lookup("./src/math.test.ts").expect("indexed");
    assert_eq!(by_plain, by_dotted);
    assert_eq!(by_plain.absolute, PathBuf::from("./src/math.test.ts"));
    assert!(index.lookup("src/math.ts").is_none());
}

#[test]
fn test_insert_and_remove_follow_patterns() {
    let index = FileIndex::empty("/work/project", default_patterns());

    assert!(index.insert_path(Path::new("/work/project/a.test.ts")).is_some());
    assert!(index.insert_path(Path::new("/work/project/a.ts")).is_none());
    assert!(index.insert_path(Path::new("/elsewhere/b.test.ts")).is_none());
    assert_eq!(index.len(), 1);

    assert!(index.remove_path(Path::new("/work/project/a.test.ts")));
    assert!(!index.remove_path(Path::new("/work/project/a.test.ts")));
    assert!(index.is_empty());
}

#[test]
fn test_relative_path_never_absolute() {
    let root = Path::new("/work/project");

    assert_eq!(
        relative_path(root, Path::new("/work/project/src/a.test.ts")),
        PathBuf::from("src/a.test.ts")
    );
    assert_eq!(
        relative_path(root, Path::new("/work/shared/b.test.ts")),
        PathBuf::from("../shared/b.test.ts")
    );
    assert_eq!(
        relative_path(root, Path::new("already/relative.ts")),
        PathBuf::from("already/relative.ts")
    );
}
