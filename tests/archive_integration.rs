#[path = "../src/archive.rs"]
mod archive;

use std::{
    fs,
    io::{Cursor, Write},
};

fn two_entry_archive() -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::FileOptions::default();
    zip.add_directory("assets/", options).unwrap();
    zip.start_file("assets/readme.txt", options).unwrap();
    zip.write_all(b"hello").unwrap();
    zip.finish().unwrap().into_inner()
}

#[test]
fn extracts_assets_readme() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");

    let mut last = 0.0;
    archive::extract(&two_entry_archive(), &out, |p| last = p).unwrap();

    let readme = out.join("assets").join("readme.txt");
    assert_eq!(fs::read_to_string(readme).unwrap(), "hello");
    assert_eq!(last, 1.0);
}

#[test]
fn repeated_extraction_yields_identical_tree() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");
    let data = two_entry_archive();

    archive::extract(&data, &out, |_| {}).unwrap();
    let first = fs::read(out.join("assets/readme.txt")).unwrap();
    archive::extract(&data, &out, |_| {}).unwrap();
    let second = fs::read(out.join("assets/readme.txt")).unwrap();

    assert_eq!(first, second);
}

#[test]
fn write_failure_aborts_with_path_context() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");
    fs::create_dir_all(&out).unwrap();
    // a plain file where the archive expects a directory
    fs::write(out.join("assets"), "not a dir").unwrap();

    let mut seen = Vec::new();
    let err = archive::extract(&two_entry_archive(), &out, |p| seen.push(p)).unwrap_err();

    assert!(format!("{err:#}").contains("assets"));
    assert_eq!(seen, vec![0.5]);
}
