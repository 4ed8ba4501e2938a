/*!
 * Tests for file utility functions
 */

use std::fs;
use std::path::Path;
use anyhow::Result;
use skelweave::file_utils::FileManager;
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "test_file_exists.tmp", "test content")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::dir_exists(&test_file));
    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tmp"));
}

/// Test that generate_output_path inserts the locale before the extension
#[test]
fn test_generate_output_path_withValidInputs_shouldCreateCorrectPath() {
    let output_path = FileManager::generate_output_path(Path::new("/tmp/input/menu.xml"), Path::new("/tmp/output"), "fr-CA");
    assert_eq!(output_path, Path::new("/tmp/output/menu.fr-CA.xml"));

    let no_extension = FileManager::generate_output_path("README", "/tmp/output", "de");
    assert_eq!(no_extension, Path::new("/tmp/output/README.de"));
}

/// Test that artefact paths replace the extension
#[test]
fn test_artefact_path_withExtension_shouldReplaceIt() {
    let path = FileManager::artefact_path("/data/menu.xml", "/tmp/out", ".skl");
    assert_eq!(path, Path::new("/tmp/out/menu.skl"));
}

/// Test finding files by extension in sorted order
#[test]
fn test_find_files_withMixedExtensions_shouldReturnMatchesSorted() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "b.xml", "<b/>")?;
    common::create_test_file(temp_dir.path(), "a.XML", "<a/>")?;
    common::create_test_file(temp_dir.path(), "notes.txt", "x")?;
    common::create_test_file(temp_dir.path(), "sub/c.xml", "<c/>")?;

    let found = FileManager::find_files(temp_dir.path(), "xml")?;
    let names: Vec<String> = found
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["a.XML", "b.xml", "c.xml"]);
    Ok(())
}

/// Test writing into a directory that does not exist yet
#[test]
fn test_write_to_file_withMissingParent_shouldCreateIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("deep").join("er").join("out.txt");

    FileManager::write_to_file(&path, "content")?;
    assert_eq!(FileManager::read_to_string(&path)?, "content");
    Ok(())
}

/// Test that log lines are appended with a timestamp
#[test]
fn test_append_to_log_file_withTwoWrites_shouldAppend() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("run.log");

    FileManager::append_to_log_file(&path, "first")?;
    FileManager::append_to_log_file(&path, "second")?;

    let content = fs::read_to_string(&path)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with('[') && lines[0].ends_with("] first"));
    assert!(lines[1].ends_with("] second"));
    Ok(())
}

/// Test the SHA-256 digest helper
#[test]
fn test_hash_text_withKnownInput_shouldMatchDigest() {
    assert_eq!(
        FileManager::hash_text("abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    assert_eq!(FileManager::hash_text("").len(), 64);
}
