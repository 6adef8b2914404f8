//! Integration tests for listing, extracting and serving ZIP entries

mod common;

use std::path::PathBuf;

use common::{dir, file, scratch_dirs, setup, write_zip};

use ::common::archive::{extract_to_workspace, list_entries, ArchiveError, ArchiveLimits, Locator};

#[test]
fn test_list_entries_in_archive_order() {
    let fx = setup();
    let archive = fx.storage.join("tenant1/bundle.zip");
    write_zip(&archive, &[file("a/b.txt", b"bee"), file("c.txt", b"sea")]);

    let entries = list_entries(&archive, &ArchiveLimits::default()).unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].filename, "b.txt");
    assert_eq!(entries[0].directory, fx.storage.join("tenant1/a"));
    assert_eq!(entries[0].locator.decode().unwrap(), "a/b.txt");
    assert_eq!(entries[1].filename, "c.txt");
    assert_eq!(entries[1].directory, fx.storage.join("tenant1"));
    assert_eq!(entries[1].locator.decode().unwrap(), "c.txt");
}

#[test]
fn test_list_entries_keeps_directory_entries() {
    let fx = setup();
    let archive = fx.storage.join("dirs.zip");
    write_zip(&archive, &[dir("docs/"), file("docs/readme.md", b"# hi")]);

    let entries = list_entries(&archive, &ArchiveLimits::default()).unwrap();

    assert_eq!(entries.len(), 2);
    assert!(entries[0].is_dir);
    assert_eq!(entries[0].filename, "docs");
    assert!(!entries[1].is_dir);
    assert_eq!(entries[1].size, 4);
}

#[test]
fn test_list_entries_missing_archive_is_io_error() {
    let fx = setup();
    let missing = fx.storage.join("nope.zip");
    let err = list_entries(&missing, &ArchiveLimits::default()).unwrap_err();
    assert!(matches!(err, ArchiveError::Io(_)));
}

#[test]
fn test_list_entries_corrupt_archive_is_read_error() {
    let fx = setup();
    let archive = fx.storage.join("broken.zip");
    std::fs::write(&archive, b"this is not a zip file at all").unwrap();

    let err = list_entries(&archive, &ArchiveLimits::default()).unwrap_err();
    assert!(matches!(err, ArchiveError::Read(_)));
}

#[test]
fn test_list_entries_enforces_entry_limit() {
    let fx = setup();
    let archive = fx.storage.join("many.zip");
    write_zip(
        &archive,
        &[file("1", b"1"), file("2", b"2"), file("3", b"3")],
    );
    let limits = ArchiveLimits {
        max_entries: 2,
        ..ArchiveLimits::default()
    };

    let err = list_entries(&archive, &limits).unwrap_err();
    assert!(matches!(err, ArchiveError::LimitExceeded(_)));
}

#[test]
fn test_extract_and_serve_nested_entry() {
    let fx = setup();
    let archive = fx.storage.join("bundle.zip");
    write_zip(&archive, &[file("a/b.txt", b"nested bytes"), file("c.txt", b"top")]);

    let workspace = fx.unpack(&archive);
    let served = workspace.serve_entry(&Locator::encode("a/b.txt")).unwrap();

    assert_eq!(served.bytes, b"nested bytes");
    assert_eq!(served.filename, "b.txt");
    assert_eq!(served.name, "a/b.txt");
    assert_eq!(served.content_type, "text/plain; charset=utf-8");
    assert_eq!(served.content_disposition(), "attachment; filename=b.txt");
}

#[test]
fn test_same_base_name_in_different_directories_does_not_collide() {
    let fx = setup();
    let archive = fx.storage.join("dupes.zip");
    write_zip(
        &archive,
        &[file("x/data.csv", b"from x"), file("y/data.csv", b"from y")],
    );

    let workspace = fx.unpack(&archive);

    let x = workspace.serve_entry(&Locator::encode("x/data.csv")).unwrap();
    let y = workspace.serve_entry(&Locator::encode("y/data.csv")).unwrap();
    assert_eq!(x.bytes, b"from x");
    assert_eq!(y.bytes, b"from y");
}

#[test]
fn test_serve_missing_entry_is_not_found() {
    let fx = setup();
    let archive = fx.storage.join("bundle.zip");
    write_zip(&archive, &[file("c.txt", b"top")]);

    let workspace = fx.unpack(&archive);
    let err = workspace
        .serve_entry(&Locator::encode("missing/file.txt"))
        .unwrap_err();
    assert!(matches!(err, ArchiveError::NotFound(name) if name == "missing/file.txt"));
}

#[test]
fn test_serve_directory_entry_is_not_found() {
    let fx = setup();
    let archive = fx.storage.join("dirs.zip");
    write_zip(&archive, &[dir("docs/"), file("docs/a.txt", b"a")]);

    let workspace = fx.unpack(&archive);
    assert!(workspace.path().join("docs").is_dir());
    let err = workspace.serve_entry(&Locator::encode("docs/")).unwrap_err();
    assert!(matches!(err, ArchiveError::NotFound(_)));
}

#[test]
fn test_serve_rejects_traversal_locator() {
    let fx = setup();
    let archive = fx.storage.join("bundle.zip");
    write_zip(&archive, &[file("c.txt", b"top")]);
    std::fs::write(fx.scratch.join("secret.txt"), b"outside").unwrap();

    let workspace = fx.unpack(&archive);
    let err = workspace
        .serve_entry(&Locator::encode("../secret.txt"))
        .unwrap_err();
    assert!(matches!(err, ArchiveError::NotFound(_)));
}

#[test]
fn test_serve_invalid_locator() {
    let fx = setup();
    let archive = fx.storage.join("bundle.zip");
    write_zip(&archive, &[file("c.txt", b"top")]);

    let workspace = fx.unpack(&archive);
    let err = workspace
        .serve_entry(&Locator::from_token("%%%"))
        .unwrap_err();
    assert!(matches!(err, ArchiveError::InvalidLocator(_)));
}

#[test]
fn test_workspace_is_removed_on_drop() {
    let fx = setup();
    let archive = fx.storage.join("bundle.zip");
    write_zip(&archive, &[file("c.txt", b"top")]);

    let workspace = fx.unpack(&archive);
    let path: PathBuf = workspace.path().to_path_buf();
    assert!(path.starts_with(&fx.scratch));
    assert_eq!(scratch_dirs(&fx.scratch), 1);

    drop(workspace);
    assert!(!path.exists());
    assert_eq!(scratch_dirs(&fx.scratch), 0);
}

#[test]
fn test_failed_extraction_leaves_no_workspace() {
    let fx = setup();
    let archive = fx.storage.join("big.zip");
    write_zip(&archive, &[file("a.bin", &[7u8; 4096]), file("b.bin", &[9u8; 4096])]);
    let limits = ArchiveLimits {
        max_extracted_bytes: 5000,
        ..ArchiveLimits::default()
    };

    let err = extract_to_workspace(&archive, &fx.scratch, &limits).unwrap_err();
    assert!(matches!(err, ArchiveError::LimitExceeded(_)));
    assert_eq!(scratch_dirs(&fx.scratch), 0);
}

#[test]
fn test_extracted_entries_carry_archive_mtime() {
    let fx = setup();
    let archive = fx.storage.join("bundle.zip");
    write_zip(&archive, &[file("c.txt", b"top")]);
    let archive_mtime = std::fs::metadata(&archive).unwrap().modified().unwrap();

    let workspace = fx.unpack(&archive);
    assert_eq!(workspace.archive_modified(), Some(archive_mtime));

    let served = workspace.serve_entry(&Locator::encode("c.txt")).unwrap();
    assert_eq!(served.last_modified, Some(archive_mtime));
}

#[test]
fn test_pdf_entry_is_sniffed() {
    let fx = setup();
    let archive = fx.storage.join("tenant1/archive.zip");
    write_zip(&archive, &[file("report.pdf", b"%PDF-1.7\n%fake pdf body")]);

    let entries = list_entries(&archive, &ArchiveLimits::default()).unwrap();
    assert_eq!(entries[0].locator.decode().unwrap(), "report.pdf");

    let workspace = fx.unpack(&archive);
    let served = workspace.serve_entry(&entries[0].locator).unwrap();
    assert_eq!(served.content_type, "application/pdf");
    assert_eq!(served.content_disposition(), "attachment; filename=report.pdf");
}

#[test]
fn test_rooted_and_dotted_entries_serve_what_they_list() {
    let fx = setup();
    let archive = fx.storage.join("odd.zip");
    write_zip(&archive, &[file("/abs.txt", b"abs"), file("./dot.txt", b"dot")]);

    let entries = list_entries(&archive, &ArchiveLimits::default()).unwrap();
    assert_eq!(entries.len(), 2);

    let workspace = fx.unpack(&archive);
    let abs = workspace.serve_entry(&entries[0].locator).unwrap();
    let dot = workspace.serve_entry(&entries[1].locator).unwrap();
    assert_eq!(abs.bytes, b"abs");
    assert_eq!(abs.filename, "abs.txt");
    assert_eq!(dot.bytes, b"dot");
}

#[test]
fn test_binary_entry_with_text_name_is_octet_stream() {
    let fx = setup();
    let archive = fx.storage.join("blob.zip");
    write_zip(&archive, &[file("blob.txt", &[0, 1, 2, 3, 0xfa, 0, 0])]);

    let workspace = fx.unpack(&archive);
    let served = workspace.serve_entry(&Locator::encode("blob.txt")).unwrap();
    assert_eq!(served.content_type, "application/octet-stream");
}
