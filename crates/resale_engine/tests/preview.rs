use resale_core::ImageFile;
use resale_engine::{FailureKind, PreviewRegistry};
use tempfile::TempDir;

#[test]
fn acquire_is_cached_and_release_happens_once() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("lamp.png");
    std::fs::write(&path, b"png-bytes").unwrap();
    let image = ImageFile::new(7, &path);

    let mut registry = PreviewRegistry::new();
    let preview = registry.acquire(&image).unwrap();
    assert_eq!(preview.mime, "image/png");
    assert_eq!(&preview.bytes[..], b"png-bytes");

    // File changes on disk are not picked up for the same id.
    std::fs::write(&path, b"changed").unwrap();
    assert_eq!(&registry.acquire(&image).unwrap().bytes[..], b"png-bytes");
    assert_eq!(registry.len(), 1);

    assert!(registry.release(7));
    assert!(!registry.release(7));
    assert!(registry.is_empty());
}

#[test]
fn missing_file_is_an_io_error() {
    let mut registry = PreviewRegistry::new();
    let err = registry
        .acquire(&ImageFile::new(1, "/no/such/file.jpg"))
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Io);
    assert!(registry.get(1).is_none());
}
