use super::*;
use crate::embedding::{ClipEncoder, MockImageEncoder};
use image::{Rgb, RgbImage};
use std::path::Path;

fn solid(color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(16, 16, Rgb(color))
}

fn write_png(dir: &Path, name: &str, color: [u8; 3]) {
    solid(color).save(dir.join(name)).expect("write test image");
}

fn stub() -> ClipEncoder {
    ClipEncoder::stub().expect("stub encoder")
}

#[test]
fn test_is_supported_image() {
    assert!(is_supported_image(Path::new("a.jpg")));
    assert!(is_supported_image(Path::new("a.JPEG")));
    assert!(is_supported_image(Path::new("dir/a.Png")));
    assert!(is_supported_image(Path::new("a.webp")));
    assert!(!is_supported_image(Path::new("a.txt")));
    assert!(!is_supported_image(Path::new("a.heic")));
    assert!(!is_supported_image(Path::new("png")));
}

#[test]
fn test_build_orders_by_file_name() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "c.png", [0, 0, 255]);
    write_png(dir.path(), "a.png", [255, 0, 0]);
    write_png(dir.path(), "b.png", [0, 255, 0]);

    let index = ReferenceIndex::build(dir.path(), &stub()).unwrap();

    let ids: Vec<&str> = index.iter().map(|e| &**e.identifier()).collect();
    assert_eq!(ids, ["a.png", "b.png", "c.png"]);
    assert_eq!(index.len(), 3);
    assert!(!index.is_empty());
    assert_eq!(index.dim(), crate::constants::DEFAULT_EMBEDDING_DIM);
    assert_eq!(index.source(), Some(dir.path()));
    assert!(index.skipped().is_empty());
}

#[test]
fn test_build_skips_unreadable_files() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "good.png", [255, 0, 0]);
    std::fs::write(dir.path().join("broken.png"), b"definitely not a png").unwrap();

    let index = ReferenceIndex::build(dir.path(), &stub()).unwrap();

    assert_eq!(index.len(), 1);
    assert!(index.get("good.png").is_some());
    assert!(index.get("broken.png").is_none());
    assert_eq!(index.skipped().len(), 1);
    assert!(index.skipped()[0].path.ends_with("broken.png"));
    assert!(!index.skipped()[0].reason.is_empty());
}

#[test]
fn test_build_ignores_unknown_extensions_and_directories() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "mural.png", [255, 0, 0]);
    std::fs::rename(dir.path().join("mural.png"), dir.path().join("mural.PNG")).unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"reference list").unwrap();
    std::fs::create_dir(dir.path().join("nested.png")).unwrap();

    let index = ReferenceIndex::build(dir.path(), &stub()).unwrap();

    assert_eq!(index.len(), 1);
    assert!(index.skipped().is_empty());
}

#[test]
fn test_build_empty_directory_is_empty_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let err = ReferenceIndex::build(dir.path(), &stub()).unwrap_err();
    assert!(matches!(err, IndexError::EmptyCorpus { skipped: 0, .. }));
}

#[test]
fn test_build_only_broken_files_is_empty_corpus() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.jpg"), b"nope").unwrap();
    std::fs::write(dir.path().join("b.webp"), b"nope").unwrap();

    let err = ReferenceIndex::build(dir.path(), &stub()).unwrap_err();
    assert!(matches!(err, IndexError::EmptyCorpus { skipped: 2, .. }));
}

#[test]
fn test_build_missing_directory() {
    let err = ReferenceIndex::build("/nonexistent/reference_art", &stub()).unwrap_err();
    assert!(matches!(err, IndexError::CorpusNotFound { .. }));
}

#[test]
fn test_build_file_instead_of_directory() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("a.png");
    write_png(dir.path(), "a.png", [1, 2, 3]);

    let err = ReferenceIndex::build(&file, &stub()).unwrap_err();
    assert!(matches!(err, IndexError::NotADirectory { .. }));
}

#[test]
fn test_build_tags_entries_with_encoder_version() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "a.png", [255, 0, 0]);
    let encoder = MockImageEncoder::new().with_version(EncoderVersion::from_raw(42));

    let index = ReferenceIndex::build(dir.path(), &encoder).unwrap();

    assert_eq!(index.version(), EncoderVersion::from_raw(42));
    assert_eq!(encoder.calls(), 1);
}

#[test]
fn test_from_entries_rejects_mixed_dimensions() {
    let version = EncoderVersion::from_raw(1);
    let entries = vec![
        ReferenceEntry::new("a", Embedding::from_raw(vec![1.0, 0.0], version).unwrap()),
        ReferenceEntry::new("b", Embedding::from_raw(vec![1.0, 0.0, 0.0], version).unwrap()),
    ];

    let err = ReferenceIndex::from_entries(entries).unwrap_err();
    assert!(matches!(
        err,
        IndexError::DimensionMismatch {
            expected: 2,
            actual: 3,
            ..
        }
    ));
}

#[test]
fn test_from_entries_rejects_mixed_versions() {
    let entries = vec![
        ReferenceEntry::new(
            "a",
            Embedding::from_raw(vec![1.0, 0.0], EncoderVersion::from_raw(1)).unwrap(),
        ),
        ReferenceEntry::new(
            "b",
            Embedding::from_raw(vec![0.0, 1.0], EncoderVersion::from_raw(2)).unwrap(),
        ),
    ];

    let err = ReferenceIndex::from_entries(entries).unwrap_err();
    assert!(matches!(err, IndexError::EncoderMismatch { .. }));
    assert!(err.to_string().contains("b"));
}

#[test]
fn test_from_entries_empty() {
    let err = ReferenceIndex::from_entries(Vec::new()).unwrap_err();
    assert!(matches!(err, IndexError::EmptyCorpus { .. }));
}

mod handle_tests {
    use super::*;

    fn single(identifier: &str) -> ReferenceIndex {
        let embedding = Embedding::from_raw(vec![1.0, 0.0], EncoderVersion::from_raw(1)).unwrap();
        ReferenceIndex::from_entries(vec![ReferenceEntry::new(identifier, embedding)]).unwrap()
    }

    #[test]
    fn test_swap_replaces_and_counts_generations() {
        let handle = IndexHandle::new(single("old"));
        assert_eq!(handle.generation(), 0);

        let snapshot = handle.load();
        let previous = handle.swap(Arc::new(single("new")));

        assert_eq!(handle.generation(), 1);
        assert!(previous.get("old").is_some());
        assert!(handle.load().get("new").is_some());
        // a snapshot taken before the swap still sees the old index in full
        assert!(snapshot.get("old").is_some());
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_concurrent_readers_never_see_partial_index() {
        let handle = Arc::new(IndexHandle::new(single("gen-0")));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let handle = Arc::clone(&handle);
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        let index = handle.load();
                        assert_eq!(index.len(), 1);
                        assert!(index.entries()[0].identifier().starts_with("gen-"));
                    }
                })
            })
            .collect();

        for i in 1..=50 {
            handle.swap(Arc::new(single(&format!("gen-{i}"))));
        }

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(handle.generation(), 50);
    }
}
