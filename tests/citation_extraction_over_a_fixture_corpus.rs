//! Exercises `citation::extract_citations` over a small on-disk corpus,
//! mirroring the teacher's `tests/common/corpus.rs` directory-walking
//! pattern (`walkdir::WalkDir` over a `tempfile` scratch directory) rather
//! than a hardcoded in-memory test-corpora submodule.

use std::fs;

use neo_alexandria_core::citation::extract_citations;
use neo_alexandria_core::model::{ResourceFormat, ResourceId};
use walkdir::WalkDir;

#[test]
fn extracting_citations_from_every_markdown_file_in_a_directory_finds_all_links() {
    let dir = tempfile::tempdir().unwrap();

    fs::write(
        dir.path().join("a.md"),
        "See [the paper](https://arxiv.org/abs/1111) for background.",
    )
    .unwrap();
    fs::write(
        dir.path().join("b.md"),
        "Two links: https://example.com/x and [y](https://example.com/y).",
    )
    .unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(
        dir.path().join("nested/c.md"),
        "Nested reference to https://example.org/z.",
    )
    .unwrap();

    let mut total = 0;
    for entry in WalkDir::new(dir.path()) {
        let entry = entry.unwrap();
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "md") {
            let bytes = fs::read(entry.path()).unwrap();
            let citations = extract_citations(ResourceFormat::Markdown, &bytes, "", &ResourceId::new());
            total += citations.len();
        }
    }

    assert_eq!(total, 4);
}
