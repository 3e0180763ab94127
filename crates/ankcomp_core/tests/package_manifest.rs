use ankcomp_core::{
    collection_id, CollectionResolver, DeckPackager, EngineConfig, ManifestPackager,
    PackageRequest,
};
use serde_json::Value;
use std::fs;

const CELLS_DOC: &str = "---
deck: Biology::Cells
tags: biology
---

---

What does the diagram show?:::![cell](diagrams/fig1.png)

---
[^id]: Cell000001
[^tag]: cells

---

The powerhouse of the cell is the {{c1::mitochondrion}}.

---
[^id]: Cell000002
";

const MORE_CELLS_DOC: &str = "---
deck: Biology::Cells
---

---

membrane::![again](diagrams/fig1.png) ![other](diagrams/fig2.png)

---
[^id]: Cell000003
";

#[test]
fn manifest_carries_deck_models_notes_and_media() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let cells = input.path().join("cells.md");
    let more = input.path().join("more.md");
    fs::write(&cells, CELLS_DOC).unwrap();
    fs::write(&more, MORE_CELLS_DOC).unwrap();

    let collection = CollectionResolver::new(EngineConfig::default())
        .resolve("Biology::Cells", &[cells, more])
        .into_result()
        .unwrap();
    let request = PackageRequest::from_collection(&collection);
    assert_eq!(request.file_stem(), "biology--cells");

    let path = ManifestPackager::new(output.path())
        .package(&request)
        .unwrap();
    assert_eq!(path, output.path().join("biology--cells.json"));

    let manifest: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(manifest["deck"]["id"], collection_id("Biology::Cells"));
    assert_eq!(manifest["deck"]["name"], "Biology::Cells");

    let model_names: Vec<&str> = manifest["models"]
        .as_array()
        .unwrap()
        .iter()
        .map(|model| model["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        model_names,
        [
            "AnkCompiler-Question_Answer",
            "AnkCompiler-Front_Back",
            "AnkCompiler-Cloze"
        ]
    );
    assert_eq!(
        manifest["models"][0]["fields"],
        serde_json::json!(["Question", "Answer", "Source"])
    );
    assert_eq!(manifest["models"][2]["kind"], "cloze");

    let notes = manifest["notes"].as_array().unwrap();
    assert_eq!(notes.len(), 3);
    assert_eq!(notes[0]["guid"], "Cell000001");
    assert_eq!(notes[0]["model_id"], 1_764_365_620_i64);
    assert_eq!(notes[0]["tags"], serde_json::json!(["cells", "biology"]));
    assert_eq!(notes[0]["fields"][2], "cells.md");
    assert_eq!(notes[1]["model_id"], 1_783_507_665_i64);
    assert_eq!(notes[2]["fields"][2], "more.md");

    let media: Vec<String> = manifest["media"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry.as_str().unwrap().to_string())
        .collect();
    let expected: Vec<String> = ["diagrams/fig1.png", "diagrams/fig2.png"]
        .iter()
        .map(|name| input.path().join(name).to_string_lossy().into_owned())
        .collect();
    assert_eq!(media, expected);
}

#[test]
fn packaging_into_missing_directory_reports_io_error() {
    let output = tempfile::tempdir().unwrap();
    let collection = CollectionResolver::new(EngineConfig::default())
        .resolve("Empty", &[])
        .collection;

    let packager = ManifestPackager::new(output.path().join("absent"));
    let err = packager
        .package(&PackageRequest::from_collection(&collection))
        .unwrap_err();
    assert!(err.to_string().contains("empty.json"));
}
