//! Tests for JSON manifest export

#[cfg(test)]
mod tests {
    use greedymosaic::io::manifest::{manifest_json, write_manifest};
    use greedymosaic::spatial::GridLayout;
    use greedymosaic::spatial::mosaic::{ManifestEntry, MosaicSummary};
    use serde_json::Value;

    fn summary() -> MosaicSummary {
        let layout = GridLayout::new(2, 1, 4, 1).expect("valid layout");
        let entries = vec![
            ManifestEntry {
                display_name: "b.png".to_string(),
                tile_box: layout.large_box(1, 0),
                byte_size: 20,
                catalog_index: 1,
            },
            ManifestEntry {
                display_name: "a.png".to_string(),
                tile_box: layout.large_box(0, 0),
                byte_size: 10,
                catalog_index: 0,
            },
        ];
        MosaicSummary::from_manifest(entries, &layout, 2)
    }

    // Tests the document carries aggregates and raster-ordered entries
    // Verified by serializing the unsorted manifest
    #[test]
    fn test_manifest_json_fields() {
        let json: Value =
            serde_json::from_str(&manifest_json(&summary()).expect("serialized")).expect("json");

        assert_eq!(json["columns"], 2);
        assert_eq!(json["rows"], 1);
        assert_eq!(json["distinct_tiles"], 2);
        assert_eq!(json["total_bytes"], 30);
        assert_eq!(json["painted_cells"], 2);
        assert_eq!(json["ordered_catalog_indices"], serde_json::json!([0, 1]));
        assert_eq!(json["entries"][0]["display_name"], "a.png");
        assert_eq!(json["entries"][1]["tile_box"]["x0"], 4);
    }

    // Tests the file is written, creating parent directories
    // Verified by skipping the final flush
    #[test]
    fn test_write_manifest_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("reports").join("manifest.json");

        write_manifest(&summary(), &path).expect("written");

        let contents = std::fs::read_to_string(&path).expect("readable");
        let json: Value = serde_json::from_str(&contents).expect("json");
        assert_eq!(json["entries"].as_array().map(Vec::len), Some(2));
        assert_eq!(contents, manifest_json(&summary()).expect("serialized"));
    }

    // Tests an unwritable destination surfaces a file system error
    // Verified by ignoring create failures
    #[test]
    fn test_write_manifest_into_file_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").expect("written");

        let result = write_manifest(&summary(), &blocker.join("manifest.json"));
        assert!(matches!(
            result,
            Err(greedymosaic::MosaicError::FileSystem { .. })
        ));
    }
}
