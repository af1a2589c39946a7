use nalgebra::DMatrix;
use sio_store::*;
use sio_transform::IoTables;

fn tables() -> IoTables {
    IoTables {
        a: DMatrix::from_row_slice(2, 2, &[0.1, 0.2, 0.0, 0.25]),
        l: DMatrix::from_row_slice(2, 2, &[1.0 / 0.9, 0.3, 0.0, 4.0 / 3.0]),
        y: DMatrix::from_row_slice(2, 1, &[7.0, 9.0]),
        b: DMatrix::from_row_slice(1, 2, &[0.5, 0.125]),
        w: DMatrix::from_row_slice(1, 2, &[0.4, 0.6]),
    }
}

fn manifest(year: i32) -> YearManifest {
    YearManifest {
        dataset: "toy".to_string(),
        year,
        input_hash: "abc".to_string(),
        timestamp: "2011-01-01T00:00:00+00:00".to_string(),
        secondary_applied: true,
        matrices: vec![],
        checks: vec![CheckSummary {
            kind: "io_transactions".to_string(),
            passed: true,
            compared: 2,
            failures: 0,
            max_abs_delta: 0.0,
        }],
        raw_imbalances: RawImbalanceSummary::default(),
        elapsed_s: 0.5,
        tool_version: "0.1.0".to_string(),
    }
}

#[test]
fn saved_year_can_be_listed_and_read_back() {
    let root = std::env::temp_dir().join("sio_store_roundtrip_saved");
    let _ = std::fs::remove_dir_all(&root);
    let store = OutputStore::new(root).unwrap();
    let t = tables();
    let y_country = DMatrix::from_row_slice(2, 1, &[7.0, 9.0]);

    let written = store.save_year(manifest(2011), &t, &y_country).unwrap();
    assert_eq!(written.matrices.len(), 6);
    assert!(written.passed());

    store.save_year(manifest(1995), &t, &y_country).unwrap();
    assert_eq!(store.list_years().unwrap(), vec![1995, 2011]);

    let loaded = store.load_manifest(2011).unwrap();
    assert_eq!(loaded, written);
    let l_entry = loaded.matrices.iter().find(|m| m.name == "L").unwrap();
    assert_eq!((l_entry.rows, l_entry.cols), (2, 2));

    assert_eq!(store.load_matrix(2011, "L").unwrap(), t.l);
    assert_eq!(store.load_matrix(2011, "B").unwrap(), t.b);
}

#[test]
fn missing_year_and_matrix_are_errors() {
    let root = std::env::temp_dir().join("sio_store_roundtrip_missing");
    let _ = std::fs::remove_dir_all(&root);
    let store = OutputStore::new(root).unwrap();
    assert!(matches!(
        store.load_manifest(2000),
        Err(StoreError::YearNotFound { year: 2000 })
    ));

    let y_country = DMatrix::zeros(2, 1);
    store.save_year(manifest(2000), &tables(), &y_country).unwrap();
    assert!(matches!(
        store.load_matrix(2000, "Z"),
        Err(StoreError::MatrixNotFound { .. })
    ));
}

#[test]
fn directories_without_manifest_are_not_listed() {
    let root = std::env::temp_dir().join("sio_store_roundtrip_unlisted");
    let _ = std::fs::remove_dir_all(&root);
    let store = OutputStore::new(root.clone()).unwrap();
    std::fs::create_dir_all(root.join("2005")).unwrap();
    std::fs::create_dir_all(root.join("notes")).unwrap();
    assert!(store.list_years().unwrap().is_empty());
}
