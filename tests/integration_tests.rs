//! Integration tests for the record store workflow.

use std::path::PathBuf;

use empdb::storage::{FileHeader, FORMAT_VERSION, HEADER_SIZE, RECORD_SIZE};
use empdb::{EmpDbError, Employee, RecordStore, StoreConfig, TailPolicy};
use tempfile::TempDir;

fn setup_test_env() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("create temp dir");
    let db_path = temp_dir.path().join("test.db");
    (temp_dir, db_path)
}

fn emp(id: u32, name: &str, salary: f32) -> Employee {
    Employee::new(id, name, salary).expect("valid employee")
}

fn staff() -> Vec<Employee> {
    vec![
        emp(1001, "Alice", 60000.0),
        emp(1002, "Bob", 55000.0),
        emp(1003, "Charlie", 62000.0),
    ]
}

// =============================================================================
// Header
// =============================================================================

mod header_integration {
    use super::*;

    #[test]
    fn test_created_file_validates() {
        let (_temp, db_path) = setup_test_env();
        let store = RecordStore::new(&db_path);
        store.create_file().expect("create");

        let header = store.open_and_validate().expect("validate");
        assert_eq!(header, FileHeader::new());
    }

    #[test]
    fn test_empty_file_rejected() {
        let (_temp, db_path) = setup_test_env();
        std::fs::write(&db_path, b"").expect("write");

        let err = RecordStore::new(&db_path).open_and_validate().unwrap_err();
        assert!(matches!(err, EmpDbError::InvalidDatabaseFile(_)));
    }

    #[test]
    fn test_wrong_magic_rejected() {
        let (_temp, db_path) = setup_test_env();
        std::fs::write(&db_path, b"ABCD\x01\0\0\0").expect("write");

        let err = RecordStore::new(&db_path).open_and_validate().unwrap_err();
        assert!(matches!(err, EmpDbError::InvalidDatabaseFile(_)));
    }

    #[test]
    fn test_wrong_version_rejected() {
        let (_temp, db_path) = setup_test_env();
        let mut bytes = FileHeader::new().to_bytes();
        bytes[4] = FORMAT_VERSION.wrapping_add(1);
        std::fs::write(&db_path, bytes).expect("write");

        let err = RecordStore::new(&db_path).open_and_validate().unwrap_err();
        assert!(matches!(err, EmpDbError::UnsupportedVersion { .. }));
        assert!(err.is_format_error());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let (_temp, db_path) = setup_test_env();
        let err = RecordStore::new(&db_path).open_and_validate().unwrap_err();
        assert!(matches!(err, EmpDbError::IoError(_)));
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let (temp, _) = setup_test_env();
        let store = RecordStore::new(temp.path().join("no/such/dir/test.db"));
        assert!(matches!(
            store.create_file().unwrap_err(),
            EmpDbError::IoError(_)
        ));
    }
}

// =============================================================================
// Record store scenario
// =============================================================================

mod store_integration {
    use super::*;

    #[test]
    fn test_staff_scenario() {
        let (_temp, db_path) = setup_test_env();
        let store = RecordStore::new(&db_path);
        store.create_file().expect("create");
        store.append_records(&staff()).expect("append");

        assert_eq!(store.list_all().expect("list"), staff());

        let bob = store.search_by_id(1002).expect("search").expect("found");
        assert_eq!(bob.name.as_bytes(), b"Bob");
        assert!((bob.salary - 55000.0).abs() < f32::EPSILON);

        assert!(store.delete_by_id(1002).expect("delete"));
        let remaining = store.list_all().expect("list");
        assert_eq!(remaining, vec![staff()[0], staff()[2]]);

        assert!(!store.delete_by_id(9999).expect("delete miss"));
        assert_eq!(store.list_all().expect("list"), remaining);
    }

    #[test]
    fn test_search_absent_id() {
        let (_temp, db_path) = setup_test_env();
        let store = RecordStore::new(&db_path);
        store.create_file().expect("create");
        store.append_records(&staff()).expect("append");

        assert!(store.search_by_id(42).expect("search").is_none());
    }

    #[test]
    fn test_appends_accumulate_in_order() {
        let (_temp, db_path) = setup_test_env();
        let store = RecordStore::new(&db_path);
        store.create_file().expect("create");

        for record in staff() {
            store.append_records(&[record]).expect("append");
        }
        assert_eq!(store.list_all().expect("list"), staff());
        assert_eq!(store.record_count().expect("count"), 3);
    }

    #[test]
    fn test_file_bytes_match_layout() {
        let (_temp, db_path) = setup_test_env();
        let store = RecordStore::new(&db_path);
        store.create_file().expect("create");
        store.append_records(&staff()).expect("append");

        let bytes = std::fs::read(&db_path).expect("read");
        assert_eq!(bytes.len(), HEADER_SIZE + 3 * RECORD_SIZE);
        assert_eq!(&bytes[..HEADER_SIZE], &FileHeader::new().to_bytes());
        for (n, record) in staff().iter().enumerate() {
            let start = HEADER_SIZE + n * RECORD_SIZE;
            assert_eq!(&bytes[start..start + RECORD_SIZE], &record.to_bytes());
        }
    }

    #[test]
    fn test_delete_miss_leaves_bytes_unchanged() {
        let (_temp, db_path) = setup_test_env();
        let store = RecordStore::new(&db_path);
        store.create_file().expect("create");
        store.append_records(&staff()).expect("append");

        let before = std::fs::read(&db_path).expect("read");
        assert!(!store.delete_by_id(7).expect("delete"));
        assert_eq!(std::fs::read(&db_path).expect("read"), before);
    }

    #[test]
    fn test_delete_preserves_header_and_survivor_bytes() {
        let (_temp, db_path) = setup_test_env();
        let store = RecordStore::new(&db_path);
        store.create_file().expect("create");

        // Reserved header bytes and bytes after a name's terminator must
        // survive the rewrite untouched.
        let mut raw = std::fs::read(&db_path).expect("read");
        raw[5..8].copy_from_slice(&[1, 2, 3]);
        let mut odd = emp(1, "Ann", 1.0).to_bytes();
        odd[20] = b'!';
        raw.extend_from_slice(&odd);
        raw.extend_from_slice(&emp(2, "Ben", 2.0).to_bytes());
        std::fs::write(&db_path, &raw).expect("write");

        assert!(store.delete_by_id(2).expect("delete"));
        let after = std::fs::read(&db_path).expect("read");
        assert_eq!(after.len(), HEADER_SIZE + RECORD_SIZE);
        assert_eq!(&after[..HEADER_SIZE], &raw[..HEADER_SIZE]);
        assert_eq!(&after[HEADER_SIZE..], &odd);
    }
}

// =============================================================================
// Truncated tails
// =============================================================================

mod truncation_integration {
    use super::*;

    fn truncated_store(path: &std::path::Path, config: StoreConfig) -> RecordStore {
        let store = RecordStore::with_config(path, config);
        store.create_file().expect("create");
        store.append_records(&staff()).expect("append");

        let len = std::fs::metadata(path).expect("metadata").len();
        let file = std::fs::OpenOptions::new()
            .write(true)
            .open(path)
            .expect("open");
        file.set_len(len - 10).expect("truncate");
        store
    }

    #[test]
    fn test_partial_tail_dropped_by_default() {
        let (_temp, db_path) = setup_test_env();
        let store = truncated_store(&db_path, StoreConfig::default());

        let records = store.list_all().expect("list");
        assert_eq!(records, staff()[..2].to_vec());
        assert_eq!(store.record_count().expect("count"), 2);
        assert!(store.search_by_id(1003).expect("search").is_none());
    }

    #[test]
    fn test_partial_tail_reported_in_strict_mode() {
        let (_temp, db_path) = setup_test_env();
        let store = truncated_store(
            &db_path,
            StoreConfig::new().with_tail_policy(TailPolicy::Error),
        );

        let results: Vec<_> = store.list_records().expect("list").collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        match &results[2] {
            Err(EmpDbError::TruncatedRecord {
                offset,
                len,
                expected,
            }) => {
                assert_eq!(*offset, (HEADER_SIZE + 2 * RECORD_SIZE) as u64);
                assert_eq!(*len, RECORD_SIZE - 10);
                assert_eq!(*expected, RECORD_SIZE);
            }
            other => panic!("expected truncated record, got {other:?}"),
        }
    }

    #[test]
    fn test_delete_drops_partial_tail() {
        let (_temp, db_path) = setup_test_env();
        let store = truncated_store(&db_path, StoreConfig::default());

        assert!(store.delete_by_id(1001).expect("delete"));
        let len = std::fs::metadata(&db_path).expect("metadata").len();
        assert_eq!(len, (HEADER_SIZE + RECORD_SIZE) as u64);
        assert_eq!(store.list_all().expect("list"), vec![staff()[1]]);
    }
}

// =============================================================================
// Property-based tests
// =============================================================================

mod proptest_store {
    use super::*;
    use proptest::prelude::*;

    fn employee_strategy() -> impl Strategy<Value = Employee> {
        (0..20u32, "[a-zA-Z ]{0,50}", -1.0e6f32..1.0e6f32)
            .prop_map(|(id, name, salary)| Employee::new(id, &name, salary).expect("valid name"))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Property: list returns exactly what was appended, in order.
        #[test]
        fn test_append_list_consistency(records in proptest::collection::vec(employee_strategy(), 0..40)) {
            let (_temp, db_path) = setup_test_env();
            let store = RecordStore::new(&db_path);
            store.create_file().expect("create");
            store.append_records(&records).expect("append");

            let listed = store.list_all().expect("list");
            prop_assert_eq!(listed.len(), records.len());
            for (got, want) in listed.iter().zip(&records) {
                prop_assert_eq!(got.to_bytes(), want.to_bytes());
            }
        }

        /// Property: search returns the first record with the id, or none.
        #[test]
        fn test_search_finds_first_match(
            records in proptest::collection::vec(employee_strategy(), 0..40),
            id in 0..25u32,
        ) {
            let (_temp, db_path) = setup_test_env();
            let store = RecordStore::new(&db_path);
            store.create_file().expect("create");
            store.append_records(&records).expect("append");

            let expected = records.iter().find(|e| e.id == id).copied();
            prop_assert_eq!(store.search_by_id(id).expect("search"), expected);
        }

        /// Property: delete removes exactly the matching records and keeps
        /// the order of the rest.
        #[test]
        fn test_delete_filters_in_order(
            records in proptest::collection::vec(employee_strategy(), 0..40),
            id in 0..25u32,
        ) {
            let (_temp, db_path) = setup_test_env();
            let store = RecordStore::new(&db_path);
            store.create_file().expect("create");
            store.append_records(&records).expect("append");
            let before = std::fs::read(&db_path).expect("read");

            let deleted = store.delete_by_id(id).expect("delete");
            let expected: Vec<Employee> = records.iter().filter(|e| e.id != id).copied().collect();

            prop_assert_eq!(deleted, expected.len() != records.len());
            prop_assert_eq!(store.list_all().expect("list"), expected);
            if !deleted {
                prop_assert_eq!(std::fs::read(&db_path).expect("read"), before);
            }
        }
    }
}
