//! Property tests for path containment and exclusion.

use hardlinker_fs::{qualify, ExclusionPattern, Qualification, Rejection};
use proptest::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn segments() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::string::string_regex("[a-z0-9_]{1,8}").unwrap(),
        1..4,
    )
}

fn materialize_file(base: &std::path::Path, segments: &[String], ext: &str) -> PathBuf {
    let mut path = base.to_path_buf();
    for segment in segments {
        path.push(segment);
    }
    path.set_extension(ext);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, b"x").unwrap();
    path
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn outside_root_never_qualifies(
        segs in segments(),
        pattern in prop::sample::select(vec!["", r"\.tmp$", "zzz", "^$"]),
    ) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("root");
        fs::create_dir_all(&root).unwrap();
        let outside = materialize_file(&dir.path().join("other"), &segs, "txt");

        let exclusions = ExclusionPattern::new(pattern).unwrap();
        prop_assert_eq!(
            qualify(&outside, &root, &exclusions),
            Qualification::Rejected(Rejection::OutsideSourceRoot)
        );
    }

    #[test]
    fn tmp_suffix_is_always_excluded(segs in segments()) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("root");
        let exclusions = ExclusionPattern::new(r"\.tmp$").unwrap();

        let tmp = materialize_file(&root, &segs, "tmp");
        let txt = materialize_file(&root, &segs, "txt");

        prop_assert_eq!(
            qualify(&tmp, &root, &exclusions),
            Qualification::Rejected(Rejection::Excluded)
        );
        prop_assert_eq!(qualify(&txt, &root, &exclusions), Qualification::Qualified);
    }
}
