// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dv_core::PropertySet;
use std::io::Write;

const POOLS: &str = r#"
[[pool]]
id = "linux"
condition = "OSFamily == 'Linux'"

[[pool]]
id = "gpu"
name = "GPU builders"
condition = "HasGpu && CPUCount >= 16"

[[pool]]
id = "manual"
"#;

#[test]
fn parses_pools_with_conditions() {
    let pools = parse_pools(Path::new("pools.toml"), POOLS).unwrap();
    assert_eq!(pools.len(), 3);
    assert_eq!(pools[0].name, "linux");
    assert_eq!(pools[1].name, "GPU builders");
    assert!(pools[2].condition.is_none());

    let props: Vec<String> = ["OSFamily=Linux", "HasGpu=true", "CPUCount=32"].map(String::from).to_vec();
    let set = PropertySet::new(&props);
    assert!(pools.iter().take(2).all(|p| p.matches(&set)));
    assert!(!pools[2].matches(&set));
}

#[test]
fn empty_file_has_no_pools() {
    assert!(parse_pools(Path::new("pools.toml"), "").unwrap().is_empty());
}

#[yare::parameterized(
    bad_condition = { "[[pool]]\nid = \"x\"\ncondition = \"OSFamily ==\"\n" },
    unknown_table = { "[defaults]\nlifetime = 3\n" },
    not_toml      = { "[[pool" },
)]
fn rejects_invalid_files(text: &str) {
    let err = parse_pools(Path::new("pools.toml"), text).unwrap_err();
    assert!(matches!(err, DaemonError::PoolsParse { .. }), "{err}");
}

#[test]
fn loads_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(POOLS.as_bytes()).unwrap();
    assert_eq!(load_pools(file.path()).unwrap().len(), 3);
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_pools(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, DaemonError::PoolsRead { .. }));
}
