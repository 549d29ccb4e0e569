//! Integration tests for the bundled fixtures and fakes.

use std::collections::HashSet;
use std::fs;

use mirrorgate_test::{fixtures_dir, FixtureSet, MIRROR_HOST};
use tempfile::TempDir;

#[test]
fn test_every_bundled_fixture_file_is_valid() {
    let mut names = HashSet::new();
    let mut files = 0;

    for entry in fs::read_dir(fixtures_dir()).expect("fixtures directory exists") {
        let path = entry.unwrap().path();
        if path.extension().is_some_and(|e| e == "yaml") {
            let set = FixtureSet::from_yaml_file(&path)
                .unwrap_or_else(|e| panic!("{}: {e}", path.display()));
            assert_eq!(set.mirror_host, MIRROR_HOST, "{}", path.display());
            for fixture in &set.fixtures {
                assert!(
                    names.insert(fixture.name.clone()),
                    "duplicate fixture name {}",
                    fixture.name
                );
            }
            files += 1;
        }
    }

    assert!(files >= 2);
}

#[test]
fn test_fixture_set_from_temp_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("custom.yaml");
    fs::write(
        &path,
        r"
name: custom
mirror_host: registry.internal:5000
fixtures:
  - name: private
    image: artifactory.swg-devops.com/team/app:2
    expect:
      error: unsupported_private_registry
",
    )
    .unwrap();

    let set = FixtureSet::from_yaml_file(&path).unwrap();
    assert_eq!(set.name.as_deref(), Some("custom"));
    assert_eq!(set.mirror_host, "registry.internal:5000");
    assert_eq!(
        set.fixtures[0].image().unwrap().registry(),
        Some("artifactory.swg-devops.com")
    );
}
