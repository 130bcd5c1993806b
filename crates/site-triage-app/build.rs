use std::path::Path;

fn main() {
    let workspace_root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .expect("crate should live under <root>/crates/");
    let version_path = workspace_root.join("VERSION");

    println!("cargo:rerun-if-changed={}", version_path.display());

    let raw_version = std::fs::read_to_string(&version_path).expect("read VERSION file");
    let version = raw_version.trim();
    assert!(
        !version.is_empty() && version.split('.').all(|part| !part.is_empty()),
        "VERSION file must contain a dotted version, got {version:?}"
    );

    println!("cargo:rustc-env=SITE_TRIAGE_VERSION={version}");
}
