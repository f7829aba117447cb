use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

const CATALOG: &str = r#"
[textures]
count = 1000

[[buildings]]
id = 101
gfx = 4
posoffs = 20

[[buildings]]
id = 1201
gfx = 758

[[buildings]]
id = 900
gfx = 100
width = 2
rotate = 2
posoffs = 20
"#;

fn island_template() -> String {
    let grass = vec![r#"{"id":101}"#; 16].join(",");
    let empty = vec!["null"; 16].join(",");
    format!(
        r#"{{"width":4,"height":4,"x":-1,"y":-1,"climate":"south","layers":[{{"coast":[{empty}]}},{{"terrain":[{grass}]}},{{"buildings":[{empty}]}}]}}"#
    )
}

fn workspace(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("isle-cli-{}-{name}", std::process::id()));
    fs::create_dir_all(&dir).expect("temporary directory");
    fs::write(dir.join("catalog.toml"), CATALOG).expect("catalog");
    fs::write(dir.join("island.isl"), island_template()).expect("island template");
    dir
}

fn isle(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_isle"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run the isle binary")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "isle failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn new_map(dir: &Path) {
    let out = stdout(&isle(
        dir,
        &[
            "new",
            "world.map",
            "--width",
            "50",
            "--height",
            "50",
            "--island",
            "island.isl@10,10",
        ],
    ));
    assert!(
        out.contains("island 0 at (10, 10) size 4x4 climate south"),
        "{out}"
    );
}

#[test]
fn edits_are_saved_and_reloaded() {
    let dir = workspace("edits");
    new_map(&dir);

    let placed = stdout(&isle(
        &dir,
        &["place", "world.map", "900", "11", "11", "--rotation", "1"],
    ));
    assert!(placed.contains("BuildingPlaced"), "{placed}");

    let inspected = stdout(&isle(&dir, &["inspect", "world.map"]));
    assert!(inspected.contains("building tiles 2"), "{inspected}");
    assert!(inspected.contains("deep water tiles 2484"), "{inspected}");

    let selected = stdout(&isle(&dir, &["select", "world.map", "11", "12"]));
    assert!(selected.starts_with("building 900"), "{selected}");
    assert!(selected.contains("SelectionChanged"), "{selected}");

    let removed = stdout(&isle(&dir, &["remove", "world.map", "11", "12"]));
    assert!(removed.contains("BuildingRemoved"), "{removed}");

    let inspected = stdout(&isle(&dir, &["inspect", "world.map"]));
    assert!(inspected.contains("building tiles 0"), "{inspected}");
}

#[test]
fn rejected_edits_fail_without_saving() {
    let dir = workspace("rejected");
    new_map(&dir);
    let before = fs::read_to_string(dir.join("world.map")).expect("map");

    let output = isle(&dir, &["place", "world.map", "900", "13", "10"]);
    assert!(!output.status.success());
    assert!(
        String::from_utf8_lossy(&output.stderr).contains("OutOfBounds"),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );

    let output = isle(&dir, &["remove", "world.map", "11", "11"]);
    assert!(!output.status.success(), "nothing to remove");

    let after = fs::read_to_string(dir.join("world.map")).expect("map");
    assert_eq!(before, after);
}

#[test]
fn picking_and_frames_follow_the_view() {
    let dir = workspace("view");
    new_map(&dir);

    // centre of the elevated diamond of (12, 10) at full zoom
    let picked = stdout(&isle(&dir, &["pick", "world.map", "96", "348"]));
    assert_eq!(picked.trim(), "cell (12, 10) terrain 101");

    let outside = stdout(&isle(&dir, &["pick", "world.map", "-4000", "10"]));
    assert!(outside.starts_with("outside"), "{outside}");

    let frame = stdout(&isle(&dir, &["frame", "world.map", "--grids"]));
    assert!(frame.contains("DeepWater instances 2484"), "{frame}");
    assert!(frame.contains("kind: Mixed"), "{frame}");
    assert!(frame.contains("kind: Grid"), "{frame}");

    let far = stdout(&isle(
        &dir,
        &["frame", "world.map", "--camera-x", "9000", "--zoom", "sgfx"],
    ));
    assert!(!far.contains("Island"), "{far}");
}

#[test]
fn map_files_must_use_the_map_extension() {
    let dir = workspace("extension");
    let output = isle(
        &dir,
        &["new", "world.json", "--width", "50", "--height", "50"],
    );
    assert!(!output.status.success());
}

#[test]
fn view_changes_are_logged_at_debug_level() {
    let dir = workspace("view-log");
    new_map(&dir);

    let output = isle(
        &dir,
        &[
            "--log", "debug", "pick", "world.map", "96", "348", "--rotation", "1", "--zoom", "mgfx",
        ],
    );
    let _ = stdout(&output);
    let logged = String::from_utf8_lossy(&output.stderr);
    assert!(logged.contains("view changed"), "{logged}");
    assert!(logged.contains("RotationChanged"), "{logged}");
    assert!(logged.contains("ZoomChanged"), "{logged}");
}
