use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const MIN_WINDOW_WIDTH: i32 = 220;
const MIN_WINDOW_HEIGHT: i32 = 140;

#[derive(Debug, Deserialize)]
struct LauncherFile {
    schema_version: u32,
    #[serde(default, rename = "launcher")]
    launchers: Vec<Launcher>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Launcher {
    id: String,
    title: String,
    icon: String,
    width: i32,
    height: i32,
    #[serde(default = "default_true")]
    resizable: bool,
    #[serde(default = "default_true")]
    maximizable: bool,
}

fn main() {
    let crate_root = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("manifest dir"));
    let path = crate_root.join("launchers.toml");
    println!("cargo:rerun-if-changed={}", path.display());

    let raw = fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()));
    let file: LauncherFile = toml::from_str(&raw)
        .unwrap_or_else(|err| panic!("failed to parse {}: {err}", path.display()));
    if file.schema_version != 1 {
        panic!(
            "launcher schema mismatch in {}: expected 1 found {}",
            path.display(),
            file.schema_version
        );
    }

    let mut seen = BTreeSet::new();
    for launcher in &file.launchers {
        if !seen.insert(launcher.id.clone()) {
            panic!("duplicate launcher id `{}` in {}", launcher.id, path.display());
        }
        if launcher.width < MIN_WINDOW_WIDTH || launcher.height < MIN_WINDOW_HEIGHT {
            panic!(
                "launcher `{}` is smaller than the {MIN_WINDOW_WIDTH}x{MIN_WINDOW_HEIGHT} window floor",
                launcher.id
            );
        }
    }

    let json = serde_json::to_string_pretty(&file.launchers).expect("serialize launcher catalog");
    let generated = format!(
        "/// Build-time generated launcher catalog JSON.\n\
pub const LAUNCHER_CATALOG_JSON: &str = r##\"{}\"##;\n",
        json
    );

    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("OUT_DIR"));
    let out_file = out_dir.join("launcher_catalog_generated.rs");
    fs::write(&out_file, generated)
        .unwrap_or_else(|err| panic!("failed to write {}: {err}", out_file.display()));
}
