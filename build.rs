use anyhow::*;
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::env;
use std::path::PathBuf;

/// Copies `assets/` (textures, matcaps, fonts) into the build output and tells
/// the crate where the copy lives, so native runs find them from any directory.
fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets");

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets_src = manifest_dir.join("assets");

    let asset_dir = if assets_src.is_dir() {
        let mut copy_options = CopyOptions::new();
        copy_options.overwrite = true;
        copy_items(&[&assets_src], &out_dir, &copy_options)
            .with_context(|| format!("copying {}", assets_src.display()))?;
        out_dir.join("assets")
    } else {
        assets_src
    };
    println!("cargo:rustc-env=FLOW_BUNDLED_ASSETS={}", asset_dir.display());

    Ok(())
}
