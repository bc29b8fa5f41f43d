//! Loading of external assets (images, fonts) for native and WASM targets.
//!
//! Relative names are resolved against the asset root: `<origin>/<root>/` on
//! the web and the `<root>` directory natively. Absolute `http(s)` URLs are
//! fetched as-is on both platforms.

use std::{future::Future, pin::Pin, sync::OnceLock};

use anyhow::Context as _;

pub mod font;
pub mod procedural;

static ASSET_ROOT: OnceLock<String> = OnceLock::new();

/// Sets the asset root once at startup. Later calls are ignored.
pub fn set_asset_root(root: &str) {
    if ASSET_ROOT.set(root.trim_end_matches('/').to_string()).is_err() {
        log::warn!("Asset root was already set to {}", asset_root());
    }
}

pub fn asset_root() -> &'static str {
    ASSET_ROOT.get().map(String::as_str).unwrap_or("assets")
}

pub fn is_remote(file_name: &str) -> bool {
    file_name.starts_with("http://") || file_name.starts_with("https://")
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    if is_remote(file_name) {
        return Ok(reqwest::Url::parse(file_name)?);
    }
    let window = web_sys::window().context("no window available")?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("page origin is not readable"))?;
    let base = reqwest::Url::parse(&format!("{}/{}/", origin, asset_root()))?;
    Ok(base.join(file_name.trim_start_matches('/'))?)
}

async fn fetch_remote(url: &str) -> anyhow::Result<Vec<u8>> {
    let response = reqwest::get(url).await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        fetch_remote(url.as_str()).await?
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = if is_remote(file_name) {
        fetch_remote(file_name).await?
    } else {
        let path = std::path::Path::new(asset_root()).join(file_name.trim_start_matches('/'));
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("cannot read {}", path.display()))?
    };

    Ok(data)
}

/// Decodes an image asset into RGBA pixels.
pub async fn load_image(file_name: &str) -> anyhow::Result<image::RgbaImage> {
    let data = load_binary(file_name).await?;
    let img = image::load_from_memory(&data)
        .with_context(|| format!("cannot decode image {file_name}"))?;
    Ok(img.to_rgba8())
}

/// Anything that can hand out the bytes behind an asset URL.
///
/// Loaders that try several locations are written against this trait so that
/// they can run without network or file system access.
pub trait AssetSource {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<u8>>> + 'a>>;
}

/// Fetches assets from the asset root or, for absolute URLs, over HTTP.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpAssets;

impl AssetSource for HttpAssets {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<u8>>> + 'a>> {
        Box::pin(load_binary(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_detect_remote_urls() {
        assert!(is_remote("https://threejs.org/fonts/a.json"));
        assert!(is_remote("http://localhost/a.json"));
        assert!(!is_remote("fonts/a.json"));
        assert!(!is_remote("/static/fonts/a.json"));
    }
}
