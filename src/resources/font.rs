//! Typeface fonts in the three.js JSON format and the prioritized loader.
//!
//! A typeface file maps characters to outlines encoded as compact path
//! commands. [`Typeface::generate_shapes`] turns a string into filled 2D shapes
//! (outer contour plus holes) ready for triangulation and extrusion.

use std::collections::HashMap;

use anyhow::Context as _;
use cgmath::{InnerSpace, Vector2};
use serde::Deserialize;

use crate::resources::AssetSource;

#[derive(Debug, Clone, Deserialize)]
pub struct Glyph {
    /// Horizontal advance in font units.
    pub ha: f32,
    #[serde(default)]
    pub x_min: Option<f32>,
    #[serde(default)]
    pub x_max: Option<f32>,
    /// Outline commands, absent for blank glyphs such as space.
    #[serde(default)]
    pub o: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typeface {
    pub glyphs: HashMap<String, Glyph>,
    #[serde(default)]
    pub family_name: String,
    pub resolution: f32,
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub underline_thickness: f32,
}

/// A filled region: counter-clockwise outer contour and clockwise holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub outer: Vec<Vector2<f32>>,
    pub holes: Vec<Vec<Vector2<f32>>>,
}

impl Typeface {
    pub fn from_json(bytes: &[u8]) -> anyhow::Result<Self> {
        let typeface: Typeface =
            serde_json::from_slice(bytes).context("not a typeface JSON document")?;
        anyhow::ensure!(
            typeface.resolution > 0.0,
            "typeface resolution must be positive"
        );
        Ok(typeface)
    }

    pub fn line_height(&self, size: f32) -> f32 {
        let bb = &self.bounding_box;
        (bb.y_max - bb.y_min + self.underline_thickness) * size / self.resolution
    }

    /// Lays out `text` and returns the filled shapes of all glyphs.
    ///
    /// `size` is the height of one em in scene units; curves are flattened
    /// with `curve_segments` straight pieces each.
    pub fn generate_shapes(&self, text: &str, size: f32, curve_segments: u32) -> Vec<Shape> {
        let scale = size / self.resolution;
        let line_height = self.line_height(size);
        let mut offset = Vector2::new(0.0, 0.0);
        let mut contours = Vec::new();

        for ch in text.chars() {
            if ch == '\n' {
                offset.x = 0.0;
                offset.y -= line_height;
                continue;
            }
            let Some(glyph) = self.glyphs.get(&ch.to_string()) else {
                log::warn!(
                    "Character {:?} does not exist in font family {}",
                    ch,
                    self.family_name
                );
                continue;
            };
            if let Some(outline) = &glyph.o {
                match parse_outline(outline, scale, offset, curve_segments) {
                    Ok(mut glyph_contours) => contours.append(&mut glyph_contours),
                    Err(e) => log::warn!("Skipping malformed glyph {:?}: {}", ch, e),
                }
            }
            offset.x += glyph.ha * scale;
        }

        to_shapes(contours)
    }
}

fn parse_outline(
    outline: &str,
    scale: f32,
    offset: Vector2<f32>,
    curve_segments: u32,
) -> anyhow::Result<Vec<Vec<Vector2<f32>>>> {
    let tokens: Vec<&str> = outline.split_whitespace().collect();
    let mut i = 0;
    let next = |i: &mut usize| -> anyhow::Result<f32> {
        let token = tokens.get(*i).context("outline ended early")?;
        *i += 1;
        Ok(token.parse::<f32>().context("bad coordinate")?)
    };
    let point = |i: &mut usize| -> anyhow::Result<Vector2<f32>> {
        let x = next(i)?;
        let y = next(i)?;
        Ok(Vector2::new(x * scale + offset.x, y * scale + offset.y))
    };

    let divisions = curve_segments.max(1);
    let mut contours: Vec<Vec<Vector2<f32>>> = Vec::new();
    let mut current: Vec<Vector2<f32>> = Vec::new();
    while i < tokens.len() {
        let command = tokens[i];
        i += 1;
        match command {
            "m" => {
                if current.len() > 2 {
                    contours.push(std::mem::take(&mut current));
                }
                current.clear();
                current.push(point(&mut i)?);
            }
            "l" => current.push(point(&mut i)?),
            "q" => {
                let end = point(&mut i)?;
                let ctrl = point(&mut i)?;
                let start = *current.last().context("curve without start point")?;
                for d in 1..=divisions {
                    let t = d as f32 / divisions as f32;
                    let u = 1.0 - t;
                    current.push(start * (u * u) + ctrl * (2.0 * u * t) + end * (t * t));
                }
            }
            "b" => {
                let end = point(&mut i)?;
                let c1 = point(&mut i)?;
                let c2 = point(&mut i)?;
                let start = *current.last().context("curve without start point")?;
                for d in 1..=divisions {
                    let t = d as f32 / divisions as f32;
                    let u = 1.0 - t;
                    current.push(
                        start * (u * u * u)
                            + c1 * (3.0 * u * u * t)
                            + c2 * (3.0 * u * t * t)
                            + end * (t * t * t),
                    );
                }
            }
            // closePath; the next `m` starts a new contour anyway
            "z" => (),
            other => anyhow::bail!("unknown outline command {other:?}"),
        }
    }
    if current.len() > 2 {
        contours.push(current);
    }

    Ok(contours.into_iter().filter_map(clean_contour).collect())
}

/// Drops repeated points (including the closing duplicate) and degenerate contours.
fn clean_contour(contour: Vec<Vector2<f32>>) -> Option<Vec<Vector2<f32>>> {
    const EPS: f32 = 1e-10;
    let mut cleaned: Vec<Vector2<f32>> = Vec::with_capacity(contour.len());
    for p in contour {
        if cleaned.last().map_or(true, |&q| (p - q).magnitude2() > EPS) {
            cleaned.push(p);
        }
    }
    while cleaned.len() > 1 && (cleaned[0] - cleaned[cleaned.len() - 1]).magnitude2() <= EPS {
        cleaned.pop();
    }
    if cleaned.len() < 3 || signed_area(&cleaned).abs() <= EPS {
        return None;
    }
    Some(cleaned)
}

/// Shoelace area, positive for counter-clockwise contours.
pub fn signed_area(contour: &[Vector2<f32>]) -> f32 {
    let n = contour.len();
    (0..n)
        .map(|i| {
            let a = contour[i];
            let b = contour[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum::<f32>()
        * 0.5
}

pub fn point_in_polygon(p: Vector2<f32>, polygon: &[Vector2<f32>]) -> bool {
    let mut inside = false;
    let n = polygon.len();
    let mut j = n - 1;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[j];
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Groups contours into shapes using nesting depth: contours inside an even
/// number of other contours are solids, odd ones are holes of the smallest
/// solid containing them.
fn to_shapes(contours: Vec<Vec<Vector2<f32>>>) -> Vec<Shape> {
    let containers: Vec<Vec<usize>> = contours
        .iter()
        .enumerate()
        .map(|(i, contour)| {
            contours
                .iter()
                .enumerate()
                .filter(|(j, other)| *j != i && point_in_polygon(contour[0], other))
                .map(|(j, _)| j)
                .collect()
        })
        .collect();
    let areas: Vec<f32> = contours.iter().map(|c| signed_area(c).abs()).collect();

    let mut shapes: Vec<Shape> = Vec::new();
    let mut shape_of_contour: HashMap<usize, usize> = HashMap::new();
    for (i, contour) in contours.iter().enumerate() {
        if containers[i].len() % 2 == 0 {
            let mut outer = contour.clone();
            if signed_area(&outer) < 0.0 {
                outer.reverse();
            }
            shape_of_contour.insert(i, shapes.len());
            shapes.push(Shape {
                outer,
                holes: Vec::new(),
            });
        }
    }
    for (i, contour) in contours.iter().enumerate() {
        if containers[i].len() % 2 == 1 {
            let parent = containers[i]
                .iter()
                .filter(|j| containers[**j].len() % 2 == 0)
                .min_by(|a, b| areas[**a].total_cmp(&areas[**b]))
                .and_then(|j| shape_of_contour.get(j));
            match parent {
                Some(&shape) => {
                    let mut hole = contour.clone();
                    if signed_area(&hole) > 0.0 {
                        hole.reverse();
                    }
                    shapes[shape].holes.push(hole);
                }
                None => log::warn!("Dropping a hole contour without enclosing solid"),
            }
        }
    }
    shapes
}

/// Result of a successful font load: where it came from and the parsed font.
#[derive(Debug, Clone)]
pub struct LoadedFont {
    pub url: String,
    pub typeface: Typeface,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedAttempt {
    pub url: String,
    pub reason: String,
}

/// Every location of the list failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("font could not be loaded from any of {} locations", .attempts.len())]
pub struct FontLoadFailure {
    pub attempts: Vec<FailedAttempt>,
}

/// Tries a fixed, ordered list of font locations until one yields a typeface.
#[derive(Debug, Clone)]
pub struct FontLoader {
    urls: Vec<String>,
}

impl FontLoader {
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
        }
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Walks the list in order. A fetch or parse failure advances to the next
    /// entry; the failure is reported only after the list is exhausted.
    pub async fn load(&self, source: &dyn AssetSource) -> Result<LoadedFont, FontLoadFailure> {
        let mut attempts = Vec::new();
        for url in &self.urls {
            let result = match source.fetch(url).await {
                Ok(bytes) => Typeface::from_json(&bytes),
                Err(e) => Err(e),
            };
            match result {
                Ok(typeface) => {
                    log::info!("Loaded font {} from {}", typeface.family_name, url);
                    return Ok(LoadedFont {
                        url: url.clone(),
                        typeface,
                    });
                }
                Err(e) => {
                    log::warn!("Font not available at {}: {:#}", url, e);
                    attempts.push(FailedAttempt {
                        url: url.clone(),
                        reason: format!("{e:#}"),
                    });
                }
            }
        }
        log::error!("All {} font locations failed", attempts.len());
        Err(FontLoadFailure { attempts })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Square "o"-like glyph with a square hole and a blank space glyph.
    pub(crate) const BOX_FONT: &str = r#"{
        "glyphs": {
            "o": { "ha": 1200, "x_min": 0, "x_max": 1000,
                   "o": "m 0 0 l 1000 0 l 1000 1000 l 0 1000 l 0 0 m 250 250 l 250 750 l 750 750 l 750 250 l 250 250" },
            "i": { "ha": 400, "x_min": 0, "x_max": 200,
                   "o": "m 0 0 l 0 1000 l 200 1000 l 200 0 z" },
            "c": { "ha": 1000, "x_min": 0, "x_max": 1000,
                   "o": "m 0 0 l 1000 0 q 1000 1000 1000 500 l 0 1000" },
            " ": { "ha": 300 }
        },
        "familyName": "Boxes",
        "resolution": 1000,
        "boundingBox": { "xMin": 0, "xMax": 1200, "yMin": -200, "yMax": 1000 },
        "underlineThickness": 50
    }"#;

    pub(crate) fn box_font() -> Typeface {
        Typeface::from_json(BOX_FONT.as_bytes()).unwrap()
    }

    #[test]
    fn should_parse_typeface_json() {
        let font = box_font();
        assert_eq!(font.family_name, "Boxes");
        assert_eq!(font.glyphs.len(), 4);
        assert!(font.glyphs[" "].o.is_none());
        assert!((font.line_height(1.0) - 1.25).abs() < 1e-6);
    }

    #[test]
    fn should_reject_non_typeface_json() {
        assert!(Typeface::from_json(b"<html>404</html>").is_err());
        assert!(Typeface::from_json(br#"{"glyphs": {}}"#).is_err());
    }

    #[test]
    fn should_classify_holes_and_orient_contours() {
        let shapes = box_font().generate_shapes("o", 1.0, 4);
        assert_eq!(shapes.len(), 1);
        let shape = &shapes[0];
        assert_eq!(shape.outer.len(), 4);
        assert_eq!(shape.holes.len(), 1);
        assert!(signed_area(&shape.outer) > 0.0);
        assert!(signed_area(&shape.holes[0]) < 0.0);
        assert!((signed_area(&shape.outer) - 1.0).abs() < 1e-5);
        assert!((signed_area(&shape.holes[0]) + 0.25).abs() < 1e-5);
    }

    #[test]
    fn should_advance_and_break_lines() {
        let font = box_font();
        let shapes = font.generate_shapes("i i\ni", 2.0, 4);
        assert_eq!(shapes.len(), 3);
        let min_x = |s: &Shape| s.outer.iter().map(|p| p.x).fold(f32::MAX, f32::min);
        let min_y = |s: &Shape| s.outer.iter().map(|p| p.y).fold(f32::MAX, f32::min);
        // "i" advances 0.8, the space 0.6
        assert!((min_x(&shapes[0]) - 0.0).abs() < 1e-5);
        assert!((min_x(&shapes[1]) - 1.4).abs() < 1e-5);
        assert!((min_x(&shapes[2]) - 0.0).abs() < 1e-5);
        assert!((min_y(&shapes[2]) + 2.5).abs() < 1e-5);
    }

    #[test]
    fn should_flatten_curves_with_requested_segments() {
        let font = box_font();
        let coarse = font.generate_shapes("c", 1.0, 2);
        let fine = font.generate_shapes("c", 1.0, 12);
        assert_eq!(coarse[0].outer.len() + 10, fine[0].outer.len());
    }

    #[test]
    fn should_skip_unknown_characters() {
        let shapes = box_font().generate_shapes("x?o", 1.0, 4);
        assert_eq!(shapes.len(), 1);
    }

    #[test]
    fn load_failure_should_count_the_attempts() {
        let attempt = |url: &str| FailedAttempt {
            url: url.to_string(),
            reason: "404 Not Found".to_string(),
        };
        let failure = FontLoadFailure {
            attempts: vec![attempt("fonts/a.json"), attempt("https://cdn/a.json")],
        };
        assert_eq!(
            failure.to_string(),
            "font could not be loaded from any of 2 locations"
        );
        let error: &dyn std::error::Error = &failure;
        assert!(error.source().is_none());
    }
}
