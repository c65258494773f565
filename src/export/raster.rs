//! Rasterization and image encoding.
//!
//! Scenes are drawn with `plotters` into an RGB buffer. The rings of a
//! region are joined into one polygon so holes stay empty. Two-color regions
//! are clipped at the vertical midpoint of their projected extent into a top
//! and a bottom polygon.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use plotters::coord::Shift;
use plotters::prelude::{
    BitMapBackend, Color, DrawingArea, FontStyle, IntoDrawingArea, IntoFont, PathElement,
    Polygon, RGBColor, Rectangle, Text,
};
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::io::Cursor;
use tracing::warn;

use super::composer::{ExportError, Fill, MapScene, Rect, SceneLegend, SceneRegion};
use crate::config::ImageFormat;
use crate::constants::{LEGEND_FONT_SIZE, LEGEND_TEXT, LEGEND_TITLE, REGION_STROKE};
use crate::models::RgbColor;

const JPEG_QUALITY: u8 = 92;
const FONT_FAMILY: &str = "sans-serif";
const LEGEND_FILL: RgbColor = RgbColor::new(0xFF, 0xFF, 0xFF);
const LEGEND_BORDER: RgbColor = RgbColor::new(0xCC, 0xCC, 0xCC);
const SWATCH_BORDER: RgbColor = RgbColor::new(0x66, 0x66, 0x66);
const OUTLINE_STROKE: RgbColor = RgbColor::new(0x9E, 0x9E, 0x9E);

type Canvas<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Draws the scene into an RGB buffer.
///
/// Legend text needs a system `sans-serif` font. Without one the labels are
/// skipped with a warning and the rest of the image is still produced.
pub fn rasterize(scene: &MapScene) -> Result<RgbImage, ExportError> {
    let mut buffer = vec![0_u8; scene.width as usize * scene.height as usize * 3];
    {
        let canvas =
            BitMapBackend::with_buffer(&mut buffer, (scene.width, scene.height)).into_drawing_area();
        canvas.fill(&rgb(scene.background)).map_err(draw_error)?;

        for region in &scene.regions {
            draw_region(&canvas, region)?;
        }
        if let Some(legend) = &scene.legend {
            draw_legend(&canvas, legend)?;
        }
        canvas.present().map_err(draw_error)?;
    }

    RgbImage::from_raw(scene.width, scene.height, buffer).ok_or(ExportError::InvalidDimensions {
        width: f64::from(scene.width),
        height: f64::from(scene.height),
    })
}

/// Encodes pixels as PNG or JPEG.
pub fn encode(image: &RgbImage, format: ImageFormat) -> Result<Vec<u8>, ExportError> {
    let mut out = Cursor::new(Vec::new());
    match format {
        ImageFormat::Png => image.write_to(&mut out, image::ImageFormat::Png)?,
        ImageFormat::Jpeg => {
            JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).encode_image(image)?;
        }
    }
    Ok(out.into_inner())
}

fn draw_region(canvas: &Canvas<'_>, region: &SceneRegion) -> Result<(), ExportError> {
    let outline = match region.fill {
        Fill::Solid(color) => {
            fill_rings(canvas, &region.rings, color)?;
            REGION_STROKE
        }
        Fill::Split { top, bottom } => {
            let mid = region
                .vertical_extent()
                .map_or(0.0, |(lo, hi)| (lo + hi) / 2.0);
            let upper: Vec<_> = region.rings.iter().map(|r| clip_ring(r, mid, true)).collect();
            let lower: Vec<_> = region.rings.iter().map(|r| clip_ring(r, mid, false)).collect();
            fill_rings(canvas, &upper, top)?;
            fill_rings(canvas, &lower, bottom)?;
            REGION_STROKE
        }
        Fill::Outline => OUTLINE_STROKE,
    };

    for ring in region.rings.iter().filter(|r| r.len() >= 2) {
        let points: Vec<_> = ring.iter().map(|p| to_pixel(*p)).collect();
        canvas
            .draw(&PathElement::new(points, rgb(outline).stroke_width(1)))
            .map_err(draw_error)?;
    }
    Ok(())
}

fn fill_rings(
    canvas: &Canvas<'_>,
    rings: &[Vec<[f64; 2]>],
    color: RgbColor,
) -> Result<(), ExportError> {
    let points = joined_rings(rings);
    if points.len() < 3 {
        return Ok(());
    }
    canvas
        .draw(&Polygon::new(points, rgb(color).filled()))
        .map_err(draw_error)
}

/// Joins rings into a single vertex list for an even-odd fill.
///
/// Every ring after the first is entered from and left back to the first
/// ring's start point, so each bridge edge appears twice and cancels out.
fn joined_rings(rings: &[Vec<[f64; 2]>]) -> Vec<(i32, i32)> {
    let mut rings = rings.iter().filter(|r| r.len() >= 3).map(|ring| {
        let mut points: Vec<_> = ring.iter().map(|p| to_pixel(*p)).collect();
        if points.first() != points.last() {
            points.push(points[0]);
        }
        points
    });

    let Some(mut joined) = rings.next() else {
        return Vec::new();
    };
    let anchor = joined[0];
    for ring in rings {
        joined.extend(ring);
        joined.push(anchor);
    }
    joined
}

/// Clips a ring against the horizontal line `y = mid`, keeping the part
/// above it (smaller y) or below it.
fn clip_ring(ring: &[[f64; 2]], mid: f64, keep_upper: bool) -> Vec<[f64; 2]> {
    let inside = |p: [f64; 2]| if keep_upper { p[1] <= mid } else { p[1] >= mid };
    let crossing = |a: [f64; 2], b: [f64; 2]| {
        let t = (mid - a[1]) / (b[1] - a[1]);
        [a[0] + t * (b[0] - a[0]), mid]
    };

    let mut clipped = Vec::with_capacity(ring.len() + 2);
    for (idx, &current) in ring.iter().enumerate() {
        let previous = ring[(idx + ring.len() - 1) % ring.len()];
        match (inside(previous), inside(current)) {
            (true, true) => clipped.push(current),
            (true, false) => clipped.push(crossing(previous, current)),
            (false, true) => {
                clipped.push(crossing(previous, current));
                clipped.push(current);
            }
            (false, false) => {}
        }
    }
    clipped
}

fn draw_legend(canvas: &Canvas<'_>, legend: &SceneLegend) -> Result<(), ExportError> {
    let frame = corners(legend.rect);
    canvas
        .draw(&Rectangle::new(frame, rgb(LEGEND_FILL).filled()))
        .map_err(draw_error)?;
    canvas
        .draw(&Rectangle::new(frame, rgb(LEGEND_BORDER).stroke_width(1)))
        .map_err(draw_error)?;

    for (idx, row) in legend.rows.iter().enumerate() {
        let swatch = corners(legend.swatch(idx));
        canvas
            .draw(&Rectangle::new(swatch, rgb(row.color).filled()))
            .map_err(draw_error)?;
        canvas
            .draw(&Rectangle::new(swatch, rgb(SWATCH_BORDER).stroke_width(1)))
            .map_err(draw_error)?;
    }

    if let Err(err) = draw_legend_text(canvas, legend) {
        warn!("Legend labels skipped: {err}");
    }
    Ok(())
}

fn draw_legend_text(canvas: &Canvas<'_>, legend: &SceneLegend) -> Result<(), ExportError> {
    let size = LEGEND_FONT_SIZE * legend.scale;
    let color = rgb(LEGEND_TEXT);
    let baseline = Pos::new(HPos::Left, VPos::Bottom);

    let title_style = (FONT_FAMILY, size * 1.1, FontStyle::Bold)
        .into_font()
        .color(&color)
        .pos(baseline);
    canvas
        .draw(&Text::new(LEGEND_TITLE, to_pixel(legend.title_origin()), title_style))
        .map_err(draw_error)?;

    let label_style = (FONT_FAMILY, size).into_font().color(&color).pos(baseline);
    for (idx, row) in legend.rows.iter().enumerate() {
        canvas
            .draw(&Text::new(
                row.label.as_str(),
                to_pixel(legend.label_origin(idx)),
                label_style.clone(),
            ))
            .map_err(draw_error)?;
    }
    Ok(())
}

fn draw_error(err: impl std::fmt::Display) -> ExportError {
    ExportError::Draw(err.to_string())
}

const fn rgb(color: RgbColor) -> RGBColor {
    RGBColor(color.r, color.g, color.b)
}

fn to_pixel(point: [f64; 2]) -> (i32, i32) {
    (point[0].round() as i32, point[1].round() as i32)
}

fn corners(rect: Rect) -> [(i32, i32); 2] {
    [
        to_pixel([rect.x, rect.y]),
        to_pixel([rect.x + rect.width, rect.y + rect.height]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::composer::SceneLegendRow;
    use image::Rgb;

    const RED: RgbColor = RgbColor::new(255, 0, 0);
    const BLUE: RgbColor = RgbColor::new(0, 0, 255);
    const WHITE: RgbColor = RgbColor::new(255, 255, 255);

    fn scene(regions: Vec<SceneRegion>) -> MapScene {
        MapScene {
            width: 40,
            height: 40,
            scale: 1.0,
            background: WHITE,
            regions,
            legend: None,
        }
    }

    fn square(x: f64, y: f64, size: f64) -> Vec<[f64; 2]> {
        vec![[x, y], [x + size, y], [x + size, y + size], [x, y + size], [x, y]]
    }

    fn region(rings: Vec<Vec<[f64; 2]>>, fill: Fill) -> SceneRegion {
        SceneRegion {
            id: "r".into(),
            title: "r".into(),
            rings,
            fill,
        }
    }

    fn pixel(image: &RgbImage, x: u32, y: u32) -> RgbColor {
        let Rgb([r, g, b]) = *image.get_pixel(x, y);
        RgbColor::new(r, g, b)
    }

    fn legend_scene(label: &str) -> MapScene {
        let mut scene = scene(Vec::new());
        scene.width = 400;
        scene.height = 100;
        scene.legend = Some(SceneLegend {
            rect: Rect { x: 40.0, y: 0.0, width: 360.0, height: 100.0 },
            scale: 1.0,
            rows: vec![SceneLegendRow { color: BLUE, label: label.into() }],
        });
        scene
    }

    #[test]
    fn test_solid_fill_covers_interior_only() {
        let image =
            rasterize(&scene(vec![region(vec![square(10.0, 10.0, 20.0)], Fill::Solid(RED))]))
                .unwrap();

        assert_eq!(pixel(&image, 20, 20), RED);
        assert_eq!(pixel(&image, 5, 5), WHITE);
        assert_eq!(pixel(&image, 35, 20), WHITE);
    }

    #[test]
    fn test_even_odd_leaves_holes() {
        let rings = vec![square(0.0, 0.0, 40.0), square(10.0, 10.0, 20.0)];
        let image = rasterize(&scene(vec![region(rings, Fill::Solid(RED))])).unwrap();

        assert_eq!(pixel(&image, 5, 20), RED);
        assert_eq!(pixel(&image, 20, 20), WHITE);
    }

    #[test]
    fn test_split_fill_top_over_bottom() {
        let fill = Fill::Split { top: RED, bottom: BLUE };
        let image = rasterize(&scene(vec![region(vec![square(0.0, 0.0, 40.0)], fill)])).unwrap();

        assert_eq!(pixel(&image, 20, 10), RED);
        assert_eq!(pixel(&image, 20, 30), BLUE);
    }

    #[test]
    fn test_clip_ring_halves() {
        let ring = square(0.0, 0.0, 40.0);

        let upper = clip_ring(&ring, 20.0, true);
        assert!(upper.iter().all(|p| p[1] <= 20.0));
        assert!(upper.contains(&[40.0, 20.0]));
        assert!(upper.contains(&[0.0, 20.0]));

        let lower = clip_ring(&ring, 20.0, false);
        assert!(lower.iter().all(|p| p[1] >= 20.0));
        assert!(lower.contains(&[40.0, 40.0]));
    }

    #[test]
    fn test_outline_does_not_fill() {
        let image =
            rasterize(&scene(vec![region(vec![square(5.0, 5.0, 30.0)], Fill::Outline)])).unwrap();
        assert_eq!(pixel(&image, 20, 20), WHITE);
        assert_eq!(pixel(&image, 5, 20), OUTLINE_STROKE);
    }

    #[test]
    fn test_out_of_bounds_geometry_is_clipped() {
        let image =
            rasterize(&scene(vec![region(vec![square(-50.0, -50.0, 200.0)], Fill::Solid(RED))]))
                .unwrap();
        assert_eq!(pixel(&image, 0, 0), RED);
        assert_eq!(pixel(&image, 39, 39), RED);
    }

    #[test]
    fn test_legend_swatches() {
        let scene = legend_scene("Label 1");
        let swatch = scene.legend.as_ref().unwrap().swatch(0);
        let image = rasterize(&scene).unwrap();

        let cx = (swatch.x + swatch.width / 2.0) as u32;
        let cy = (swatch.y + swatch.height / 2.0) as u32;
        assert_eq!(pixel(&image, cx, cy), BLUE);
    }

    #[test]
    fn test_legend_labels_are_drawn() {
        let scene = legend_scene(&"W".repeat(40));
        let legend = scene.legend.clone().unwrap();
        let image = rasterize(&scene).unwrap();

        let [x, baseline] = legend.label_origin(0);
        let swatch = legend.swatch(0);
        let inked = (x as u32..scene.width)
            .flat_map(|px| (swatch.y as u32..baseline as u32 + 2).map(move |py| (px, py)))
            .filter(|&(px, py)| pixel(&image, px, py) != WHITE)
            .count();
        assert!(inked > 0, "label column should contain glyph pixels");
    }

    #[test]
    fn test_encode_png_round_trip_dimensions() {
        let image =
            rasterize(&scene(vec![region(vec![square(0.0, 0.0, 10.0)], Fill::Solid(RED))]))
                .unwrap();
        let bytes = encode(&image, ImageFormat::Png).unwrap();

        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 40));
    }

    #[test]
    fn test_encode_jpeg() {
        let image = rasterize(&scene(Vec::new())).unwrap();
        let bytes = encode(&image, ImageFormat::Jpeg).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
