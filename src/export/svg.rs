//! SVG serialization of export scenes.

use std::fmt::Write;

use super::composer::{Fill, MapScene, SceneLegend};
use crate::constants::{LEGEND_FONT_SIZE, LEGEND_TEXT, LEGEND_TITLE, REGION_STROKE};

/// Stroke of outlined (uncolored overlay) regions.
const OUTLINE_STROKE: &str = "#9E9E9E";

/// Renders a complete standalone SVG document.
#[must_use]
pub fn render(scene: &MapScene) -> String {
    let mut out = String::new();
    let stroke_width = 0.5 * scene.scale;

    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = scene.width,
        h = scene.height
    );
    let _ = writeln!(
        out,
        r#"  <rect width="100%" height="100%" fill="{}"/>"#,
        scene.background
    );

    let splits: Vec<(usize, &Fill)> = scene
        .regions
        .iter()
        .enumerate()
        .filter(|(_, r)| matches!(r.fill, Fill::Split { .. }))
        .map(|(idx, r)| (idx, &r.fill))
        .collect();

    if !splits.is_empty() {
        out.push_str("  <defs>\n");
        for (idx, fill) in splits {
            if let Fill::Split { top, bottom } = fill {
                // Hard stop at 50%: top color over bottom color.
                let _ = writeln!(
                    out,
                    r#"    <linearGradient id="split-{idx}" x1="0" y1="0" x2="0" y2="1"><stop offset="0" stop-color="{top}"/><stop offset="0.5" stop-color="{top}"/><stop offset="0.5" stop-color="{bottom}"/><stop offset="1" stop-color="{bottom}"/></linearGradient>"#
                );
            }
        }
        out.push_str("  </defs>\n");
    }

    out.push_str("  <g id=\"regions\">\n");
    for (idx, region) in scene.regions.iter().enumerate() {
        let d = path_data(&region.rings);
        if d.is_empty() {
            continue;
        }
        let paint = match region.fill {
            Fill::Solid(color) => format!(
                r#"fill="{color}" stroke="{REGION_STROKE}" stroke-width="{stroke_width}""#
            ),
            Fill::Split { .. } => format!(
                r#"fill="url(#split-{idx})" stroke="{REGION_STROKE}" stroke-width="{stroke_width}""#
            ),
            Fill::Outline => format!(
                r#"fill="none" stroke="{OUTLINE_STROKE}" stroke-width="{}""#,
                stroke_width / 2.0
            ),
        };
        let _ = writeln!(
            out,
            r#"    <path data-region="{}" d="{d}" fill-rule="evenodd" {paint}><title>{}</title></path>"#,
            escape(&region.id),
            escape(&region.title)
        );
    }
    out.push_str("  </g>\n");

    if let Some(legend) = &scene.legend {
        render_legend(&mut out, legend);
    }

    out.push_str("</svg>\n");
    out
}

fn render_legend(out: &mut String, legend: &SceneLegend) {
    let s = legend.scale;
    let font_size = LEGEND_FONT_SIZE * s;
    let rect = legend.rect;

    out.push_str("  <g id=\"legend\" font-family=\"sans-serif\">\n");
    let _ = writeln!(
        out,
        r##"    <rect x="{}" y="{}" width="{}" height="{}" fill="#FFFFFF" stroke="#CCCCCC" stroke-width="{}"/>"##,
        rect.x,
        rect.y,
        rect.width,
        rect.height,
        s
    );

    let [tx, ty] = legend.title_origin();
    let _ = writeln!(
        out,
        r#"    <text x="{tx}" y="{ty}" font-size="{}" font-weight="bold" fill="{LEGEND_TEXT}">{LEGEND_TITLE}</text>"#,
        font_size * 1.1
    );

    for (idx, row) in legend.rows.iter().enumerate() {
        let swatch = legend.swatch(idx);
        let [lx, ly] = legend.label_origin(idx);
        let _ = writeln!(
            out,
            r##"    <rect x="{}" y="{}" width="{}" height="{}" fill="{}" stroke="#666666" stroke-width="{}"/>"##,
            swatch.x,
            swatch.y,
            swatch.width,
            swatch.height,
            row.color,
            0.5 * s
        );
        let _ = writeln!(
            out,
            r#"    <text x="{lx}" y="{ly}" font-size="{font_size}" fill="{LEGEND_TEXT}">{}</text>"#,
            escape(&row.label)
        );
    }
    out.push_str("  </g>\n");
}

/// SVG path data for a set of rings, e.g. `M1,2L3,4L5,6Z`.
#[must_use]
pub fn path_data(rings: &[Vec<[f64; 2]>]) -> String {
    let mut d = String::new();
    for ring in rings.iter().filter(|r| r.len() >= 3) {
        for (idx, [x, y]) in ring.iter().enumerate() {
            let cmd = if idx == 0 { 'M' } else { 'L' };
            let _ = write!(d, "{cmd}{:.2},{:.2}", x, y);
        }
        d.push('Z');
    }
    d
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
