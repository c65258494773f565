//! Offscreen export scenes.
//!
//! An export runs as a sequence of stages, each of which can fail on its own:
//!
//! 1. [`layout`] sizes the canvas from the base map size, the scale and the
//!    legend width.
//! 2. [`compose`] projects the visible regions and the legend into a
//!    [`MapScene`].
//! 3. The scene is serialized to SVG ([`super::svg`]) or rasterized
//!    ([`super::raster`]).
//! 4. Raster output is encoded to PNG or JPEG.
//! 5. [`deliver`] writes the bytes to disk.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]

use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use crate::config::{ExportConfig, ImageFormat};
use crate::constants::{
    DEFAULT_REGION_FILL, EXPORT_FILE_PREFIX, LEGEND_PADDING, LEGEND_ROW_HEIGHT, LEGEND_SWATCH_GAP,
    LEGEND_SWATCH_SIZE, LEGEND_TITLE_HEIGHT, MAP_MARGIN, MAX_EXPORT_DIMENSION,
};
use crate::map::{LegendIndex, SelectionStore};
use crate::models::{ColorList, RegionKind, RgbColor};

/// Failure of one export attempt. The store is never modified by an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Layout produced a canvas that cannot be allocated
    #[error("Invalid export dimensions: {width} x {height}")]
    InvalidDimensions {
        /// Computed width in pixels
        width: f64,
        /// Computed height in pixels
        height: f64,
    },
    /// Drawing the scene failed
    #[error("Failed to draw map: {0}")]
    Draw(String),
    /// The image encoder failed
    #[error("Failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
    /// JSON serialization failed
    #[error("Failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),
    /// Writing the output failed
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        /// Target path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Export settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Output image format
    pub format: ImageFormat,
    /// Resolution multiplier
    pub scale: f64,
    /// Base map width at scale 1
    pub base_width: u32,
    /// Base map height at scale 1
    pub base_height: u32,
    /// Draw the legend next to the map
    pub show_legend: bool,
    /// Canvas background
    pub background: RgbColor,
}

impl From<&ExportConfig> for ExportOptions {
    fn from(config: &ExportConfig) -> Self {
        Self {
            format: config.format,
            scale: config.scale,
            base_width: config.base_width,
            base_height: config.base_height,
            show_legend: config.show_legend,
            background: config.background,
        }
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::from(&ExportConfig::default())
    }
}

/// Axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

/// Canvas size and the placement of the map and legend.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportLayout {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Scale factor used for all metrics
    pub scale: f64,
    /// Map area
    pub map: Rect,
    /// Legend area, when the legend is shown and not empty
    pub legend: Option<Rect>,
}

/// Computes the canvas layout.
///
/// The canvas is the scaled base map plus the measured legend width; its
/// height is the larger of the map and legend heights.
pub fn layout(legend: &LegendIndex, options: &ExportOptions) -> Result<ExportLayout, ExportError> {
    let scale = options.scale;
    let map = Rect {
        x: 0.0,
        y: 0.0,
        width: f64::from(options.base_width) * scale,
        height: f64::from(options.base_height) * scale,
    };

    let legend_rect = (options.show_legend && !legend.is_empty()).then(|| Rect {
        x: map.width,
        y: 0.0,
        width: legend.measure(scale),
        height: legend.measure_height(scale),
    });

    let width = map.width + legend_rect.map_or(0.0, |r| r.width);
    let height = legend_rect.map_or(map.height, |r| map.height.max(r.height));

    let limit = f64::from(MAX_EXPORT_DIMENSION);
    let valid = |v: f64| v.is_finite() && v >= 1.0 && v <= limit;
    if !valid(width) || !valid(height) {
        return Err(ExportError::InvalidDimensions { width, height });
    }

    Ok(ExportLayout {
        // Both are finite and within [1, MAX_EXPORT_DIMENSION].
        width: width.ceil() as u32,
        height: height.ceil() as u32,
        scale,
        map,
        legend: legend_rect,
    })
}

/// How a region is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// One color
    Solid(RgbColor),
    /// Top color over bottom color, split at the vertical midpoint
    Split {
        /// Upper half
        top: RgbColor,
        /// Lower half
        bottom: RgbColor,
    },
    /// Border only (uncolored counties over their state)
    Outline,
}

impl Fill {
    fn for_colors(colors: &ColorList, fallback: Self) -> Self {
        match (colors.top(), colors.bottom()) {
            (Some(top), Some(bottom)) => Self::Split { top, bottom },
            (Some(top), None) => Self::Solid(top),
            _ => fallback,
        }
    }
}

/// A projected region.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneRegion {
    /// Region id
    pub id: String,
    /// Tooltip text
    pub title: String,
    /// Projected rings (outer rings and holes, filled even-odd)
    pub rings: Vec<Vec<[f64; 2]>>,
    /// Paint
    pub fill: Fill,
}

impl SceneRegion {
    /// Vertical extent `(min_y, max_y)` of the projected rings.
    #[must_use]
    pub fn vertical_extent(&self) -> Option<(f64, f64)> {
        let mut ys = self.rings.iter().flatten().map(|p| p[1]);
        let first = ys.next()?;
        Some(ys.fold((first, first), |(lo, hi), y| (lo.min(y), hi.max(y))))
    }
}

/// One legend row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneLegendRow {
    /// Swatch color
    pub color: RgbColor,
    /// Effective label
    pub label: String,
}

/// Legend placement and content.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneLegend {
    /// Legend box
    pub rect: Rect,
    /// Scale factor
    pub scale: f64,
    /// Rows in display order
    pub rows: Vec<SceneLegendRow>,
}

impl SceneLegend {
    /// Baseline origin of the title.
    #[must_use]
    pub fn title_origin(&self) -> [f64; 2] {
        let s = self.scale;
        [
            self.rect.x + LEGEND_PADDING * s,
            self.rect.y + LEGEND_PADDING * s + LEGEND_TITLE_HEIGHT * s * 0.7,
        ]
    }

    /// Swatch square of row `index`.
    #[must_use]
    pub fn swatch(&self, index: usize) -> Rect {
        let s = self.scale;
        let row_top = self.row_top(index);
        Rect {
            x: self.rect.x + LEGEND_PADDING * s,
            y: row_top + (LEGEND_ROW_HEIGHT - LEGEND_SWATCH_SIZE) / 2.0 * s,
            width: LEGEND_SWATCH_SIZE * s,
            height: LEGEND_SWATCH_SIZE * s,
        }
    }

    /// Baseline origin of the label of row `index`.
    #[must_use]
    pub fn label_origin(&self, index: usize) -> [f64; 2] {
        let s = self.scale;
        [
            self.rect.x + (LEGEND_PADDING + LEGEND_SWATCH_SIZE + LEGEND_SWATCH_GAP) * s,
            self.row_top(index) + LEGEND_ROW_HEIGHT * s * 0.65,
        ]
    }

    fn row_top(&self, index: usize) -> f64 {
        let s = self.scale;
        self.rect.y + (LEGEND_PADDING + LEGEND_TITLE_HEIGHT + index as f64 * LEGEND_ROW_HEIGHT) * s
    }
}

/// Everything needed to draw one export.
#[derive(Debug, Clone, PartialEq)]
pub struct MapScene {
    /// Canvas width
    pub width: u32,
    /// Canvas height
    pub height: u32,
    /// Scale factor
    pub scale: f64,
    /// Canvas background
    pub background: RgbColor,
    /// Regions in paint order
    pub regions: Vec<SceneRegion>,
    /// Legend, if shown
    pub legend: Option<SceneLegend>,
}

/// Maps longitude/latitude into the map area.
///
/// Equirectangular, with longitudes shrunk by the cosine of the mean
/// latitude. Coordinates that are clearly not geographic (outside ±180/±90)
/// are treated as already-projected screen coordinates and only fitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    origin: [f64; 2],
    x_factor: f64,
    flip_y: bool,
    wrap: bool,
    scale: f64,
    offset: [f64; 2],
}

impl Projection {
    /// Fits `points` into `area`, keeping a margin. `None` without points.
    #[must_use]
    pub fn fit(points: &[[f64; 2]], area: Rect, margin: f64) -> Option<Self> {
        let [min_x, min_y, max_x, max_y] = bounds_of(points.iter().copied())?;
        let geographic = min_x >= -180.0 && max_x <= 180.0 && min_y >= -90.0 && max_y <= 90.0;

        // Aleutian islands cross the antimeridian; keep them next to Alaska.
        let wrap = geographic && max_x - min_x > 180.0;
        let [min_x, min_y, max_x, max_y] = if wrap {
            bounds_of(points.iter().map(|p| [wrap_longitude(p[0]), p[1]]))?
        } else {
            [min_x, min_y, max_x, max_y]
        };

        let x_factor = if geographic {
            ((min_y + max_y) / 2.0).to_radians().cos().max(0.1)
        } else {
            1.0
        };

        let span_x = ((max_x - min_x) * x_factor).max(f64::EPSILON);
        let span_y = (max_y - min_y).max(f64::EPSILON);
        let avail_w = (area.width - 2.0 * margin).max(1.0);
        let avail_h = (area.height - 2.0 * margin).max(1.0);
        let scale = (avail_w / span_x).min(avail_h / span_y);

        Some(Self {
            origin: [min_x, if geographic { max_y } else { min_y }],
            x_factor,
            flip_y: geographic,
            wrap,
            scale,
            offset: [
                area.x + (area.width - span_x * scale) / 2.0,
                area.y + (area.height - span_y * scale) / 2.0,
            ],
        })
    }

    /// Projects one position to canvas pixels.
    #[must_use]
    pub fn project(&self, point: [f64; 2]) -> [f64; 2] {
        let lon = if self.wrap {
            wrap_longitude(point[0])
        } else {
            point[0]
        };
        let dy = if self.flip_y {
            self.origin[1] - point[1]
        } else {
            point[1] - self.origin[1]
        };
        [
            self.offset[0] + (lon - self.origin[0]) * self.x_factor * self.scale,
            self.offset[1] + dy * self.scale,
        ]
    }
}

fn wrap_longitude(lon: f64) -> f64 {
    if lon > 0.0 {
        lon - 360.0
    } else {
        lon
    }
}

fn bounds_of(mut points: impl Iterator<Item = [f64; 2]>) -> Option<[f64; 4]> {
    let first = points.next()?;
    Some(points.fold([first[0], first[1], first[0], first[1]], |[x0, y0, x1, y1], p| {
        [x0.min(p[0]), y0.min(p[1]), x1.max(p[0]), y1.max(p[1])]
    }))
}

/// Builds the scene for the current store state.
///
/// Hidden regions (outside an active isolation) are left out. When states
/// are drawn they form the base layer with the default fill, and uncolored
/// counties are outlined on top of them; otherwise counties are the base.
pub fn compose(store: &SelectionStore, options: &ExportOptions) -> Result<MapScene, ExportError> {
    let layout = layout(store.legend(), options)?;
    let catalog = store.catalog();
    let isolation = store.isolation();

    let drawn: Vec<_> = catalog
        .regions()
        .filter(|r| !r.geometry.is_empty() && isolation.is_visible(&r.id))
        .collect();

    let base_kind = if drawn.iter().any(|r| r.kind == RegionKind::State) {
        RegionKind::State
    } else {
        RegionKind::County
    };

    let points: Vec<[f64; 2]> = drawn
        .iter()
        .flat_map(|r| r.geometry.iter().flatten().flatten().copied())
        .collect();

    let mut regions = Vec::with_capacity(drawn.len());
    if let Some(projection) = Projection::fit(&points, layout.map, MAP_MARGIN * layout.scale) {
        let (base, overlay): (Vec<_>, Vec<_>) =
            drawn.into_iter().partition(|r| r.kind == base_kind);

        for region in base.into_iter().chain(overlay) {
            let fallback = if region.kind == base_kind {
                Fill::Solid(DEFAULT_REGION_FILL)
            } else {
                Fill::Outline
            };
            let title = store
                .selection(&region.id)
                .map_or_else(|| region.display_name(), |s| s.tooltip());

            regions.push(SceneRegion {
                id: region.id.clone(),
                title,
                rings: region
                    .geometry
                    .iter()
                    .flatten()
                    .map(|ring| ring.iter().map(|p| projection.project(*p)).collect())
                    .collect(),
                fill: Fill::for_colors(&store.color(&region.id), fallback),
            });
        }
    }

    let legend = layout.legend.map(|rect| SceneLegend {
        rect,
        scale: layout.scale,
        rows: store
            .legend()
            .entries()
            .enumerate()
            .map(|(idx, entry)| SceneLegendRow {
                color: entry.color,
                label: entry.display_label(idx),
            })
            .collect(),
    });

    debug!(
        "Composed {}x{} scene with {} regions",
        layout.width,
        layout.height,
        regions.len()
    );

    Ok(MapScene {
        width: layout.width,
        height: layout.height,
        scale: layout.scale,
        background: options.background,
        regions,
        legend,
    })
}

/// File name for an export made at `now`, e.g.
/// `us-county-map-2024-05-01T12-30-00-123Z.png`.
#[must_use]
pub fn export_filename(now: DateTime<Utc>, extension: &str) -> String {
    format!(
        "{EXPORT_FILE_PREFIX}-{}.{extension}",
        now.format("%Y-%m-%dT%H-%M-%S-%3fZ")
    )
}

/// Where exported bytes go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// A directory; the file name is generated from the export time
    Directory(PathBuf),
    /// An explicit file path
    File(PathBuf),
}

/// Writes `bytes` to the destination and returns the final path.
pub fn deliver(
    bytes: &[u8],
    destination: &Destination,
    extension: &str,
    now: DateTime<Utc>,
) -> Result<PathBuf, ExportError> {
    let path = match destination {
        Destination::Directory(dir) => {
            fs::create_dir_all(dir).map_err(|source| ExportError::Write {
                path: dir.clone(),
                source,
            })?;
            dir.join(export_filename(now, extension))
        }
        Destination::File(path) => path.clone(),
    };

    fs::write(&path, bytes).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Runs whole export pipelines against a store.
#[derive(Debug, Clone, Default)]
pub struct ExportComposer {
    options: ExportOptions,
}

impl ExportComposer {
    /// Creates a composer with fixed options.
    #[must_use]
    pub const fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    /// Options in use.
    #[must_use]
    pub const fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Layout and composition stages.
    pub fn scene(&self, store: &SelectionStore) -> Result<MapScene, ExportError> {
        compose(store, &self.options)
    }

    /// Serializes the scene as an SVG document.
    pub fn svg(&self, store: &SelectionStore) -> Result<String, ExportError> {
        Ok(super::svg::render(&self.scene(store)?))
    }

    /// Rasterizes and encodes the scene in the configured format.
    pub fn image(&self, store: &SelectionStore) -> Result<Vec<u8>, ExportError> {
        let scene = self.scene(store)?;
        let pixels = super::raster::rasterize(&scene)?;
        super::raster::encode(&pixels, self.options.format)
    }

    /// Full pipeline: compose, rasterize, encode and write.
    pub fn export_image(
        &self,
        store: &SelectionStore,
        destination: &Destination,
        now: DateTime<Utc>,
    ) -> Result<PathBuf, ExportError> {
        let bytes = self.image(store)?;
        deliver(&bytes, destination, self.options.format.extension(), now)
    }

    /// Writes the SVG document.
    pub fn export_svg(
        &self,
        store: &SelectionStore,
        destination: &Destination,
        now: DateTime<Utc>,
    ) -> Result<PathBuf, ExportError> {
        let svg = self.svg(store)?;
        deliver(svg.as_bytes(), destination, "svg", now)
    }
}
