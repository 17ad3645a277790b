//! Renderer: draw classified lines and the palm grid over the original.
//!
//! Rasterization goes through `tiny-skia` with anti-aliasing off, so
//! every pixel is either untouched or exactly the class colour. Pixel
//! `(x, y)` is addressed at its centre `(x + 0.5, y + 0.5)`; a stroke of
//! width `t` therefore covers `t` whole pixels across. Lines get round
//! caps.

use image::{Rgb, RgbImage};
use tiny_skia::{IntSize, LineCap, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::types::{AnalysisResult, GridRegion, LineCandidate, LineClass, LineSegment, PalmGrid};

/// Colour and stroke width used for one line class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    /// RGB colour.
    pub color: [u8; 3],
    /// Stroke width in pixels.
    pub thickness: f32,
}

/// Colour of the grid rectangles.
pub const GRID_COLOR: [u8; 3] = [128, 128, 128];

/// Stroke width of the grid rectangles.
pub const GRID_THICKNESS: f32 = 1.0;

/// Drawing style of a line class.
#[must_use]
pub const fn style(class: LineClass) -> LineStyle {
    match class {
        LineClass::MajorVertical => LineStyle {
            color: [255, 0, 0],
            thickness: 3.0,
        },
        LineClass::MajorHorizontal => LineStyle {
            color: [0, 255, 0],
            thickness: 3.0,
        },
        LineClass::Medium => LineStyle {
            color: [0, 0, 255],
            thickness: 2.0,
        },
        LineClass::Minor => LineStyle {
            color: [0, 255, 255],
            thickness: 1.0,
        },
    }
}

/// Annotated copy of the analysed image.
#[must_use = "returns the annotated image"]
pub fn render(result: &AnalysisResult) -> RgbImage {
    draw_annotations(result.original(), result.lines(), result.grid())
}

/// Draw `lines`, then the cells of `grid`, onto a copy of `original`.
///
/// Lines are drawn in order, so later lines overwrite earlier ones where
/// they cross. The input is never modified.
#[must_use = "returns the annotated image"]
pub fn draw_annotations(
    original: &RgbImage,
    lines: &[LineCandidate],
    grid: Option<&PalmGrid>,
) -> RgbImage {
    let (width, height) = original.dimensions();
    let Some(size) = IntSize::from_wh(width, height) else {
        return original.clone();
    };
    let rgba: Vec<u8> = original
        .pixels()
        .flat_map(|Rgb([r, g, b])| [*r, *g, *b, 255])
        .collect();
    let Some(mut pixmap) = Pixmap::from_vec(rgba, size) else {
        return original.clone();
    };

    for line in lines {
        stroke_segment(&mut pixmap, line.segment(), style(line.class()));
    }
    if let Some(grid) = grid {
        for region in &grid.regions {
            stroke_region(&mut pixmap, region);
        }
    }

    // Everything drawn is opaque, so premultiplied RGBA is plain RGBA.
    let rgb: Vec<u8> = pixmap
        .data()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    RgbImage::from_raw(width, height, rgb).unwrap_or_else(|| original.clone())
}

fn paint(color: [u8; 3]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], 255);
    paint.anti_alias = false;
    paint
}

#[allow(clippy::cast_precision_loss)]
fn centre(x: i32, y: i32) -> (f32, f32) {
    (x as f32 + 0.5, y as f32 + 0.5)
}

fn stroke_segment(pixmap: &mut Pixmap, segment: LineSegment, style: LineStyle) {
    let (x1, y1) = centre(segment.x1, segment.y1);
    let (x2, y2) = centre(segment.x2, segment.y2);
    let mut pb = PathBuilder::new();
    pb.move_to(x1, y1);
    pb.line_to(x2, y2);
    let Some(path) = pb.finish() else {
        return;
    };

    let stroke = Stroke {
        width: style.thickness,
        line_cap: LineCap::Round,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &paint(style.color), &stroke, Transform::identity(), None);
}

/// Outline a cell through the pixel rows and columns at both of its
/// edges, `x` and `x + width` inclusive.
fn stroke_region(pixmap: &mut Pixmap, region: &GridRegion) {
    let (left, top) = centre(region.x, region.y);
    let (right, bottom) = centre(region.x + region.width, region.y + region.height);
    let mut pb = PathBuilder::new();
    pb.move_to(left, top);
    pb.line_to(right, top);
    pb.line_to(right, bottom);
    pb.line_to(left, bottom);
    pb.close();
    let Some(path) = pb.finish() else {
        return;
    };

    let stroke = Stroke {
        width: GRID_THICKNESS,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &paint(GRID_COLOR), &stroke, Transform::identity(), None);
}
