//! Contour extraction on a binary mask.
//!
//! Wraps [`imageproc::contours::find_contours`] (Suzuki-Abe border
//! following) and keeps only external borders: outer borders that are
//! not nested inside any hole. Enclosed area is the shoelace area of the
//! boundary polygon, computed with [`geo`].

use geo::{Area, Coord, LineString, Polygon};
use image::GrayImage;
use imageproc::contours::BorderType;

use crate::types::{ContourPoint, HandContour};

/// All external contours of a binary mask (non-zero = foreground), in
/// raster discovery order.
#[must_use]
pub fn external_contours(mask: &GrayImage) -> Vec<HandContour> {
    imageproc::contours::find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(|c| {
            HandContour::new(
                c.points
                    .into_iter()
                    .map(|p| ContourPoint::new(p.x, p.y))
                    .collect(),
            )
        })
        .collect()
}

/// Shoelace area of the polygon traced by `contour`.
///
/// Degenerate contours (fewer than three points) have zero area.
#[must_use]
pub fn contour_area(contour: &HandContour) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }
    let ring: LineString<f64> = contour
        .points()
        .iter()
        .map(|p| Coord {
            x: f64::from(p.x),
            y: f64::from(p.y),
        })
        .collect();
    Polygon::new(ring, vec![]).unsigned_area()
}

/// The contour with the largest enclosed area. The earliest one wins a
/// tie, so a mask of isolated pixels still yields its first contour.
#[must_use]
pub fn largest_contour(contours: Vec<HandContour>) -> Option<HandContour> {
    let mut best: Option<(f64, HandContour)> = None;
    for contour in contours {
        let area = contour_area(&contour);
        match &best {
            Some((best_area, _)) if area <= *best_area => {}
            _ => best = Some((area, contour)),
        }
    }
    best.map(|(_, contour)| contour)
}
