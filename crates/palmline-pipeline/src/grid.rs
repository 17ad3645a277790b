//! Grid partitioner: split the hand's bounding box into 4×4 cells.

use crate::types::{GRID_SIZE, GridRegion, HandContour, PalmGrid};

/// Partition the bounding box of `contour` into a 4×4 grid.
///
/// Cell size is the box size divided by four with integer division, so a
/// box whose sides are not multiples of four leaves a thin uncovered
/// strip on the right and bottom. Cells are listed column by column.
/// Returns `None` for an absent or empty contour.
#[must_use]
pub fn partition(contour: Option<&HandContour>) -> Option<PalmGrid> {
    let bbox = contour?.bounding_box()?;
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let n = GRID_SIZE as i32;
    let cell_w = bbox.width / n;
    let cell_h = bbox.height / n;

    let regions = std::array::from_fn(|i| {
        let col = i / GRID_SIZE;
        let row = i % GRID_SIZE;
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let (c, r) = (col as i32, row as i32);
        GridRegion {
            x: bbox.x + c * cell_w,
            y: bbox.y + r * cell_h,
            width: cell_w,
            height: cell_h,
            row,
            col,
        }
    });
    Some(PalmGrid { regions })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::ContourPoint;

    fn rect_contour(x: i32, y: i32, w: i32, h: i32) -> HandContour {
        HandContour::new(vec![
            ContourPoint::new(x, y),
            ContourPoint::new(x + w - 1, y),
            ContourPoint::new(x + w - 1, y + h - 1),
            ContourPoint::new(x, y + h - 1),
        ])
    }

    #[test]
    fn absent_contour_has_no_grid() {
        assert!(partition(None).is_none());
        assert!(partition(Some(&HandContour::new(vec![]))).is_none());
    }

    #[test]
    fn sixteen_cells_tile_the_box() {
        let grid = partition(Some(&rect_contour(10, 20, 100, 80))).unwrap();
        assert_eq!(grid.regions.len(), 16);
        let area: i32 = grid.regions.iter().map(|r| r.width * r.height).sum();
        assert_eq!(area, 100 * 80);

        let first = grid.cell(0, 0).unwrap();
        assert_eq!((first.x, first.y, first.width, first.height), (10, 20, 25, 20));
        let last = grid.cell(3, 3).unwrap();
        assert_eq!((last.x, last.y), (10 + 75, 20 + 60));
    }

    #[test]
    fn cells_are_column_major() {
        let grid = partition(Some(&rect_contour(0, 0, 40, 40))).unwrap();
        let order: Vec<(usize, usize)> = grid.regions.iter().map(|r| (r.col, r.row)).collect();
        let expected: Vec<(usize, usize)> =
            (0..4).flat_map(|c| (0..4).map(move |r| (c, r))).collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn remainder_is_truncated() {
        let grid = partition(Some(&rect_contour(0, 0, 43, 18))).unwrap();
        let cell = grid.cell(1, 2).unwrap();
        assert_eq!((cell.width, cell.height), (10, 4));
        assert_eq!((cell.x, cell.y), (20, 4));
        let area: i32 = grid.regions.iter().map(|r| r.width * r.height).sum();
        assert!(area <= 43 * 18);
    }

    #[test]
    fn tiny_box_yields_empty_cells() {
        let grid = partition(Some(&rect_contour(5, 5, 3, 2))).unwrap();
        assert!(grid.regions.iter().all(|r| r.width == 0 && r.height == 0));
        assert!(grid.regions.iter().all(|r| (r.x, r.y) == (5, 5)));
    }
}
