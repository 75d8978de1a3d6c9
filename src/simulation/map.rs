// ground truth map with point landmarks

use nalgebra::DMatrix;
use rand::Rng;
use std::ops::Deref;

use crate::common::{Point2D, SlamError, SlamResult};

/// Occupancy grid with 1 m cells; `true` marks an occupied cell.
///
/// Row index is y, column index is x.
pub struct OccupancyGrid {
    grid: DMatrix<bool>,
}

impl OccupancyGrid {
    /// Free area of `height` x `width` cells enclosed by a one-cell wall
    pub fn with_border(height: usize, width: usize) -> SlamResult<Self> {
        if height < 3 || width < 3 {
            return Err(SlamError::InvalidParameter(format!(
                "map must be at least 3x3 cells, got {}x{}",
                height, width
            )));
        }
        let grid = DMatrix::from_fn(height, width, |r, c| {
            r == 0 || c == 0 || r == height - 1 || c == width - 1
        });
        Ok(Self { grid })
    }

    pub fn height(&self) -> usize {
        self.grid.nrows()
    }

    pub fn width(&self) -> usize {
        self.grid.ncols()
    }

    /// True if every cell within `margin` of (x, y) is free
    pub fn is_free(&self, x: f64, y: f64, margin: f64) -> bool {
        let lo_x = (x - margin).floor();
        let hi_x = (x + margin).floor();
        let lo_y = (y - margin).floor();
        let hi_y = (y + margin).floor();
        if lo_x < 0.0 || lo_y < 0.0 || hi_x >= self.width() as f64 || hi_y >= self.height() as f64 {
            return false;
        }
        for r in lo_y as usize..=hi_y as usize {
            for c in lo_x as usize..=hi_x as usize {
                if self.grid[(r, c)] {
                    return false;
                }
            }
        }
        true
    }

    /// Center of the map
    pub fn center(&self) -> Point2D {
        Point2D::new(self.width() as f64 / 2.0, self.height() as f64 / 2.0)
    }
}

impl Deref for OccupancyGrid {
    type Target = DMatrix<bool>;

    fn deref(&self) -> &Self::Target {
        &self.grid
    }
}

/// Walled map with `landmark_count` landmarks drawn uniformly in the free area
pub fn generate_map<R: Rng + ?Sized>(
    height: usize,
    width: usize,
    landmark_count: usize,
    rng: &mut R,
) -> SlamResult<(OccupancyGrid, Vec<Point2D>)> {
    let map = OccupancyGrid::with_border(height, width)?;
    let landmarks = (0..landmark_count)
        .map(|_| {
            Point2D::new(
                rng.gen_range(1.0..(width - 1) as f64),
                rng.gen_range(1.0..(height - 1) as f64),
            )
        })
        .collect();
    Ok((map, landmarks))
}
