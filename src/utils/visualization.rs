//! Visualization utilities for graph_slam
//!
//! Plots trajectories, landmarks and information matrix sparsity with
//! gnuplot. Series are collected first and drawn onto a single set of axes
//! when the figure is shown or saved.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};
use nalgebra::DMatrix;

use crate::common::{ObservationModel, Point2D, Pose2D, RangeBearing};
use crate::simulation::OccupancyGrid;
use crate::slam::RangeBearingModel;

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const GRAY: &str = "#808080";

    pub const WALL: &str = GRAY;
    pub const LANDMARK: &str = BLACK;
    pub const GROUND_TRUTH: &str = "#1F77B4";
    pub const DEAD_RECKONING: &str = "#FF7F0E";
    pub const ESTIMATED: &str = "#2CA02C";
    pub const MEASUREMENT: &str = "#DD3355";
    pub const NONZERO: &str = "#1F77B4";
}

/// Style for path rendering
#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: String,
}

impl PathStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: caption.to_string(),
        }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

/// Style for point rendering
#[derive(Debug, Clone)]
pub struct PointStyle {
    pub color: String,
    pub size: f64,
    pub symbol: char,
    pub caption: String,
}

impl PointStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            size: 1.0,
            symbol: 'O',
            caption: caption.to_string(),
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_symbol(mut self, symbol: char) -> Self {
        self.symbol = symbol;
        self
    }
}

enum Series {
    Lines { x: Vec<f64>, y: Vec<f64>, style: PathStyle },
    Points { x: Vec<f64>, y: Vec<f64>, style: PointStyle },
}

/// Main visualizer struct
pub struct Visualizer {
    series: Vec<Series>,
    title: String,
    x_label: String,
    y_label: String,
    x_range: Option<(f64, f64)>,
    y_range: Option<(f64, f64)>,
    aspect_ratio: Option<f64>,
}

impl Visualizer {
    /// Create a new visualizer
    pub fn new() -> Self {
        Self {
            series: Vec::new(),
            title: String::new(),
            x_label: "X [m]".to_string(),
            y_label: "Y [m]".to_string(),
            x_range: None,
            y_range: None,
            aspect_ratio: Some(1.0),
        }
    }

    /// Set the plot title
    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    pub fn set_labels(&mut self, x_label: &str, y_label: &str) -> &mut Self {
        self.x_label = x_label.to_string();
        self.y_label = y_label.to_string();
        self
    }

    pub fn set_x_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.x_range = Some((min, max));
        self
    }

    pub fn set_y_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.y_range = Some((min, max));
        self
    }

    /// Number of series added so far
    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    /// Plot a line through x,y vectors
    pub fn plot_path_xy(&mut self, x: &[f64], y: &[f64], style: &PathStyle) -> &mut Self {
        self.series.push(Series::Lines {
            x: x.to_vec(),
            y: y.to_vec(),
            style: style.clone(),
        });
        self
    }

    /// Plot points from x,y vectors
    pub fn plot_points_xy(&mut self, x: &[f64], y: &[f64], style: &PointStyle) -> &mut Self {
        self.series.push(Series::Points {
            x: x.to_vec(),
            y: y.to_vec(),
            style: style.clone(),
        });
        self
    }

    /// Plot a trajectory
    pub fn plot_poses(&mut self, poses: &[Pose2D], style: &PathStyle) -> &mut Self {
        let x: Vec<f64> = poses.iter().map(|p| p.x).collect();
        let y: Vec<f64> = poses.iter().map(|p| p.y).collect();
        self.plot_path_xy(&x, &y, style)
    }

    pub fn plot_points(&mut self, points: &[Point2D], style: &PointStyle) -> &mut Self {
        let x: Vec<f64> = points.iter().map(|p| p.x).collect();
        let y: Vec<f64> = points.iter().map(|p| p.y).collect();
        self.plot_points_xy(&x, &y, style)
    }

    /// Plot the landmarks of the ground truth map
    pub fn plot_landmarks(&mut self, landmarks: &[Point2D]) -> &mut Self {
        self.plot_points(
            landmarks,
            &PointStyle::new(colors::LANDMARK, "Landmarks").with_symbol('x'),
        )
    }

    /// Plot the occupied cells of a map, cell centers at half-integer coordinates
    pub fn plot_occupancy(&mut self, map: &OccupancyGrid) -> &mut Self {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for r in 0..map.height() {
            for c in 0..map.width() {
                if map[(r, c)] {
                    x.push(c as f64 + 0.5);
                    y.push(r as f64 + 0.5);
                }
            }
        }
        self.plot_points_xy(
            &x,
            &y,
            &PointStyle::new(colors::WALL, "Walls").with_symbol('S').with_size(0.5),
        )
    }

    /// Plot the measurements taken at `pose` as rays to the measured points
    pub fn plot_measurements(&mut self, pose: &Pose2D, measurements: &[RangeBearing]) -> &mut Self {
        let model = RangeBearingModel;
        let style = PathStyle::new(colors::MEASUREMENT, "").with_line_width(1.0);
        let mut hits = Vec::with_capacity(measurements.len());
        for z in measurements {
            let hit = model.inverse(pose, z);
            self.plot_path_xy(&[pose.x, hit[0]], &[pose.y, hit[1]], &style);
            hits.push(Point2D::from(hit));
        }
        self.plot_points(
            &hits,
            &PointStyle::new(colors::MEASUREMENT, "Measurements").with_size(0.8),
        )
    }

    /// Plot the nonzero pattern of a matrix with row 0 at the top
    pub fn plot_sparsity(&mut self, mask: &DMatrix<bool>, caption: &str) -> &mut Self {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for r in 0..mask.nrows() {
            for c in 0..mask.ncols() {
                if mask[(r, c)] {
                    x.push(c as f64);
                    y.push(-(r as f64));
                }
            }
        }
        self.set_labels("column", "row");
        self.plot_points_xy(
            &x,
            &y,
            &PointStyle::new(colors::NONZERO, caption).with_symbol('S').with_size(0.3),
        )
    }

    /// Finalize and show the plot
    pub fn show(&self) -> Result<(), String> {
        let mut figure = self.render();
        figure.show().map_err(|e| e.to_string()).map(|_| ())
    }

    /// Save plot to SVG file
    pub fn save_svg(&self, path: &str) -> Result<(), String> {
        let mut figure = self.render();
        figure.save_to_svg(path, 800, 600).map_err(|e| e.to_string())
    }

    fn render(&self) -> Figure {
        let mut figure = Figure::new();
        let axes = figure.axes2d();

        for series in &self.series {
            match series {
                Series::Lines { x, y, style } => {
                    axes.lines(x, y, &[
                        Caption(&style.caption),
                        Color(&style.color),
                        LineWidth(style.line_width),
                    ]);
                }
                Series::Points { x, y, style } => {
                    axes.points(x, y, &[
                        Caption(&style.caption),
                        Color(&style.color),
                        PointSymbol(style.symbol),
                        PointSize(style.size),
                    ]);
                }
            }
        }

        if !self.title.is_empty() {
            axes.set_title(&self.title, &[]);
        }
        axes.set_x_label(&self.x_label, &[]);
        axes.set_y_label(&self.y_label, &[]);

        if let Some((min, max)) = self.x_range {
            axes.set_x_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some((min, max)) = self.y_range {
            axes.set_y_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some(ratio) = self.aspect_ratio {
            axes.set_aspect_ratio(AutoOption::Fix(ratio));
        }
        figure
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visualizer_creation() {
        let vis = Visualizer::new();
        assert!(vis.aspect_ratio.is_some());
        assert_eq!(vis.series_count(), 0);
    }

    #[test]
    fn test_measurement_rays() {
        let mut vis = Visualizer::new();
        let z = vec![RangeBearing::new(1.0, 0.0), RangeBearing::new(2.0, 0.5)];
        vis.plot_measurements(&Pose2D::origin(), &z);
        // one ray per measurement plus the measured points
        assert_eq!(vis.series_count(), 3);
    }

    #[test]
    fn test_path_style() {
        let style = PathStyle::new(colors::ESTIMATED, "Estimate").with_line_width(3.0);
        assert_eq!(style.line_width, 3.0);
        assert_eq!(style.color, colors::ESTIMATED);
    }
}
