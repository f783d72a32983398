//! Chart Renderer
//!
//! Rasterises the tremor line chart and the activity bar chart. Each chart
//! owns a fresh [`ChartCanvas`]; the canvas is consumed when encoded, so no
//! drawing state carries over from one chart to the next.

use crate::error::{ReportError, Result};
use crate::pipeline::series::{ActivitySeries, TremorSeries};
use plotters::coord::ranged1d::{DefaultFormatting, KeyPointHint, Ranged};
use plotters::coord::Shift;
use plotters::prelude::*;
use printpdf::image_crate::{DynamicImage, ImageFormat, RgbImage};
use serde::Serialize;
use std::cell::RefCell;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Show every Nth time label on the tremor x-axis
pub const DEFAULT_TICK_STRIDE: usize = 3;

/// Raster size in pixels; twice the on-page placement of 650x250 pt
pub const DEFAULT_CHART_WIDTH: u32 = 1300;
pub const DEFAULT_CHART_HEIGHT: u32 = 500;

const SERIES_COLOR: RGBColor = RGBColor(31, 119, 180);
const BAR_HALF_WIDTH: f64 = 0.4;

/// Which chart an image holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChartKind {
    Tremor,
    Activity,
}

impl ChartKind {
    /// Fixed file name; regeneration overwrites it
    pub fn file_name(&self) -> &'static str {
        match self {
            ChartKind::Tremor => "tremor_graph.png",
            ChartKind::Activity => "Activity_Rhythm.png",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::Tremor => "Tremor Report",
            ChartKind::Activity => "Activity Rhythm Report",
        }
    }

    fn axis_labels(&self) -> (&'static str, &'static str) {
        match self {
            ChartKind::Tremor => ("Time", "Intensity"),
            ChartKind::Activity => ("timestamp", "Activity Type"),
        }
    }
}

/// Raster size and tick policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
    pub tick_stride: usize,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_CHART_WIDTH,
            height: DEFAULT_CHART_HEIGHT,
            tick_stride: DEFAULT_TICK_STRIDE,
        }
    }
}

/// One encoded chart
#[derive(Debug, Clone)]
pub struct ChartImage {
    pub kind: ChartKind,
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Slot indices of the x-axis labels the mesh drew
    pub ticks: Vec<usize>,
}

impl ChartImage {
    pub fn tick_count(&self) -> usize {
        self.ticks.len()
    }

    pub fn file_name(&self) -> &'static str {
        self.kind.file_name()
    }

    /// Write the PNG into `dir` under its fixed name, replacing any earlier file
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.file_name());
        std::fs::write(&path, &self.png)?;
        debug!("Wrote {} ({} bytes)", path.display(), self.png.len());
        Ok(path)
    }
}

type Root<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

fn chart_err<E: std::fmt::Display>(e: E) -> ReportError {
    ReportError::Chart(e.to_string())
}

/// Explicit drawing context for a single chart
pub struct ChartCanvas {
    buffer: Vec<u8>,
    width: u32,
    height: u32,
}

impl ChartCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buffer: vec![0u8; (width as usize) * (height as usize) * 3],
            width,
            height,
        }
    }

    /// Run `paint` against a white drawing area backed by this canvas.
    ///
    /// The backend borrows the buffer only for the duration of the call and
    /// is flushed before returning, on success and on error alike.
    pub fn draw<F>(&mut self, paint: F) -> Result<()>
    where
        F: FnOnce(&Root<'_>) -> Result<()>,
    {
        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;
        let painted = paint(&root);
        let presented = root.present().map_err(chart_err);
        painted.and(presented)
    }

    /// Encode the canvas as PNG, releasing the buffer
    pub fn into_png(self) -> Result<Vec<u8>> {
        let img = RgbImage::from_raw(self.width, self.height, self.buffer)
            .ok_or_else(|| ReportError::Image("canvas buffer size mismatch".to_string()))?;

        let mut png = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| ReportError::Image(e.to_string()))?;
        Ok(png)
    }
}

/// Linear f64 axis whose labelled ticks are exactly `keys`.
///
/// It yields no light mesh points.
#[derive(Debug, Clone)]
struct KeyedAxis {
    range: Range<f64>,
    keys: Vec<f64>,
}

impl KeyedAxis {
    fn new(range: Range<f64>, keys: impl IntoIterator<Item = usize>) -> Self {
        Self {
            range,
            keys: keys.into_iter().map(|k| k as f64).collect(),
        }
    }
}

impl Ranged for KeyedAxis {
    type FormatOption = DefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        let span = self.range.end - self.range.start;
        if span == 0.0 {
            return (limit.0 + limit.1) / 2;
        }
        let fraction = (value - self.range.start) / span;
        limit.0 + (fraction * f64::from(limit.1 - limit.0)).round() as i32
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        if hint.weight().allow_light_points() {
            Vec::new()
        } else {
            self.keys.clone()
        }
    }

    fn range(&self) -> Range<f64> {
        self.range.clone()
    }
}

/// Indices of the x-axis labels to draw: `0, stride, 2*stride, ...` below `len`
pub fn tick_positions(len: usize, stride: usize) -> Vec<usize> {
    (0..len).step_by(stride.max(1)).collect()
}

/// Split a series at absent values into drawable runs of (index, value)
fn line_segments(values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();

    for (i, value) in values.iter().enumerate() {
        match value {
            Some(v) => current.push((i as f64, *v)),
            None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

/// Assign each category a level 1..=k in order of first appearance
fn category_levels(types: &[Option<String>]) -> (Vec<String>, Vec<Option<usize>>) {
    let mut names: Vec<String> = Vec::new();
    let levels = types
        .iter()
        .map(|t| {
            let name = t.as_ref()?;
            let index = match names.iter().position(|n| n == name) {
                Some(i) => i,
                None => {
                    names.push(name.clone());
                    names.len() - 1
                }
            };
            Some(index + 1)
        })
        .collect();

    (names, levels)
}

fn index_label(labels: &[Option<String>], x: f64) -> String {
    let rounded = x.round();
    if rounded < 0.0 {
        return String::new();
    }
    labels
        .get(rounded as usize)
        .and_then(|l| l.clone())
        .unwrap_or_default()
}

/// x-range that keeps slot `i` centred at `i`, never degenerate
fn slot_range(len: usize) -> Range<f64> {
    -0.5..(len.max(1) as f64 - 0.5)
}

fn intensity_range(values: &[Option<f64>]) -> Range<f64> {
    let present = values.iter().flatten().copied();
    let (lo, hi) = present.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() {
        return 0.0..1.0;
    }
    let lo = lo.min(0.0);
    let pad = ((hi - lo) * 0.05).max(0.5);
    lo..(hi + pad)
}

/// Line plot of intensity against capture time
pub fn render_tremor_chart(series: &TremorSeries, options: &ChartOptions) -> Result<ChartImage> {
    let kind = ChartKind::Tremor;
    let x_axis = KeyedAxis::new(
        slot_range(series.len()),
        tick_positions(series.len(), options.tick_stride),
    );
    let drawn = RefCell::new(Vec::new());
    let segments = line_segments(&series.intensities);
    let (x_desc, y_desc) = kind.axis_labels();

    let mut canvas = ChartCanvas::new(options.width, options.height);
    canvas.draw(|root| {
        let mut chart = ChartBuilder::on(root)
            .caption(kind.title(), ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(x_axis, intensity_range(&series.intensities))
            .map_err(chart_err)?;

        let time_label = |x: &f64| {
            drawn.borrow_mut().push(x.round() as usize);
            index_label(&series.times, *x)
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_label_formatter(&time_label)
            .x_desc(x_desc)
            .y_desc(y_desc)
            .draw()
            .map_err(chart_err)?;

        for segment in &segments {
            chart
                .draw_series(LineSeries::new(segment.iter().copied(), SERIES_COLOR.stroke_width(2)))
                .map_err(chart_err)?;
            chart
                .draw_series(
                    segment
                        .iter()
                        .map(|&(x, y)| Circle::new((x, y), 3, SERIES_COLOR.filled())),
                )
                .map_err(chart_err)?;
        }

        Ok(())
    })?;

    let png = canvas.into_png()?;
    let ticks = drawn.into_inner();
    debug!(
        "Rendered tremor chart: {} samples, {} ticks, {} segments",
        series.len(),
        ticks.len(),
        segments.len()
    );

    Ok(ChartImage {
        kind,
        png,
        width: options.width,
        height: options.height,
        ticks,
    })
}

/// Bar plot of activity category against event timestamp
pub fn render_activity_chart(series: &ActivitySeries, options: &ChartOptions) -> Result<ChartImage> {
    let kind = ChartKind::Activity;
    let (names, levels) = category_levels(&series.types);
    let x_axis = KeyedAxis::new(slot_range(series.len()), 0..series.len());
    let y_axis = KeyedAxis::new(0.0..names.len().max(1) as f64 + 0.5, 1..=names.len());
    let drawn = RefCell::new(Vec::new());
    let (x_desc, y_desc) = kind.axis_labels();

    let mut canvas = ChartCanvas::new(options.width, options.height);
    canvas.draw(|root| {
        let mut chart = ChartBuilder::on(root)
            .caption(kind.title(), ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(140)
            .build_cartesian_2d(x_axis, y_axis)
            .map_err(chart_err)?;

        let timestamp_label = |x: &f64| {
            drawn.borrow_mut().push(x.round() as usize);
            index_label(&series.timestamps, *x)
        };
        let category_label = |y: &f64| {
            let level = y.round() as usize;
            names.get(level.wrapping_sub(1)).cloned().unwrap_or_default()
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_label_formatter(&timestamp_label)
            .y_label_formatter(&category_label)
            .x_desc(x_desc)
            .y_desc(y_desc)
            .draw()
            .map_err(chart_err)?;

        chart
            .draw_series(levels.iter().enumerate().filter_map(|(i, level)| {
                let top = (*level)? as f64;
                let x = i as f64;
                Some(Rectangle::new(
                    [(x - BAR_HALF_WIDTH, 0.0), (x + BAR_HALF_WIDTH, top)],
                    SERIES_COLOR.filled(),
                ))
            }))
            .map_err(chart_err)?;

        Ok(())
    })?;

    let png = canvas.into_png()?;
    debug!(
        "Rendered activity chart: {} events, {} categories",
        series.len(),
        names.len()
    );

    Ok(ChartImage {
        kind,
        png,
        width: options.width,
        height: options.height,
        ticks: drawn.into_inner(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotters::coord::ranged1d::{BoldPoints, LightPoints};

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G'];

    fn small() -> ChartOptions {
        ChartOptions {
            width: 320,
            height: 200,
            tick_stride: 3,
        }
    }

    #[test]
    fn test_tick_count_is_ceil_of_len_over_stride() {
        for (n, expected) in [(0, 0), (1, 1), (2, 1), (3, 1), (7, 3), (30, 10)] {
            assert_eq!(tick_positions(n, 3).len(), expected, "n = {}", n);
        }
        assert_eq!(tick_positions(7, 3), vec![0, 3, 6]);
    }

    #[test]
    fn test_line_segments_break_on_absent() {
        let segments = line_segments(&[Some(1.0), Some(2.0), None, None, Some(4.0)]);
        assert_eq!(segments, vec![vec![(0.0, 1.0), (1.0, 2.0)], vec![(4.0, 4.0)]]);
        assert!(line_segments(&[None]).is_empty());
    }

    #[test]
    fn test_category_levels_first_appearance() {
        let types = vec![
            Some("Walking".to_string()),
            Some("Sleeping".to_string()),
            None,
            Some("Walking".to_string()),
        ];
        let (names, levels) = category_levels(&types);
        assert_eq!(names, vec!["Walking", "Sleeping"]);
        assert_eq!(levels, vec![Some(1), Some(2), None, Some(1)]);
    }

    #[test]
    fn test_index_label_out_of_range_is_empty() {
        let labels = vec![Some("10:00".to_string()), None];
        assert_eq!(index_label(&labels, 0.0), "10:00");
        assert_eq!(index_label(&labels, 1.0), "");
        assert_eq!(index_label(&labels, 5.0), "");
        assert_eq!(index_label(&labels, -0.5), "");
    }

    #[test]
    fn test_empty_series_render_valid_png() {
        let tremor = render_tremor_chart(&TremorSeries::default(), &small()).unwrap();
        assert!(tremor.png.starts_with(PNG_MAGIC));
        assert!(tremor.ticks.is_empty());

        let activity = render_activity_chart(&ActivitySeries::default(), &small()).unwrap();
        assert!(activity.png.starts_with(PNG_MAGIC));
        assert_eq!(activity.file_name(), "Activity_Rhythm.png");
    }

    #[test]
    fn test_tremor_chart_ticks_follow_stride() {
        let series = TremorSeries {
            times: (0..7).map(|i| Some(format!("10:0{}", i))).collect(),
            intensities: (0..7).map(|i| Some(i as f64)).collect(),
        };
        let chart = render_tremor_chart(&series, &small()).unwrap();
        assert_eq!(chart.ticks, vec![0, 3, 6]);
        assert_eq!(chart.tick_count(), 3);
        assert_eq!(chart.file_name(), "tremor_graph.png");

        let mut wide = small();
        wide.tick_stride = 1;
        let every = render_tremor_chart(&series, &wide).unwrap();
        assert_eq!(every.ticks, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn test_activity_chart_labels_every_event() {
        let series = ActivitySeries {
            timestamps: (0..4).map(|i| Some(format!("t{}", i))).collect(),
            types: vec![
                Some("Walking".to_string()),
                None,
                Some("Sleeping".to_string()),
                Some("Walking".to_string()),
            ],
        };
        let chart = render_activity_chart(&series, &small()).unwrap();
        assert_eq!(chart.ticks, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_keyed_axis_ticks_and_mapping() {
        let axis = KeyedAxis::new(slot_range(7), tick_positions(7, 3));
        assert_eq!(axis.key_points(BoldPoints(2)), vec![0.0, 3.0, 6.0]);
        assert!(axis.key_points(LightPoints::new(2, 20)).is_empty());

        assert_eq!(axis.map(&-0.5, (0, 700)), 0);
        assert_eq!(axis.map(&6.5, (0, 700)), 700);
        assert_eq!(axis.map(&3.0, (700, 0)), 350);
    }

    #[test]
    fn test_canvas_error_still_releases() {
        let mut canvas = ChartCanvas::new(16, 16);
        let result = canvas.draw(|_| Err(ReportError::Chart("paint failed".into())));
        assert!(matches!(result, Err(ReportError::Chart(_))));
        assert!(canvas.into_png().unwrap().starts_with(PNG_MAGIC));
    }
}
