//! Page layout
//!
//! Coordinates are PDF points with the origin at the bottom-left corner of
//! the page. Every placement can be overridden from `[report.layout]`.

use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Points per centimetre
pub const POINTS_PER_CM: f32 = 72.0 / 2.54;

/// Landscape A4, points
pub const A4_LANDSCAPE_WIDTH: f32 = 841.89;
pub const A4_LANDSCAPE_HEIGHT: f32 = 595.28;

/// Height reserved for the summary table at the top of the first page
pub const DEFAULT_TABLE_HEIGHT: f32 = 4.0 * POINTS_PER_CM;

/// Font size of the chart labels drawn on the page
pub const LABEL_FONT_SIZE: f32 = 12.0;

/// Rectangular element position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Placement {
    pub const fn new(page: usize, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            page,
            x,
            y,
            width,
            height,
        }
    }
}

/// Text baseline position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub page: usize,
    pub x: f32,
    pub y: f32,
}

impl Anchor {
    pub const fn new(page: usize, x: f32, y: f32) -> Self {
        Self { page, x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LayoutElement {
    Table,
    ActivityLabel,
    ActivityChart,
    TremorLabel,
    TremorChart,
}

impl fmt::Display for LayoutElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayoutElement::Table => "table",
            LayoutElement::ActivityLabel => "activity label",
            LayoutElement::ActivityChart => "activity chart",
            LayoutElement::TremorLabel => "tremor label",
            LayoutElement::TremorChart => "tremor chart",
        };
        f.write_str(name)
    }
}

/// An element not contained in its page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutViolation {
    pub element: LayoutElement,
    pub page: usize,
    /// Element extent as (left, bottom, right, top)
    pub extent: (f32, f32, f32, f32),
}

impl fmt::Display for LayoutViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (l, b, r, t) = self.extent;
        write!(
            f,
            "{} on page {} spans ({:.1}, {:.1})..({:.1}, {:.1}), outside the page",
            self.element,
            self.page + 1,
            l,
            b,
            r,
            t
        )
    }
}

/// Positions of everything drawn into the report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLayout {
    pub page_width: f32,
    pub page_height: f32,
    /// Bottom-left corner of the table
    pub table: Anchor,
    pub table_height: f32,
    pub activity_label: Anchor,
    pub activity_chart: Placement,
    pub tremor_label: Anchor,
    pub tremor_chart: Placement,
}

impl Default for PageLayout {
    /// Two pages: table and activity chart first, tremor chart second
    fn default() -> Self {
        Self {
            page_width: A4_LANDSCAPE_WIDTH,
            page_height: A4_LANDSCAPE_HEIGHT,
            table: Anchor::new(0, 25.0, A4_LANDSCAPE_HEIGHT - DEFAULT_TABLE_HEIGHT),
            table_height: DEFAULT_TABLE_HEIGHT,
            activity_label: Anchor::new(0, 100.0, 460.0),
            activity_chart: Placement::new(0, 25.0, 200.0, 650.0, 250.0),
            tremor_label: Anchor::new(1, 100.0, 500.0),
            tremor_chart: Placement::new(1, 25.0, 230.0, 650.0, 250.0),
        }
    }
}

impl PageLayout {
    /// Single-page geometry of the first deployed report, kept for comparison.
    ///
    /// The table offset is taken from the portrait page height, both labels
    /// sit above the page and the tremor chart starts below the page origin.
    pub fn reference() -> Self {
        let table_height = 12.1 * POINTS_PER_CM;
        Self {
            page_width: A4_LANDSCAPE_WIDTH,
            page_height: A4_LANDSCAPE_HEIGHT,
            table: Anchor::new(0, 0.0, A4_LANDSCAPE_WIDTH - table_height),
            table_height,
            activity_label: Anchor::new(0, 100.0, 750.0),
            activity_chart: Placement::new(0, 25.0, 240.0, 650.0, 250.0),
            tremor_label: Anchor::new(0, 100.0, 900.0),
            tremor_chart: Placement::new(0, 25.0, -8.0, 650.0, 250.0),
        }
    }

    /// Number of pages the layout spans
    pub fn page_count(&self) -> usize {
        [
            self.table.page,
            self.activity_label.page,
            self.activity_chart.page,
            self.tremor_label.page,
            self.tremor_chart.page,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }

    /// Reject geometry that cannot be drawn at all
    pub fn validate(&self) -> Result<()> {
        if !(self.page_width > 0.0 && self.page_height > 0.0) {
            return Err(ReportError::Layout(format!(
                "page size must be positive, got {}x{}",
                self.page_width, self.page_height
            )));
        }
        if !(self.table_height > 0.0) {
            return Err(ReportError::Layout(format!(
                "table_height must be positive, got {}",
                self.table_height
            )));
        }
        for (element, chart) in [
            (LayoutElement::ActivityChart, &self.activity_chart),
            (LayoutElement::TremorChart, &self.tremor_chart),
        ] {
            if !(chart.width > 0.0 && chart.height > 0.0) {
                return Err(ReportError::Layout(format!(
                    "{} must have a positive size, got {}x{}",
                    element, chart.width, chart.height
                )));
            }
        }
        Ok(())
    }

    /// Every element that is not fully contained in its page.
    ///
    /// `table_size` is the measured (width, height) of the table.
    pub fn out_of_bounds(&self, table_size: (f32, f32)) -> Vec<LayoutViolation> {
        let (table_width, table_height) = table_size;
        let extents = [
            (
                LayoutElement::Table,
                self.table.page,
                (
                    self.table.x,
                    self.table.y,
                    self.table.x + table_width,
                    self.table.y + table_height,
                ),
            ),
            (
                LayoutElement::ActivityLabel,
                self.activity_label.page,
                label_extent(&self.activity_label),
            ),
            (
                LayoutElement::ActivityChart,
                self.activity_chart.page,
                placement_extent(&self.activity_chart),
            ),
            (
                LayoutElement::TremorLabel,
                self.tremor_label.page,
                label_extent(&self.tremor_label),
            ),
            (
                LayoutElement::TremorChart,
                self.tremor_chart.page,
                placement_extent(&self.tremor_chart),
            ),
        ];

        extents
            .into_iter()
            .filter(|(_, _, extent)| !self.contains(*extent))
            .map(|(element, page, extent)| LayoutViolation {
                element,
                page,
                extent,
            })
            .collect()
    }

    fn contains(&self, (left, bottom, right, top): (f32, f32, f32, f32)) -> bool {
        left >= 0.0 && bottom >= 0.0 && right <= self.page_width && top <= self.page_height
    }

    /// Apply `[report.layout]` overrides on top of this layout
    pub fn with_overrides(mut self, o: &LayoutOverrides) -> Self {
        fn set<T: Copy>(target: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *target = v;
            }
        }

        set(&mut self.page_width, o.page_width);
        set(&mut self.page_height, o.page_height);
        set(&mut self.table_height, o.table_height);
        set(&mut self.table.page, o.table_page);
        set(&mut self.table.x, o.table_x);
        // The table stays anchored to the page top unless placed explicitly
        self.table.y = o.table_y.unwrap_or(self.page_height - self.table_height);

        set(&mut self.activity_label.page, o.activity_label_page);
        set(&mut self.activity_label.x, o.activity_label_x);
        set(&mut self.activity_label.y, o.activity_label_y);
        set(&mut self.activity_chart.page, o.activity_chart_page);
        set(&mut self.activity_chart.x, o.activity_chart_x);
        set(&mut self.activity_chart.y, o.activity_chart_y);
        set(&mut self.activity_chart.width, o.activity_chart_width);
        set(&mut self.activity_chart.height, o.activity_chart_height);

        set(&mut self.tremor_label.page, o.tremor_label_page);
        set(&mut self.tremor_label.x, o.tremor_label_x);
        set(&mut self.tremor_label.y, o.tremor_label_y);
        set(&mut self.tremor_chart.page, o.tremor_chart_page);
        set(&mut self.tremor_chart.x, o.tremor_chart_x);
        set(&mut self.tremor_chart.y, o.tremor_chart_y);
        set(&mut self.tremor_chart.width, o.tremor_chart_width);
        set(&mut self.tremor_chart.height, o.tremor_chart_height);

        self
    }
}

fn placement_extent(p: &Placement) -> (f32, f32, f32, f32) {
    (p.x, p.y, p.x + p.width, p.y + p.height)
}

fn label_extent(a: &Anchor) -> (f32, f32, f32, f32) {
    (a.x, a.y, a.x, a.y + LABEL_FONT_SIZE)
}

/// `[report.layout]` section: any subset of placements, points
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOverrides {
    pub page_width: Option<f32>,
    pub page_height: Option<f32>,
    pub table_height: Option<f32>,
    pub table_page: Option<usize>,
    pub table_x: Option<f32>,
    pub table_y: Option<f32>,
    pub activity_label_page: Option<usize>,
    pub activity_label_x: Option<f32>,
    pub activity_label_y: Option<f32>,
    pub activity_chart_page: Option<usize>,
    pub activity_chart_x: Option<f32>,
    pub activity_chart_y: Option<f32>,
    pub activity_chart_width: Option<f32>,
    pub activity_chart_height: Option<f32>,
    pub tremor_label_page: Option<usize>,
    pub tremor_label_x: Option<f32>,
    pub tremor_label_y: Option<f32>,
    pub tremor_chart_page: Option<usize>,
    pub tremor_chart_x: Option<f32>,
    pub tremor_chart_y: Option<f32>,
    pub tremor_chart_width: Option<f32>,
    pub tremor_chart_height: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE_SIZE: (f32, f32) = (620.0, 106.0);

    #[test]
    fn test_default_layout_is_contained() {
        let layout = PageLayout::default();
        assert!(layout.validate().is_ok());
        assert_eq!(layout.page_count(), 2);
        assert!(layout.out_of_bounds(TABLE_SIZE).is_empty());
    }

    #[test]
    fn test_table_anchored_to_page_top() {
        let layout = PageLayout::default();
        assert!((layout.table.y + layout.table_height - layout.page_height).abs() < 1e-3);
        assert!((layout.table_height - 113.386).abs() < 0.01);
    }

    #[test]
    fn test_reference_layout_flags_tremor_chart() {
        let layout = PageLayout::reference();
        assert_eq!(layout.page_count(), 1);
        assert_eq!(layout.tremor_chart.y, -8.0);

        let violations = layout.out_of_bounds(TABLE_SIZE);
        let flagged: Vec<LayoutElement> = violations.iter().map(|v| v.element).collect();
        assert!(flagged.contains(&LayoutElement::TremorChart));
        assert!(flagged.contains(&LayoutElement::ActivityLabel));
        assert!(flagged.contains(&LayoutElement::TremorLabel));
        assert!(!flagged.contains(&LayoutElement::ActivityChart));
    }

    #[test]
    fn test_overrides_apply_and_reanchor_table() {
        let overrides = LayoutOverrides {
            tremor_chart_y: Some(-8.0),
            table_height: Some(120.0),
            ..Default::default()
        };
        let layout = PageLayout::default().with_overrides(&overrides);

        assert_eq!(layout.tremor_chart.y, -8.0);
        assert!((layout.table.y - (A4_LANDSCAPE_HEIGHT - 120.0)).abs() < 1e-3);
        assert_eq!(layout.out_of_bounds(TABLE_SIZE).len(), 1);
    }

    #[test]
    fn test_validate_rejects_empty_chart() {
        let overrides = LayoutOverrides {
            activity_chart_width: Some(0.0),
            ..Default::default()
        };
        let layout = PageLayout::default().with_overrides(&overrides);
        assert!(matches!(layout.validate(), Err(ReportError::Layout(_))));
    }

    #[test]
    fn test_violation_display() {
        let violation = &PageLayout::reference().out_of_bounds(TABLE_SIZE)[0];
        assert!(violation.to_string().contains("page 1"));
    }
}
