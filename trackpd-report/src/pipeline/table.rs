//! Table Composer
//!
//! Turns the profile document into the single-row summary table: a header
//! row plus exactly one data row, nine fixed columns, fixed theme.

use serde::Serialize;
use serde_json::Value;
use trackpd_common::models::profile_fields;
use trackpd_common::Document;

/// Number of table columns
pub const COLUMN_COUNT: usize = 9;

/// Column labels, in the order of `profile_fields::ALL`
pub const COLUMN_LABELS: [&str; COLUMN_COUNT] = [
    "Name",
    "Age",
    "Gender",
    "Height",
    "Weight",
    "Bradykinesia",
    "Dyskinesia",
    "PD Duration",
    "Tremor",
];

/// Header row plus one data row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileTable {
    pub header: [String; COLUMN_COUNT],
    pub row: [String; COLUMN_COUNT],
}

impl ProfileTable {
    /// Rows in drawing order
    pub fn rows(&self) -> [&[String; COLUMN_COUNT]; 2] {
        [&self.header, &self.row]
    }

    pub fn row_count(&self) -> usize {
        self.rows().len()
    }
}

/// Build the table from a profile document. Missing fields render empty.
pub fn compose_profile_table(profile: &Document) -> ProfileTable {
    ProfileTable {
        header: COLUMN_LABELS.map(str::to_string),
        row: profile_fields::ALL.map(|field| display_value(profile.get(field))),
    }
}

/// Display form of a profile value
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(true)) => "Yes".to_string(),
        Some(Value::Bool(false)) => "No".to_string(),
        Some(other) => other.to_string(),
    }
}

/// 8-bit RGB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb8(pub u8, pub u8, pub u8);

impl Rgb8 {
    pub const ACCENT: Rgb8 = Rgb8(0x1E, 0x90, 0xFF);
    pub const WHITESMOKE: Rgb8 = Rgb8(0xF5, 0xF5, 0xF5);
    pub const BEIGE: Rgb8 = Rgb8(0xF5, 0xF5, 0xDC);
    pub const BLACK: Rgb8 = Rgb8(0, 0, 0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Align {
    Left,
    Center,
}

/// Resolved style of one cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellStyle {
    pub background: Rgb8,
    pub text: Rgb8,
    pub weight: FontWeight,
    pub font_size: f32,
    pub align: Align,
}

/// Fixed table theme
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TableTheme {
    pub emphasis: CellStyle,
    pub body: CellStyle,
    pub grid_color: Rgb8,
    pub grid_width: f32,
    /// Top and bottom padding of every cell, points
    pub vertical_padding: f32,
    /// Left and right padding of every cell, points
    pub horizontal_padding: f32,
}

impl Default for TableTheme {
    fn default() -> Self {
        Self {
            emphasis: CellStyle {
                background: Rgb8::ACCENT,
                text: Rgb8::WHITESMOKE,
                weight: FontWeight::Bold,
                font_size: 14.0,
                align: Align::Center,
            },
            body: CellStyle {
                background: Rgb8::BEIGE,
                text: Rgb8::BLACK,
                weight: FontWeight::Regular,
                font_size: 12.0,
                align: Align::Left,
            },
            grid_color: Rgb8::BLACK,
            grid_width: 1.0,
            vertical_padding: 20.0,
            horizontal_padding: 6.0,
        }
    }
}

impl TableTheme {
    /// Style for row `row` of `rows`.
    ///
    /// The header is emphasised. A footer row is emphasised only when it is
    /// not also the first data row, so a one-row table keeps a neutral body.
    pub fn cell_style(&self, row: usize, rows: usize) -> CellStyle {
        let is_header = row == 0;
        let is_footer = rows > 2 && row + 1 == rows;
        if is_header || is_footer {
            self.emphasis
        } else {
            self.body
        }
    }
}

/// Approximate Helvetica advance width of `text` at `size` points
pub fn text_width(text: &str, size: f32, weight: FontWeight) -> f32 {
    let em: f32 = text
        .chars()
        .map(|c| match c {
            ' ' | 'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '|' => 0.278,
            'f' | 't' | 'r' | 'I' | '-' | '(' | ')' | '/' => 0.333,
            'm' | 'M' | 'W' => 0.833,
            'w' => 0.722,
            c if c.is_ascii_uppercase() => 0.667,
            _ => 0.556,
        })
        .sum();
    let weight_factor = match weight {
        FontWeight::Regular => 1.0,
        FontWeight::Bold => 1.06,
    };
    em * size * weight_factor
}

/// Measured column widths and row heights, points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableGeometry {
    pub column_widths: Vec<f32>,
    pub row_heights: Vec<f32>,
}

impl TableGeometry {
    pub fn measure(table: &ProfileTable, theme: &TableTheme) -> Self {
        let rows = table.rows();
        let mut column_widths = vec![0.0f32; COLUMN_COUNT];
        let mut row_heights = Vec::with_capacity(rows.len());

        for (r, cells) in rows.iter().enumerate() {
            let style = theme.cell_style(r, rows.len());
            for (c, text) in cells.iter().enumerate() {
                let width = text_width(text, style.font_size, style.weight)
                    + 2.0 * theme.horizontal_padding;
                column_widths[c] = column_widths[c].max(width);
            }
            row_heights.push(style.font_size + 2.0 * theme.vertical_padding);
        }

        Self {
            column_widths,
            row_heights,
        }
    }

    pub fn width(&self) -> f32 {
        self.column_widths.iter().sum()
    }

    pub fn height(&self) -> f32 {
        self.row_heights.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_table_shape_is_two_by_nine() {
        let table = compose_profile_table(&Document::new());
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.header.len(), 9);
        assert_eq!(table.row.len(), 9);
        assert_eq!(
            table.header,
            COLUMN_LABELS.map(str::to_string),
        );
        assert_eq!(table.header[7], "PD Duration");
    }

    #[test]
    fn test_missing_age_renders_empty() {
        let table = compose_profile_table(&profile(json!({"name": "Ada", "gender": "F"})));
        assert_eq!(table.row[0], "Ada");
        assert_eq!(table.row[1], "");
        assert_ne!(table.row[1], "None");
        assert_eq!(table.row[2], "F");
    }

    #[test]
    fn test_values_coerced_in_column_order() {
        let table = compose_profile_table(&profile(json!({
            "name": "Ada",
            "age": 71,
            "gender": "F",
            "height": 165.5,
            "weight": 60,
            "Bradykinesia": true,
            "Dyskinesia": false,
            "PD duration": "5 years",
            "Tremor": null,
        })));
        assert_eq!(
            table.row,
            ["Ada", "71", "F", "165.5", "60", "Yes", "No", "5 years", ""].map(str::to_string)
        );
    }

    #[test]
    fn test_nested_value_is_compact_json() {
        assert_eq!(display_value(Some(&json!([1, 2]))), "[1,2]");
    }

    #[test]
    fn test_single_data_row_keeps_body_style() {
        let theme = TableTheme::default();
        assert_eq!(theme.cell_style(0, 2), theme.emphasis);
        assert_eq!(theme.cell_style(1, 2), theme.body);
        assert_eq!(theme.cell_style(2, 3), theme.emphasis);
        assert_eq!(theme.emphasis.background, Rgb8::ACCENT);
        assert_eq!(theme.body.align, Align::Left);
    }

    #[test]
    fn test_geometry_fits_landscape_page() {
        let table = compose_profile_table(&profile(json!({"name": "Ada Lovelace", "age": 71})));
        let geometry = TableGeometry::measure(&table, &TableTheme::default());

        assert_eq!(geometry.column_widths.len(), 9);
        assert_eq!(geometry.row_heights, vec![54.0, 52.0]);
        assert!(geometry.width() < 841.89);
        assert!(geometry.height() < 113.4);
        assert!(geometry.column_widths.iter().all(|w| *w >= 12.0));
    }
}
