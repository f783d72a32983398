//! Document Assembler
//!
//! Draws the table, chart labels and chart rasters onto landscape pages and
//! persists the finished PDF.

use crate::error::{ReportError, Result};
use crate::pipeline::chart::ChartImage;
use crate::pipeline::layout::{Anchor, PageLayout, Placement, LABEL_FONT_SIZE};
use crate::pipeline::table::{
    text_width, Align, FontWeight, ProfileTable, Rgb8, TableGeometry, TableTheme,
};
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfLayerReference, Point, Pt, Rect, Rgb,
};
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// Everything the assembler places
pub struct DocumentParts<'a> {
    pub title: &'a str,
    pub table: &'a ProfileTable,
    pub theme: &'a TableTheme,
    pub tremor_chart: &'a ChartImage,
    pub activity_chart: &'a ChartImage,
}

/// Serialised PDF plus its page count
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    pub bytes: Vec<u8>,
    pub pages: usize,
}

fn pdf_err<E: std::fmt::Display>(e: E) -> ReportError {
    ReportError::Pdf(e.to_string())
}

fn mm(points: f32) -> Mm {
    Mm::from(Pt(points))
}

fn color(c: Rgb8) -> Color {
    Color::Rgb(Rgb::new(
        c.0 as f32 / 255.0,
        c.1 as f32 / 255.0,
        c.2 as f32 / 255.0,
        None,
    ))
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn get(&self, weight: FontWeight) -> &IndirectFontRef {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }
}

/// Lay out every element and serialise the document
pub fn assemble_document(parts: &DocumentParts<'_>, layout: &PageLayout) -> Result<AssembledDocument> {
    layout.validate()?;

    let geometry = TableGeometry::measure(parts.table, parts.theme);
    for violation in layout.out_of_bounds((geometry.width(), geometry.height())) {
        warn!("Layout: {}", violation);
    }

    let page_count = layout.page_count();
    let (page_w, page_h) = (mm(layout.page_width), mm(layout.page_height));
    let (doc, first_page, first_layer) = PdfDocument::new(parts.title, page_w, page_h, "Page 1");

    let mut layers = vec![doc.get_page(first_page).get_layer(first_layer)];
    for index in 1..page_count {
        let (page, layer) = doc.add_page(page_w, page_h, format!("Page {}", index + 1));
        layers.push(doc.get_page(page).get_layer(layer));
    }

    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?,
    };

    draw_table(
        &layers[layout.table.page],
        &fonts,
        parts.table,
        parts.theme,
        &geometry,
        &layout.table,
    );

    draw_label(
        &layers[layout.activity_label.page],
        &fonts,
        parts.activity_chart.kind.title(),
        &layout.activity_label,
    );
    draw_chart(
        &layers[layout.activity_chart.page],
        parts.activity_chart,
        &layout.activity_chart,
    )?;

    draw_label(
        &layers[layout.tremor_label.page],
        &fonts,
        parts.tremor_chart.kind.title(),
        &layout.tremor_label,
    );
    draw_chart(
        &layers[layout.tremor_chart.page],
        parts.tremor_chart,
        &layout.tremor_chart,
    )?;

    drop(layers);
    let bytes = doc.save_to_bytes().map_err(pdf_err)?;
    debug!("Assembled {} page(s), {} bytes", page_count, bytes.len());

    Ok(AssembledDocument {
        bytes,
        pages: page_count,
    })
}

fn draw_label(layer: &PdfLayerReference, fonts: &Fonts, text: &str, at: &Anchor) {
    layer.set_fill_color(color(Rgb8::BLACK));
    layer.use_text(text, LABEL_FONT_SIZE, mm(at.x), mm(at.y), &fonts.regular);
}

fn draw_chart(layer: &PdfLayerReference, chart: &ChartImage, at: &Placement) -> Result<()> {
    let decoded = printpdf::image_crate::load_from_memory(&chart.png)
        .map_err(|e| ReportError::Image(e.to_string()))?;
    let image = Image::from_dynamic_image(&decoded);

    // At 72 dpi one pixel is one point; scale to the placement box
    let transform = ImageTransform {
        translate_x: Some(mm(at.x)),
        translate_y: Some(mm(at.y)),
        dpi: Some(72.0),
        scale_x: Some(at.width / chart.width as f32),
        scale_y: Some(at.height / chart.height as f32),
        ..Default::default()
    };
    image.add_to_layer(layer.clone(), transform);
    Ok(())
}

fn draw_table(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    table: &ProfileTable,
    theme: &TableTheme,
    geometry: &TableGeometry,
    origin: &Anchor,
) {
    let rows = table.rows();
    let mut top = origin.y + geometry.height();

    for (r, cells) in rows.iter().enumerate() {
        let style = theme.cell_style(r, rows.len());
        let row_height = geometry.row_heights[r];
        let bottom = top - row_height;
        let mut left = origin.x;

        for (c, text) in cells.iter().enumerate() {
            let width = geometry.column_widths[c];

            layer.set_fill_color(color(style.background));
            layer.add_rect(
                Rect::new(mm(left), mm(bottom), mm(left + width), mm(top))
                    .with_mode(PaintMode::Fill),
            );

            let text_x = match style.align {
                Align::Left => left + theme.horizontal_padding,
                Align::Center => {
                    left + (width - text_width(text, style.font_size, style.weight)) / 2.0
                }
            };
            // Vertically centred baseline; cap height of Helvetica is ~0.72 em
            let text_y = bottom + (row_height - style.font_size * 0.72) / 2.0;

            layer.set_fill_color(color(style.text));
            layer.use_text(
                text.as_str(),
                style.font_size,
                mm(text_x),
                mm(text_y),
                fonts.get(style.weight),
            );

            left += width;
        }
        top = bottom;
    }

    draw_grid(layer, theme, geometry, origin);
}

fn draw_grid(layer: &PdfLayerReference, theme: &TableTheme, geometry: &TableGeometry, origin: &Anchor) {
    layer.set_outline_color(color(theme.grid_color));
    layer.set_outline_thickness(theme.grid_width);

    let left = origin.x;
    let right = origin.x + geometry.width();
    let bottom = origin.y;
    let top = origin.y + geometry.height();

    let mut y = top;
    let mut horizontals = vec![top];
    for height in &geometry.row_heights {
        y -= height;
        horizontals.push(y);
    }
    for y in horizontals {
        stroke(layer, (left, y), (right, y));
    }

    let mut x = left;
    stroke(layer, (x, bottom), (x, top));
    for width in &geometry.column_widths {
        x += width;
        stroke(layer, (x, bottom), (x, top));
    }
}

fn stroke(layer: &PdfLayerReference, from: (f32, f32), to: (f32, f32)) {
    layer.add_line(Line {
        points: vec![
            (Point::new(mm(from.0), mm(from.1)), false),
            (Point::new(mm(to.0), mm(to.1)), false),
        ],
        is_closed: false,
    });
}

/// Write `bytes` to `path` atomically.
///
/// The bytes go to a temporary file in the same directory which is then
/// renamed over the target, so a failed write never leaves a partial artifact
/// and never disturbs the previous one.
pub fn persist_artifact(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|e| ReportError::Io(e.error))?;

    Ok(())
}
