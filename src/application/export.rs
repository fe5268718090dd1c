//! File rendering for exported reports.
//!
//! A report is first flattened into a [`ReportTable`] and then written as CSV
//! (`csv`), an Excel workbook (`rust_xlsxwriter`) or a landscape A4 PDF
//! (`printpdf`, built-in Helvetica).

use printpdf::{BuiltinFont, Mm, PdfDocument};
use rust_xlsxwriter::{Format, Workbook};
use serde_json::json;

use crate::domain::entities::ExportFormat;
use crate::error::AppError;

/// A single value in an exported row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    /// Rendered with two decimals in text formats.
    Decimal(f64),
    Integer(i64),
}

impl Cell {
    fn display(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Decimal(v) => format!("{v:.2}"),
            Self::Integer(v) => v.to_string(),
        }
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Self::Integer(value as i64)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub title: String,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<Cell>>,
}

fn render_error(format: &str, err: impl std::fmt::Debug) -> AppError {
    tracing::error!("Failed to render {} export: {:?}", format, err);
    AppError::internal(
        "No se pudo generar el archivo de exportación",
        json!({ "format": format }),
    )
}

/// Renders the table in the requested format.
pub fn render(table: &ReportTable, format: ExportFormat) -> Result<Vec<u8>, AppError> {
    match format {
        ExportFormat::Csv => render_csv(table),
        ExportFormat::Excel => render_xlsx(table),
        ExportFormat::Pdf => render_pdf(table),
    }
}

fn render_csv(table: &ReportTable) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(&table.headers)
        .map_err(|e| render_error("csv", e))?;
    for row in &table.rows {
        writer
            .write_record(row.iter().map(Cell::display))
            .map_err(|e| render_error("csv", e))?;
    }

    writer
        .into_inner()
        .map_err(|e| render_error("csv", e.error().to_string()))
}

fn render_xlsx(table: &ReportTable) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let decimal = Format::new().set_num_format("0.00");

    let sheet = workbook.add_worksheet();
    sheet
        .set_name("Reporte")
        .map_err(|e| render_error("excel", e))?;

    for (col, header) in table.headers.iter().enumerate() {
        let col = col as u16;
        sheet
            .write_string_with_format(0, col, *header, &bold)
            .map_err(|e| render_error("excel", e))?;
        sheet
            .set_column_width(col, 18.0)
            .map_err(|e| render_error("excel", e))?;
    }

    for (index, row) in table.rows.iter().enumerate() {
        let r = index as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            let written = match cell {
                Cell::Text(s) => sheet.write_string(r, col, s.as_str()),
                Cell::Decimal(v) => sheet.write_number_with_format(r, col, *v, &decimal),
                Cell::Integer(v) => sheet.write_number(r, col, *v as f64),
            };
            written.map_err(|e| render_error("excel", e))?;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| render_error("excel", e))
}

const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 15.0;
const LINE_HEIGHT: f32 = 6.0;
const CELL_CHARS: usize = 28;

fn fit(text: String) -> String {
    if text.chars().count() <= CELL_CHARS {
        text
    } else {
        let mut cut: String = text.chars().take(CELL_CHARS - 1).collect();
        cut.push('…');
        cut
    }
}

fn render_pdf(table: &ReportTable) -> Result<Vec<u8>, AppError> {
    let (doc, page, layer) = PdfDocument::new(
        table.title.as_str(),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Página 1",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| render_error("pdf", e))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| render_error("pdf", e))?;

    let columns = table.headers.len().max(1) as f32;
    let column_width = (PAGE_WIDTH - 2.0 * MARGIN) / columns;

    let mut current = doc.get_page(page).get_layer(layer);
    let mut y = PAGE_HEIGHT - MARGIN;
    current.use_text(table.title.as_str(), 14.0, Mm(MARGIN), Mm(y), &bold);
    y -= 2.0 * LINE_HEIGHT;

    let mut page_number = 1;
    let mut rows = table.rows.iter().peekable();
    loop {
        for (col, header) in table.headers.iter().enumerate() {
            let x = MARGIN + col as f32 * column_width;
            current.use_text(*header, 9.0, Mm(x), Mm(y), &bold);
        }
        y -= LINE_HEIGHT;

        while y > MARGIN {
            let Some(row) = rows.next() else { break };
            for (col, cell) in row.iter().enumerate() {
                let x = MARGIN + col as f32 * column_width;
                current.use_text(fit(cell.display()), 9.0, Mm(x), Mm(y), &regular);
            }
            y -= LINE_HEIGHT;
        }

        if rows.peek().is_none() {
            break;
        }
        page_number += 1;
        let (next_page, next_layer) = doc.add_page(
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
            format!("Página {page_number}"),
        );
        current = doc.get_page(next_page).get_layer(next_layer);
        y = PAGE_HEIGHT - MARGIN;
    }

    doc.save_to_bytes().map_err(|e| render_error("pdf", e))
}
