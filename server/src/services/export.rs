//! XLSX export of a filtered listing.
//!
//! The workbook is built in memory and streamed back as an attachment; the
//! same filters as the listing select the rows, so the file always matches
//! what the viewer shows.

use records::{Record, parse_iso_date};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, FormatPattern, Workbook, XlsxError};
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

pub const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const SHEET_NAME: &str = "Registros de Procedimentos";
const HEADER_COLOR: u32 = 0x0033_7AB7;

/// Column headers, in sheet order.
pub const HEADERS: [&str; 9] = [
    "Posto",
    "Data (Dia/Mês/Ano)",
    "Hora Início",
    "Hora Término",
    "Mesa/Local",
    "Coleta de Imagem",
    "Retaguarda",
    "Destino/Setor Retaguarda",
    "Procedimento Completo",
];

const COLUMN_WIDTHS: [f64; 9] = [20.0, 18.0, 12.0, 12.0, 18.0, 12.0, 12.0, 22.0, 70.0];
const PROCEDURE_COLUMN: u16 = 8;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("xlsx error: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("timestamp error: {0}")]
    Timestamp(#[from] time::error::Format),
}

const FILENAME: &[BorrowedFormatItem<'static>] =
    format_description!("Registros_PPT_[year][month][day]_[hour][minute][second].xlsx");
const DISPLAY_DATE: &[BorrowedFormatItem<'static>] = format_description!("[day]/[month]/[year]");

/// `Registros_PPT_YYYYMMDD_HHMMSS.xlsx`.
///
/// # Errors
///
/// Returns [`ExportError::Timestamp`] if the timestamp cannot be rendered.
pub fn export_filename(now: OffsetDateTime) -> Result<String, ExportError> {
    Ok(now.format(FILENAME)?)
}

/// `YYYY-MM-DD` as `DD/MM/YYYY`; anything else passes through untouched.
#[must_use]
pub fn display_date(iso: &str) -> String {
    parse_iso_date(iso)
        .and_then(|date| date.format(DISPLAY_DATE).ok())
        .unwrap_or_else(|| iso.to_owned())
}

/// Sheet cells for one record.
#[must_use]
pub fn record_cells(record: &Record) -> [String; 9] {
    let mesa_local = record
        .numero_mesa
        .clone()
        .or_else(|| record.local.clone())
        .unwrap_or_default();
    let destino = if record.retaguarda_sim_nao.is_sim() {
        record
            .retaguarda_destino
            .clone()
            .or_else(|| record.retaguarda_setor.clone())
            .unwrap_or_default()
    } else {
        String::new()
    };

    [
        record.posto.clone(),
        display_date(&record.data),
        record.hora_inicio.clone(),
        record.hora_termino.clone().unwrap_or_default(),
        mesa_local,
        record.coleta_imagem.as_str().to_owned(),
        record.retaguarda_sim_nao.as_str().to_owned(),
        destino,
        record.procedimento.clone(),
    ]
}

/// Build the workbook and return the file bytes.
///
/// # Errors
///
/// Returns [`ExportError::Xlsx`] if the workbook cannot be written.
pub fn build_workbook(records: &[Record]) -> Result<Vec<u8>, ExportError> {
    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_COLOR))
        .set_pattern(FormatPattern::Solid)
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap();
    let centered = Format::new()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap();
    let procedure = Format::new()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Left)
        .set_align(FormatAlign::Top)
        .set_text_wrap();

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in (0u16..).zip(HEADERS) {
        worksheet.write_string_with_format(0, col, header, &header_format)?;
    }
    for (col, width) in (0u16..).zip(COLUMN_WIDTHS) {
        worksheet.set_column_width(col, width)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    for (row, record) in (1u32..).zip(records) {
        for (col, value) in (0u16..).zip(record_cells(record)) {
            let format = if col == PROCEDURE_COLUMN { &procedure } else { &centered };
            worksheet.write_string_with_format(row, col, value.as_str(), format)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
#[path = "export_test.rs"]
mod tests;
