use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::*;

use crate::error::Result;
use crate::models::gradebook::Gradebook;

pub struct ExportService;

impl ExportService {
    /// Generate a styled XLSX workbook from a course gradebook.
    pub fn generate_gradebook_xlsx(course_name: &str, book: &Gradebook) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Calificaciones")?;

        // ── Color palette ──
        let primary_color = Color::RGB(0x1E293B);
        let header_bg = Color::RGB(0x0F172A);
        let header_text = Color::White;
        let alt_row_1 = Color::RGB(0xF8FAFC);
        let alt_row_2 = Color::White;
        let border_color = Color::RGB(0xE2E8F0);
        let pending_color = Color::RGB(0xF59E0B);

        let grade_high = Color::RGB(0x10B981);
        let grade_mid = Color::RGB(0xF59E0B);
        let grade_low = Color::RGB(0xEF4444);

        // ── Columns: №, student, email, one per evaluation, totals ──
        let mut headers: Vec<(String, f64)> = vec![
            ("№".into(), 6.0),
            ("Estudiante".into(), 30.0),
            ("Email".into(), 30.0),
        ];
        for col in &book.columns {
            headers.push((format!("{} ({} pts)", col.title, col.total_points), 18.0));
        }
        headers.push(("Puntos".into(), 14.0));
        headers.push(("Porcentaje (%)".into(), 16.0));
        let last_col = (headers.len() - 1) as u16;
        let first_eval_col = 3u16;
        let points_col = first_eval_col + book.columns.len() as u16;
        let pct_col = points_col + 1;

        for (i, (_, width)) in headers.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }

        // ── Title row ──
        let title_format = Format::new()
            .set_font_size(16)
            .set_bold()
            .set_font_color(header_text)
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);
        worksheet.set_row_height(0, 40)?;
        let title = format!("Libro de calificaciones: {}", course_name);
        worksheet.merge_range(0, 0, 0, last_col, &title, &title_format)?;

        // ── Subtitle row ──
        let subtitle_format = Format::new()
            .set_font_size(10)
            .set_italic()
            .set_font_color(Color::RGB(0x94A3B8))
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);
        worksheet.set_row_height(1, 22)?;
        let now = chrono::Utc::now().format("%d/%m/%Y %H:%M UTC").to_string();
        let subtitle = format!(
            "Exportado: {}  •  Estudiantes: {}  •  Evaluaciones: {}",
            now,
            book.rows.len(),
            book.columns.len()
        );
        worksheet.merge_range(1, 0, 1, last_col, &subtitle, &subtitle_format)?;

        // ── Header row ──
        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(header_text)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);
        let header_row = 2;
        worksheet.set_row_height(header_row, 30)?;
        for (i, (name, _)) in headers.iter().enumerate() {
            worksheet.write_string_with_format(header_row, i as u16, name, &header_format)?;
        }

        // ── Data rows ──
        let data_start_row = 3;
        for (idx, student) in book.rows.iter().enumerate() {
            let row = data_start_row + idx as u32;
            let bg = if idx % 2 == 0 { alt_row_1 } else { alt_row_2 };

            let base_fmt = Format::new()
                .set_font_size(10)
                .set_background_color(bg)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            let center_fmt = base_fmt.clone().set_align(FormatAlign::Center);
            let pending_fmt = center_fmt.clone().set_italic().set_font_color(pending_color);

            worksheet.set_row_height(row, 22)?;
            worksheet.write_number_with_format(row, 0, (idx + 1) as f64, &center_fmt)?;
            worksheet.write_string_with_format(row, 1, &student.full_name, &base_fmt.clone().set_bold())?;
            worksheet.write_string_with_format(row, 2, &student.email, &base_fmt)?;

            for (offset, cell) in student.cells.iter().enumerate() {
                let col = first_eval_col + offset as u16;
                match cell {
                    Some(c) => {
                        let text = format!("{} / {}", c.score, c.total_points);
                        let fmt = if c.pending_review { &pending_fmt } else { &center_fmt };
                        worksheet.write_string_with_format(row, col, &text, fmt)?;
                    }
                    None => {
                        worksheet.write_string_with_format(row, col, "—", &center_fmt)?;
                    }
                }
            }

            worksheet.write_string_with_format(
                row,
                points_col,
                &format!("{} / {}", student.earned, student.possible),
                &center_fmt,
            )?;

            let pct = student.percentage.to_f64().unwrap_or(0.0);
            let pct_color = if pct >= 70.0 {
                grade_high
            } else if pct >= 50.0 {
                grade_mid
            } else {
                grade_low
            };
            let pct_fmt = center_fmt
                .clone()
                .set_bold()
                .set_font_color(pct_color)
                .set_num_format("0.00");
            worksheet.write_number_with_format(row, pct_col, pct, &pct_fmt)?;
        }

        // ── Summary row ──
        let total_row = data_start_row + book.rows.len() as u32 + 1;
        let summary_fmt = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(primary_color)
            .set_background_color(Color::RGB(0xE0E7FF))
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);
        worksheet.set_row_height(total_row, 26)?;

        let graded: Vec<f64> = book
            .rows
            .iter()
            .filter(|r| r.possible > 0)
            .filter_map(|r| r.percentage.to_f64())
            .collect();
        let average = if graded.is_empty() {
            0.0
        } else {
            graded.iter().sum::<f64>() / graded.len() as f64
        };
        worksheet.merge_range(
            total_row,
            0,
            total_row,
            2,
            &format!("Total: {} estudiantes", book.rows.len()),
            &summary_fmt,
        )?;
        for col in first_eval_col..=last_col {
            worksheet.write_string_with_format(total_row, col, "", &summary_fmt)?;
        }
        worksheet.write_string_with_format(total_row, pct_col, &format!("Prom. {:.2}", average), &summary_fmt)?;

        worksheet.set_freeze_panes(3, 2)?;
        if !book.rows.is_empty() {
            worksheet.autofilter(2, 0, data_start_row + book.rows.len() as u32 - 1, last_col)?;
        }

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::gradebook::{GradebookColumn, GradebookScore, GradebookStudent};
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn writes_a_workbook() {
        let col = GradebookColumn {
            evaluation_id: Uuid::new_v4(),
            title: "Parcial".into(),
            start_date: Utc::now(),
            total_points: 10,
        };
        let student = GradebookStudent {
            student_id: Uuid::new_v4(),
            full_name: "Ana".into(),
            email: "ana@aula.test".into(),
        };
        let score = GradebookScore {
            evaluation_id: col.evaluation_id,
            student_id: student.student_id,
            score: 7,
            total_points: 10,
            graded_at: Some(Utc::now()),
        };
        let book = Gradebook::build(Uuid::nil(), vec![col], vec![student], vec![score]);
        let bytes = ExportService::generate_gradebook_xlsx("Álgebra", &book).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn empty_gradebook_still_exports() {
        let book = Gradebook::build(Uuid::nil(), vec![], vec![], vec![]);
        assert!(ExportService::generate_gradebook_xlsx("Vacío", &book).is_ok());
    }
}
