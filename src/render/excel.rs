use rust_xlsxwriter::{Format, FormatAlign, Workbook};
use std::error::Error;
use std::path::Path;

use crate::models::registry::RegistryRow;

pub const WORKBOOK_FILE_NAME: &str = "Reporte Conversaciones.xlsx";

/// Writes the fixed-header listing worksheet, one row per item, columns
/// {status, date, user, name}.
pub fn write_workbook(
    rows: &[RegistryRow],
    output: &Path,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Hoja1")?;

    let header = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    worksheet.write_string_with_format(0, 0, "Estado", &header)?;
    worksheet.write_string_with_format(0, 1, "Fecha de consulta", &header)?;
    worksheet.write_string_with_format(0, 2, "Usuario", &header)?;
    worksheet.write_string_with_format(0, 3, "Consulta", &header)?;

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        worksheet.write_string(r, 0, &row.estado)?;
        worksheet.write_string(r, 1, &row.date)?;
        worksheet.write_string(r, 2, &row.user_name)?;
        worksheet.write_string(r, 3, &row.name)?;
    }
    worksheet.autofit();

    workbook.save(output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workbook_file_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(WORKBOOK_FILE_NAME);
        let rows = vec![RegistryRow {
            conversation_id: "c1".into(),
            user_name: "ana".into(),
            name: "Primera Conversación".into(),
            date: "01/06/2024 10:30 AM".into(),
            estado: "Activo".into(),
        }];

        write_workbook(&rows, &path).unwrap();
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}
