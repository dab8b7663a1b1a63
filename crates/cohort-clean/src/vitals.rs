//! Blood-pressure banding.

use cohort_model::{CellValue, Column, Table};

use crate::error::{CleanError, Result};

/// American Heart Association blood-pressure bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BloodPressureBand {
    Normal,
    Elevated,
    Stage1Hypertension,
    Stage2Hypertension,
    HypertensiveCrisis,
}

impl BloodPressureBand {
    pub fn code(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Elevated => 1,
            Self::Stage1Hypertension => 2,
            Self::Stage2Hypertension => 3,
            Self::HypertensiveCrisis => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Elevated => "Elevated",
            Self::Stage1Hypertension => "Stage 1 HTN",
            Self::Stage2Hypertension => "Stage 2 HTN",
            Self::HypertensiveCrisis => "Hypertensive crisis",
        }
    }
}

/// Band a systolic/diastolic reading.
pub fn blood_pressure_band(systolic: f64, diastolic: f64) -> BloodPressureBand {
    if systolic < 120.0 && diastolic < 80.0 {
        BloodPressureBand::Normal
    } else if systolic < 130.0 && diastolic < 80.0 {
        BloodPressureBand::Elevated
    } else if systolic < 140.0 || diastolic < 90.0 {
        BloodPressureBand::Stage1Hypertension
    } else if systolic >= 180.0 || diastolic >= 120.0 {
        BloodPressureBand::HypertensiveCrisis
    } else {
        BloodPressureBand::Stage2Hypertension
    }
}

fn require<'a>(table: &'a Table, column: &str, transform: &'static str) -> Result<&'a Column> {
    table.column(column).ok_or_else(|| CleanError::MissingColumn {
        table: table.name.clone(),
        column: column.to_string(),
        transform,
    })
}

fn band_columns(
    table: &Table,
    systolic: &str,
    diastolic: &str,
    code_name: &str,
    label_name: &str,
) -> Result<(Column, Column)> {
    let sys = require(table, systolic, "clean_vital_signs")?;
    let dia = require(table, diastolic, "clean_vital_signs")?;
    let mut codes = Vec::with_capacity(table.height());
    let mut labels = Vec::with_capacity(table.height());
    for (s, d) in sys.cells.iter().zip(dia.cells.iter()) {
        match (s.as_number(), d.as_number()) {
            (Some(s), Some(d)) => {
                let band = blood_pressure_band(s, d);
                codes.push(CellValue::Number(f64::from(band.code())));
                labels.push(CellValue::Text(band.label().to_string()));
            }
            _ => {
                codes.push(CellValue::Null);
                labels.push(CellValue::Null);
            }
        }
    }
    Ok((
        Column::new(code_name, codes),
        Column::new(label_name, labels),
    ))
}

/// Append banded supine and standing blood-pressure columns.
pub fn clean_vital_signs(table: Table) -> Result<Table> {
    let (sup_code, sup_label) =
        band_columns(&table, "SYSSUP", "DIASUP", "SUP_BP_CODE", "SUP_BP_LABEL")?;
    let (stnd_code, stnd_label) = band_columns(
        &table,
        "SYSSTND",
        "DIASTND",
        "STND_BP_CODE",
        "STND_BP_LABEL",
    )?;
    let mut out = table;
    out.push_column(sup_code)?;
    out.push_column(sup_label)?;
    out.push_column(stnd_code)?;
    out.push_column(stnd_label)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_follow_aha_thresholds() {
        assert_eq!(blood_pressure_band(118.0, 75.0), BloodPressureBand::Normal);
        assert_eq!(blood_pressure_band(125.0, 78.0), BloodPressureBand::Elevated);
        assert_eq!(
            blood_pressure_band(135.0, 85.0),
            BloodPressureBand::Stage1Hypertension
        );
        // Either reading under its stage-2 threshold still counts as stage 1.
        assert_eq!(
            blood_pressure_band(150.0, 85.0),
            BloodPressureBand::Stage1Hypertension
        );
        assert_eq!(
            blood_pressure_band(150.0, 95.0),
            BloodPressureBand::Stage2Hypertension
        );
        assert_eq!(
            blood_pressure_band(185.0, 95.0),
            BloodPressureBand::HypertensiveCrisis
        );
        assert_eq!(
            blood_pressure_band(150.0, 125.0),
            BloodPressureBand::HypertensiveCrisis
        );
    }

    #[test]
    fn appends_banded_columns() {
        let table = Table::from_columns(
            "Vital_Signs",
            vec![
                Column::from_raw("PATNO", &["1", "2"]),
                Column::from_raw("SYSSUP", &["118", ""]),
                Column::from_raw("DIASUP", &["75", "80"]),
                Column::from_raw("SYSSTND", &["150", "122"]),
                Column::from_raw("DIASTND", &["95", "78"]),
            ],
        )
        .unwrap();
        let out = clean_vital_signs(table).unwrap();
        assert_eq!(out.cell("SUP_BP_CODE", 0), CellValue::Number(0.0));
        assert_eq!(out.cell("SUP_BP_LABEL", 0), CellValue::Text("Normal".into()));
        // Missing reading yields no band.
        assert_eq!(out.cell("SUP_BP_CODE", 1), CellValue::Null);
        assert_eq!(
            out.cell("STND_BP_LABEL", 0),
            CellValue::Text("Stage 2 HTN".into())
        );
        assert_eq!(
            out.cell("STND_BP_LABEL", 1),
            CellValue::Text("Elevated".into())
        );
    }

    #[test]
    fn missing_columns_are_reported() {
        let table = Table::from_columns(
            "Vital_Signs",
            vec![Column::from_raw("PATNO", &["1"])],
        )
        .unwrap();
        assert!(matches!(
            clean_vital_signs(table),
            Err(CleanError::MissingColumn { .. })
        ));
    }
}
