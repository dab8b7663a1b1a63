//! Medication-log cleaning: start/stop dates, levodopa-equivalent daily
//! dose, and concomitant-medication indication coding.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use cohort_model::{CellValue, Column, Table};
use tracing::{debug, info, warn};

use crate::error::{CleanError, Result};

/// Parse a `MM/YYYY` medication date.
pub fn parse_month_year(raw: &str) -> Option<NaiveDate> {
    let (month, year) = raw.trim().split_once('/')?;
    let month: u32 = month.trim().parse().ok()?;
    let year: i32 = year.trim().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn require(table: &Table, column: &str, transform: &'static str) -> Result<()> {
    if table.has_column(column) {
        Ok(())
    } else {
        Err(CleanError::MissingColumn {
            table: table.name.clone(),
            column: column.to_string(),
            transform,
        })
    }
}

/// Rewrite `MM/YYYY` date columns as ISO dates pinned to the first of the
/// month; unparseable entries become `Null`.
fn normalize_date_columns(table: Table, date_columns: &[&str]) -> Result<Table> {
    let name = table.name.clone();
    let columns: Vec<Column> = table
        .columns()
        .iter()
        .map(|column| {
            if !date_columns.contains(&column.name.as_str()) {
                return column.clone();
            }
            let mut missing = 0usize;
            let cells: Vec<CellValue> = column
                .cells
                .iter()
                .map(|cell| match cell.token().as_deref().and_then(parse_month_year) {
                    Some(date) => CellValue::Text(date.format("%Y-%m-%d").to_string()),
                    None => {
                        if !cell.is_empty() {
                            missing += 1;
                        }
                        CellValue::Null
                    }
                })
                .collect();
            if missing > 0 {
                debug!(table = %name, column = %column.name, count = missing, "unparseable dates dropped");
            }
            Column::new(column.name.clone(), cells)
        })
        .collect();
    Ok(Table::from_columns(name, columns)?)
}

fn filter_rows(table: Table, keep: &[bool]) -> Result<Table> {
    let name = table.name.clone();
    let columns: Vec<Column> = table
        .columns()
        .iter()
        .map(|column| {
            let cells = column
                .cells
                .iter()
                .zip(keep)
                .filter(|(_, keep)| **keep)
                .map(|(cell, _)| cell.clone())
                .collect();
            Column::new(column.name.clone(), cells)
        })
        .collect();
    Ok(Table::from_columns(name, columns)?)
}

/// Anticholinergics and similar agents that must not enter the levodopa
/// equivalent, even when present in the medication log.
fn is_non_ledd_agent(treatment: &str) -> bool {
    ["benztropine", "cogentin", "biperden", "akineton", "budipin", "parkinsan"]
        .iter()
        .any(|agent| treatment.contains(agent))
}

fn scaled(dose_value: Option<f64>, factor: f64) -> CellValue {
    match dose_value {
        Some(v) => CellValue::Number(factor * v),
        None => CellValue::Null,
    }
}

/// Levodopa-equivalent daily dose for one medication entry.
///
/// `treatment` and `dose_form` are matched lowercase. Catechol-O-methyl
/// transferase inhibitors scale the concurrent levodopa dose rather than
/// carrying a dose of their own; those entries yield a textual `LD x F`
/// factor for downstream handling.
fn equivalent_dose(treatment: &str, dose_form: &str, dose_value: Option<f64>) -> CellValue {
    // Fixed amounts
    if treatment.contains("safinamide") || treatment.contains("xadago") {
        return CellValue::Number(150.0);
    }
    // Lots of mis-spellings of trihexiphenidyl in the source; catch them all.
    if treatment.contains("zonisamide") || treatment.contains("trihex") {
        return CellValue::Number(100.0);
    }

    // Combos and complex names first, to catch them correctly
    if treatment.contains("infusion") || treatment.contains("duopa") {
        return scaled(dose_value, 1.1);
    }
    if treatment.contains("inhal") || treatment.contains("inbrija") {
        return scaled(dose_value, 0.69);
    }
    // Some entries cut off Benserazide
    if treatment.contains("madopar") || treatment.contains("benseraz") {
        return scaled(dose_value, 0.85);
    }

    // Levodopa-scaling adjuncts
    if treatment.contains("istradefylline") || treatment.contains("nourianz") {
        return CellValue::Text("LD x 0.2".to_string());
    }
    if treatment.contains("tolcapone") || treatment.contains("opicapone") {
        return CellValue::Text("LD x 0.5".to_string());
    }
    if treatment.contains("entacapone") {
        return CellValue::Text("LD x 0.33".to_string());
    }

    // Dopamine agonists and MAO-B inhibitors
    if treatment.contains("prami") || treatment.contains("rasa") || treatment.contains("azil") {
        return scaled(dose_value, 100.0);
    }
    if treatment.contains("ropini") || treatment.contains("requip") {
        return scaled(dose_value, 20.0);
    }
    if treatment.contains("rotigo") || treatment.contains("neupro") {
        return scaled(dose_value, 30.3);
    }
    if treatment.contains("piri") {
        return scaled(dose_value, 1.0);
    }
    if (treatment.contains("apomorph") && treatment.contains("pen"))
        || (treatment.contains("seleg") && dose_form.contains("po"))
    {
        return scaled(dose_value, 10.0);
    }
    if (treatment.contains("apomorph") && treatment.contains("film"))
        || treatment.contains("kynmobi")
    {
        return scaled(dose_value, 1.5);
    }
    if treatment.contains("seleg") && dose_form.contains("subling") {
        return scaled(dose_value, 80.0);
    }

    // Amantadine order is important
    if treatment.contains("osmolex") {
        return scaled(dose_value, 1.0);
    }
    if treatment.contains("gocovri") || (treatment.contains("amantad") && treatment.contains(" cr"))
    {
        return scaled(dose_value, 1.25);
    }
    if treatment.contains("amantad") {
        return scaled(dose_value, 1.0);
    }

    // Various levodopas
    if treatment.contains("rytary")
        || (treatment.contains("extended") && treatment.contains("levodopa"))
        || (treatment.contains(" er") && treatment.contains("levodopa"))
        || (treatment.contains("prolonged") && treatment.contains("levodopa"))
    {
        return scaled(dose_value, 0.5);
    }
    if (treatment.contains("control") && treatment.contains("levodopa"))
        || (treatment.contains(" cr") && treatment.contains("levodopa"))
        || (treatment.contains("retard") && treatment.contains("sinemet"))
    {
        return scaled(dose_value, 0.75);
    }
    if treatment.contains("carbidopa/levodopa") {
        return scaled(dose_value, 1.0);
    }

    CellValue::Null
}

/// Clean a levodopa-equivalent medication log.
///
/// Normalizes start/stop dates, drops non-LEDD agents, and fills the `LEDD`
/// column where the extract left it empty, from strength x dose x frequency
/// and the per-drug conversion factor.
pub fn clean_ledd_meds(table: Table) -> Result<Table> {
    for column in ["LEDTRT", "LEDD", "LEDDSTRMG", "LEDDOSE", "LEDDOSFRQ", "STARTDT", "STOPDT"] {
        require(&table, column, "clean_ledd_meds")?;
    }
    let table = normalize_date_columns(table, &["STARTDT", "STOPDT"])?;

    let treatments: Vec<String> = table
        .column("LEDTRT")
        .map(|c| c.cells.iter().map(|v| v.render().to_lowercase()).collect())
        .unwrap_or_default();
    let keep: Vec<bool> = treatments.iter().map(|t| !is_non_ledd_agent(t)).collect();
    let dropped = keep.iter().filter(|k| !**k).count();
    if dropped > 0 {
        info!(table = %table.name, count = dropped, "excluded non-LEDD agents");
    }
    let table = filter_rows(table, &keep)?;

    let name = table.name.clone();
    let dose_forms: Vec<String> = match table.column("LEDDOSSTR") {
        Some(c) => c.cells.iter().map(|v| v.render().to_lowercase()).collect(),
        None => vec![String::new(); table.height()],
    };
    let mut nulls = 0usize;
    let columns: Vec<Column> = table
        .columns()
        .iter()
        .map(|column| {
            if column.name != "LEDD" {
                return column.clone();
            }
            let cells: Vec<CellValue> = column
                .cells
                .iter()
                .enumerate()
                .map(|(row, cell)| {
                    if !cell.is_empty() {
                        return cell.clone();
                    }
                    let treatment = table.cell("LEDTRT", row).render().to_lowercase();
                    let dose_value = match (
                        table.cell("LEDDSTRMG", row).as_number(),
                        table.cell("LEDDOSE", row).as_number(),
                        table.cell("LEDDOSFRQ", row).as_number(),
                    ) {
                        (Some(strength), Some(dose), Some(freq)) => Some(strength * dose * freq),
                        _ => None,
                    };
                    let computed = equivalent_dose(&treatment, &dose_forms[row], dose_value);
                    if computed.is_empty() {
                        nulls += 1;
                    }
                    computed
                })
                .collect();
            Column::new(column.name.clone(), cells)
        })
        .collect();
    if nulls > 0 {
        info!(table = %name, count = nulls, "null LEDD values remain after cleaning");
    }
    Ok(Table::from_columns(name, columns)?)
}

/// Indication code book for concomitant medications: canonical code-to-label
/// entries plus free-text-to-code mappings, loadable from JSON.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IndicationMap {
    pub indications: BTreeMap<u32, String>,
    pub text_mappings: BTreeMap<String, u32>,
}

impl Default for IndicationMap {
    fn default() -> Self {
        let indications = [
            (1, "Anxiety"),
            (2, "Atrial Fibrillation / Arrhythmias"),
            (3, "Benign Prostatic Hypertrophy / Overactive Bladder"),
            (4, "Cognitive Dysfunction"),
            (5, "Congestive Heart Failure"),
            (6, "Constipation"),
            (7, "Coronary Artery Disease, Peripheral Artery Disease, Stroke"),
            (8, "Daytime Sleepiness"),
            (9, "Delusions, Hallucination, Psychosis"),
            (10, "Depression"),
            (11, "Diabetes"),
            (12, "GERD"),
            (13, "Hyperlipidemia"),
            (14, "Hypertension"),
            (15, "Insomnia"),
            (16, "Nausea"),
            (17, "Pain"),
            (18, "REM-Behavior Disorder"),
            (19, "Restless Leg Syndrome"),
            (20, "Sexual Dysfunction"),
            (21, "Sialorrhea / Drooling"),
            (22, "Supplements / Homeopathic Medication"),
            (23, "Thyroid Disorder"),
            (24, "Vitamins / Coenzymes"),
            (25, "Other"),
        ]
        .into_iter()
        .map(|(code, label)| (code, label.to_string()))
        .collect();
        let text_mappings = [
            ("anxiety disorder", 1),
            ("panic attacks", 1),
            ("a-fib", 2),
            ("atrial flutter", 2),
            ("bph", 3),
            ("overactive bladder", 3),
            ("dementia", 4),
            ("memory", 4),
            ("heart insufficiency", 5),
            ("ibs", 6),
            ("stool softener", 6),
            ("angina", 7),
            ("heart attack", 7),
            ("tia", 7),
            ("narcolepsy", 8),
            ("somnolence", 8),
            ("antipsychotic", 9),
            ("paranoia", 9),
            ("antidepressant", 10),
            ("mood disorder", 10),
            ("diabetes mellitus", 11),
            ("dm", 11),
            ("heartburn", 12),
            ("hiatal hernia", 12),
            ("high cholesterol", 13),
            ("high blood pressure", 14),
            ("sleep disorder", 15),
            ("motion sickness", 16),
            ("headache", 17),
            ("rbd", 18),
            ("restless legs", 19),
            ("erectile dysfunction", 20),
            ("drooling", 21),
            ("fish oil", 22),
            ("hypothyroidism", 23),
            ("vitamin d deficiency", 24),
        ]
        .into_iter()
        .map(|(text, code)| (text.to_string(), code))
        .collect();
        Self {
            indications,
            text_mappings,
        }
    }
}

impl IndicationMap {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn label(&self, code: u32) -> Option<&str> {
        self.indications.get(&code).map(String::as_str)
    }

    pub fn code_for_text(&self, text: &str) -> Option<u32> {
        self.text_mappings.get(&text.trim().to_lowercase()).copied()
    }
}

/// Map a treatment with neither code nor indication text. A handful of known
/// entries carry enough signal in the treatment name; the rest go to Other.
fn code_from_treatment(treatment: &str) -> u32 {
    match treatment.trim() {
        "ASPIRIN" => 17,
        "GINKOBIL" => 22,
        "HUMULIN NPH" => 11,
        other => {
            debug!(treatment = %other, "concomitant med with only a treatment name; mapping to Other");
            25
        }
    }
}

/// Clean a concomitant-medication log into a completely coded indication
/// column.
///
/// Entries carry either a numeric `CMINDC` code or free text in
/// `CMINDC_TEXT` (a handful carry neither). Codes win; text is mapped through
/// the code book; the label column is rebuilt from the final codes.
pub fn clean_concomitant_meds(table: Table, map: &IndicationMap) -> Result<Table> {
    for column in ["CMINDC", "CMINDC_TEXT", "CMTRT", "STARTDT", "STOPDT"] {
        require(&table, column, "clean_concomitant_meds")?;
    }
    let table = normalize_date_columns(table, &["STARTDT", "STOPDT"])?;

    let missing_start = table
        .column("STARTDT")
        .map(|c| c.cells.iter().filter(|v| v.is_empty()).count())
        .unwrap_or_default();
    let missing_stop = table
        .column("STOPDT")
        .map(|c| c.cells.iter().filter(|v| v.is_empty()).count())
        .unwrap_or_default();
    // No start date: assume prior to enrollment. No stop date: assume still
    // on the medication as of the last visit.
    info!(
        table = %table.name,
        no_start = missing_start,
        no_stop = missing_stop,
        "concomitant medication entries with open date ranges"
    );

    let mut codes: Vec<CellValue> = Vec::with_capacity(table.height());
    let mut labels: Vec<CellValue> = Vec::with_capacity(table.height());
    let mut unmapped = 0usize;
    for row in 0..table.height() {
        let existing = table.cell("CMINDC", row);
        let code = match existing.as_number() {
            Some(code) => Some(code as u32),
            None => {
                let text = table.cell("CMINDC_TEXT", row);
                match text.token() {
                    None => Some(code_from_treatment(&table.cell("CMTRT", row).render())),
                    Some(text) => map.code_for_text(&text),
                }
            }
        };
        match code {
            Some(code) => {
                codes.push(CellValue::Number(f64::from(code)));
                labels.push(match map.label(code) {
                    Some(label) => CellValue::Text(label.to_string()),
                    None => CellValue::Text("UNKNOWN".to_string()),
                });
            }
            None => {
                unmapped += 1;
                codes.push(CellValue::Null);
                labels.push(CellValue::Text("UNKNOWN".to_string()));
            }
        }
    }
    if unmapped > 0 {
        warn!(table = %table.name, count = unmapped, "concomitant meds did not map to indication codes");
    }

    let name = table.name.clone();
    let columns: Vec<Column> = table
        .columns()
        .iter()
        .map(|column| match column.name.as_str() {
            "CMINDC" => Column::new("CMINDC", codes.clone()),
            "CMINDC_TEXT" => Column::new("CMINDC_TEXT", labels.clone()),
            _ => column.clone(),
        })
        .collect();
    Ok(Table::from_columns(name, columns)?)
}
