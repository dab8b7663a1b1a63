//! Scheduled-visit timing.

/// Months into the study for a scheduled visit code.
///
/// The screening visit can occur any time up to 3 months prior to baseline.
/// Unscheduled and telephone visits have no fixed offset and return `None`.
pub fn visit_month(event_id: &str) -> Option<f64> {
    let months = match event_id.trim() {
        "SC" => -3.0,
        "BL" => 0.0,
        "V01" => 3.0,
        "V02" => 6.0,
        "R01" => 6.0,
        "V03" => 9.0,
        "V04" => 12.0,
        "V05" => 18.0,
        "R04" => 18.0,
        "V06" => 24.0,
        "R06" => 30.0,
        "V07" => 30.0,
        "V08" => 36.0,
        "R08" => 42.0,
        "V09" => 42.0,
        "V10" => 48.0,
        "R10" => 54.0,
        "V11" => 54.0,
        "V12" => 60.0,
        "R12" => 66.0,
        "V13" => 72.0,
        "R13" => 78.0,
        "V14" => 84.0,
        "R14" => 90.0,
        "V15" => 96.0,
        "R15" => 102.0,
        "V16" => 108.0,
        "R16" => 114.0,
        "V17" => 120.0,
        "R17" => 126.0,
        "V18" => 132.0,
        "R18" => 138.0,
        "V19" => 144.0,
        "R19" => 150.0,
        "V20" => 156.0,
        "R20" => 162.0,
        "V21" => 168.0,
        _ => return None,
    };
    Some(months)
}
