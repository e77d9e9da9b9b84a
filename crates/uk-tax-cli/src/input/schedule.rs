use std::fs;

use uk_tax_core::schedule::ScheduleParams;
use uk_tax_core::{TaxYear, TaxYearSchedule};

use super::file;

/// Pick the schedule for this run.
///
/// `--schedule <file>` (JSON or YAML) wins over `--tax-year`; with neither
/// the current preset is used. Either way the schedule is validated here,
/// before any command runs.
pub fn resolve_schedule(
    tax_year: Option<&str>,
    path: Option<&str>,
) -> Result<TaxYearSchedule, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return load_schedule_file(path);
    }
    match tax_year {
        Some(label) => {
            let year: TaxYear = label.parse()?;
            Ok(TaxYearSchedule::for_tax_year(year)?)
        }
        None => Ok(TaxYearSchedule::default()),
    }
}

fn load_schedule_file(path: &str) -> Result<TaxYearSchedule, Box<dyn std::error::Error>> {
    let resolved = file::resolve_path(path)?;
    let p = resolved.as_path();
    let contents = fs::read_to_string(p)
        .map_err(|e| format!("Failed to read schedule '{}': {}", p.display(), e))?;

    let params: ScheduleParams = if file::is_yaml(p) {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse schedule '{}': {}", p.display(), e))?
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse schedule '{}': {}", p.display(), e))?
    };
    tracing::debug!(tax_year = %params.tax_year, path = %p.display(), "loaded schedule file");
    Ok(TaxYearSchedule::new(params)?)
}
