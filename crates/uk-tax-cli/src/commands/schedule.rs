use serde_json::{json, Value};

use uk_tax_core::TaxYearSchedule;

/// The schedule this run would compute with, after `--tax-year` and
/// `--schedule` have been applied.
pub fn run_schedule(schedule: &TaxYearSchedule) -> Result<Value, Box<dyn std::error::Error>> {
    Ok(json!({
        "result": schedule,
        "warnings": if schedule.marginal_relief_is_continuous() {
            Vec::<String>::new()
        } else {
            vec![format!(
                "Marginal relief fraction for {} does not meet the main rate at the upper limit.",
                schedule.label()
            )]
        },
        "methodology": format!("UK tax schedule {}", schedule.label()),
    }))
}
