//! Plan file for the reconciler.

use crate::error::Result;
use crate::plan::Plan;
use chrono::{DateTime, Utc};

/// `topology_plan_<YYYY-MM-DD>.json` for the day the plan was generated.
pub fn default_plan_file(generated_at: DateTime<Utc>) -> String {
    format!("topology_plan_{}.json", generated_at.format("%Y-%m-%d"))
}

/// Write `plan` as pretty JSON, returning the path written.
pub fn write_plan(plan: &Plan, plan_file: Option<&str>) -> Result<String> {
    let plan_file = match plan_file {
        Some(file) => file.to_string(),
        None => default_plan_file(plan.generated_at),
    };
    log::warn!("Writing plan to file: {plan_file}");
    std::fs::write(&plan_file, plan.to_json()?)?;
    Ok(plan_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_plan_file() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 0).unwrap();
        assert_eq!(default_plan_file(at), "topology_plan_2024-03-09.json");
    }

    #[test]
    fn test_write_plan() {
        let plan = Plan {
            generated_at: Utc::now(),
            operations: vec![],
            warnings: vec![],
        };
        let path = std::env::temp_dir().join("vpc_service_topology_write_plan_test.json");
        let path = path.to_string_lossy().to_string();
        assert_eq!(write_plan(&plan, Some(&path)).unwrap(), path);
        let back: Plan = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, plan);
        std::fs::remove_file(&path).unwrap();
    }
}
