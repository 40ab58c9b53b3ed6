//! Agent execution plans (spec.md §3 "Plan"). ACP plans have no cancelled
//! state; an entry that is abandoned is simply omitted from the next update.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanEntryPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanEntryStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanEntry {
    pub content: String,
    #[serde(default)]
    pub priority: PlanEntryPriority,
    #[serde(default)]
    pub status: PlanEntryStatus,
}

impl PlanEntry {
    pub fn new(
        content: impl Into<String>,
        priority: PlanEntryPriority,
        status: PlanEntryStatus,
    ) -> Self {
        Self {
            content: content.into(),
            priority,
            status,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    #[serde(default)]
    pub entries: Vec<PlanEntry>,
}

impl Plan {
    pub fn new(entries: Vec<PlanEntry>) -> Self {
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_serializes_entries_in_order() {
        let plan = Plan::new(vec![
            PlanEntry::new("Read the file", PlanEntryPriority::High, PlanEntryStatus::Completed),
            PlanEntry::new("Write the fix", PlanEntryPriority::Medium, PlanEntryStatus::InProgress),
        ]);
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["entries"][0]["status"], "completed");
        assert_eq!(json["entries"][1]["priority"], "medium");
    }

    #[test]
    fn plan_entry_status_has_no_cancelled_variant() {
        let err = serde_json::from_value::<PlanEntryStatus>(serde_json::json!("cancelled"));
        assert!(err.is_err());
    }
}
