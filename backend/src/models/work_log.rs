use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Number of hours per day paid at the regular rate; anything beyond is
/// overtime. Domain constant, not configurable per user.
pub const REGULAR_HOURS_CAP: f64 = 8.0;

/// Approval state of a single work-log entry.
///
/// PENDING is the only initial state. APPROVED and REJECTED are terminal;
/// there is no transition out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkLogStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "APPROVED")]
    Approved,
    #[serde(rename = "REJECTED")]
    Rejected,
}

impl WorkLogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkLogStatus::Pending => "PENDING",
            WorkLogStatus::Approved => "APPROVED",
            WorkLogStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<WorkLogStatus> {
        match s {
            "PENDING" => Some(WorkLogStatus::Pending),
            "APPROVED" => Some(WorkLogStatus::Approved),
            "REJECTED" => Some(WorkLogStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkLogStatus::Pending)
    }
}

/// One day of logged work for one user. At most one entry per (user, date).
#[derive(Debug, Clone)]
pub struct WorkLogEntry {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub hours_worked: f64,
    pub remarks: String,
    pub status: WorkLogStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkLogEntry {
    /// Hours paid at the regular rate: the portion up to the daily cap.
    pub fn regular_hours(&self) -> f64 {
        self.hours_worked.min(REGULAR_HOURS_CAP)
    }

    /// Hours beyond the daily cap, paid at the overtime rate.
    pub fn overtime_hours(&self) -> f64 {
        (self.hours_worked - REGULAR_HOURS_CAP).max(0.0)
    }
}

/// Aggregated view of a user's work logs for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyWorkSummary {
    /// Month in "YYYY-MM" form.
    pub year_month: String,
    pub total_hours_worked: f64,
    pub approved_hours: f64,
    pub pending_hours: f64,
    pub overtime_hours: f64,
    pub average_hours_per_day: f64,
    pub work_days_count: usize,
    pub total_work_logs: usize,
    pub approved_work_logs: usize,
    pub pending_work_logs: usize,
}

impl MonthlyWorkSummary {
    /// Build a summary from the entries of a single month. An empty slice
    /// yields an all-zero summary.
    pub fn from_entries(year_month: &str, entries: &[WorkLogEntry]) -> Self {
        let total_hours_worked: f64 = entries.iter().map(|e| e.hours_worked).sum();
        let approved_hours: f64 = entries
            .iter()
            .filter(|e| e.status == WorkLogStatus::Approved)
            .map(|e| e.hours_worked)
            .sum();
        let pending_hours: f64 = entries
            .iter()
            .filter(|e| e.status == WorkLogStatus::Pending)
            .map(|e| e.hours_worked)
            .sum();
        let overtime_hours: f64 = entries.iter().map(|e| e.overtime_hours()).sum();

        let work_days_count = entries.len();
        let average_hours_per_day = if work_days_count == 0 {
            0.0
        } else {
            total_hours_worked / work_days_count as f64
        };

        MonthlyWorkSummary {
            year_month: year_month.to_string(),
            total_hours_worked,
            approved_hours,
            pending_hours,
            overtime_hours,
            average_hours_per_day,
            work_days_count,
            total_work_logs: entries.len(),
            approved_work_logs: entries
                .iter()
                .filter(|e| e.status == WorkLogStatus::Approved)
                .count(),
            pending_work_logs: entries
                .iter()
                .filter(|e| e.status == WorkLogStatus::Pending)
                .count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn entry(date: NaiveDate, hours: f64, status: WorkLogStatus) -> WorkLogEntry {
        WorkLogEntry {
            id: 0,
            user_id: 1,
            date,
            hours_worked: hours,
            remarks: String::new(),
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[rstest]
    #[case(0.5, 0.5, 0.0)]
    #[case(4.0, 4.0, 0.0)]
    #[case(8.0, 8.0, 0.0)]
    #[case(8.5, 8.0, 0.5)]
    #[case(10.0, 8.0, 2.0)]
    #[case(24.0, 8.0, 16.0)]
    fn splits_hours_at_the_eight_hour_cap(
        #[case] worked: f64,
        #[case] regular: f64,
        #[case] overtime: f64,
    ) {
        let date = NaiveDate::from_ymd_opt(2023, 12, 1).unwrap();
        let e = entry(date, worked, WorkLogStatus::Pending);
        assert!((e.regular_hours() - regular).abs() < 0.01);
        assert!((e.overtime_hours() - overtime).abs() < 0.01);
    }

    #[test]
    fn monthly_summary_aggregates_by_status() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 1).unwrap();
        let entries = vec![
            entry(date, 8.0, WorkLogStatus::Approved),
            entry(date.succ_opt().unwrap(), 9.0, WorkLogStatus::Approved),
            entry(date + chrono::Days::new(2), 7.5, WorkLogStatus::Pending),
        ];

        let summary = MonthlyWorkSummary::from_entries("2023-12", &entries);
        assert!((summary.total_hours_worked - 24.5).abs() < 0.01);
        assert!((summary.approved_hours - 17.0).abs() < 0.01);
        assert!((summary.pending_hours - 7.5).abs() < 0.01);
        assert!((summary.average_hours_per_day - 8.17).abs() < 0.01);
        assert_eq!(summary.work_days_count, 3);
        assert_eq!(summary.total_work_logs, 3);
        assert_eq!(summary.approved_work_logs, 2);
        assert_eq!(summary.pending_work_logs, 1);
    }

    #[test]
    fn monthly_summary_counts_overtime() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 1).unwrap();
        let entries = vec![entry(date, 10.0, WorkLogStatus::Approved)];
        let summary = MonthlyWorkSummary::from_entries("2023-12", &entries);
        assert!((summary.overtime_hours - 2.0).abs() < 0.01);
    }

    #[test]
    fn monthly_summary_of_nothing_is_zero() {
        let summary = MonthlyWorkSummary::from_entries("2023-12", &[]);
        assert_eq!(summary.total_hours_worked, 0.0);
        assert_eq!(summary.average_hours_per_day, 0.0);
        assert_eq!(summary.work_days_count, 0);
    }

    #[test]
    fn terminal_states() {
        assert!(!WorkLogStatus::Pending.is_terminal());
        assert!(WorkLogStatus::Approved.is_terminal());
        assert!(WorkLogStatus::Rejected.is_terminal());
    }
}
