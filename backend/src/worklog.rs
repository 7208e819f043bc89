//! Work-log lifecycle: creation, owner edits while pending, and the
//! admin-only approval state machine.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};

use crate::auth::{guard, AuthUser};
use crate::error::{Error, Result};
use crate::models::{MonthlyWorkSummary, Role, WorkLogEntry, WorkLogStatus};
use crate::store::Store;

pub struct WorkLogService {
    store: Arc<Store>,
}

impl WorkLogService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Create a PENDING entry owned by the caller. One entry per date.
    pub fn create(
        &self,
        caller: &AuthUser,
        date: NaiveDate,
        hours_worked: f64,
        remarks: &str,
    ) -> Result<WorkLogEntry> {
        validate_hours(hours_worked)?;
        let entry = self
            .store
            .insert_work_log(caller.id, date, hours_worked, remarks)?;
        tracing::info!(user = %caller.username, date = %date, "work log created");
        Ok(entry)
    }

    pub fn list_for_caller(&self, caller: &AuthUser) -> Result<Vec<WorkLogEntry>> {
        self.store.list_work_logs_for_user(caller.id)
    }

    pub fn list_for_caller_between(
        &self,
        caller: &AuthUser,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WorkLogEntry>> {
        self.store.list_work_logs_between(caller.id, start, end)
    }

    /// Edit hours/remarks. Only the owner may edit, and only while the entry
    /// is still PENDING.
    pub fn update_content(
        &self,
        caller: &AuthUser,
        id: i64,
        hours_worked: f64,
        remarks: &str,
    ) -> Result<WorkLogEntry> {
        let entry = self.find(id)?;

        if entry.user_id != caller.id {
            return Err(Error::Forbidden(
                "You can only modify your own work logs".to_string(),
            ));
        }
        if entry.status != WorkLogStatus::Pending {
            return Err(Error::Forbidden(format!(
                "Cannot modify a work log in {} status",
                entry.status.as_str()
            )));
        }
        validate_hours(hours_worked)?;

        self.store
            .update_work_log_content(id, hours_worked, remarks)?;
        self.find(id)
    }

    /// Approve or reject an entry. Admin only. APPROVED and REJECTED are
    /// terminal: re-applying the same status is a no-op, anything else is
    /// rejected.
    pub fn transition_status(
        &self,
        caller: &AuthUser,
        id: i64,
        new_status: WorkLogStatus,
    ) -> Result<WorkLogEntry> {
        guard::require_role(caller, Role::Admin)?;

        if new_status == WorkLogStatus::Pending {
            return Err(Error::Validation(
                "Work logs cannot be moved back to PENDING".to_string(),
            ));
        }

        let entry = self.find(id)?;
        if entry.status.is_terminal() {
            if entry.status == new_status {
                return Ok(entry);
            }
            return Err(Error::Validation(format!(
                "Work log is already {}",
                entry.status.as_str()
            )));
        }

        self.store.update_work_log_status(id, new_status)?;
        tracing::info!(id, status = new_status.as_str(), admin = %caller.username, "work log status updated");
        self.find(id)
    }

    /// Per-month summaries of the caller's entries between two dates.
    pub fn monthly_summary(
        &self,
        caller: &AuthUser,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MonthlyWorkSummary>> {
        let entries = self.store.list_work_logs_between(caller.id, start, end)?;

        let mut by_month: BTreeMap<String, Vec<WorkLogEntry>> = BTreeMap::new();
        for entry in entries {
            let key = format!("{:04}-{:02}", entry.date.year(), entry.date.month());
            by_month.entry(key).or_default().push(entry);
        }

        Ok(by_month
            .iter()
            .map(|(month, entries)| MonthlyWorkSummary::from_entries(month, entries))
            .collect())
    }

    fn find(&self, id: i64) -> Result<WorkLogEntry> {
        self.store
            .find_work_log(id)?
            .ok_or_else(|| Error::NotFound(format!("Work log not found with id: {}", id)))
    }
}

fn validate_hours(hours: f64) -> Result<()> {
    if !hours.is_finite() || hours <= 0.0 || hours > 24.0 {
        return Err(Error::Validation(
            "Hours worked must be greater than 0 and at most 24".to_string(),
        ));
    }
    Ok(())
}
