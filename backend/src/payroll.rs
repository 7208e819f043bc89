//! Payroll computation over approved work hours.
//!
//! Records are derived on demand from the current work-log state and never
//! cached. Overtime is paid at 1.5x beyond 8 hours/day; both are domain
//! constants.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::auth::{guard, AuthUser};
use crate::error::{Error, Result};
use crate::models::{Deductions, Earnings, PayrollRecord, PayrollSummary, Role, User};
use crate::store::Store;

/// Overtime pay multiplier. Fixed, not per-user.
pub const OVERTIME_MULTIPLIER: f64 = 1.5;

/// A calendar month, parsed from "YYYY-MM" query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn first_day(&self) -> NaiveDate {
        // Month is validated at parse time.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("valid period")
    }

    pub fn last_day(&self) -> NaiveDate {
        let next = self.next();
        next.first_day().pred_opt().expect("valid period")
    }

    pub fn next(&self) -> Period {
        if self.month == 12 {
            Period {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Period {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Validation(format!("Invalid yearMonth: {}", s));
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(invalid());
        }
        Ok(Period { year, month })
    }
}

/// How deductions are derived from gross pay. The tax table itself lives
/// outside this core; [`FlatRateDeductions`] is the default slot filler.
pub trait DeductionPolicy: Send + Sync {
    fn deductions(&self, gross_pay: f64) -> Deductions;
}

/// Flat percentage deductions: 20% tax, 5% insurance, 5% pension.
pub struct FlatRateDeductions {
    pub tax_rate: f64,
    pub insurance_rate: f64,
    pub pension_rate: f64,
}

impl Default for FlatRateDeductions {
    fn default() -> Self {
        Self {
            tax_rate: 0.20,
            insurance_rate: 0.05,
            pension_rate: 0.05,
        }
    }
}

impl DeductionPolicy for FlatRateDeductions {
    fn deductions(&self, gross_pay: f64) -> Deductions {
        let tax = round2(gross_pay * self.tax_rate);
        let insurance = round2(gross_pay * self.insurance_rate);
        let pension = round2(gross_pay * self.pension_rate);
        Deductions {
            tax,
            insurance,
            pension,
            total: round2(tax + insurance + pension),
        }
    }
}

pub struct PayrollEngine {
    store: Arc<Store>,
    deduction_policy: Box<dyn DeductionPolicy>,
}

impl PayrollEngine {
    pub fn new(store: Arc<Store>) -> Self {
        Self::with_policy(store, Box::new(FlatRateDeductions::default()))
    }

    pub fn with_policy(store: Arc<Store>, deduction_policy: Box<dyn DeductionPolicy>) -> Self {
        Self {
            store,
            deduction_policy,
        }
    }

    /// Compute one user's payroll for a month. Callable by that user or an
    /// admin; anyone else gets a payroll processing failure.
    pub fn calculate_for_user(
        &self,
        caller: &AuthUser,
        user_id: i64,
        period: Period,
    ) -> Result<PayrollRecord> {
        guard::require_owner_or_admin(caller, user_id).map_err(|_| {
            Error::PayrollProcessing("You are not authorized to access this payroll".to_string())
        })?;

        let user = self
            .store
            .find_user_by_id(user_id)?
            .ok_or_else(|| Error::NotFound(format!("User not found with id: {}", user_id)))?;

        self.compute_record(&user, period)
    }

    /// Payroll records for every user. Admin only; the per-user ownership
    /// check is skipped because the caller is already confirmed admin.
    pub fn generate_report(&self, caller: &AuthUser, period: Period) -> Result<Vec<PayrollRecord>> {
        guard::require_role(caller, Role::Admin).map_err(|_| {
            Error::PayrollProcessing(
                "Only administrators can generate payroll reports".to_string(),
            )
        })?;

        self.store
            .list_users()?
            .iter()
            .map(|user| self.compute_record(user, period))
            .collect()
    }

    /// Aggregate payroll across an inclusive month range. Admin only.
    pub fn summarize(
        &self,
        caller: &AuthUser,
        start: Period,
        end: Period,
    ) -> Result<PayrollSummary> {
        guard::require_role(caller, Role::Admin).map_err(|_| {
            Error::PayrollProcessing(
                "Only administrators can view the payroll summary".to_string(),
            )
        })?;

        if end < start {
            return Err(Error::Validation(format!(
                "endMonth {} precedes startMonth {}",
                end, start
            )));
        }

        let users = self.store.list_users()?;
        let mut total_payroll = 0.0;
        let mut department_totals: BTreeMap<String, f64> = BTreeMap::new();
        let mut months = 0usize;

        let mut period = start;
        loop {
            months += 1;
            for user in &users {
                let record = self.compute_record(user, period)?;
                total_payroll += record.earnings.gross_pay;
                *department_totals.entry(user.department.clone()).or_insert(0.0) +=
                    record.earnings.gross_pay;
            }
            if period == end {
                break;
            }
            period = period.next();
        }

        for total in department_totals.values_mut() {
            *total = round2(*total);
        }

        Ok(PayrollSummary {
            start_month: start.to_string(),
            end_month: end.to_string(),
            total_payroll: round2(total_payroll),
            total_employees: users.len(),
            average_monthly_payroll: round2(total_payroll / months as f64),
            department_totals,
        })
    }

    fn compute_record(&self, user: &User, period: Period) -> Result<PayrollRecord> {
        if !user.hourly_rate.is_finite() || user.hourly_rate < 0.0 {
            // Never substitute a default rate.
            return Err(Error::PayrollProcessing(format!(
                "Invalid hourly rate for user {}",
                user.username
            )));
        }

        let entries =
            self.store
                .list_work_logs_between(user.id, period.first_day(), period.last_day())?;

        let total_hours: f64 = entries.iter().map(|e| e.hours_worked).sum();
        let regular_hours: f64 = entries.iter().map(|e| e.regular_hours()).sum();
        let overtime_hours: f64 = entries.iter().map(|e| e.overtime_hours()).sum();

        let regular_pay = round2(regular_hours * user.hourly_rate);
        let overtime_pay = round2(overtime_hours * user.hourly_rate * OVERTIME_MULTIPLIER);
        let gross_pay = round2(regular_pay + overtime_pay);

        let deductions = self.deduction_policy.deductions(gross_pay);
        let net_pay = round2(gross_pay - deductions.total);

        Ok(PayrollRecord {
            employee_id: user.id,
            employee_name: user.full_name(),
            period: period.to_string(),
            total_hours,
            regular_hours,
            overtime_hours,
            earnings: Earnings {
                regular_pay,
                overtime_pay,
                gross_pay,
            },
            deductions,
            net_pay,
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
