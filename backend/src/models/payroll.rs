use std::collections::BTreeMap;

use serde::Serialize;

/// Pay before deductions, split by rate class.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Earnings {
    pub regular_pay: f64,
    pub overtime_pay: f64,
    pub gross_pay: f64,
}

/// Amounts withheld from gross pay. The breakdown comes from whatever
/// `DeductionPolicy` is plugged into the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deductions {
    pub tax: f64,
    pub insurance: f64,
    pub pension: f64,
    pub total: f64,
}

/// One employee's pay for one calendar month. Derived on demand from the
/// current work-log state, never persisted or cached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollRecord {
    pub employee_id: i64,
    pub employee_name: String,
    /// Month in "YYYY-MM" form.
    pub period: String,
    pub total_hours: f64,
    pub regular_hours: f64,
    pub overtime_hours: f64,
    pub earnings: Earnings,
    pub deductions: Deductions,
    pub net_pay: f64,
}

/// Aggregate payroll over an inclusive month range.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollSummary {
    pub start_month: String,
    pub end_month: String,
    pub total_payroll: f64,
    pub total_employees: usize,
    pub average_monthly_payroll: f64,
    /// Gross payroll per department. BTreeMap keeps the output ordering
    /// stable.
    pub department_totals: BTreeMap<String, f64>,
}
