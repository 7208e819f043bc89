pub mod payroll;
pub mod user;
pub mod work_log;

pub use payroll::{Deductions, Earnings, PayrollRecord, PayrollSummary};
pub use user::{Role, User, UserProfile};
pub use work_log::{MonthlyWorkSummary, WorkLogEntry, WorkLogStatus};
