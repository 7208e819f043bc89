pub mod auth;
pub mod health;
pub mod payroll;
pub mod users;
pub mod work_logs;
