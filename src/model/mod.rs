pub mod attendance;
pub mod employee;
pub mod scan_log;

pub use attendance::AttendanceSession;
pub use employee::Employee;
pub use scan_log::{ScanAction, ScanLogEntry};
