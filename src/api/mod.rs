pub mod attendance;
pub mod employee;
pub mod nfc;
pub mod scan;
pub mod ws;
