pub mod identity;
pub mod ports;
pub mod resellers;
