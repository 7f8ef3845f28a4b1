pub mod date;
pub mod jwt;
