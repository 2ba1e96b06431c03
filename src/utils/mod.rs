pub mod jwt;
pub mod password;
pub mod sigv4;
pub mod identifiers;
pub mod status;
pub mod format;
pub mod validation;
pub mod query;
pub mod time;
