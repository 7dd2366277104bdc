//! CLI Commands

pub mod credentials;
pub mod extend;
pub mod record;
