pub mod agenda;
pub mod config;
pub mod dependents;
pub mod describe;
pub mod detach;
pub mod encode;
pub mod occurrences;
