pub mod aggregate;
pub mod cache;
pub mod config;
pub mod errors;
pub mod geocode;
pub mod geodata;
pub mod landregistry;
pub mod net;
pub mod postcode;
pub mod query;
pub mod report;
