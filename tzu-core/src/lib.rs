//! ICU time zone update utility - data source library exports

pub mod sources;
