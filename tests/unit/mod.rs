//! Unit tests for individual components

mod audit_test;
mod config_test;
mod builders_test;
mod runtime_test;
mod graph_test;
