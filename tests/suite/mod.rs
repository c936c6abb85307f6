//! Integration test modules

mod config;
mod persistence;
mod ritual_flow;
