//! Arbor - model tree and function composition engine for time-stepped
//! scientific simulations

pub mod core;
pub mod datastore;
pub mod functions;
pub mod lifecycle;
pub mod links;
pub mod loader;
pub mod models;
pub mod runner;
pub mod tree;
