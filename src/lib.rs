//! Employee records and the leave-approval workflow of an HR service,
//! backed by a relational store and a read-through cache.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod model;
pub mod routes;
pub mod service;
pub mod store;
pub mod telemetry;
