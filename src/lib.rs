pub mod config;
pub mod db;
pub mod device;
pub mod error;
pub mod models;
pub mod plan;
pub mod routes;
pub mod services;
pub mod state;
