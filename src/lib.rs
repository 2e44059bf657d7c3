pub mod catalog;
pub mod config;
pub mod data;
pub mod demo;
pub mod errors;
pub mod handlers;
pub mod jobs;
pub mod ml;
pub mod models;
pub mod store;
