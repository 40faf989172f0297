pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod pieces;
pub mod shares;
pub mod state;
