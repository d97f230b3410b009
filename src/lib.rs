pub mod ai;
pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod health;
pub mod meals;
pub mod pages;
pub mod recommendations;
pub mod state;

#[cfg(test)]
mod testing;
