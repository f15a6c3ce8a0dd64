//! GasControl library
//!
//! Core of the gas meter readings console: consumption validation, CSV
//! export, the REST client with its mock backend, the session store and
//! the command handlers the binaries are built on.

pub mod api;
pub mod commands;
pub mod core;
pub mod db;
pub mod export;
pub mod format;
pub mod i18n;
pub mod services;
pub mod session;
pub mod validation;
