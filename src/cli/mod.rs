pub mod app;
mod cache;
mod commands;
mod config;
mod context;
mod demo;
mod dispatch;
mod env;
mod run;
mod runtime;
mod session;
