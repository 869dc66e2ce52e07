#![deny(warnings)]

pub mod chart;
pub mod config;
pub mod stats;

type Result<T> = anyhow::Result<T>;
