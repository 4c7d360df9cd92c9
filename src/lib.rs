#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classification;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod export;
pub mod observability;
pub mod pipeline;
pub mod summary;
