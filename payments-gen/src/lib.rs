#![deny(rust_2018_idioms)]
#![deny(clippy::correctness)]
#![deny(clippy::perf)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod distribution;
pub mod error;
pub mod generator;
pub mod record;
pub mod reference;
pub mod sampler;
pub mod writer;
