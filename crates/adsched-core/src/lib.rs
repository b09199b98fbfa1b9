pub mod config;
pub mod logging;

pub mod admission;
pub mod clock;
pub mod forecast;
pub mod lifecycle;
pub mod observer;
pub mod samples;
pub mod scheduler;
pub mod service;
