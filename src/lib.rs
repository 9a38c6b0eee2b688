pub mod config;
pub mod explore;
pub mod net;
pub mod options;
