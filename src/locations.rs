pub mod error;
pub mod port_catalog;
pub mod resolver;
pub mod seed;
