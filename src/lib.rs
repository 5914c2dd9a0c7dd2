pub mod angles;
pub mod error;
pub mod feature_config;
pub mod features;
pub mod geometry_utils;
pub mod histogram;
pub mod table;
pub mod table_io;

pub type Point2D = (f64, f64);
