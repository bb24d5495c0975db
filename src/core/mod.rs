pub mod data_structures;

pub use data_structures::*;
