mod grid_impl;

pub use grid_impl::{CoordType, DynamicGrid};
