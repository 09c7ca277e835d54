//! Hardware drivers.

pub mod argon_one;
