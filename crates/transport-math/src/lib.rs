//! 1-D radial numerics for the core-profile transport engine.

pub mod integrate;
pub mod interp;
