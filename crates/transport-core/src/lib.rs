//! Core-profile state reconciliation around the implicit transport solve.
//!
//! Boundary conditions for t + dt, merging of solved fields, prescribed
//! profiles, and finalization of flux-derived quantities.

pub mod boundary;
pub mod charge_states;
pub mod formulas;
pub mod getters;
pub mod initialization;
pub mod psi_calculations;
pub mod sources;
pub mod step;
pub mod updaters;
