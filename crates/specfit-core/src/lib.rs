//! Core of the `specfit-rs` spectral curve-fitting toolkit.
//!
//! The crate implements the preprocessing → fitting → postprocessing
//! pipeline over column-oriented spectral tables: deterministic data
//! transforms, interpretation of an external nonlinear least-squares outcome
//! (error bars, correlations, global-fit residual reshaping), a structured
//! fit report, and persistence of the accumulated run summary.
//!
//! The nonlinear solver itself is an external collaborator behind the
//! [`fitting::Minimizer`] trait; the pipeline consumes its [`fitting::FitOutcome`]
//! contract and never optimizes anything itself.

pub mod domain;
pub mod fitting;
pub mod numerics;
pub mod pipeline;
pub mod statistics;
pub mod table;
