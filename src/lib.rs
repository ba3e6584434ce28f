//! Cardioid - modular multiplication drawn as a functional graph.
//!
//! Every residue of `mod` sits on a circle and points at its image under
//! `x -> x * mult mod mod`. The familiar cardioid, nephroid and rose curves
//! emerge as the envelope of those chords.

pub mod config;
pub mod error;
pub mod generators;
pub mod orbit;
pub mod server;

pub use config::CardioidConfig;
pub use error::CardioidError;
pub use generators::{Canvas, Format, Generator};
pub use orbit::{generate, Diagram, EdgeColors, FunctionalGraph};
