//! Physical-units repair stage.
//!
//! Consumes the dependency graph plus an external units-inference report
//! (a JSON oracle) and proposes local rewrites for statements whose
//! operands carry inconsistent physical units. The dump is never mutated;
//! fixes are emitted as rewrite proposals.

pub mod algebra;
pub mod repair;
pub mod report;

pub use algebra::UnitMap;
pub use repair::{
    connected_error_groups, fix_addition_subtraction, locate_error, CandidateFix, ErrorSite,
};
pub use report::{PhysVar, UnitCatalog, UnitError, UnitsReport};
