//! # asterism
//!
//! Guide-star selection for a multi-probe **adaptive-optics wavefront-sensing**
//! instrument.
//!
//! Given a telescope pointing, a candidate star catalog and a set of allowed
//! position angles, `asterism` finds sets of natural guide stars ("asterisms")
//! that the instrument's guide probes can mechanically reach without shadowing
//! each other, and ranks them by optical quality.
//!
//! ## Features
//!
//! - **Frame transforms**: sky coordinates to east/north tangent-plane offsets and back
//! - **Patrol fields**: per-probe reachable regions, rotated with the position
//!   angle and port, intersected over science offsets and sibling dependencies
//! - **Vignetting**: directional probe-arm shadowing checks following the arm
//!   stacking order
//! - **Search**: brightest-first enumeration of star subsets and probe
//!   assignments with deterministic ranking, progress reporting and cancellation
//!
//! ## Example
//!
//! ```no_run
//! use std::ops::ControlFlow;
//! use asterism::{
//!     find_asterisms, CandidateStar, Instrument, MagnitudeBand, ObservingContext, Probe,
//!     ProgressUpdate, SearchOptions, SkyCoord, StaticCatalog,
//! };
//!
//! let base = SkyCoord::from_degrees(83.82, -5.39);
//! let ctx = ObservingContext::new(base, Instrument::Imager);
//! let catalog = StaticCatalog::from_csv("data/field.csv").unwrap();
//!
//! // Brighter R magnitude, better star
//! let quality = |star: &CandidateStar, _probe: Probe| {
//!     star.magnitude(MagnitudeBand::R).map_or(0.0, |m| 20.0 - m)
//! };
//! let mut progress = |u: &ProgressUpdate| -> ControlFlow<()> {
//!     println!("{}/{} combinations", u.count, u.total);
//!     ControlFlow::Continue(())
//! };
//!
//! let outcome = find_asterisms(&ctx, &catalog, &SearchOptions::default(), &quality, &mut progress)
//!     .unwrap();
//! let best = outcome.best().unwrap();
//! println!("Best at PA {} with score {:.2}", best.position_angle(), best.score());
//! for a in best.assignments() {
//!     println!("  {} -> {} ({})", a.probe, a.star.name, a.role);
//! }
//! ```
//!
//! ## Coordinate conventions
//!
//! All focal-plane geometry is in arcseconds of offset from the base position,
//! `p` east and `q` north. The instrument frame is rotated from the sky by the
//! position angle plus the port rotation; instrument-frame shapes are brought to
//! the sky by rotating them by the negative of that total.

pub mod angle;
pub mod catalogs;
pub mod config;
pub mod context;
pub mod coords;
pub mod geometry;
pub mod patrol;
pub mod probe;
pub mod rules;
pub mod search;
pub mod star;
pub mod validation;
pub mod vignetting;

pub use angle::{Angle, AngleUnit, Offset};
pub use catalogs::{Catalog, CatalogError, StaticCatalog};
pub use config::{Port, PortRotations};
pub use context::ObservingContext;
pub use coords::{coordinate_diff, SkyCoord};
pub use geometry::{PatrolField, Region};
pub use patrol::{arm_origin, patrol_field};
pub use probe::{Footprint, Instrument, Probe, ProbeDescriptor, ProbeGroup, ProbeTable};
pub use rules::{check_composition, CompositionProblem, Severity};
pub use search::{
    find_asterisms, Asterism, Assignment, CommitTarget, GuideStarRole, IgnoreProgress, NirBand,
    ProgressUpdate, SearchError, SearchOptions, SearchOutcome, SearchProgress, SearchStats,
    Selection, StarQuality, TipTiltMode,
};
pub use star::*;
pub use validation::{probes_in_range, validate_assignment, validate_guide_star, Validation};
pub use vignetting::{validate_vignetting, vignetting};

// Commonly used types
// Focal-plane math is done in f64 arcseconds
pub type Vector2 = nalgebra::Vector2<f64>;
