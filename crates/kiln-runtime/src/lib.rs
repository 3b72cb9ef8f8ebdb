#![forbid(unsafe_code)]

//! Runtime: the host seam, the update-protocol driver, and the two entry
//! points a host adapter wires into its component lifecycle.
//!
//! A host adapter implements [`Host`] for its live component instance and
//! calls [`ComponentSpec::render`] and [`ComponentSpec::dispatch`] from its
//! render and event hooks. Everything between those calls, such as running
//! a handler's co-transformer against the live state one update at a time,
//! happens here.

pub mod component;
pub mod driver;
pub mod error;
pub mod host;

pub use component::{
    ComponentConfig, ComponentSpec, DispatchOutcome, create_component_spec,
    create_component_spec_with,
};
pub use driver::{DriveReport, DriverConfig, drive};
pub use error::{HostError, Result};
pub use host::{Host, StateHost};
