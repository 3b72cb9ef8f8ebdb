#![forbid(unsafe_code)]

//! Kiln public facade crate.
//!
//! Specs and combinators live in [`core`](prelude::core); the host-facing
//! driver lives in `runtime` and the in-memory test host in `harness`.

pub mod prelude {
    pub use kiln_core as core;
    #[cfg(feature = "harness")]
    pub use kiln_harness as harness;
    #[cfg(feature = "runtime")]
    pub use kiln_runtime as runtime;

    pub use kiln_core::optics::{first, lens, prism, second, some};
    pub use kiln_core::{CoTransformer, Dispatch, EventHandler, Identity, Lens, Prism, Spec};
    #[cfg(feature = "runtime")]
    pub use kiln_runtime::{
        ComponentSpec, DispatchOutcome, Host, HostError, StateHost, create_component_spec,
    };
}
