//! Umbrella crate for the mgread readers. Each reader lives in its own crate
//! and is switched on with the feature of the same name.

#[cfg(feature = "core")]
#[doc(inline)]
pub use mgread_core as core;

#[cfg(feature = "coords")]
#[doc(inline)]
pub use mgread_coords as coords;

#[cfg(feature = "tracks")]
#[doc(inline)]
pub use mgread_tracks as tracks;
