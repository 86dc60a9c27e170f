//! Storefront-side models.
//!
//! Domain types live in `wallposter-core`; this module only holds what is
//! tied to the web layer, such as the session-backed cart.

pub mod session;
