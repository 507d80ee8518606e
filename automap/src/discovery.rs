//! Module auto-discovery via `inventory`.
//!
//! `#[expose(discover)]` on an `impl` block emits an `inventory::submit!`
//! that registers a [`ModuleDescriptor`] at link time. Calling
//! [`Mapper::discover()`](crate::mapper::Mapper::discover) builds every
//! registered object and maps it.

use std::sync::Arc;

use crate::reflect::Exposable;

/// A type registered for discovery, collected at link time.
pub struct ModuleDescriptor {
    /// Name the object reports through [`Exposable::name`].
    pub name: &'static str,
    /// Builds a fresh instance (the type's `Default`).
    pub build: fn() -> Arc<dyn Exposable>,
}

inventory::collect!(ModuleDescriptor);

/// All registered descriptors, sorted by name.
pub fn descriptors() -> Vec<&'static ModuleDescriptor> {
    let mut descriptors: Vec<_> = inventory::iter::<ModuleDescriptor>.into_iter().collect();
    descriptors.sort_by_key(|d| d.name);
    descriptors
}
