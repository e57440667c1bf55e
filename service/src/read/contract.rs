//! [`Contract`] read model definition.

#[cfg(doc)]
use crate::domain::Contract;

/// Wrapper around a [`Contract`] indicating that it [`is_active()`].
///
/// [`is_active()`]: Contract::is_active
#[derive(Clone, Copy, Debug)]
pub struct Active<T>(pub T);
