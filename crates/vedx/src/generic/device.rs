use std::{fmt, sync::Arc};

use crate::traits::Backend;

use super::{Config, Diagnostics};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Vulkan,
    Dx12,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Vulkan => write!(f, "vulkan"),
            BackendKind::Dx12 => write!(f, "d3d12"),
        }
    }
}

struct Inner<B: Backend> {
    native: B::Device,
    config: Config,
    diagnostics: Diagnostics,
}

/// Native device together with configuration and diagnostics context.
///
/// Cheap to clone. Objects created from it may be built concurrently
/// from multiple threads.
pub struct Device<B: Backend> {
    inner: Arc<Inner<B>>,
}

impl<B: Backend> Clone for Device<B> {
    #[inline]
    fn clone(&self) -> Self {
        Device {
            inner: self.inner.clone(),
        }
    }
}

impl<B: Backend> fmt::Debug for Device<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("backend", &B::KIND)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl<B: Backend> Device<B> {
    pub fn new(native: B::Device) -> Self {
        Device::from_parts(native, Config::default(), Diagnostics::default())
    }

    pub fn from_parts(native: B::Device, config: Config, diagnostics: Diagnostics) -> Self {
        Device {
            inner: Arc::new(Inner {
                native,
                config,
                diagnostics,
            }),
        }
    }

    #[inline]
    pub fn backend(&self) -> BackendKind {
        B::KIND
    }

    #[inline]
    pub fn native(&self) -> &B::Device {
        &self.inner.native
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.inner.diagnostics
    }
}
