//! Pipeline layout and resource binding model shared by Vulkan and DirectX 12.
//!
//! Logical objects live in [`generic`] and are parameterized by a [`Backend`].
//! Each backend only translates the validated logical model into native objects.
#![deny(unsafe_op_in_unsafe_fn)]

pub mod dx12;
pub mod generic;
mod traits;
pub mod vulkan;

pub use self::{generic::*, traits::Backend};
