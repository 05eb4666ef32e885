use std::{
    ffi::{CStr, CString},
    fmt, io,
    sync::Arc,
};

use ash::vk;

use crate::generic::{Error, ShaderModuleDesc};

use super::{native_error, VulkanDevice};

pub struct ShaderModule<D: VulkanDevice> {
    handle: vk::ShaderModule,
    entry: CString,
    owner: Arc<D>,
}

impl<D: VulkanDevice> fmt::Debug for ShaderModule<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderModule")
            .field("handle", &self.handle)
            .field("entry", &self.entry)
            .finish()
    }
}

impl<D: VulkanDevice> Drop for ShaderModule<D> {
    fn drop(&mut self) {
        unsafe { self.owner.destroy_shader_module(self.handle) }
    }
}

impl<D: VulkanDevice> ShaderModule<D> {
    #[inline]
    pub fn handle(&self) -> vk::ShaderModule {
        self.handle
    }

    #[inline]
    pub fn entry(&self) -> &CStr {
        &self.entry
    }
}

pub(super) fn create_shader_module<D: VulkanDevice>(
    owner: &Arc<D>,
    desc: &ShaderModuleDesc<'_>,
) -> Result<ShaderModule<D>, Error> {
    let entry = CString::new(desc.entry).map_err(|_| {
        Error::invalid(
            "entry_point",
            format!("entry point of `{}` contains a nul byte", desc.name),
        )
    })?;

    let words = ash::util::read_spv(&mut io::Cursor::new(desc.code)).map_err(|err| {
        Error::invalid(
            "bytecode",
            format!("`{}` is not a valid SPIR-V module: {err}", desc.name),
        )
    })?;

    let info = vk::ShaderModuleCreateInfo::default().code(&words);
    let handle = unsafe { owner.create_shader_module(&info) }
        .map_err(|err| native_error(err, "shader module"))?;

    Ok(ShaderModule {
        handle,
        entry,
        owner: owner.clone(),
    })
}
