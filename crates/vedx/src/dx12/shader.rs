use crate::generic::{Error, ShaderModuleDesc};

const CONTAINER_MAGIC: &[u8; 4] = b"DXBC";
const HEADER_SIZE: usize = 32;

/// Intermediate language stored in a shader container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderLanguage {
    /// Shader model 5.1 and below.
    Dxbc,

    /// Shader model 6.0 and above.
    Dxil,
}

/// Validated shader container. Bytecode stays with the logical module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderModule {
    language: ShaderLanguage,
}

impl ShaderModule {
    #[inline]
    pub fn language(&self) -> ShaderLanguage {
        self.language
    }
}

fn read_u32(code: &[u8], offset: usize) -> Option<u32> {
    let bytes = code.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Fourcc codes of every part in the container, `None` if container is malformed.
fn container_parts(code: &[u8]) -> Option<Vec<[u8; 4]>> {
    if code.len() < HEADER_SIZE || &code[..4] != CONTAINER_MAGIC {
        return None;
    }

    let total_size = read_u32(code, 24)? as usize;
    if total_size > code.len() {
        return None;
    }

    let part_count = read_u32(code, 28)? as usize;
    let mut parts = Vec::with_capacity(part_count.min(16));

    for idx in 0..part_count {
        let offset = read_u32(code, HEADER_SIZE + idx * 4)? as usize;
        let fourcc = code.get(offset..offset.checked_add(4)?)?;
        parts.push([fourcc[0], fourcc[1], fourcc[2], fourcc[3]]);
    }

    Some(parts)
}

pub(super) fn create_shader_module(desc: &ShaderModuleDesc<'_>) -> Result<ShaderModule, Error> {
    let Some(parts) = container_parts(desc.code) else {
        return Err(Error::invalid(
            "bytecode",
            format!("`{}` is not a valid DXBC container", desc.name),
        ));
    };

    let language = if parts.iter().any(|part| part == b"DXIL") {
        ShaderLanguage::Dxil
    } else {
        ShaderLanguage::Dxbc
    };

    Ok(ShaderModule { language })
}

#[cfg(test)]
pub(crate) fn test_container(parts: &[&[u8; 4]]) -> Vec<u8> {
    let mut code = Vec::new();
    code.extend_from_slice(CONTAINER_MAGIC);
    code.extend_from_slice(&[0; 16]);
    code.extend_from_slice(&1u16.to_le_bytes());
    code.extend_from_slice(&0u16.to_le_bytes());

    let data_start = HEADER_SIZE + parts.len() * 4;
    let total = data_start + parts.len() * 8;
    code.extend_from_slice(&(total as u32).to_le_bytes());
    code.extend_from_slice(&(parts.len() as u32).to_le_bytes());

    for idx in 0..parts.len() {
        code.extend_from_slice(&((data_start + idx * 8) as u32).to_le_bytes());
    }
    for part in parts {
        code.extend_from_slice(*part);
        code.extend_from_slice(&0u32.to_le_bytes());
    }
    code
}
