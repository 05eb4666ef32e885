use super::{config::PORTABLE_PUSH_CONSTANTS_SIZE, Diagnostics, Error, ShaderStage, ShaderStages};

/// Push constants range visible to a single shader stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PushConstantsRange {
    stage: ShaderStage,
    offset: u32,
    size: u32,
    space: u32,
    binding: u32,
}

impl PushConstantsRange {
    pub fn new(
        stages: ShaderStages,
        offset: u32,
        size: u32,
        space: u32,
        binding: u32,
    ) -> Result<Self, Error> {
        if offset % 4 != 0 {
            return Err(Error::invalid(
                "offset",
                format!("push constants offset {offset} is not a multiple of 4"),
            ));
        }

        if size == 0 {
            return Err(Error::invalid("size", "push constants range must not be empty"));
        }

        if size % 4 != 0 {
            return Err(Error::invalid(
                "size",
                format!("push constants size {size} is not a multiple of 4"),
            ));
        }

        let Some(stage) = stages.single() else {
            return Err(Error::invalid(
                "stages",
                format!(
                    "push constants range must be mapped to exactly one shader stage, got {stages:?}"
                ),
            ));
        };

        Ok(PushConstantsRange {
            stage,
            offset,
            size,
            space,
            binding,
        })
    }

    #[inline]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    pub fn space(&self) -> u32 {
        self.space
    }

    #[inline]
    pub fn binding(&self) -> u32 {
        self.binding
    }
}

/// Push constants block partitioned between shader stages.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PushConstantsLayout {
    size: u32,
    ranges: Vec<PushConstantsRange>,
}

impl PushConstantsLayout {
    pub fn new(
        diagnostics: &Diagnostics,
        size: u32,
        ranges: Vec<PushConstantsRange>,
    ) -> Result<Self, Error> {
        PushConstantsLayout::with_limit(diagnostics, size, ranges, PORTABLE_PUSH_CONSTANTS_SIZE)
    }

    /// Same as [`PushConstantsLayout::new`] but warns above `portable_size` bytes.
    pub fn with_limit(
        diagnostics: &Diagnostics,
        size: u32,
        ranges: Vec<PushConstantsRange>,
        portable_size: u32,
    ) -> Result<Self, Error> {
        let size = match size.checked_add(3) {
            Some(end) => end & !3,
            None => {
                return Err(Error::invalid(
                    "size",
                    format!("push constants size {size} is too large"),
                ))
            }
        };

        let mut stages = ShaderStages::empty();
        for range in &ranges {
            let stage = ShaderStages::from(range.stage);
            if stages.contains(stage) {
                return Err(Error::invalid(
                    "ranges",
                    format!(
                        "only one push constant range can be mapped to a shader stage, {} has more",
                        range.stage
                    ),
                ));
            }
            stages |= stage;

            if u64::from(range.offset) + u64::from(range.size) > u64::from(size) {
                return Err(Error::invalid(
                    "ranges",
                    format!(
                        "{} push constants range [{}, {}) exceeds block size {size}",
                        range.stage,
                        range.offset,
                        u64::from(range.offset) + u64::from(range.size),
                    ),
                ));
            }
        }

        if size > portable_size {
            diagnostics.warn(
                "push_constants",
                format_args!(
                    "push constants block of {size} bytes exceeds {portable_size} bytes, which is not guaranteed to be available on all hardware"
                ),
            );
        }

        Ok(PushConstantsLayout { size, ranges })
    }

    /// Size of the block, a multiple of 4.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    pub fn ranges(&self) -> &[PushConstantsRange] {
        &self.ranges
    }

    pub fn range(&self, stage: impl Into<ShaderStages>) -> Result<&PushConstantsRange, Error> {
        let stages = stage.into();
        let Some(stage) = stages.single() else {
            return Err(Error::out_of_range(
                "stage",
                format!("push constants lookup requires exactly one stage, got {stages:?}"),
            ));
        };

        self.ranges
            .iter()
            .find(|r| r.stage == stage)
            .ok_or_else(|| {
                Error::invalid(
                    "stage",
                    format!("no push constants range is mapped to the {stage} stage"),
                )
            })
    }
}
