/// How baked tile lighting is visualised in the overworld.
/// Debug modes only change presentation, never the baked values.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightingMode {
    /// Tiles are tinted by their baked light colour.
    #[default]
    Standard,
    /// Lighting ignored; tiles drawn with a white tint.
    Disabled,
    /// Standard tint plus an outline in the tile's light colour.
    Border,
    /// Standard tint over a filled rect of the tile's light colour.
    Fill,
}

impl LightingMode {
    pub const ALL: &'static [LightingMode] = &[
        LightingMode::Standard,
        LightingMode::Disabled,
        LightingMode::Border,
        LightingMode::Fill,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Standard => "Lighting: standard",
            Self::Disabled => "Lighting: disabled",
            Self::Border => "Lighting: border",
            Self::Fill => "Lighting: fill",
        }
    }

    /// Cycle to the next mode (wraps around).
    pub fn next(self) -> Self {
        match self {
            Self::Standard => Self::Disabled,
            Self::Disabled => Self::Border,
            Self::Border => Self::Fill,
            Self::Fill => Self::Standard,
        }
    }
}

impl std::fmt::Display for LightingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullingMode {
    /// Skip tiles outside the camera and tiles that are fully unlit.
    #[default]
    Standard,
    /// Camera culling only; unlit tiles are still drawn.
    NoLights,
    /// Draw everything.
    Disabled,
}

impl CullingMode {
    pub const ALL: &'static [CullingMode] = &[
        CullingMode::Standard,
        CullingMode::NoLights,
        CullingMode::Disabled,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Standard => "Culling: standard",
            Self::NoLights => "Culling: camera only",
            Self::Disabled => "Culling: disabled",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Standard => Self::NoLights,
            Self::NoLights => Self::Disabled,
            Self::Disabled => Self::Standard,
        }
    }

    pub fn culls_to_camera(self) -> bool {
        !matches!(self, Self::Disabled)
    }

    pub fn culls_unlit(self) -> bool {
        matches!(self, Self::Standard)
    }
}

impl std::fmt::Display for CullingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
