#[derive(Debug, Clone)]
pub struct EmitterConfig {
    pub indent_spaces: usize,
    /// Blank lines between state cells, local functions, effects, and the
    /// trailing body.
    pub section_spacing: bool,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            indent_spaces: 2,
            section_spacing: true,
        }
    }
}
