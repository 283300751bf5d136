/// Presentation knobs for an editable surface and its leaves.
#[derive(Debug, Clone, Default)]
pub struct ViewConfig {
    /// Opacity of the placeholder overlay. Zero, negative or NaN means "use the default".
    pub placeholder_opacity: f32,
    /// Wrap injected rules in `:where(...)` when the platform supports it,
    /// so they carry zero specificity.
    pub use_where_selector: bool,
    /// Text shown over an empty document.
    pub placeholder: Option<String>,
    /// Nonce stamped on the injected style element for strict CSP pages.
    pub csp_nonce: Option<String>,
}

impl ViewConfig {
    pub fn new() -> Self {
        Self {
            use_where_selector: true,
            ..Self::default()
        }
        .with_defaults()
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn csp_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.csp_nonce = Some(nonce.into());
        self
    }

    pub(crate) fn with_defaults(mut self) -> Self {
        if self.placeholder_opacity.is_nan() || self.placeholder_opacity <= 0.0 {
            self.placeholder_opacity = 0.333;
        }
        self
    }
}
