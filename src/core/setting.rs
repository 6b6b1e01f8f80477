/// A header slot value: either configured, or explicitly opted out of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Setting<T> {
    OptOut,
    Configured(T),
}

impl<T> Setting<T> {
    #[inline]
    pub fn is_opt_out(&self) -> bool {
        matches!(self, Setting::OptOut)
    }

    #[inline]
    pub fn as_configured(&self) -> Option<&T> {
        match self {
            Setting::Configured(value) => Some(value),
            Setting::OptOut => None,
        }
    }

    #[inline]
    pub fn as_configured_mut(&mut self) -> Option<&mut T> {
        match self {
            Setting::Configured(value) => Some(value),
            Setting::OptOut => None,
        }
    }
}

impl<T> From<T> for Setting<T> {
    #[inline]
    fn from(value: T) -> Self {
        Setting::Configured(value)
    }
}
