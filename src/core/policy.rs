use crate::core::directives::{Directive, DirectiveKind};
use crate::core::setting::Setting;
use crate::core::validate;
use crate::error::ConfigurationError;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::BTreeMap;

pub type SourceList = SmallVec<[String; 4]>;

/// Value assigned to a single directive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DirectiveValue {
    Sources(SourceList),
    Flag(bool),
    Text(String),
}

impl DirectiveValue {
    #[inline]
    pub fn kind(&self) -> DirectiveKind {
        match self {
            DirectiveValue::Sources(_) => DirectiveKind::SourceList,
            DirectiveValue::Flag(_) => DirectiveKind::Boolean,
            DirectiveValue::Text(_) => DirectiveKind::StringValue,
        }
    }

    #[inline]
    pub fn as_sources(&self) -> Option<&[String]> {
        match self {
            DirectiveValue::Sources(sources) => Some(sources),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn is_empty_list(&self) -> bool {
        matches!(self, DirectiveValue::Sources(sources) if sources.is_empty())
    }

    pub fn sources<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DirectiveValue::Sources(sources.into_iter().map(Into::into).collect())
    }
}

/// Directive assignments for one CSP header variant.
///
/// Directives are kept in canonical order, so two policies with the same
/// assignments compare equal regardless of how they were built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyConfig {
    directives: BTreeMap<Directive, DirectiveValue>,
    report_only: Option<bool>,
    preserve_schemes: Option<bool>,
}

impl PolicyConfig {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a directive map without requiring `default_src`.
    ///
    /// This is the shape used for additions passed to the override and append APIs.
    pub fn from_json(value: &Value) -> Result<Self, ConfigurationError> {
        validate::parse_policy(value, false)
    }

    #[inline]
    pub fn get(&self, directive: Directive) -> Option<&DirectiveValue> {
        self.directives.get(&directive)
    }

    #[inline]
    pub fn sources(&self, directive: Directive) -> Option<&[String]> {
        self.get(directive).and_then(DirectiveValue::as_sources)
    }

    #[inline]
    pub fn contains(&self, directive: Directive) -> bool {
        self.directives.contains_key(&directive)
    }

    pub fn insert(&mut self, directive: Directive, value: DirectiveValue) -> &mut Self {
        self.directives.insert(directive, value);
        self
    }

    pub fn set_sources<I, S>(&mut self, directive: Directive, sources: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(directive, DirectiveValue::sources(sources))
    }

    #[inline]
    pub fn remove(&mut self, directive: Directive) -> Option<DirectiveValue> {
        self.directives.remove(&directive)
    }

    #[inline]
    pub fn directives(&self) -> impl Iterator<Item = (Directive, &DirectiveValue)> {
        self.directives.iter().map(|(directive, value)| (*directive, value))
    }

    #[inline]
    pub(crate) fn directives_mut(&mut self) -> &mut BTreeMap<Directive, DirectiveValue> {
        &mut self.directives
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.directives.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    #[inline]
    pub fn is_report_only(&self) -> bool {
        self.report_only.unwrap_or(false)
    }

    #[inline]
    pub fn preserves_schemes(&self) -> bool {
        self.preserve_schemes.unwrap_or(false)
    }

    #[inline]
    pub fn report_only(&self) -> Option<bool> {
        self.report_only
    }

    #[inline]
    pub fn preserve_schemes(&self) -> Option<bool> {
        self.preserve_schemes
    }

    #[inline]
    pub fn set_report_only(&mut self, report_only: bool) -> &mut Self {
        self.report_only = Some(report_only);
        self
    }

    #[inline]
    pub fn set_preserve_schemes(&mut self, preserve: bool) -> &mut Self {
        self.preserve_schemes = Some(preserve);
        self
    }

    /// Sets the flag for the report-only slot and clears it for the enforced one.
    #[inline]
    pub(crate) fn pin_report_only(&mut self, report_only: bool) {
        self.report_only = if report_only { Some(true) } else { None };
    }

    pub(crate) fn set_meta(&mut self, report_only: Option<bool>, preserve_schemes: Option<bool>) {
        if report_only.is_some() {
            self.report_only = report_only;
        }
        if preserve_schemes.is_some() {
            self.preserve_schemes = preserve_schemes;
        }
    }
}

impl Setting<PolicyConfig> {
    /// Parses and validates a complete policy, or the `"opt_out"` sentinel.
    pub fn from_json(value: &Value) -> Result<Self, ConfigurationError> {
        if validate::is_opt_out_json(value) {
            return Ok(Setting::OptOut);
        }
        validate::parse_policy(value, true).map(Setting::Configured)
    }
}

macro_rules! source_list_setters {
    ($($method:ident => $directive:ident),+ $(,)?) => {
        $(
            pub fn $method<I, S>(mut self, sources: I) -> Self
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                self.policy.set_sources(Directive::$directive, sources);
                self
            }
        )+
    };
}

#[derive(Debug, Default)]
pub struct PolicyConfigBuilder {
    policy: PolicyConfig,
}

impl PolicyConfigBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    source_list_setters! {
        default_src => DefaultSrc,
        base_uri => BaseUri,
        child_src => ChildSrc,
        connect_src => ConnectSrc,
        font_src => FontSrc,
        form_action => FormAction,
        frame_ancestors => FrameAncestors,
        frame_src => FrameSrc,
        img_src => ImgSrc,
        manifest_src => ManifestSrc,
        media_src => MediaSrc,
        object_src => ObjectSrc,
        plugin_types => PluginTypes,
        script_src => ScriptSrc,
        style_src => StyleSrc,
        worker_src => WorkerSrc,
        report_uri => ReportUri,
    }

    pub fn sandbox(mut self, value: impl Into<String>) -> Self {
        self.policy
            .insert(Directive::Sandbox, DirectiveValue::Text(value.into()));
        self
    }

    pub fn upgrade_insecure_requests(mut self, enabled: bool) -> Self {
        self.policy
            .insert(Directive::UpgradeInsecureRequests, DirectiveValue::Flag(enabled));
        self
    }

    pub fn block_all_mixed_content(mut self, enabled: bool) -> Self {
        self.policy
            .insert(Directive::BlockAllMixedContent, DirectiveValue::Flag(enabled));
        self
    }

    #[inline]
    pub fn directive(mut self, directive: Directive, value: DirectiveValue) -> Self {
        self.policy.insert(directive, value);
        self
    }

    #[inline]
    pub fn report_only(mut self, enabled: bool) -> Self {
        self.policy.set_report_only(enabled);
        self
    }

    #[inline]
    pub fn preserve_schemes(mut self, enabled: bool) -> Self {
        self.policy.set_preserve_schemes(enabled);
        self
    }

    /// Builds a complete policy, requiring `default_src`.
    pub fn build(self) -> Result<PolicyConfig, ConfigurationError> {
        validate::validate_policy(&self.policy)?;
        Ok(self.policy)
    }

    /// Builds without validation; suitable for additions maps.
    #[inline]
    pub fn build_unchecked(self) -> PolicyConfig {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::source::Source;

    #[test]
    fn builder_accepts_typed_and_plain_sources() {
        let policy = PolicyConfigBuilder::new()
            .default_src([Source::Self_])
            .script_src(["https://cdn.example.com"])
            .build()
            .unwrap();

        assert_eq!(policy.sources(Directive::DefaultSrc), Some(&["'self'".to_string()][..]));
        assert_eq!(policy.len(), 2);
        assert!(!policy.is_report_only());
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let a = PolicyConfigBuilder::new()
            .default_src(["'self'"])
            .img_src(["data:"])
            .build_unchecked();
        let b = PolicyConfigBuilder::new()
            .img_src(["data:"])
            .default_src(["'self'"])
            .build_unchecked();
        assert_eq!(a, b);
    }
}
