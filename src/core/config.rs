use crate::core::directives::{Directive, Family};
use crate::core::merge::{combine_policies, idempotent_additions, override_policy};
use crate::core::policy::{PolicyConfig, PolicyConfigBuilder};
use crate::core::render::render_header;
use crate::core::setting::Setting;
use crate::core::source::Source;
use crate::core::validate;
use crate::error::{ConfigurationError, StateError};
use crate::headers::{
    CookieConfig, HeaderConfig, HeaderKey, Hsts, PublicKeyPins, ReferrerPolicy, RenderedHeader,
    RequestScheme, XContentTypeOptions, XDownloadOptions, XFrameOptions,
    XPermittedCrossDomainPolicies, XXssProtection,
};
use crate::security::nonce::NonceGenerator;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::Arc;

/// Which CSP variant an override applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyTarget {
    Enforced,
    ReportOnly,
    Both,
}

impl PolicyTarget {
    #[inline]
    fn slots(self) -> &'static [PolicySlot] {
        match self {
            PolicyTarget::Enforced => &[PolicySlot::Enforced],
            PolicyTarget::ReportOnly => &[PolicySlot::ReportOnly],
            PolicyTarget::Both => &[PolicySlot::Enforced, PolicySlot::ReportOnly],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PolicySlot {
    Enforced,
    ReportOnly,
}

impl PolicySlot {
    #[inline]
    fn key(self) -> HeaderKey {
        match self {
            PolicySlot::Enforced => HeaderKey::Csp,
            PolicySlot::ReportOnly => HeaderKey::CspReportOnly,
        }
    }

    /// Makes the `report_only` flag agree with the slot, so each slot renders under
    /// its own header name.
    #[inline]
    fn pin(self, policy: &mut PolicyConfig) {
        policy.pin_report_only(self == PolicySlot::ReportOnly);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OverrideMode {
    Replace,
    Append,
}

/// One typed slot per non-CSP header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderSlots {
    pub hsts: Setting<Hsts>,
    pub x_frame_options: Setting<XFrameOptions>,
    pub x_content_type_options: Setting<XContentTypeOptions>,
    pub x_xss_protection: Setting<XXssProtection>,
    pub x_download_options: Setting<XDownloadOptions>,
    pub x_permitted_cross_domain_policies: Setting<XPermittedCrossDomainPolicies>,
    pub referrer_policy: Setting<ReferrerPolicy>,
    pub public_key_pins: Setting<PublicKeyPins>,
    pub cookies: Setting<CookieConfig>,
}

impl Default for HeaderSlots {
    fn default() -> Self {
        Self {
            hsts: Setting::Configured(Hsts::default()),
            x_frame_options: Setting::Configured(XFrameOptions::default()),
            x_content_type_options: Setting::Configured(XContentTypeOptions::default()),
            x_xss_protection: Setting::Configured(XXssProtection::default()),
            x_download_options: Setting::Configured(XDownloadOptions::default()),
            x_permitted_cross_domain_policies: Setting::Configured(
                XPermittedCrossDomainPolicies::default(),
            ),
            referrer_policy: Setting::Configured(ReferrerPolicy::default()),
            public_key_pins: Setting::OptOut,
            cookies: Setting::Configured(CookieConfig::default()),
        }
    }
}

struct SlotEntry {
    key: HeaderKey,
    validate: fn(&HeaderSlots) -> Result<(), ConfigurationError>,
    build: fn(&HeaderSlots) -> Option<RenderedHeader>,
    opt_out: fn(&mut HeaderSlots),
}

macro_rules! slot {
    ($ty:ty, $field:ident) => {
        SlotEntry {
            key: <$ty as HeaderConfig>::KEY,
            validate: |slots| slots.$field.validate(),
            build: |slots| slots.$field.build(),
            opt_out: |slots| slots.$field = Setting::OptOut,
        }
    };
}

const SLOTS: &[SlotEntry] = &[
    slot!(Hsts, hsts),
    slot!(XFrameOptions, x_frame_options),
    slot!(XContentTypeOptions, x_content_type_options),
    slot!(XXssProtection, x_xss_protection),
    slot!(XDownloadOptions, x_download_options),
    slot!(XPermittedCrossDomainPolicies, x_permitted_cross_domain_policies),
    slot!(ReferrerPolicy, referrer_policy),
    slot!(PublicKeyPins, public_key_pins),
];

impl HeaderSlots {
    /// Every slot opted out.
    pub fn opted_out() -> Self {
        let mut slots = Self::default();
        for entry in SLOTS {
            (entry.opt_out)(&mut slots);
        }
        slots.cookies = Setting::OptOut;
        slots
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for entry in SLOTS {
            (entry.validate)(self)?;
        }
        self.cookies
            .as_configured()
            .map_or(Ok(()), CookieConfig::validate)
    }

    /// Renders every configured header, skipping opted-out slots.
    pub fn build_all(&self) -> SmallVec<[(HeaderKey, RenderedHeader); 8]> {
        SLOTS
            .iter()
            .filter_map(|entry| (entry.build)(self).map(|header| (entry.key, header)))
            .collect()
    }

    /// Opts a non-CSP header out. Returns `false` for CSP keys, which are not held here.
    pub fn opt_out(&mut self, key: HeaderKey) -> bool {
        match SLOTS.iter().find(|entry| entry.key == key) {
            Some(entry) => {
                (entry.opt_out)(self);
                true
            }
            None => false,
        }
    }
}

/// A CSP policy together with its rendering for every browser family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPolicy {
    source: PolicyConfig,
    rendered: FxHashMap<Family, RenderedHeader>,
}

impl CachedPolicy {
    fn new(source: &PolicyConfig) -> Self {
        let rendered = Family::ALL
            .iter()
            .filter_map(|family| render_non_empty(source, *family).map(|header| (*family, header)))
            .collect();
        Self {
            source: source.clone(),
            rendered,
        }
    }

    #[inline]
    pub fn source(&self) -> &PolicyConfig {
        &self.source
    }

    /// Rendering for `family`, absent when nothing in the policy applies to it.
    #[inline]
    pub fn get(&self, family: Family) -> Option<&RenderedHeader> {
        self.rendered.get(&family)
    }
}

#[inline]
fn render_non_empty(policy: &PolicyConfig, family: Family) -> Option<RenderedHeader> {
    let header = render_header(policy, family);
    if header.value.is_empty() {
        log::debug!("{} renders no directives for {}, header skipped", header.name, family);
        None
    } else {
        Some(header)
    }
}

/// Headers rendered when a configuration was frozen.
///
/// Opted-out headers have no entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCache {
    csp: Option<CachedPolicy>,
    csp_report_only: Option<CachedPolicy>,
    headers: SmallVec<[(HeaderKey, RenderedHeader); 8]>,
    header_source: HeaderSlots,
}

impl HeaderCache {
    fn build(
        csp: &Setting<PolicyConfig>,
        csp_report_only: &Setting<PolicyConfig>,
        headers: &HeaderSlots,
    ) -> Self {
        Self {
            csp: csp.as_configured().map(CachedPolicy::new),
            csp_report_only: csp_report_only.as_configured().map(CachedPolicy::new),
            headers: headers.build_all(),
            header_source: headers.clone(),
        }
    }

    /// Cached header for `key`. CSP entries are looked up for `family`.
    pub fn get(&self, key: HeaderKey, family: Family) -> Option<&RenderedHeader> {
        match key {
            HeaderKey::Csp => self.csp.as_ref().and_then(|cached| cached.get(family)),
            HeaderKey::CspReportOnly => self
                .csp_report_only
                .as_ref()
                .and_then(|cached| cached.get(family)),
            other => self
                .headers
                .iter()
                .find(|(key, _)| *key == other)
                .map(|(_, header)| header),
        }
    }

    #[inline]
    fn policy(&self, slot: PolicySlot) -> Option<&CachedPolicy> {
        match slot {
            PolicySlot::Enforced => self.csp.as_ref(),
            PolicySlot::ReportOnly => self.csp_report_only.as_ref(),
        }
    }

    /// Headers for a request that made no changes to its configuration.
    fn resolve<F>(&self, family: Family, applies: F) -> ResolvedHeaders
    where
        F: Fn(HeaderKey) -> bool,
    {
        let mut resolved = ResolvedHeaders::default();
        for slot in [PolicySlot::Enforced, PolicySlot::ReportOnly] {
            if !applies(slot.key()) {
                continue;
            }
            if let Some(header) = self.policy(slot).and_then(|cached| cached.get(family)) {
                resolved.headers.push(header.clone());
            }
        }
        resolved.headers.extend(
            self.headers
                .iter()
                .filter(|(key, _)| applies(*key))
                .map(|(_, header)| header.clone()),
        );
        resolved
    }
}

/// Headers resolved for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedHeaders {
    headers: SmallVec<[RenderedHeader; 10]>,
    rendered: usize,
}

impl ResolvedHeaders {
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &RenderedHeader> {
        self.headers.iter()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|header| header.name.eq_ignore_ascii_case(name))
            .map(|header| header.value.as_str())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Number of headers rendered on demand instead of taken from the cache.
    #[inline]
    pub fn rendered(&self) -> usize {
        self.rendered
    }
}

impl IntoIterator for ResolvedHeaders {
    type Item = RenderedHeader;
    type IntoIter = smallvec::IntoIter<[RenderedHeader; 10]>;

    fn into_iter(self) -> Self::IntoIter {
        self.headers.into_iter()
    }
}

fn default_policy() -> PolicyConfig {
    PolicyConfigBuilder::new()
        .default_src(["https:"])
        .img_src(["https:", "data:", "'self'"])
        .object_src([Source::None])
        .script_src(["https:"])
        .style_src(["'self'", "'unsafe-inline'", "https:"])
        .build_unchecked()
}

/// A configuration that can still be changed.
///
/// Fresh builders are used at registration time. [`Configuration::duplicate`] also
/// returns a builder: the request-scoped copy on which overrides are applied and
/// from which the request's headers are resolved.
#[derive(Debug, Clone)]
pub struct ConfigurationBuilder {
    csp: Setting<PolicyConfig>,
    csp_report_only: Setting<PolicyConfig>,
    dynamic_csp: Option<Setting<PolicyConfig>>,
    dynamic_csp_report_only: Option<Setting<PolicyConfig>>,
    headers: HeaderSlots,
    cache: Option<Arc<HeaderCache>>,
    nonce: Option<String>,
}

impl Default for ConfigurationBuilder {
    fn default() -> Self {
        Self {
            csp: Setting::Configured(default_policy()),
            csp_report_only: Setting::OptOut,
            dynamic_csp: None,
            dynamic_csp_report_only: None,
            headers: HeaderSlots::default(),
            cache: None,
            nonce: None,
        }
    }
}

impl ConfigurationBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder with every header opted out, including both dynamic CSP slots.
    pub fn opted_out() -> Self {
        Self {
            csp: Setting::OptOut,
            csp_report_only: Setting::OptOut,
            dynamic_csp: Some(Setting::OptOut),
            dynamic_csp_report_only: Some(Setting::OptOut),
            headers: HeaderSlots::opted_out(),
            cache: None,
            nonce: None,
        }
    }

    /// Replaces the static enforced policy. Its `report_only` flag is cleared.
    ///
    /// Fails once a dynamic override exists for it, since that override would be lost.
    pub fn csp(
        &mut self,
        policy: impl Into<Setting<PolicyConfig>>,
    ) -> Result<&mut Self, StateError> {
        if self.dynamic_csp.is_some() {
            return Err(StateError::IllegalDirectModification("csp"));
        }
        self.csp = pinned(policy.into(), PolicySlot::Enforced);
        Ok(self)
    }

    /// Replaces the static report-only policy. Its `report_only` flag is forced on.
    pub fn csp_report_only(
        &mut self,
        policy: impl Into<Setting<PolicyConfig>>,
    ) -> Result<&mut Self, StateError> {
        if self.dynamic_csp_report_only.is_some() {
            return Err(StateError::IllegalDirectModification("csp_report_only"));
        }
        self.csp_report_only = pinned(policy.into(), PolicySlot::ReportOnly);
        Ok(self)
    }

    #[inline]
    pub fn headers(&self) -> &HeaderSlots {
        &self.headers
    }

    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderSlots {
        &mut self.headers
    }

    /// Policy in effect for `target` (`Both` reads the enforced slot): the dynamic
    /// override if present, else the static one.
    pub fn active_policy(&self, target: PolicyTarget) -> &Setting<PolicyConfig> {
        match target {
            PolicyTarget::ReportOnly => self.active(PolicySlot::ReportOnly),
            _ => self.active(PolicySlot::Enforced),
        }
    }

    #[inline]
    pub fn has_dynamic_policy(&self) -> bool {
        self.dynamic_csp.is_some() || self.dynamic_csp_report_only.is_some()
    }

    /// Replaces directives of the active policy with those in `additions`.
    pub fn override_directives(
        &mut self,
        additions: &PolicyConfig,
        target: PolicyTarget,
    ) -> Result<&mut Self, ConfigurationError> {
        self.apply_override(additions, target, OverrideMode::Replace)
    }

    /// Appends `additions` to the active policy using union semantics.
    pub fn append_directives(
        &mut self,
        additions: &PolicyConfig,
        target: PolicyTarget,
    ) -> Result<&mut Self, ConfigurationError> {
        self.apply_override(additions, target, OverrideMode::Append)
    }

    fn apply_override(
        &mut self,
        additions: &PolicyConfig,
        target: PolicyTarget,
        mode: OverrideMode,
    ) -> Result<&mut Self, ConfigurationError> {
        validate::validate_directives(additions)?;

        for &slot in target.slots() {
            let current = match self.active(slot) {
                Setting::Configured(policy) => policy.clone(),
                Setting::OptOut => {
                    let mut seeded = PolicyConfig::new();
                    slot.pin(&mut seeded);
                    seeded
                }
            };

            if mode == OverrideMode::Append && idempotent_additions(self.active(slot), additions) {
                log::trace!("{:?} append is a no-op, keeping cached header", slot.key());
                continue;
            }
            let mut updated = match mode {
                OverrideMode::Replace => override_policy(&current, additions),
                OverrideMode::Append => combine_policies(&current, additions),
            };
            slot.pin(&mut updated);
            *self.dynamic_slot(slot) = Some(Setting::Configured(updated));
        }
        Ok(self)
    }

    /// Opts the current configuration out of a header.
    ///
    /// For CSP keys this sets the dynamic slot, so it only affects this configuration
    /// copy and leaves the static policy untouched.
    pub fn opt_out(&mut self, key: HeaderKey) -> &mut Self {
        match key {
            HeaderKey::Csp => self.dynamic_csp = Some(Setting::OptOut),
            HeaderKey::CspReportOnly => self.dynamic_csp_report_only = Some(Setting::OptOut),
            other => {
                self.headers.opt_out(other);
            }
        }
        self
    }

    /// Per-request nonce added to `script-src` of every active policy.
    pub fn script_nonce(&mut self, generator: &NonceGenerator) -> String {
        self.nonce_for(Directive::ScriptSrc, generator)
    }

    /// Per-request nonce added to `style-src` of every active policy.
    pub fn style_nonce(&mut self, generator: &NonceGenerator) -> String {
        self.nonce_for(Directive::StyleSrc, generator)
    }

    fn nonce_for(&mut self, directive: Directive, generator: &NonceGenerator) -> String {
        let nonce = self
            .nonce
            .get_or_insert_with(|| generator.generate())
            .clone();
        let mut additions = PolicyConfig::new();
        additions.set_sources(directive, [Source::nonce(nonce.clone())]);
        self.append_to_configured(&additions);
        nonce
    }

    /// Adds hash sources (e.g. `'sha256-…'`) to `script-src` of every active policy.
    pub fn append_script_hashes<I, S>(&mut self, hashes: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut additions = PolicyConfig::new();
        additions.set_sources(Directive::ScriptSrc, hashes);
        self.append_to_configured(&additions);
        self
    }

    /// Adds hash sources to `style-src` of every active policy.
    pub fn append_style_hashes<I, S>(&mut self, hashes: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut additions = PolicyConfig::new();
        additions.set_sources(Directive::StyleSrc, hashes);
        self.append_to_configured(&additions);
        self
    }

    /// Appends to each slot that is not opted out; opted-out policies stay silent.
    fn append_to_configured(&mut self, additions: &PolicyConfig) {
        for slot in [PolicySlot::Enforced, PolicySlot::ReportOnly] {
            let updated = match self.active(slot) {
                Setting::Configured(policy) => combine_policies(policy, additions),
                Setting::OptOut => continue,
            };
            *self.dynamic_slot(slot) = Some(Setting::Configured(updated));
        }
    }

    /// Validates both policies (as they are currently in effect) and every header.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        validate::validate(self.active(PolicySlot::Enforced))?;
        validate::validate(self.active(PolicySlot::ReportOnly))?;
        self.headers.validate()
    }

    /// Resolves the headers for a request from `family`.
    ///
    /// CSP headers come from the cache when the active policy is the one the cache
    /// was rendered from, and are rendered on demand otherwise. The shared cache is
    /// never modified. Only keys accepted by `applies` are returned.
    pub fn resolve_headers<F>(&self, family: Family, applies: F) -> ResolvedHeaders
    where
        F: Fn(HeaderKey) -> bool,
    {
        let owned;
        let cache = match &self.cache {
            Some(cache) => cache.as_ref(),
            None => {
                owned = HeaderCache::build(&self.csp, &self.csp_report_only, &self.headers);
                &owned
            }
        };

        let mut resolved = ResolvedHeaders::default();
        for slot in [PolicySlot::Enforced, PolicySlot::ReportOnly] {
            if !applies(slot.key()) {
                continue;
            }
            let active = match self.active(slot) {
                Setting::Configured(policy) => policy,
                Setting::OptOut => continue,
            };
            match cache.policy(slot) {
                Some(cached) if cached.source() == active => {
                    log::trace!("{:?} cache hit for {}", slot.key(), family);
                    if let Some(header) = cached.get(family) {
                        resolved.headers.push(header.clone());
                    }
                }
                _ => {
                    log::trace!("{:?} rendered on demand for {}", slot.key(), family);
                    resolved.headers.extend(render_non_empty(active, family));
                    resolved.rendered += 1;
                }
            }
        }

        if cache.header_source == self.headers {
            resolved.headers.extend(
                cache
                    .headers
                    .iter()
                    .filter(|(key, _)| applies(*key))
                    .map(|(_, header)| header.clone()),
            );
        } else {
            for (key, header) in self.headers.build_all() {
                if applies(key) {
                    resolved.headers.push(header);
                    resolved.rendered += 1;
                }
            }
        }

        resolved
    }

    /// [`resolve_headers`](Self::resolve_headers) gated on the request scheme.
    #[inline]
    pub fn resolve_for(&self, family: Family, scheme: RequestScheme) -> ResolvedHeaders {
        self.resolve_headers(family, |key| scheme.allows(key))
    }

    /// Validates, renders the header cache and produces an immutable configuration.
    ///
    /// Dynamic overrides become the static policies of the frozen configuration.
    pub fn freeze(mut self, name: impl Into<String>) -> Result<Configuration, ConfigurationError> {
        if let Some(policy) = self.dynamic_csp.take() {
            self.csp = policy;
        }
        if let Some(policy) = self.dynamic_csp_report_only.take() {
            self.csp_report_only = policy;
        }
        self.validate()?;

        let name = name.into();
        let cache = HeaderCache::build(&self.csp, &self.csp_report_only, &self.headers);
        log::debug!(
            "Froze configuration {} ({} cached headers)",
            name,
            cache.headers.len()
                + cache.csp.as_ref().map_or(0, |_| 1)
                + cache.csp_report_only.as_ref().map_or(0, |_| 1)
        );

        Ok(Configuration {
            name,
            csp: self.csp,
            csp_report_only: self.csp_report_only,
            headers: self.headers,
            cache: Arc::new(cache),
        })
    }

    #[inline]
    fn active(&self, slot: PolicySlot) -> &Setting<PolicyConfig> {
        match slot {
            PolicySlot::Enforced => self.dynamic_csp.as_ref().unwrap_or(&self.csp),
            PolicySlot::ReportOnly => self
                .dynamic_csp_report_only
                .as_ref()
                .unwrap_or(&self.csp_report_only),
        }
    }

    #[inline]
    fn dynamic_slot(&mut self, slot: PolicySlot) -> &mut Option<Setting<PolicyConfig>> {
        match slot {
            PolicySlot::Enforced => &mut self.dynamic_csp,
            PolicySlot::ReportOnly => &mut self.dynamic_csp_report_only,
        }
    }
}

fn pinned(mut policy: Setting<PolicyConfig>, slot: PolicySlot) -> Setting<PolicyConfig> {
    if let Setting::Configured(policy) = &mut policy {
        slot.pin(policy);
    }
    policy
}

/// A validated configuration with precomputed headers. It has no mutators.
#[derive(Debug)]
pub struct Configuration {
    name: String,
    csp: Setting<PolicyConfig>,
    csp_report_only: Setting<PolicyConfig>,
    headers: HeaderSlots,
    cache: Arc<HeaderCache>,
}

impl Configuration {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn csp(&self) -> &Setting<PolicyConfig> {
        &self.csp
    }

    #[inline]
    pub fn csp_report_only(&self) -> &Setting<PolicyConfig> {
        &self.csp_report_only
    }

    #[inline]
    pub fn headers(&self) -> &HeaderSlots {
        &self.headers
    }

    #[inline]
    pub fn cache(&self) -> &HeaderCache {
        &self.cache
    }

    #[inline]
    pub fn cookies(&self) -> Option<&CookieConfig> {
        self.headers.cookies.as_configured()
    }

    /// Mutable copy of this configuration.
    ///
    /// Policies and header slots are cloned; the rendered cache is shared read-only.
    pub fn duplicate(&self) -> ConfigurationBuilder {
        ConfigurationBuilder {
            csp: self.csp.clone(),
            csp_report_only: self.csp_report_only.clone(),
            dynamic_csp: None,
            dynamic_csp_report_only: None,
            headers: self.headers.clone(),
            cache: Some(Arc::clone(&self.cache)),
            nonce: None,
        }
    }

    /// Cached headers for `family`, gated on the request scheme.
    #[inline]
    pub fn resolve_for(&self, family: Family, scheme: RequestScheme) -> ResolvedHeaders {
        self.cache.resolve(family, |key| scheme.allows(key))
    }
}
