//! Directive-aware combination of policies.

use crate::core::directives::Directive;
use crate::core::policy::{DirectiveValue, PolicyConfig, SourceList};
use crate::core::setting::Setting;
use crate::error::StateError;

/// Appends `additions` to `original`.
///
/// Source lists present in both are unioned in order. A source list that only
/// appears in `additions` is first seeded with `default_src` when the directive
/// would otherwise inherit it, even when the added list is empty. Every other key
/// is replaced. Empty source lists are dropped from the result.
pub fn combine(
    original: &Setting<PolicyConfig>,
    additions: &PolicyConfig,
) -> Result<PolicyConfig, StateError> {
    match original {
        Setting::OptOut => Err(StateError::OptOutMerge),
        Setting::Configured(policy) => Ok(combine_policies(policy, additions)),
    }
}

pub(crate) fn combine_policies(original: &PolicyConfig, additions: &PolicyConfig) -> PolicyConfig {
    let mut merged = original.clone();
    let inherited: Option<SourceList> = original
        .sources(Directive::DefaultSrc)
        .map(|sources| sources.iter().cloned().collect());

    for (directive, added) in additions.directives() {
        let directives = merged.directives_mut();
        if !directives.contains_key(&directive) && directive.inherits_default() {
            if let (Some(seed), DirectiveValue::Sources(_)) = (&inherited, added) {
                directives.insert(directive, DirectiveValue::Sources(seed.clone()));
            }
        }

        if let (Some(DirectiveValue::Sources(existing)), DirectiveValue::Sources(new_sources)) =
            (directives.get_mut(&directive), added)
        {
            union_into(existing, new_sources);
            continue;
        }
        directives.insert(directive, added.clone());
    }

    merged.set_meta(additions.report_only(), additions.preserve_schemes());
    drop_empty(&mut merged);
    merged
}

/// Replaces directives of `current` with those in `additions`, without unioning.
pub fn override_policy(current: &PolicyConfig, additions: &PolicyConfig) -> PolicyConfig {
    let mut merged = current.clone();
    for (directive, value) in additions.directives() {
        merged.insert(directive, value.clone());
    }
    merged.set_meta(additions.report_only(), additions.preserve_schemes());
    drop_empty(&mut merged);
    merged
}

/// Whether appending `additions` would leave `original` unchanged.
pub fn idempotent_additions(original: &Setting<PolicyConfig>, additions: &PolicyConfig) -> bool {
    match original {
        Setting::OptOut => false,
        Setting::Configured(policy) => combine_policies(policy, additions) == *policy,
    }
}

fn union_into(existing: &mut SourceList, additions: &[String]) {
    for source in additions {
        if !existing.iter().any(|s| s == source) {
            existing.push(source.clone());
        }
    }
}

#[inline]
fn drop_empty(policy: &mut PolicyConfig) {
    policy.directives_mut().retain(|_, value| !value.is_empty_list());
}
