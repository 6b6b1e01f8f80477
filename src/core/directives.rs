use std::fmt;

/// The shape of value a directive accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    SourceList,
    Boolean,
    StringValue,
}

impl DirectiveKind {
    pub(crate) const fn describe(self) -> &'static str {
        match self {
            DirectiveKind::SourceList => "a list of source expressions",
            DirectiveKind::Boolean => "a boolean",
            DirectiveKind::StringValue => "a string",
        }
    }
}

macro_rules! define_directives {
    ($($variant:ident => $key:literal, $name:literal, $kind:ident;)+) => {
        /// A recognized CSP directive.
        ///
        /// Variants are declared in canonical rendering order, so the derived `Ord`
        /// puts `default-src` first and `report-uri` last.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Directive {
            $($variant,)+
        }

        impl Directive {
            pub const ALL: &'static [Directive] = &[$(Directive::$variant,)+];

            /// Configuration key, e.g. `script_src`.
            #[inline]
            pub const fn key(self) -> &'static str {
                match self {
                    $(Directive::$variant => $key,)+
                }
            }

            /// Name as it appears in the header, e.g. `script-src`.
            #[inline]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Directive::$variant => $name,)+
                }
            }

            #[inline]
            pub const fn kind(self) -> DirectiveKind {
                match self {
                    $(Directive::$variant => DirectiveKind::$kind,)+
                }
            }

            pub fn from_key(key: &str) -> Option<Directive> {
                match key {
                    $($key => Some(Directive::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

define_directives! {
    DefaultSrc => "default_src", "default-src", SourceList;
    BaseUri => "base_uri", "base-uri", SourceList;
    BlockAllMixedContent => "block_all_mixed_content", "block-all-mixed-content", Boolean;
    ChildSrc => "child_src", "child-src", SourceList;
    ConnectSrc => "connect_src", "connect-src", SourceList;
    FontSrc => "font_src", "font-src", SourceList;
    FormAction => "form_action", "form-action", SourceList;
    FrameAncestors => "frame_ancestors", "frame-ancestors", SourceList;
    FrameSrc => "frame_src", "frame-src", SourceList;
    ImgSrc => "img_src", "img-src", SourceList;
    ManifestSrc => "manifest_src", "manifest-src", SourceList;
    MediaSrc => "media_src", "media-src", SourceList;
    ObjectSrc => "object_src", "object-src", SourceList;
    PluginTypes => "plugin_types", "plugin-types", SourceList;
    Sandbox => "sandbox", "sandbox", StringValue;
    ScriptSrc => "script_src", "script-src", SourceList;
    StyleSrc => "style_src", "style-src", SourceList;
    UpgradeInsecureRequests => "upgrade_insecure_requests", "upgrade-insecure-requests", Boolean;
    WorkerSrc => "worker_src", "worker-src", SourceList;
    ReportUri => "report_uri", "report-uri", SourceList;
}

/// Source-list directives that never fall back to `default-src`.
const NON_INHERITING: &[Directive] = &[
    Directive::BaseUri,
    Directive::FormAction,
    Directive::FrameAncestors,
    Directive::PluginTypes,
    Directive::ReportUri,
];

const LEVEL_ONE: &[Directive] = &[
    Directive::DefaultSrc,
    Directive::ConnectSrc,
    Directive::FontSrc,
    Directive::FrameSrc,
    Directive::ImgSrc,
    Directive::MediaSrc,
    Directive::ObjectSrc,
    Directive::Sandbox,
    Directive::ScriptSrc,
    Directive::StyleSrc,
    Directive::ReportUri,
];

const FIREFOX: &[Directive] = &[
    Directive::DefaultSrc,
    Directive::BaseUri,
    Directive::ConnectSrc,
    Directive::FontSrc,
    Directive::FormAction,
    Directive::FrameAncestors,
    Directive::FrameSrc,
    Directive::ImgSrc,
    Directive::ManifestSrc,
    Directive::MediaSrc,
    Directive::ObjectSrc,
    Directive::Sandbox,
    Directive::ScriptSrc,
    Directive::StyleSrc,
    Directive::UpgradeInsecureRequests,
    Directive::WorkerSrc,
    Directive::ReportUri,
];

impl Directive {
    #[inline]
    pub fn is_source_list(self) -> bool {
        self.kind() == DirectiveKind::SourceList
    }

    /// Whether an unset directive falls back to `default-src` in the browser.
    #[inline]
    pub fn inherits_default(self) -> bool {
        self.is_source_list() && !NON_INHERITING.contains(&self)
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Kind of the directive configured under `key`, if the key is recognized.
#[inline]
pub fn kind_of(key: &str) -> Option<DirectiveKind> {
    Directive::from_key(key).map(Directive::kind)
}

#[inline]
pub fn all_directives() -> &'static [Directive] {
    Directive::ALL
}

/// Coarse browser classification used to pick which directives are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Family {
    Chrome,
    Opera,
    Firefox,
    Safari,
    Other,
}

impl Family {
    pub const ALL: [Family; 5] = [
        Family::Chrome,
        Family::Opera,
        Family::Firefox,
        Family::Safari,
        Family::Other,
    ];

    /// Directives this family understands, in canonical order.
    #[inline]
    pub fn supported_directives(self) -> &'static [Directive] {
        match self {
            Family::Chrome | Family::Opera | Family::Other => Directive::ALL,
            Family::Firefox => FIREFOX,
            Family::Safari => LEVEL_ONE,
        }
    }

    #[inline]
    pub fn supports(self, directive: Directive) -> bool {
        self.supported_directives().contains(&directive)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Family::Chrome => "chrome",
            Family::Opera => "opera",
            Family::Firefox => "firefox",
            Family::Safari => "safari",
            Family::Other => "other",
        };
        f.write_str(name)
    }
}

#[inline]
pub fn supported_directives(family: Family) -> &'static [Directive] {
    family.supported_directives()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_starts_with_default_and_ends_with_report_uri() {
        assert_eq!(Directive::ALL.first(), Some(&Directive::DefaultSrc));
        assert_eq!(Directive::ALL.last(), Some(&Directive::ReportUri));
        assert!(Directive::ALL.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn family_tables_are_sorted() {
        for family in Family::ALL {
            let supported = family.supported_directives();
            assert!(supported.windows(2).all(|w| w[0] < w[1]), "{family}");
        }
    }

    #[test]
    fn keys_round_trip() {
        for directive in Directive::ALL {
            assert_eq!(Directive::from_key(directive.key()), Some(*directive));
            assert_eq!(directive.name(), directive.key().replace('_', "-"));
        }
    }
}
