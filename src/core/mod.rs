pub mod config;
pub mod directives;
pub mod merge;
pub mod policy;
pub mod registry;
pub mod render;
pub mod setting;
pub mod source;
pub mod validate;

pub use config::{
    CachedPolicy, Configuration, ConfigurationBuilder, HeaderCache, HeaderSlots, PolicyTarget,
    ResolvedHeaders,
};
pub use directives::{Directive, DirectiveKind, Family};
pub use merge::{combine, idempotent_additions, override_policy};
pub use policy::{DirectiveValue, PolicyConfig, PolicyConfigBuilder, SourceList};
pub use registry::Registry;
pub use render::render;
pub use setting::Setting;
pub use source::Source;
