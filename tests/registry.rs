use actix_secure_headers::constants::{DEFAULT_CONFIG, OPT_OUT_CONFIG};
use actix_secure_headers::{
    ConfigurationError, Directive, Family, PolicyConfigBuilder, PolicyTarget, Registry,
    RegistryError, RequestScheme, SecureHeadersError, Source, StateError,
};
use std::sync::Arc;

fn configured() -> Registry {
    let registry = Registry::new();
    registry
        .configure(|config| {
            config.csp(
                PolicyConfigBuilder::new()
                    .default_src([Source::Self_])
                    .build()?,
            )?;
            Ok(())
        })
        .unwrap();
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_before_configure() {
        let registry = Registry::new();

        assert_eq!(
            registry.lookup(DEFAULT_CONFIG).map(|_| ()),
            Err(RegistryError::NotConfigured(DEFAULT_CONFIG.to_string()))
        );
        assert!(registry.duplicate(DEFAULT_CONFIG).is_err());
    }

    #[test]
    fn test_named_before_default_fails() {
        let registry = Registry::new();

        let result = registry.register("api", |_| Ok(()));

        assert_eq!(
            result.map(|_| ()),
            Err(SecureHeadersError::Registry(RegistryError::NotConfigured(
                DEFAULT_CONFIG.to_string()
            )))
        );
    }

    #[test]
    fn test_configure_registers_opt_out() {
        let registry = configured();

        assert_eq!(registry.names(), [DEFAULT_CONFIG, OPT_OUT_CONFIG]);
        let opt_out = registry.lookup(OPT_OUT_CONFIG).unwrap();
        assert!(opt_out
            .resolve_for(Family::Chrome, RequestScheme::Https)
            .is_empty());
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = configured();
        registry.register("api", |_| Ok(())).unwrap();

        assert_eq!(
            registry.register("api", |_| Ok(())).map(|_| ()),
            Err(SecureHeadersError::from(RegistryError::DuplicateConfiguration("api".to_string())))
        );
        assert_eq!(
            registry.configure(|_| Ok(())).map(|_| ()),
            Err(SecureHeadersError::from(RegistryError::DuplicateConfiguration(DEFAULT_CONFIG.to_string())))
        );
    }

    #[test]
    fn test_invalid_configuration_is_not_registered() {
        let registry = configured();

        let result = registry.register("broken", |config| {
            config.csp(PolicyConfigBuilder::new().img_src(["'self'"]).build_unchecked())?;
            Ok(())
        });

        assert_eq!(
            result.map(|_| ()),
            Err(SecureHeadersError::from(ConfigurationError::MissingDefaultSrc))
        );
        assert!(registry.lookup("broken").is_err());
    }

    #[test]
    fn test_override_registration() {
        let registry = configured();

        let api = registry
            .override_registration("api", DEFAULT_CONFIG, |config| {
                config.append_directives(
                    &PolicyConfigBuilder::new()
                        .connect_src(["api.example.com"])
                        .build_unchecked(),
                    PolicyTarget::Enforced,
                )?;
                Ok(())
            })
            .unwrap();

        let policy = api.csp().as_configured().unwrap();
        assert_eq!(
            policy.sources(Directive::ConnectSrc).unwrap(),
            ["'self'", "api.example.com"]
        );

        let default = registry.default_config().unwrap();
        assert!(!default
            .csp()
            .as_configured()
            .unwrap()
            .contains(Directive::ConnectSrc));
    }

    #[test]
    fn test_override_of_missing_base_fails() {
        let registry = configured();

        assert_eq!(
            registry
                .override_registration("api", "missing", |_| Ok(()))
                .map(|_| ()),
            Err(SecureHeadersError::from(RegistryError::BaseNotFound("missing".to_string())))
        );
    }

    #[test]
    fn test_sealed_registry_rejects_registrations() {
        let registry = configured();
        registry.seal();

        assert!(registry.is_sealed());
        assert_eq!(
            registry.register("late", |_| Ok(())).map(|_| ()),
            Err(SecureHeadersError::from(StateError::Frozen("late".to_string())))
        );
        assert!(registry.lookup(DEFAULT_CONFIG).is_ok());
    }

    #[test]
    fn test_lookups_share_the_frozen_configuration() {
        let registry = configured();

        let first = registry.lookup(DEFAULT_CONFIG).unwrap();
        let second = registry.lookup(DEFAULT_CONFIG).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_concurrent_readers() {
        let registry = Arc::new(configured());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    let mut duplicate = registry.duplicate(DEFAULT_CONFIG).unwrap();
                    duplicate
                        .append_directives(
                            &PolicyConfigBuilder::new()
                                .script_src([format!("thread{}.example.com", i)])
                                .build_unchecked(),
                            PolicyTarget::Enforced,
                        )
                        .unwrap();
                    duplicate
                        .resolve_for(Family::Chrome, RequestScheme::Https)
                        .get("Content-Security-Policy")
                        .map(str::to_string)
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let value = handle.join().unwrap().unwrap();
            assert!(value.contains(&format!("thread{}.example.com", i)));
            for other in (0..4).filter(|other| *other != i) {
                assert!(!value.contains(&format!("thread{}.example.com", other)));
            }
        }

        let default = registry.default_config().unwrap();
        assert!(!default
            .csp()
            .as_configured()
            .unwrap()
            .contains(Directive::ScriptSrc));
    }

    #[test]
    fn test_closures_may_use_the_registry() {
        let registry = configured();

        let api = registry
            .override_registration("api", DEFAULT_CONFIG, |config| {
                let base = registry.lookup(DEFAULT_CONFIG)?;
                assert_eq!(base.name(), DEFAULT_CONFIG);
                registry.register("nested", |_| Ok(()))?;
                config.append_directives(
                    &PolicyConfigBuilder::new()
                        .img_src(["images.example.com"])
                        .build_unchecked(),
                    PolicyTarget::Enforced,
                )?;
                Ok(())
            })
            .unwrap();

        assert!(api.csp().as_configured().unwrap().contains(Directive::ImgSrc));
        assert_eq!(registry.names(), [DEFAULT_CONFIG, OPT_OUT_CONFIG, "nested", "api"]);
    }

    #[test]
    fn test_name_taken_while_building_is_rejected() {
        let registry = configured();

        let result = registry.register("api", |_| {
            registry.register("api", |_| Ok(()))?;
            Ok(())
        });

        assert_eq!(
            result.map(|_| ()),
            Err(SecureHeadersError::from(RegistryError::DuplicateConfiguration("api".to_string())))
        );
        assert_eq!(registry.names().len(), 3);
    }
}
