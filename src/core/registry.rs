use crate::constants::{DEFAULT_CONFIG, OPT_OUT_CONFIG};
use crate::core::config::{Configuration, ConfigurationBuilder};
use crate::error::{RegistryError, SecureHeadersError, StateError};
use arc_swap::ArcSwap;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type Entries = IndexMap<String, Arc<Configuration>>;

/// Named, frozen configurations shared by all requests.
///
/// Reads are lock-free snapshots. Registrations are serialized and append-only;
/// once [`seal`](Self::seal)ed, the registry rejects further registrations.
#[derive(Debug)]
pub struct Registry {
    entries: ArcSwap<Entries>,
    write_lock: Mutex<()>,
    sealed: AtomicBool,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            entries: ArcSwap::from_pointee(IndexMap::new()),
            write_lock: Mutex::new(()),
            sealed: AtomicBool::new(false),
        }
    }
}

impl Registry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the default configuration.
    #[inline]
    pub fn configure<F>(&self, configure: F) -> Result<Arc<Configuration>, SecureHeadersError>
    where
        F: FnOnce(&mut ConfigurationBuilder) -> Result<(), SecureHeadersError>,
    {
        self.register(DEFAULT_CONFIG, configure)
    }

    /// Builds, validates and freezes a configuration under `name`.
    ///
    /// The first registration must be the default one; the opt-out configuration is
    /// registered right after it. `configure` runs without holding the registry lock,
    /// so it may look up or register other configurations.
    pub fn register<F>(
        &self,
        name: &str,
        configure: F,
    ) -> Result<Arc<Configuration>, SecureHeadersError>
    where
        F: FnOnce(&mut ConfigurationBuilder) -> Result<(), SecureHeadersError>,
    {
        self.check_insertable(name, &self.entries.load())?;

        let mut builder = ConfigurationBuilder::new();
        configure(&mut builder)?;
        let config = Arc::new(builder.freeze(name)?);
        let opt_out = if name == DEFAULT_CONFIG {
            Some(Arc::new(ConfigurationBuilder::opted_out().freeze(OPT_OUT_CONFIG)?))
        } else {
            None
        };

        self.insert(name, Arc::clone(&config), opt_out)?;
        log::debug!("Registered secure headers configuration {}", name);
        Ok(config)
    }

    /// Registers `name` as a modified copy of `base`. `mutate` runs without holding
    /// the registry lock.
    pub fn override_registration<F>(
        &self,
        name: &str,
        base: &str,
        mutate: F,
    ) -> Result<Arc<Configuration>, SecureHeadersError>
    where
        F: FnOnce(&mut ConfigurationBuilder) -> Result<(), SecureHeadersError>,
    {
        let mut builder = {
            let entries = self.entries.load();
            self.ensure_open(name)?;
            if !entries.contains_key(DEFAULT_CONFIG) {
                return Err(RegistryError::NotConfigured(DEFAULT_CONFIG.to_string()).into());
            }
            let base_config = entries
                .get(base)
                .ok_or_else(|| RegistryError::BaseNotFound(base.to_string()))?;
            self.check_insertable(name, &entries)?;
            base_config.duplicate()
        };

        mutate(&mut builder)?;
        let config = Arc::new(builder.freeze(name)?);

        self.insert(name, Arc::clone(&config), None)?;
        log::debug!("Registered configuration {} overriding {}", name, base);
        Ok(config)
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<Configuration>, RegistryError> {
        let entries = self.entries.load();
        if !entries.contains_key(DEFAULT_CONFIG) {
            return Err(RegistryError::NotConfigured(DEFAULT_CONFIG.to_string()));
        }
        entries
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotConfigured(name.to_string()))
    }

    /// Request-scoped copy of the configuration registered as `name`.
    #[inline]
    pub fn duplicate(&self, name: &str) -> Result<ConfigurationBuilder, RegistryError> {
        self.lookup(name).map(|config| config.duplicate())
    }

    #[inline]
    pub fn default_config(&self) -> Result<Arc<Configuration>, RegistryError> {
        self.lookup(DEFAULT_CONFIG)
    }

    /// Ends start-up: later registrations fail.
    pub fn seal(&self) {
        let _guard = self.write_lock.lock();
        self.sealed.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.load().keys().cloned().collect()
    }

    /// Stores a frozen configuration, re-checking under the write lock since another
    /// registration may have landed while it was being built.
    fn insert(
        &self,
        name: &str,
        config: Arc<Configuration>,
        opt_out: Option<Arc<Configuration>>,
    ) -> Result<(), SecureHeadersError> {
        let _guard = self.write_lock.lock();
        let entries = self.entries.load();
        self.check_insertable(name, &entries)?;

        let mut updated = Entries::clone(&entries);
        updated.insert(name.to_string(), config);
        if let Some(opt_out) = opt_out {
            updated.insert(OPT_OUT_CONFIG.to_string(), opt_out);
        }
        self.entries.store(Arc::new(updated));
        Ok(())
    }

    fn check_insertable(&self, name: &str, entries: &Entries) -> Result<(), SecureHeadersError> {
        self.ensure_open(name)?;
        if entries.contains_key(name) {
            return Err(RegistryError::DuplicateConfiguration(name.to_string()).into());
        }
        if name != DEFAULT_CONFIG && !entries.contains_key(DEFAULT_CONFIG) {
            return Err(RegistryError::NotConfigured(DEFAULT_CONFIG.to_string()).into());
        }
        Ok(())
    }

    fn ensure_open(&self, name: &str) -> Result<(), StateError> {
        if self.is_sealed() {
            Err(StateError::Frozen(name.to_string()))
        } else {
            Ok(())
        }
    }
}
