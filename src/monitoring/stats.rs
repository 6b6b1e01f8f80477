use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug)]
pub struct HeaderStats {
    request_count: AtomicUsize,
    cache_hit_count: AtomicUsize,
    render_count: AtomicUsize,
    override_count: AtomicUsize,
    start_time: Instant,
}

impl Default for HeaderStats {
    fn default() -> Self {
        Self {
            request_count: Default::default(),
            cache_hit_count: Default::default(),
            render_count: Default::default(),
            override_count: Default::default(),
            start_time: Instant::now(),
        }
    }
}

impl HeaderStats {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Requests served entirely from precomputed headers.
    #[inline]
    pub fn cache_hit_count(&self) -> usize {
        self.cache_hit_count.load(Ordering::Relaxed)
    }

    /// Headers rendered on demand because a request changed its configuration.
    #[inline]
    pub fn render_count(&self) -> usize {
        self.render_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn override_count(&self) -> usize {
        self.override_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    #[inline]
    pub(crate) fn record_request(&self, rendered: usize) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        if rendered == 0 {
            self.cache_hit_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.render_count.fetch_add(rendered, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn increment_override_count(&self) {
        self.override_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.request_count.store(0, Ordering::Relaxed);
        self.cache_hit_count.store(0, Ordering::Relaxed);
        self.render_count.store(0, Ordering::Relaxed);
        self.override_count.store(0, Ordering::Relaxed);
    }
}

impl fmt::Display for HeaderStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Secure Headers Statistics:")?;
        writeln!(f, "  Uptime: {} seconds", self.uptime_secs())?;
        writeln!(f, "  Requests processed: {}", self.request_count())?;
        writeln!(f, "  Served from cache: {}", self.cache_hit_count())?;
        writeln!(f, "  Headers rendered on demand: {}", self.render_count())?;
        writeln!(f, "  Overrides applied: {}", self.override_count())?;
        Ok(())
    }
}
