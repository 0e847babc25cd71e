//! Crawl configuration
//!
//! Configuration comes from the command line rather than a config file:
//! a seed URL, a maximum traversal depth, and a worker count.

use crate::LindenError;
use url::Url;

/// Default maximum BFS depth from the seed's direct children
pub const DEFAULT_MAX_DEPTH: u32 = 3;

/// Default number of concurrent workers
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Configuration for a single crawl run
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// The crawl's starting page
    pub seed: Url,

    /// Maximum depth; entries with `depth >= max_depth` are rejected
    pub max_depth: u32,

    /// Number of concurrent workers draining the queue
    pub concurrency: usize,
}

impl CrawlConfig {
    /// Creates a configuration with the default depth and concurrency
    pub fn new(seed: Url) -> Self {
        Self {
            seed,
            max_depth: DEFAULT_MAX_DEPTH,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Validates the configuration
    ///
    /// Concurrency must be at least 1; the bound of 100 keeps a typo from
    /// opening hundreds of sockets against one site.
    pub fn validate(&self) -> Result<(), LindenError> {
        if self.concurrency < 1 || self.concurrency > 100 {
            return Err(LindenError::Config(format!(
                "concurrency must be between 1 and 100, got {}",
                self.concurrency
            )));
        }

        if self.seed.scheme() != "http" && self.seed.scheme() != "https" {
            return Err(LindenError::Config(format!(
                "seed URL must be http or https, got scheme '{}'",
                self.seed.scheme()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = CrawlConfig::new(seed());
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.concurrency, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = CrawlConfig::new(seed());
        config.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_excessive_concurrency_rejected() {
        let mut config = CrawlConfig::new(seed());
        config.concurrency = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_http_seed_rejected() {
        let mut config = CrawlConfig::new(seed());
        config.seed = Url::parse("ftp://example.com/").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_depth_zero_is_valid() {
        let mut config = CrawlConfig::new(seed());
        config.max_depth = 0;
        assert!(config.validate().is_ok());
    }
}
