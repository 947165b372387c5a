//! Configuration module for docharvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use docharvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawling {} to depth {}", config.crawl.base_url, config.crawl.max_depth);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    AuthConfig, Config, CrawlConfig, CrawlMode, DocumentsConfig, FilterConfig, HttpConfig,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
