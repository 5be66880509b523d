pub mod app_config;
pub mod cart;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod seed;
pub mod slug;
pub mod urls;

pub use app_config::{AppConfig, Environment};
pub use cart::{
    apply_discount, normalize_discount_code, validate_discount_percent, Cart, CartError,
    MAX_QTY_PER_LINE,
};
pub use catalog::{
    clean_title, parse_price, validate_review, HeroWindow, ReviewDraft, ShowcaseChannel,
    DEFAULT_BOT_TITLE, SHOWCASE_LIMIT,
};
pub use classify::{classify_product, CategoryRef};
pub use config::{load_app_config, load_app_config_from_env};
pub use seed::{load_catalog, CatalogFile};
pub use slug::{slugify, unique_slug};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read catalog file {path}: {source}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog file: {0}")]
    CatalogFileParse(#[from] serde_yaml::Error),
    #[error("catalog validation failed: {0}")]
    Validation(String),
}

/// Domain rule violations surfaced to API callers as validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid showcase channel: {0}")]
    InvalidShowcaseChannel(String),
    #[error("invalid price: {0}")]
    InvalidPrice(String),
    #[error("{field}: {message}")]
    InvalidField {
        field: &'static str,
        message: &'static str,
    },
}
