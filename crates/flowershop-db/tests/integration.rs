//! Offline unit tests for flowershop-db pool configuration and row types.
//! These tests do not require a live database connection.

use flowershop_core::{AppConfig, Environment};
use flowershop_db::{PoolConfig, ProductFilter, ProductRow, ReviewPatch, SlugTarget};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        catalog_path: PathBuf::from("./config/catalog.yaml"),
        public_base_url: "https://flowers.example".to_string(),
        media_root: PathBuf::from("./media"),
        media_url: "/media/".to_string(),
        max_upload_bytes: 1024,
        bot_secret: None,
        cart_ttl_days: 14,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`ProductRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn product_row_has_expected_fields() {
    use chrono::Utc;
    use rust_decimal::Decimal;

    let row = ProductRow {
        id: 10,
        title: "Букет из 15 роз".to_string(),
        article: "main-10".to_string(),
        description: String::new(),
        price: Some(Decimal::new(8990, 2)),
        image: String::new(),
        uploaded_image: Some("product_uploads/ab/abcdef.jpg".to_string()),
        is_online_showcase: true,
        showcase_channel: "both".to_string(),
        showcase_sort_order: 0,
        category_id: None,
        category_name: None,
        slug: "buket-iz-15-roz".to_string(),
        is_published: true,
        created_by: Some(1),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    assert_eq!(row.article, "main-10");
    assert_eq!(row.price, Some(Decimal::new(8990, 2)));
    assert!(row.category_name.is_none());
}

#[test]
fn product_filter_default_is_published_only_and_unbounded_filters() {
    let filter = ProductFilter::default();
    assert!(filter.category.is_none());
    assert!(filter.store_subdomain.is_none());
    assert!(filter.flower_tag.is_none());
    assert!(!filter.online_showcase);
    assert!(!filter.include_unpublished);
}

#[test]
fn review_patch_default_changes_nothing() {
    let patch = ReviewPatch::default();
    assert!(patch.is_published.is_none());
    assert!(patch.sort_order.is_none());
}

#[test]
fn slug_targets_have_distinct_fallbacks() {
    assert_eq!(SlugTarget::Category.fallback_prefix(), "category");
    assert_eq!(SlugTarget::FlowerTag.fallback_prefix(), "flower");
    assert_eq!(SlugTarget::Product.fallback_prefix(), "product");
}
