use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::{DEFAULT_BANNER_BUTTON_TEXT, DEFAULT_BANNER_BUTTON_URL};
use crate::ConfigError;

/// Max width of `stores.subdomain`.
const MAX_SUBDOMAIN_LEN: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSeed {
    /// Empty for the main domain.
    #[serde(default)]
    pub subdomain: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    /// Derived from the name when omitted.
    pub slug: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub children: Vec<CategorySeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowerTagSeed {
    pub name: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerSeed {
    pub telegram_id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Subdomains of the stores this manager may post to.
    #[serde(default)]
    pub stores: Vec<String>,
}

/// Homepage campaign banner, matched on `name` when re-seeding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeroBannerSeed {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default = "default_button_text")]
    pub button_text: String,
    #[serde(default = "default_button_url")]
    pub button_url: String,
    pub desktop_image: String,
    pub mobile_image: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    #[serde(default)]
    pub sort_order: i32,
}

fn default_true() -> bool {
    true
}

fn default_button_text() -> String {
    DEFAULT_BANNER_BUTTON_TEXT.to_string()
}

fn default_button_url() -> String {
    DEFAULT_BANNER_BUTTON_URL.to_string()
}

/// Contents of `config/catalog.yaml`.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub stores: Vec<StoreSeed>,
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
    #[serde(default)]
    pub flower_tags: Vec<FlowerTagSeed>,
    #[serde(default)]
    pub managers: Vec<ManagerSeed>,
    #[serde(default)]
    pub hero_banners: Vec<HeroBannerSeed>,
}

/// Load and validate the catalog seed file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog(path: &Path) -> Result<CatalogFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let catalog: CatalogFile =
        serde_yaml::from_str(&content).map_err(ConfigError::CatalogFileParse)?;

    validate_catalog(&catalog)?;

    Ok(catalog)
}

fn validate_catalog(catalog: &CatalogFile) -> Result<(), ConfigError> {
    let mut subdomains = HashSet::new();
    for store in &catalog.stores {
        if store.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "store name must be non-empty".to_string(),
            ));
        }
        let sub = store.subdomain.trim().to_lowercase();
        if sub.len() > MAX_SUBDOMAIN_LEN
            || !sub
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ConfigError::Validation(format!(
                "store '{}' has invalid subdomain '{}'",
                store.name, store.subdomain
            )));
        }
        if !subdomains.insert(sub) {
            return Err(ConfigError::Validation(format!(
                "duplicate store subdomain: '{}'",
                store.subdomain
            )));
        }
    }

    validate_categories(&catalog.categories, None)?;

    let mut tag_names = HashSet::new();
    for tag in &catalog.flower_tags {
        if tag.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "flower tag name must be non-empty".to_string(),
            ));
        }
        if !tag_names.insert(tag.name.trim().to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate flower tag: '{}'",
                tag.name
            )));
        }
    }

    let mut telegram_ids = HashSet::new();
    for manager in &catalog.managers {
        if manager.telegram_id <= 0 {
            return Err(ConfigError::Validation(format!(
                "manager '{}' has invalid telegram_id {}",
                manager.full_name, manager.telegram_id
            )));
        }
        if !telegram_ids.insert(manager.telegram_id) {
            return Err(ConfigError::Validation(format!(
                "duplicate manager telegram_id: {}",
                manager.telegram_id
            )));
        }
        for sub in &manager.stores {
            if !subdomains.contains(&sub.trim().to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "manager {} references unknown store subdomain '{sub}'",
                    manager.telegram_id
                )));
            }
        }
    }

    let mut banner_names = HashSet::new();
    for banner in &catalog.hero_banners {
        if banner.name.trim().is_empty() || banner.desktop_image.trim().is_empty() {
            return Err(ConfigError::Validation(
                "hero banner needs a name and a desktop image".to_string(),
            ));
        }
        if !banner_names.insert(banner.name.trim()) {
            return Err(ConfigError::Validation(format!(
                "duplicate hero banner: '{}'",
                banner.name
            )));
        }
        if let (Some(start), Some(end)) = (banner.starts_on, banner.ends_on) {
            if start > end {
                return Err(ConfigError::Validation(format!(
                    "hero banner '{}' ends before it starts",
                    banner.name
                )));
            }
        }
    }

    Ok(())
}

fn validate_categories(
    categories: &[CategorySeed],
    parent: Option<&str>,
) -> Result<(), ConfigError> {
    let mut siblings = HashSet::new();
    for category in categories {
        let name = category.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Validation(format!(
                "category name must be non-empty (parent: {})",
                parent.unwrap_or("<root>")
            )));
        }
        if !siblings.insert(name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate category '{name}' under {}",
                parent.unwrap_or("<root>")
            )));
        }
        validate_categories(&category.children, Some(name))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "seed_test.rs"]
mod tests;
