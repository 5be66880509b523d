//! Catalog rules shared by the server and the CLI: showcase channels, prices,
//! titles, banner date windows and public review validation.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Homepage showcase size.
pub const SHOWCASE_LIMIT: i64 = 24;

/// Title given to bot uploads that arrive without one.
pub const DEFAULT_BOT_TITLE: &str = "Букет";

/// Slug base used when a title transliterates to nothing.
pub const FALLBACK_PRODUCT_SLUG: &str = "buket";

/// Call-to-action defaults for hero banners.
pub const DEFAULT_BANNER_BUTTON_TEXT: &str = "Перейти в каталог";
pub const DEFAULT_BANNER_BUTTON_URL: &str = "/store";

/// Upper bound a manager may enter for a bouquet price through the bot.
pub const MAX_BOT_PRICE: Decimal = Decimal::from_parts(999_999, 0, 0, false, 0);

/// Largest value a `NUMERIC(10,2)` price column holds.
const MAX_STORED_PRICE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Delivery channel a showcase product is offered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShowcaseChannel {
    Delivery,
    Pickup,
    #[default]
    Both,
}

impl ShowcaseChannel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ShowcaseChannel::Delivery => "delivery",
            ShowcaseChannel::Pickup => "pickup",
            ShowcaseChannel::Both => "both",
        }
    }
}

impl std::fmt::Display for ShowcaseChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShowcaseChannel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delivery" => Ok(ShowcaseChannel::Delivery),
            "pickup" => Ok(ShowcaseChannel::Pickup),
            "both" => Ok(ShowcaseChannel::Both),
            other => Err(CoreError::InvalidShowcaseChannel(other.to_string())),
        }
    }
}

/// Title as shown on storefront cards: slashes become spaces, then trimmed.
#[must_use]
pub fn clean_title(title: &str) -> String {
    title.replace(['/', '\\'], " ").trim().to_string()
}

/// `"Parent → Child"` for nested categories, the bare name for roots.
#[must_use]
pub fn category_display_name(name: &str, parent_name: Option<&str>) -> String {
    match parent_name {
        Some(parent) => format!("{parent} → {name}"),
        None => name.to_string(),
    }
}

/// Parse a price typed by a person. A comma decimal separator is accepted and
/// the result is rounded to kopecks.
///
/// # Errors
///
/// Returns [`CoreError::InvalidPrice`] for non-numeric input, negative values
/// or values that do not fit the price column.
pub fn parse_price(raw: &str) -> Result<Decimal, CoreError> {
    let normalized = raw.trim().replace(',', ".");
    let value = Decimal::from_str(&normalized)
        .map_err(|_| CoreError::InvalidPrice(raw.trim().to_string()))?;
    check_price(value)
}

/// Validate an already-numeric price for storage.
///
/// # Errors
///
/// Returns [`CoreError::InvalidPrice`] when negative or too large.
pub fn check_price(value: Decimal) -> Result<Decimal, CoreError> {
    let value = value.round_dp(2);
    if value.is_sign_negative() && !value.is_zero() {
        return Err(CoreError::InvalidPrice(value.to_string()));
    }
    if value > MAX_STORED_PRICE {
        return Err(CoreError::InvalidPrice(value.to_string()));
    }
    Ok(value)
}

/// Price rule for bot uploads: strictly positive and at most [`MAX_BOT_PRICE`].
///
/// # Errors
///
/// Returns [`CoreError::InvalidPrice`] when the value is unparseable or out of range.
pub fn parse_bot_price(raw: &str) -> Result<Decimal, CoreError> {
    let value = parse_price(raw)?;
    if value.is_zero() || value > MAX_BOT_PRICE {
        return Err(CoreError::InvalidPrice(raw.trim().to_string()));
    }
    Ok(value)
}

/// Activity window of a hero banner. Either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeroWindow {
    pub is_active: bool,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
}

impl HeroWindow {
    #[must_use]
    pub fn is_live_on(&self, today: NaiveDate) -> bool {
        let starts_ok = self.starts_on.is_none_or(|d| d <= today);
        let ends_ok = self.ends_on.is_none_or(|d| d >= today);
        self.is_active && starts_ok && ends_ok
    }
}

/// Lenient ISO date parsing used by banner payloads: bad input is dropped.
#[must_use]
pub fn parse_optional_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

/// A review submitted from the public site form.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewDraft {
    pub author: String,
    #[serde(default)]
    pub company: String,
    pub text: String,
    #[serde(default = "default_rating")]
    pub rating: i16,
}

fn default_rating() -> i16 {
    5
}

/// Trim and validate a public review.
///
/// # Errors
///
/// Returns [`CoreError::InvalidField`] naming the first offending field.
pub fn validate_review(draft: ReviewDraft) -> Result<ReviewDraft, CoreError> {
    let author = draft.author.trim().to_string();
    if author.chars().count() < 2 {
        return Err(CoreError::InvalidField {
            field: "author",
            message: "Укажите имя (минимум 2 символа).",
        });
    }
    let text = draft.text.trim().to_string();
    if text.chars().count() < 10 {
        return Err(CoreError::InvalidField {
            field: "text",
            message: "Текст отзыва слишком короткий.",
        });
    }
    if !(1..=5).contains(&draft.rating) {
        return Err(CoreError::InvalidField {
            field: "rating",
            message: "Оценка должна быть от 1 до 5.",
        });
    }
    Ok(ReviewDraft {
        author,
        company: draft.company.trim().to_string(),
        text,
        rating: draft.rating,
    })
}
