//! Public URL helpers for images and storefront links.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Shown on catalog listings, product pages and cart lines when a product has
/// no image.
pub const PRODUCT_PLACEHOLDER: &str = "/static/hero/today-desktop.svg";

/// Shown on homepage and store showcase cards and on category cards.
pub const HOME_PLACEHOLDER: &str = "/static/legacy-old/image/no_image.jpg";

/// Characters left untouched in a query value (`-_.~/` plus alphanumerics).
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Reduce an absolute URL with a path to that path, so legacy image links keep
/// working on any host. Relative URLs and URLs without a path pass through.
#[must_use]
pub fn normalize_public_url(raw: &str) -> String {
    if raw.is_empty() || raw.starts_with('/') {
        return raw.to_string();
    }
    let Some((scheme, rest)) = raw.split_once("://") else {
        return raw.to_string();
    };
    if scheme.is_empty() {
        return raw.to_string();
    }
    let before_query = rest.split(['?', '#']).next().unwrap_or_default();
    match before_query.find('/') {
        Some(idx) if idx > 0 => before_query[idx..].to_string(),
        _ => raw.to_string(),
    }
}

/// Join a media-relative path onto the media prefix (which ends in `/`).
#[must_use]
pub fn media_url(media_prefix: &str, relative: &str) -> String {
    format!("{media_prefix}{}", relative.trim_start_matches('/'))
}

/// True for a non-empty stored reference that names a file under the media
/// root rather than an absolute or site-relative URL.
#[must_use]
pub fn is_media_relative(stored: &str) -> bool {
    !(stored.is_empty()
        || stored.starts_with("http://")
        || stored.starts_with("https://")
        || stored.starts_with('/'))
}

/// Resolve a stored file reference that may already be an absolute or
/// site-relative URL.
#[must_use]
pub fn media_or_legacy_url(media_prefix: &str, stored: &str) -> String {
    if is_media_relative(stored) {
        media_url(media_prefix, stored)
    } else {
        stored.to_string()
    }
}

/// Image for a product card: uploaded file, then the external image, then
/// `placeholder`.
#[must_use]
pub fn product_image_url(
    uploaded_image: Option<&str>,
    image: &str,
    media_prefix: &str,
    placeholder: &str,
) -> String {
    if let Some(path) = uploaded_image.filter(|p| !p.is_empty()) {
        return media_url(media_prefix, path);
    }
    if !image.is_empty() {
        return normalize_public_url(image);
    }
    placeholder.to_string()
}

/// Link target of a homepage category card.
#[must_use]
pub fn category_card_href(slug: &str, name: &str) -> String {
    if slug.is_empty() {
        format!(
            "/store/?category={}",
            utf8_percent_encode(name, QUERY_VALUE)
        )
    } else {
        format!("/store/category/{slug}/")
    }
}

/// Storefront link of a product card.
#[must_use]
pub fn product_href(slug: &str, id: i64) -> String {
    if slug.is_empty() {
        format!("/store/{id}/")
    } else {
        format!("/store/{slug}/")
    }
}

/// Second image shown on hover: the external image when there is one,
/// otherwise the card image again.
#[must_use]
pub fn product_hover_image(image: &str, card_image: &str) -> String {
    if image.is_empty() {
        card_image.to_string()
    } else {
        normalize_public_url(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_keeps_relative_and_pathless_urls() {
        assert_eq!(normalize_public_url(""), "");
        assert_eq!(normalize_public_url("/media/a.jpg"), "/media/a.jpg");
        assert_eq!(normalize_public_url("https://old.example"), "https://old.example");
        assert_eq!(normalize_public_url("https://old.example/"), "/");
        assert_eq!(normalize_public_url("images/a.jpg"), "images/a.jpg");
    }

    #[test]
    fn normalize_strips_host_and_query() {
        assert_eq!(
            normalize_public_url("http://old.example:8080/images/rose.jpg?v=2"),
            "/images/rose.jpg"
        );
    }

    #[test]
    fn product_image_prefers_upload_then_external() {
        let external = "https://x.example/a.jpg";
        assert_eq!(
            product_image_url(Some("products/ab.jpg"), external, "/media/", PRODUCT_PLACEHOLDER),
            "/media/products/ab.jpg"
        );
        assert_eq!(
            product_image_url(None, external, "/media/", PRODUCT_PLACEHOLDER),
            "/a.jpg"
        );
        assert_eq!(
            product_image_url(Some(""), "", "/media/", HOME_PLACEHOLDER),
            HOME_PLACEHOLDER
        );
    }

    #[test]
    fn legacy_urls_pass_through() {
        assert_eq!(media_or_legacy_url("/media/", ""), "");
        assert_eq!(
            media_or_legacy_url("/media/", "https://cdn.example/h.jpg"),
            "https://cdn.example/h.jpg"
        );
        assert_eq!(
            media_or_legacy_url("/media/", "hero_banners/spring.jpg"),
            "/media/hero_banners/spring.jpg"
        );
    }

    #[test]
    fn only_bare_paths_are_media_relative() {
        assert!(is_media_relative("products/a.jpg"));
        assert!(!is_media_relative(""));
        assert!(!is_media_relative("/static/legacy-old/image/no_image.jpg"));
        assert!(!is_media_relative("http://old.example/a.jpg"));
    }

    #[test]
    fn category_href_uses_slug_or_encoded_name() {
        assert_eq!(category_card_href("rozy", "Розы"), "/store/category/rozy/");
        assert_eq!(
            category_card_href("", "Розы и пионы"),
            "/store/?category=%D0%A0%D0%BE%D0%B7%D1%8B%20%D0%B8%20%D0%BF%D0%B8%D0%BE%D0%BD%D1%8B"
        );
    }

    #[test]
    fn product_links_prefer_slug() {
        assert_eq!(product_href("rozy-15", 7), "/store/rozy-15/");
        assert_eq!(product_href("", 7), "/store/7/");
    }

    #[test]
    fn hover_image_falls_back_to_card_image() {
        assert_eq!(product_hover_image("", "/media/products/a.jpg"), "/media/products/a.jpg");
        assert_eq!(
            product_hover_image("https://old.example/img/b.jpg", "/media/products/a.jpg"),
            "/img/b.jpg"
        );
    }
}
