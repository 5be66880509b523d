//! Keyword-based category assignment for imported bouquets.
//!
//! Rules are checked in a fixed order against the lowercased title, then the
//! comma-separated composition text. A matching rule commits to its keyword
//! even when no category name contains it; only the rose and "main flower"
//! rules fall through on a miss.

/// Minimal view of a category used for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
}

struct Matcher<'a> {
    categories: Vec<(String, &'a CategoryRef)>,
}

impl<'a> Matcher<'a> {
    fn new(categories: &'a [CategoryRef]) -> Self {
        Self {
            categories: categories
                .iter()
                .map(|c| (c.name.trim().to_lowercase(), c))
                .collect(),
        }
    }

    /// First category whose lowercased name contains `keyword`.
    fn find(&self, keyword: &str) -> Option<i64> {
        self.categories
            .iter()
            .find(|(name, _)| name.contains(keyword))
            .map(|(_, c)| c.id)
    }

    fn find_either(&self, first: &str, second: &str) -> Option<i64> {
        self.find(first).or_else(|| self.find(second))
    }
}

const TITLE_RULES: &[&str] = &["мыло", "игрушк", "корзин"];

const FLOWER_RULES: &[&str] = &[
    "пион",
    "хризантем",
    "тюльпан",
    "гербер",
    "лили",
    "орхиде",
    "ирис",
    "гвоздик",
    "альстромери",
    "эустом",
    "гортензи",
];

const MAIN_FLOWERS: &[&str] = &[
    "роз",
    "хризантем",
    "пион",
    "тюльпан",
    "гербер",
    "лили",
    "гвоздик",
    "ирис",
];

/// Pick a category id for a product, or `None` when no rule applies.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn classify_product(
    title: &str,
    composition: &str,
    categories: &[CategoryRef],
) -> Option<i64> {
    let m = Matcher::new(categories);
    let n = title.to_lowercase();
    let c = composition.to_lowercase();

    for keyword in TITLE_RULES {
        if n.contains(keyword) {
            return m.find(keyword);
        }
    }

    if (n.contains("композиц") && n.contains("коробк")) || n.contains("в коробке") {
        return m.find("коробк");
    }
    if n.contains("композиц") {
        return m.find("композиц");
    }
    if n.contains("невест") {
        return m.find("невест");
    }
    if n.contains("свадеб") {
        return m.find("свадеб");
    }
    if ["траур", "похорон", "ритуал"].iter().any(|k| n.contains(k)) {
        return m.find_either("траур", "ритуал");
    }
    for keyword in ["сухоцвет", "премиум", "интерьер", "авторск"] {
        if n.contains(keyword) {
            return m.find(keyword);
        }
    }

    if n.contains("из роз") || n.contains("роз ") || n.ends_with(" роз") {
        if let Some(id) = m.find_either("из роз", "роз") {
            return Some(id);
        }
    }
    for keyword in FLOWER_RULES {
        if n.contains(keyword) {
            return m.find(keyword);
        }
    }

    let tags: Vec<&str> = c.split(',').map(str::trim).collect();
    let tagged = |needle: &str| tags.iter().any(|t| t.contains(needle));

    if c.contains("мыло ручной") {
        return m.find("мыло");
    }
    if tagged("авторск") {
        return m.find("авторск");
    }
    if tagged("корзин") && n.contains("композиц") {
        return m.find("корзин");
    }

    if n.contains("8 март") || c.contains("8 марта") {
        return m.find("8 март");
    }
    if n.contains("23 фев") || c.contains("23 февраля") {
        return m.find("23 фев");
    }
    if n.contains("день рожд") {
        return m.find("рожд");
    }
    if n.contains("валентин") {
        return m.find("валентин");
    }
    if n.contains("день учител") {
        return m.find("учител");
    }

    if n.contains("букет") {
        if n.contains("моно") {
            return m.find("моно");
        }
        if n.contains("полев") {
            return m.find("полев");
        }
        for flower in MAIN_FLOWERS {
            if n.contains(flower) {
                if let Some(id) = m.find(flower) {
                    return Some(id);
                }
            }
        }
    }

    if ["комнатн", "горшк", "горшок", "горшеч"]
        .iter()
        .any(|k| n.contains(k))
    {
        return m.find_either("комнатн", "горшк");
    }
    if n.contains("шар ") || n.contains("шары") || n.ends_with(" шар") {
        return m.find("шар");
    }
    if n.contains("букет") && n.contains("микс") {
        return m.find("микс");
    }
    if ["сладост", "конфет", "шоколад"].iter().any(|k| n.contains(k)) {
        return m.find_either("сладост", "подарк");
    }

    None
}
