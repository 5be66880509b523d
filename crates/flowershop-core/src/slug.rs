//! URL slugs for catalog entities.
//!
//! Names in the catalog are mostly Russian/Belarusian, so slugs are built from
//! a Latin transliteration rather than by dropping non-ASCII characters.

/// Column width of every `slug` column in the schema.
pub const MAX_SLUG_LEN: usize = 120;

/// Room kept free at the end of a base slug for a `-NNN` collision suffix.
const SUFFIX_RESERVE: usize = 10;

fn transliterate(c: char) -> Option<&'static str> {
    let mapped = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' | 'э' => "e",
        'ё' => "io",
        'ж' => "zh",
        'з' => "z",
        'и' | 'й' | 'і' => "i",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' | 'ў' => "u",
        'ф' => "f",
        'х' => "kh",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "shch",
        'ъ' | 'ь' => "",
        'ы' => "y",
        'ю' => "iu",
        'я' => "ia",
        _ => return None,
    };
    Some(mapped)
}

/// Build a lowercase ASCII slug: letters and digits are kept (Cyrillic is
/// transliterated), quotes are dropped, everything else becomes a single `-`.
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars().flat_map(char::to_lowercase) {
        if matches!(c, '\'' | '"' | '’' | '`' | '«' | '»') {
            continue;
        }
        let piece: Option<String> = if c.is_ascii_alphanumeric() {
            Some(c.to_string())
        } else {
            transliterate(c).map(str::to_string)
        };

        match piece {
            Some(p) if p.is_empty() => {}
            Some(p) => {
                if pending_dash && !out.is_empty() {
                    out.push('-');
                }
                pending_dash = false;
                out.push_str(&p);
            }
            None => pending_dash = true,
        }
    }

    out
}

/// Pick the first free slug among `base`, `base-{first_suffix}`,
/// `base-{first_suffix + 1}`, ...
///
/// The base is cut so the result always fits [`MAX_SLUG_LEN`].
pub fn unique_slug<F>(base: &str, first_suffix: u32, mut is_taken: F) -> String
where
    F: FnMut(&str) -> bool,
{
    let base = truncate_slug(base, MAX_SLUG_LEN - SUFFIX_RESERVE);
    if !is_taken(&base) {
        return base;
    }
    let mut counter = first_suffix;
    loop {
        let candidate = format!("{base}-{counter}");
        if !is_taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Cut an ASCII slug to at most `max` bytes without leaving a trailing dash.
#[must_use]
pub fn truncate_slug(slug: &str, max: usize) -> String {
    if slug.len() <= max {
        return slug.to_string();
    }
    slug[..max].trim_end_matches('-').to_string()
}
