//! Canonical region keys used to match a bazar's city against recipient allow-lists.
//!
//! Region names arrive in Uzbek Latin, Russian Cyrillic and English spellings, with or
//! without "city"/"region" qualifiers. They are reduced to a compact lowercase form and
//! then mapped through a static alias table onto the Uzbek Latin spelling.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Qualifiers dropped from region names before alias lookup.
const QUALIFIERS: &[&str] = &[
    "shahri", "shahar", "viloyati", "viloyat", "tumani", "city", "region", "oblast", "г",
    "город", "гор", "область", "обл", "район",
];

static REGION_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let groups: &[(&str, &[&str])] = &[
        ("toshkent", &["toshkent", "tashkent", "ташкент", "тошкент"]),
        ("fargona", &["fargona", "fergana", "ferghana", "фергана", "фаргона"]),
        ("namangan", &["namangan", "наманган"]),
        ("andijon", &["andijon", "andijan", "андижан", "андижон"]),
        ("buxoro", &["buxoro", "bukhara", "buhara", "бухара", "бухоро"]),
        ("jizzax", &["jizzax", "jizzakh", "jizak", "джизак", "жиззах"]),
        ("navoiy", &["navoiy", "navoi", "навои", "навоий"]),
        (
            "qashqadaryo",
            &["qashqadaryo", "kashkadarya", "кашкадарья", "қашқадарё"],
        ),
        ("samarqand", &["samarqand", "samarkand", "самарканд", "самарқанд"]),
        ("sirdaryo", &["sirdaryo", "syrdarya", "сырдарья", "сирдарё"]),
        (
            "surxondaryo",
            &["surxondaryo", "surkhandarya", "сурхандарья", "сурхондарё"],
        ),
        ("xorazm", &["xorazm", "khorezm", "khorazm", "хорезм", "хоразм"]),
        (
            "qoraqalpogiston",
            &[
                "qoraqalpogiston",
                "karakalpakstan",
                "каракалпакстан",
                "қорақалпоғистон",
            ],
        ),
    ];

    let mut aliases = HashMap::new();
    for (canonical, spellings) in groups {
        for spelling in *spellings {
            aliases.insert(*spelling, *canonical);
        }
    }
    aliases
});

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'ā' => 'a',
        'é' | 'è' | 'ê' | 'ë' | 'ē' => 'e',
        'í' | 'ì' | 'î' | 'ï' | 'ı' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ō' => 'o',
        'ú' | 'ù' | 'û' | 'ü' | 'ū' => 'u',
        'ç' => 'c',
        'ğ' => 'g',
        'ş' => 's',
        'ñ' => 'n',
        'ё' => 'е',
        other => other,
    }
}

fn is_apostrophe(c: char) -> bool {
    matches!(c, '\'' | '`' | 'ʻ' | 'ʼ' | '‘' | '’' | '´')
}

/// Lowercases, folds diacritics, drops apostrophes and turns other punctuation into
/// word breaks. Returns the remaining words.
fn normalized_words(name: &str) -> Vec<String> {
    let cleaned: String = name
        .chars()
        .flat_map(char::to_lowercase)
        .map(fold_diacritic)
        .filter(|c| !is_apostrophe(*c))
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Returns the canonical key for a region name, or `None` for blank input.
///
/// Known spellings map to one key (`"Toshkent shahri"`, `"г. Ташкент"` and `"tashkent"`
/// all become `"toshkent"`); unknown names fall back to the cleaned, space-free form.
pub fn canonical_region_key(name: &str) -> Option<String> {
    let words = normalized_words(name);
    let meaningful: Vec<&str> = words
        .iter()
        .map(String::as_str)
        .filter(|w| !QUALIFIERS.contains(w))
        .collect();

    // A name made only of qualifiers keeps its words rather than vanishing.
    let compact = if meaningful.is_empty() {
        words.concat()
    } else {
        meaningful.concat()
    };
    if compact.is_empty() {
        return None;
    }

    let key = REGION_ALIASES
        .get(compact.as_str())
        .map(|canonical| canonical.to_string())
        .unwrap_or(compact);
    Some(key)
}

/// A recipient is eligible when it has no allow-list, when the bazar has no region, or
/// when the bazar's canonical region appears in the canonicalised allow-list.
pub fn region_allowed(allowed_regions: &[String], bazar_region: Option<&str>) -> bool {
    if allowed_regions.is_empty() {
        return true;
    }
    let Some(bazar_key) = bazar_region.and_then(canonical_region_key) else {
        return true;
    };
    allowed_regions
        .iter()
        .filter_map(|r| canonical_region_key(r))
        .any(|key| key == bazar_key)
}
