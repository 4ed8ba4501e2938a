/*!
 * Locale tag utilities.
 *
 * Interchange documents, traces and skeletons carry locale tags such as
 * `en`, `fr-CA` or `pt_BR`. The primary language subtag is validated
 * against ISO 639-1 / ISO 639-2 and tags are compared loosely.
 */

use anyhow::{Result, anyhow};
use isolang::Language;

/// Language code type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

// ISO 639-2/B codes that differ from their 639-2/T counterpart
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

fn part2b_to_part2t(code: &str) -> Option<&'static str> {
    PART2B_TO_PART2T
        .iter()
        .find(|(b, _)| *b == code)
        .map(|(_, t)| *t)
}

/// Validate if a language code is a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    let normalized_code = code.trim().to_lowercase();

    match normalized_code.len() {
        2 if Language::from_639_1(&normalized_code).is_some() => Ok(LanguageCodeType::Part1),
        3 if Language::from_639_3(&normalized_code).is_some() => Ok(LanguageCodeType::Part2T),
        3 if part2b_to_part2t(&normalized_code).is_some() => Ok(LanguageCodeType::Part2B),
        _ => Err(anyhow!("Invalid language code: {}", code)),
    }
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(normalized_code);
        }
        if let Some(part2t) = part2b_to_part2t(&normalized_code) {
            return Ok(part2t.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Primary language subtag of a locale tag (`pt` for `pt-BR`)
pub fn primary_subtag(tag: &str) -> &str {
    tag.trim().split(['-', '_']).next().unwrap_or("")
}

/// Canonical spelling of a locale tag: `-` separators, lowercase language,
/// uppercase two-letter region (`pt_br` becomes `pt-BR`)
pub fn normalize_locale(tag: &str) -> String {
    let mut parts = tag.trim().split(['-', '_']);
    let mut normalized = parts.next().unwrap_or("").to_lowercase();
    for part in parts {
        normalized.push('-');
        if part.len() == 2 {
            normalized.push_str(&part.to_uppercase());
        } else {
            normalized.push_str(part);
        }
    }
    normalized
}

/// Validate a locale tag by its primary subtag
pub fn validate_locale(tag: &str) -> Result<LanguageCodeType> {
    let primary = primary_subtag(tag);
    if primary.is_empty() {
        return Err(anyhow!("Empty locale tag"));
    }
    validate_language_code(primary).map_err(|_| anyhow!("Invalid locale tag: {}", tag))
}

/// Whether two locale tags name the same locale, ignoring case and the
/// `-`/`_` separator choice
pub fn locale_tags_match(tag1: &str, tag2: &str) -> bool {
    normalize_locale(tag1).eq_ignore_ascii_case(&normalize_locale(tag2))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(normalized1), Ok(normalized2)) => normalized1 == normalized2,
        _ => false,
    }
}

/// Get the language name for a locale tag's primary subtag
pub fn get_language_name(tag: &str) -> Result<String> {
    let normalized = normalize_to_part2t(primary_subtag(tag))?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}
