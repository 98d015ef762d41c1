//! Generators for slugs, access codes, order numbers and affiliate codes.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use rand::seq::IndexedRandom;
use regex::Regex;

/// Length of a store access code.
const ACCESS_CODE_LENGTH: usize = 24;

/// Uppercase letters and digits, for codes a human may have to type.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("Invalid regex"));

/// Turn free text into a URL slug: accents folded, lowercase ASCII
/// alphanumerics joined by single hyphens.
///
/// ```
/// use vitrine_server::services::codes::slugify;
///
/// assert_eq!(slugify("Café & Açaí da Praça"), "cafe-acai-da-praca");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let folded: String = text.chars().map(fold_accent).collect::<String>().to_lowercase();
    NON_SLUG_CHARS
        .replace_all(&folded, "-")
        .trim_matches('-')
        .to_string()
}

/// Map a Latin accented letter to its base letter.
fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        'ñ' => 'n',
        'Ñ' => 'N',
        other => other,
    }
}

/// Candidate slug for the `attempt`-th try: the base itself first, then
/// `base-2`, `base-3`, ...
#[must_use]
pub fn slug_candidate(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{base}-{attempt}")
    }
}

/// Random alphanumeric access code for a new store.
#[must_use]
pub fn generate_access_code() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ACCESS_CODE_LENGTH)
        .map(char::from)
        .collect()
}

/// `count` random characters from [`CODE_ALPHABET`].
fn random_code_chars(count: usize) -> String {
    let mut rng = rand::rng();
    (0..count)
        .filter_map(|_| CODE_ALPHABET.choose(&mut rng).copied().map(char::from))
        .collect()
}

/// Order number such as `ORD-M5X2K1ABC-7QZ3`: base-36 milliseconds plus a
/// random suffix.
#[must_use]
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
    format!("ORD-{}-{}", to_base36(millis), random_code_chars(4))
}

/// Affiliate referral code: up to six alphanumerics of the name, uppercased,
/// followed by four random characters.
///
/// ```
/// use vitrine_server::services::codes::generate_affiliate_code;
///
/// let code = generate_affiliate_code("Maria José");
/// assert!(code.starts_with("MARIAJ"));
/// assert_eq!(code.len(), 10);
/// ```
#[must_use]
pub fn generate_affiliate_code(name: &str) -> String {
    let prefix: String = name
        .chars()
        .map(fold_accent)
        .filter(char::is_ascii_alphanumeric)
        .take(6)
        .collect::<String>()
        .to_ascii_uppercase();
    format!("{prefix}{}", random_code_chars(4))
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        let digit = u32::try_from(value % 36).unwrap_or_default();
        digits.push(
            char::from_digit(digit, 36)
                .unwrap_or('0')
                .to_ascii_uppercase(),
        );
        value /= 36;
    }
    digits.iter().rev().collect()
}
