//! String helpers for IRIs and user-supplied names: local names, bracket
//! stripping, prefix stripping and the ASCII normalization used both to
//! resolve identifiers and to mint new entity names.

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref NON_WORD_RUN: Regex = Regex::new(r"[^0-9A-Za-z_]+").unwrap();
    static ref LEADING_DIGIT: Regex = Regex::new(r"^[0-9]").unwrap();
}

const FULL_IRI_SCHEMES: [&str; 4] = ["http://", "https://", "urn:", "file://"];

/// Removes surrounding `<` `>` and whitespace.
pub fn strip_brackets(s: &str) -> &str {
    let s = s.trim();
    match s.strip_prefix('<').and_then(|rest| rest.strip_suffix('>')) {
        Some(inner) => inner.trim(),
        None => s,
    }
}

/// True if `s` is written as a full IRI rather than a prefixed or bare name.
pub fn is_full_iri(s: &str) -> bool {
    let s = s.trim();
    if s.starts_with('<') && s.ends_with('>') {
        return true;
    }
    FULL_IRI_SCHEMES.iter().any(|scheme| s.starts_with(scheme))
}

/// The fragment of an IRI after its last `#`, then after its last `/`.
pub fn local_name(iri: &str) -> &str {
    let s = strip_brackets(iri);
    let after_hash = s.rsplit('#').next().unwrap_or(s);
    after_hash.rsplit('/').next().unwrap_or(after_hash)
}

/// Reduces `prefix:local`, `<iri>` or a full IRI to its local part.
pub fn strip_prefixed_local(s: &str) -> &str {
    let s = s.trim();
    if is_full_iri(s) {
        return local_name(s);
    }
    match s.split_once(':') {
        Some((_, local)) => local,
        None => local_name(s),
    }
}

/// Splits `prefix:local` when the text is not a full IRI.
pub fn split_prefixed(s: &str) -> Option<(&str, &str)> {
    let s = s.trim();
    if is_full_iri(s) {
        return None;
    }
    s.split_once(':')
}

/// NFKD-decomposes, drops non-ASCII, collapses runs of characters outside
/// `[0-9A-Za-z_]` into `_` and trims `_` from both ends.
pub fn normalize_identifier(name: &str) -> String {
    let ascii: String = name.nfkd().filter(|c| c.is_ascii()).collect();
    NON_WORD_RUN
        .replace_all(&ascii, "_")
        .trim_matches('_')
        .to_string()
}

/// Like [`normalize_identifier`], but the result is always usable as the
/// local part of a new IRI: never empty and never starting with a digit.
///
/// `"Poço Produção #1"` becomes `"Poco_Producao_1"`.
pub fn sanitize_local_name(name: &str) -> String {
    let s = normalize_identifier(name);
    if s.is_empty() {
        return "entity".to_string();
    }
    if LEADING_DIGIT.is_match(&s) {
        return format!("n_{}", s);
    }
    s
}
