use unicode_normalization::UnicodeNormalization;

/// 去除重音符號：NFD 分解後丟棄 combining marks（"José" -> "Jose"）
pub fn strip_accents(s: &str) -> String {
    s.nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect()
}

/// 比對用的正規化字串：去重音 + 小寫
pub fn fold_key(s: &str) -> String {
    strip_accents(s).to_lowercase()
}

/// 不分大小寫、不分重音的包含判斷
pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    fold_key(haystack).contains(&fold_key(needle))
}
