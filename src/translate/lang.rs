//! Application language tags to Microsoft Translator codes.

/// Simplified Chinese, legacy vendor code.
pub const CHINESE_SIMPLIFIED: &str = "zh-CHS";
/// Traditional Chinese, legacy vendor code.
pub const CHINESE_TRADITIONAL: &str = "zh-CHT";

/// Map a language tag such as `EN`, `pt-BR` or `zh_TW` to the code the
/// vendor expects. Chinese regions get the legacy script codes, every other
/// tag collapses to its lowercase base language.
pub fn normalize(tag: &str) -> String {
    let lower = tag.trim().replace('_', "-").to_ascii_lowercase();
    match lower.as_str() {
        "zh-cn" => CHINESE_SIMPLIFIED.to_string(),
        "zh-tw" | "zh-hk" => CHINESE_TRADITIONAL.to_string(),
        _ => lower.split('-').next().unwrap_or_default().to_string(),
    }
}
