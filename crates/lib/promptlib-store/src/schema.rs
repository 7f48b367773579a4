pub const TOOL_LIST_PROMPTS: &str = "list_available_prompts";
pub const TOOL_GET_PROMPT_BY_NAME: &str = "get_prompt_by_name";
pub const TOOL_SEARCH_PROMPTS: &str = "search_prompts";
pub const TOOL_REFRESH_CACHE: &str = "refresh_prompt_cache";

pub const DERIVED_TOOL_PREFIX: &str = "get_";
pub const DIGIT_STEM_PREFIX: &str = "prompt_";
pub const EMPTY_STEM: &str = "prompt";

pub const METADATA_RESOURCE_URI: &str = "prompt://metadata";

/// Strips the final extension from a document identifier.
#[must_use]
pub fn file_stem(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    }
}

/// Derives the tool name published for a document identifier.
///
/// The stem is lowercased, `-`, `.` and whitespace become `_`, anything else
/// outside `[a-z0-9_]` is dropped and runs of `_` collapse. Distinct
/// identifiers can still map to the same name; callers detect that.
#[must_use]
pub fn make_tool_name(file_name: &str) -> String {
    let mut stem = String::with_capacity(file_name.len());
    for ch in file_stem(file_name).chars() {
        let mapped = match ch {
            '-' | '.' => '_',
            ch if ch.is_whitespace() => '_',
            ch if ch.is_ascii_alphanumeric() || ch == '_' => ch.to_ascii_lowercase(),
            _ => continue,
        };
        if mapped == '_' && (stem.is_empty() || stem.ends_with('_')) {
            continue;
        }
        stem.push(mapped);
    }
    while stem.ends_with('_') {
        stem.pop();
    }

    if stem.is_empty() {
        stem.push_str(EMPTY_STEM);
    } else if stem.starts_with(|ch: char| ch.is_ascii_digit()) {
        stem.insert_str(0, DIGIT_STEM_PREFIX);
    }
    format!("{DERIVED_TOOL_PREFIX}{stem}")
}
