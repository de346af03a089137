//! Cache bypass policy

use conformer_core::SIDE_EFFECT_TOKENS;
use conformer_utils::strip_comments;

/// The first side-effect token found in the comment-stripped source.
///
/// A source with no token is cacheable. This is a substring heuristic: it
/// errs towards bypassing (`important` matches `import`) and does not see
/// dynamic evaluation reached through aliasing or string building. Regex
/// literals are not tokenised either, so a pattern such as `/[/*]/` opens a
/// block comment and any token after it up to the next `*/` goes unseen.
pub fn side_effect_token(raw_source: &str) -> Option<&'static str> {
    let code = strip_comments(raw_source);
    SIDE_EFFECT_TOKENS
        .iter()
        .copied()
        .find(|token| code.contains(token))
}
