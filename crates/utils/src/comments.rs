//! Comment stripping for JavaScript sources
//!
//! The output is only ever scanned for tokens, never executed, so the filter
//! errs on the side of keeping text: string and template literals are copied
//! verbatim. Regular expression literals are not recognised, so `/[/*]/`
//! opens a block comment and hides the code after it up to the next `*/`.

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    LineComment,
    BlockComment,
    Literal(char),
}

/// Remove `//` and `/* */` comments from `source`.
///
/// Newlines inside comments are kept so line structure survives; everything
/// else inside a comment is dropped.
pub fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut state = State::Code;

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = State::BlockComment;
                }
                '\'' | '"' | '`' => {
                    out.push(c);
                    state = State::Literal(c);
                }
                _ => out.push(c),
            },
            State::LineComment => {
                if c == '\n' {
                    out.push(c);
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Code;
                } else if c == '\n' {
                    out.push(c);
                }
            }
            State::Literal(quote) => {
                out.push(c);
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                } else if c == quote || (c == '\n' && quote != '`') {
                    // an unterminated quote ends at the line break
                    state = State::Code;
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strips_line_comments() {
        let src = "var x = 1; // require('fs')\nvar y = 2;";
        assert_eq!(strip_comments(src), "var x = 1; \nvar y = 2;");
    }

    #[test]
    fn test_strips_block_comments_keeping_newlines() {
        let src = "/*---\ndescription: uses eval( in prose\n---*/\nvar x;";
        assert_eq!(strip_comments(src), "\n\n\nvar x;");
    }

    #[test]
    fn test_keeps_comment_markers_inside_strings() {
        let src = r#"var url = "http://example.com"; var s = '/* not a comment */';"#;
        assert_eq!(strip_comments(src), src);
    }

    #[test]
    fn test_keeps_template_literals_across_lines() {
        let src = "var t = `line one\n// still template`;";
        assert_eq!(strip_comments(src), src);
    }

    #[test]
    fn test_escaped_quotes_do_not_end_literal() {
        let src = r#"var s = "a \" // b"; // gone"#;
        assert_eq!(strip_comments(src), r#"var s = "a \" // b"; "#);
    }

    #[test]
    fn test_unterminated_block_comment_drops_rest() {
        assert_eq!(strip_comments("a /* never closed"), "a ");
    }

    proptest! {
        #[test]
        fn prop_comment_free_code_is_unchanged(src in "[a-z0-9 ;=(){}+\\-\n]*") {
            prop_assert_eq!(strip_comments(&src), src);
        }

        #[test]
        fn prop_never_grows(src in ".*") {
            prop_assert!(strip_comments(&src).len() <= src.len());
        }
    }
}
