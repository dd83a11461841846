use latexlang_testing::*;

test_suite![
    failure_tests(
        (unmatched_brace, "a }", "unmatched closing delimiter `}`"),
        (unmatched_paren_math, r"a \)", "unmatched closing delimiter"),
        (mismatched_math_closer, r"\( a \]", "unmatched closing delimiter `\\]`"),
        (unclosed_brace, "{a", "delimiter `{` is never closed"),
        (unclosed_inline_math, "$a", "delimiter `$` is never closed"),
        (unclosed_display_math, "$$a", "delimiter `$$` is never closed"),
        (
            unclosed_environment,
            "\\begin{document}\nabc",
            "environment `document` is never closed"
        ),
        (
            end_across_group,
            r"\begin{center} { \end{center} }",
            "no matching opener found for `\\end{center}`"
        ),
        (
            end_name_mismatch,
            r"\begin{quote}\end{itemize}",
            "no matching opener found for `\\end{itemize}`"
        ),
        (end_without_name, r"\end center", "missing its environment name"),
        (unsupported_encoding, r"\usepackage[koi8-r]{inputenc}", "unsupported input encoding"),
        (unterminated_verb, r"\verb|abc", "input ended inside `\\verb`"),
        (
            unterminated_raw_environment,
            "\\begin{comment}\nabc",
            "input ended inside the `comment` environment"
        ),
        (malformed_hex_catcode, "\\catcode\"g=11", "malformed number"),
        (invalid_catcode, "\\catcode`\\@=16", "invalid category code 16"),
        (invalid_character_code, "\\catcode 1114112=11", "invalid character code 1114112"),
    ),
];

#[test]
fn error_lines() {
    let err = latexlang::parse_str("a\nb\n\\begin{x}\n{\n").err().unwrap();
    assert_eq!(err.line, 4);
    let err = latexlang::parse_str("a\n\n\\end{x}").err().unwrap();
    assert_eq!(err.line, 3);
}

#[test]
fn error_display() {
    colored::control::set_override(false);
    let err = latexlang::parse_str("\\begin{x}\n\\end{y}").err().unwrap();
    let message = format!["{err}"];
    assert!(
        message.starts_with("Error: no matching opener found for `\\end{y}`"),
        "{message}"
    );
    assert!(message.contains("2 | \\end{y}"), "{message}");
    assert!(message.contains("= note:"), "{message}");
}
