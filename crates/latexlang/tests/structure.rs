use latexlang_testing::*;

test_suite![
    structure_tests(
        (command_with_argument, r"\section{Intro}", "Command[Argument[Text]]"),
        (
            whitespace_before_argument,
            r"\section {Intro}",
            "Command[Whitespace Argument[Text]]"
        ),
        (
            optional_and_mandatory_arguments,
            r"\mycmd[opt]{x} y",
            "Command[Argument[Text] Argument[Text]] Text"
        ),
        (prose_brackets_are_text, "The interval is [0, 1].", "Text"),
        (group_after_text, r"\foo a {b}", "Command Text Group[Text]"),
        (consecutive_commands, r"\a\b", "Command Command"),
        (comment, "a % c\nb", "Text Comment Text"),
        (active_character, "a~b", "Text Command Text"),
        (
            math_separated_by_whitespace,
            "$a$ $$b$$",
            "Math[Text] Whitespace Math[Text]"
        ),
        (paren_math, r"\(a\)", "Math[Text]"),
        (verb, r"\verb|x|", "Verbatim"),
        (
            environment,
            "\\begin{center}\nx\n\\end{center}",
            "Environment[Command[Argument[Text]] Text Command[Argument[Text]]]"
        ),
        (
            math_environment,
            r"\begin{align*}x\end{align*}",
            "MathEnvironment[Command[Argument[Text]] Text Command[Argument[Text]]]"
        ),
        (
            raw_environment,
            "\\begin{verbatim}\n\\x{ $\n\\end{verbatim}",
            "Environment[Command[Argument[Text]] Text Command[Argument[Text]]]"
        ),
        (
            nested_environment,
            r"\begin{a}\begin{b}\end{b}\end{a}",
            "Environment[Command[Argument[Text]] Environment[Command[Argument[Text]] Command[Argument[Text]]] Command[Argument[Text]]]"
        ),
        (
            half_open_interval_in_math_environment,
            r"\begin{equation} x \in [0,1) \end{equation}",
            "MathEnvironment[Command[Argument[Text]] Text Command Text Command[Argument[Text]]]"
        ),
        (
            inline_math_inside_display_math,
            r"$$\text{$x$}$$",
            "Math[Command[Argument[Math[Text]]]]"
        ),
    ),
];

test_suite![
    options(TestOption::RawEnvironment("minted")),
    structure_tests(
        (
            custom_raw_environment,
            r"\begin{minted}{$}\end{minted}",
            "Environment[Command[Argument[Text]] Text Command[Argument[Text]]]"
        ),
    ),
];

test_suite![
    options(TestOption::MathEnvironment("mymath")),
    structure_tests(
        (
            custom_math_environment,
            r"\begin{mymath}x\end{mymath}",
            "MathEnvironment[Command[Argument[Text]] Text Command[Argument[Text]]]"
        ),
    ),
];
