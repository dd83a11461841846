/*!
Latexlang unit testing library

This is a crate for writing unit tests for code that uses Latexlang.
It is used by the Latexlang integration tests,
    so those tests are good examples of what this crate can do.

## Test types

### Round trip tests

Run using [`run_round_trip_test`].

These tests verify that parsing a LaTeX snippet and rendering the resulting tree
    reproduces the snippet byte for byte.
They also verify that parsing the rendered output again gives a tree of the same shape.

### Structure tests

Run using [`run_structure_test`].

These tests verify that a LaTeX snippet parses to a tree of a specific shape.
The shape of a tree is written in a compact notation built by the [`shape`] function:
    each node is written as its kind,
    followed by its children in square brackets if it has any.
The root itself is omitted. For example
```tex
\section{Intro} text $x$
```
has the shape
```text
Command[Argument[Text]] Text Math[Text]
```

### Failure tests

Run using [`run_failure_test`].

These tests verify that a LaTeX snippet fails to parse,
    and that the title of the error contains a given fragment.

### Serde tests

Run using [`run_serde_test`].

These tests verify that a parse tree can be serialized and deserialized without
    changing how it renders.
They are only run when the `serde` feature is enabled.

### Random round trip tests

Run using [`run_random_round_trip_test`].

These tests generate a random well-formed document and run a round trip test on it.

## The test suite macro

The preferred way to write a suite of unit tests is to use the [`test_suite`] macro.
See the macro's documentation for instructions on using it.
*/

use latexlang::token::Encoding;
use latexlang::{NodeId, ParserOptions, Tree};
use rand::SeedableRng;

/// Option passed to a test runner.
pub enum TestOption {
    /// The initial encoding of the input.
    Encoding(Encoding),
    /// An additional environment whose body is not tokenized.
    RawEnvironment(&'static str),
    /// An additional environment whose body is typeset in math mode.
    MathEnvironment(&'static str),
}

fn resolve_options(options: &[TestOption]) -> ParserOptions {
    let mut resolved = ParserOptions::default();
    for option in options {
        resolved = match option {
            TestOption::Encoding(encoding) => resolved.with_encoding(*encoding),
            TestOption::RawEnvironment(name) => resolved.with_raw_environment(*name),
            TestOption::MathEnvironment(name) => resolved.with_math_environment(*name),
        };
    }
    resolved
}

fn parse(input: &[u8], options: &[TestOption]) -> Tree {
    match latexlang::parse_with_options(input, resolve_options(options)) {
        Ok(tree) => tree,
        Err(err) => {
            println!("{err}");
            if let Some(dump) = err.tree_dump() {
                println!("Partial tree:\n{dump}");
            }
            panic!("Failed to parse input");
        }
    }
}

/// Returns the shape of the subtree rooted at the node.
///
/// See the crate documentation for the notation.
pub fn shape(tree: &Tree, id: NodeId) -> String {
    let children = tree
        .children(id)
        .iter()
        .map(|child| shape(tree, *child))
        .collect::<Vec<String>>()
        .join(" ");
    if id == tree.root() {
        return children;
    }
    if children.is_empty() {
        format!["{:?}", tree.kind(id)]
    } else {
        format!["{:?}[{}]", tree.kind(id), children]
    }
}

/// Run a round trip test.
///
/// The test passes if rendering the parsed tree reproduces the input,
///     and parsing the rendered output gives a tree of the same shape.
pub fn run_round_trip_test(input: &[u8], options: &[TestOption]) {
    let tree = parse(input, options);
    let output = tree.to_latex(tree.root());
    similar_asserts::assert_eq!(
        String::from_utf8_lossy(&output),
        String::from_utf8_lossy(input)
    );
    assert_eq!(output, input);

    let reparsed = parse(&output, options);
    similar_asserts::assert_eq!(
        shape(&reparsed, reparsed.root()),
        shape(&tree, tree.root())
    );
}

/// Run a structure test.
///
/// The test passes if the input parses to a tree with the expected shape.
pub fn run_structure_test(input: &str, want: &str, options: &[TestOption]) {
    let tree = parse(input.as_bytes(), options);
    let got = shape(&tree, tree.root());
    if got != want {
        println!("Tree:\n{}", tree.dump(tree.root()));
    }
    similar_asserts::assert_eq!(got, want);
}

/// Run a failure test.
///
/// The test passes if parsing fails with an error whose title contains the fragment.
pub fn run_failure_test(input: &str, title_fragment: &str, options: &[TestOption]) {
    let result = latexlang::parse_with_options(input.as_bytes(), resolve_options(options));
    match result {
        Ok(tree) => {
            println!("Parsing succeeded:");
            println!("{}", tree.dump(tree.root()));
            panic!("Parsing failure test did not pass: parsing successful");
        }
        Err(err) => {
            let title = err.title();
            assert!(
                title.contains(title_fragment),
                "error title `{title}` does not contain `{title_fragment}`"
            );
        }
    }
}

/// Format to use in a serde test.
pub enum SerdeFormat {
    Json,
}

#[cfg(not(feature = "serde"))]
/// Run a serialization/deserialization test
pub fn run_serde_test(_input: &str, _options: &[TestOption], _format: SerdeFormat) {}

#[cfg(feature = "serde")]
/// Run a serialization/deserialization test
///
/// The test passes if the deserialized tree renders and dumps the same as the original.
pub fn run_serde_test(input: &str, options: &[TestOption], format: SerdeFormat) {
    let tree = parse(input.as_bytes(), options);
    let deserialized: Tree = match format {
        SerdeFormat::Json => {
            let serialized = serde_json::to_string_pretty(&tree).unwrap();
            println!("Serialized tree: {serialized}");
            serde_json::from_str(&serialized).unwrap()
        }
    };
    similar_asserts::assert_eq!(
        deserialized.dump(deserialized.root()).to_string(),
        tree.dump(tree.root()).to_string()
    );
    assert_eq!(
        deserialized.to_latex(deserialized.root()),
        input.as_bytes().to_vec()
    );
}

/// Run a round trip test on a randomly generated document.
pub fn run_random_round_trip_test(seed: u64, num_items: usize, max_depth: usize) {
    let weights = Default::default();
    let mut rng = rand::prelude::StdRng::seed_from_u64(seed);
    let input =
        performance::generate_random_latex_document(&mut rng, num_items, max_depth, &weights);
    run_round_trip_test(input.as_bytes(), &[]);
}

/// Macro to generate a suite of unit tests
///
/// The general use of this macros looks like this:
/// ```
/// # use latexlang_testing::*;
/// test_suite![
///     options(TestOption::RawEnvironment("minted")),
///     round_trip_tests(
///         (case_1, r"\section{Intro}"),
///     ),
///     structure_tests(
///         (case_2, r"\section{Intro}", "Command[Argument[Text]]"),
///     ),
///     failure_tests(
///         (case_3, "a }", "unmatched"),
///     ),
/// ];
/// ```
///
/// The arguments to the macro are:
///
/// - `options(option_1, option_2, ..., option_n)`: options to pass to the test runner.
///     This is a list of values of type [TestOption].
///     The options can be omitted, in which case no options are passed.
///
/// - `round_trip_tests(cases...)`: a list of round trip test cases.
///     Each case is of the form (case name, input).
///     The data here is fed into the [run_round_trip_test] test runner.
///
/// - `structure_tests(cases...)`: a list of structure test cases.
///     Each case is of the form (case name, input, shape).
///     The data here is fed into the [run_structure_test] test runner.
///
/// - `failure_tests(cases...)`: a list of failure test cases.
///     Each case is of the form (case name, input, error title fragment).
///     The data here is fed into the [run_failure_test] test runner.
///
/// - `serde_tests(cases...)`: a list of serde test cases.
///     Each case is of the form (case name, input).
///     The data here is fed into the [run_serde_test] test runner.
///
/// Only one `options()` argument may be provided, and if provided it must be in the first position.
/// Zero or more of the other arguments may be provided, and in any order.
#[macro_export]
macro_rules! test_suite {
    ( options $options: tt, round_trip_tests ( $( ($name: ident, $input: expr $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let input: &str = $input;
                let options: Vec<latexlang_testing::TestOption> = vec! $options;
                latexlang_testing::run_round_trip_test(input.as_bytes(), &options);
            }
        )*
    );
    ( options $options: tt, structure_tests ( $( ($name: ident, $input: expr, $want: expr $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let options: Vec<latexlang_testing::TestOption> = vec! $options;
                latexlang_testing::run_structure_test($input, $want, &options);
            }
        )*
    );
    ( options $options: tt, failure_tests ( $( ($name: ident, $input: expr, $fragment: expr $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let options: Vec<latexlang_testing::TestOption> = vec! $options;
                latexlang_testing::run_failure_test($input, $fragment, &options);
            }
        )*
    );
    ( options $options: tt, serde_tests ( $( ($name: ident, $input: expr $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            mod $name {
                #[allow(unused_imports)]
                use super::*;
                #[cfg_attr(not(feature = "serde"), ignore)]
                #[test]
                fn json() {
                    let options: Vec<latexlang_testing::TestOption> = vec! $options;
                    latexlang_testing::run_serde_test($input, &options, latexlang_testing::SerdeFormat::Json);
                }
            }
        )*
    );
    ( options $options: tt, round_trip_tests $test_body: tt $(,)? ) => (
        compile_error!("Invalid test cases for round_trip_tests: must be a list of tuples (name, input)");
    );
    ( options $options: tt, structure_tests $test_body: tt $(,)? ) => (
        compile_error!("Invalid test cases for structure_tests: must be a list of tuples (name, input, shape)");
    );
    ( options $options: tt, failure_tests $test_body: tt $(,)? ) => (
        compile_error!("Invalid test cases for failure_tests: must be a list of tuples (name, input, error title fragment)");
    );
    ( options $options: tt, $test_kind: ident $test_cases: tt $(,)? ) => (
        compile_error!("Invalid keyword: test_suite! only accepts the following keywords: `options`, `round_trip_tests`, `structure_tests`, `failure_tests`, `serde_tests`");
    );
    ( options $options: tt, $( $test_kind: ident $test_cases: tt ),+ $(,)? ) => (
        $(
            latexlang_testing::test_suite![options $options, $test_kind $test_cases,];
        )+
    );
    ( $( $test_kind: ident $test_cases: tt ),+ $(,)? ) => (
        latexlang_testing::test_suite![options (), $( $test_kind $test_cases, )+ ];
    );
}
