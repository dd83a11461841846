//! Random LaTeX documents for benchmarks and randomized round-trip tests.
//!
//! The generated documents are random but always parse:
//!     every group, math formula and environment that is opened is also closed.

use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::Rng;

static COMMAND_NAMES: [&str; 12] = [
    "emph", "textbf", "section", "item", "label", "ref", "cite", "hline", "newline", "LaTeX",
    "footnote", "noindent",
];

static ENVIRONMENT_NAMES: [&str; 5] = ["itemize", "center", "quote", "figure", "abstract"];

static MATH_ENVIRONMENT_NAMES: [&str; 4] = ["equation", "equation*", "align", "gather*"];

static WORDS: [&str; 16] = [
    "lorem", "ipsum", "dolor", "sit", "amet", "Knuth", "Lamport", "box", "glue", "42", "3.14",
    "e.g.,", "i.e.", "(see)", "yes!", "who?",
];

static MATH_ATOMS: [&str; 10] = [
    "x", "a+b", "\\alpha", "^2", "_i", "\\frac{1}{2}", "=", "\\sum_{i=0}^n", "(y)", "f'",
];

/// Relative frequencies of the constructs in a generated document.
pub struct Weights {
    pub text: u32,
    pub space: u32,
    pub newline: u32,
    pub comment: u32,
    pub command: u32,
    pub group: u32,
    pub inline_math: u32,
    pub display_math: u32,
    pub environment: u32,
    pub math_environment: u32,
    pub raw_environment: u32,
    pub verb: u32,
    pub prose_brackets: u32,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            text: 200,
            space: 40,
            newline: 20,
            comment: 10,
            command: 100,
            group: 20,
            inline_math: 20,
            display_math: 5,
            environment: 10,
            math_environment: 5,
            raw_environment: 2,
            verb: 5,
            prose_brackets: 10,
        }
    }
}

impl Weights {
    fn as_array(&self) -> [u32; 13] {
        [
            self.text,
            self.space,
            self.newline,
            self.comment,
            self.command,
            self.group,
            self.inline_math,
            self.display_math,
            self.environment,
            self.math_environment,
            self.raw_environment,
            self.verb,
            self.prose_brackets,
        ]
    }
}

/// Generates a random LaTeX document with `num_items` top level constructs.
///
/// Constructs are nested no deeper than `max_depth`.
///
/// Panics if all of the weights are zero.
pub fn generate_random_latex_document(
    rng: &mut StdRng,
    num_items: usize,
    max_depth: usize,
    weights: &Weights,
) -> String {
    let dist = rand::distributions::WeightedIndex::new(weights.as_array()).unwrap();
    let mut generator = Generator {
        rng,
        dist,
        max_depth,
        result: String::with_capacity(num_items * 8),
    };
    generator
        .result
        .push_str("% This LaTeX document was randomly generated by Latexlang.\n");
    generator.items(num_items, 0);
    generator.result
}

struct Generator<'a> {
    rng: &'a mut StdRng,
    dist: rand::distributions::WeightedIndex<u32>,
    max_depth: usize,
    result: String,
}

impl<'a> Generator<'a> {
    fn choose(&mut self, options: &[&'static str]) -> &'static str {
        options[self.rng.gen_range(0..options.len())]
    }

    fn items(&mut self, n: usize, depth: usize) {
        for _ in 0..n {
            self.item(depth);
        }
    }

    fn item(&mut self, depth: usize) {
        let mut kind = self.dist.sample(self.rng);
        // Constructs with children are replaced by text at the maximum depth.
        if depth >= self.max_depth && matches!(kind, 5..=10) {
            kind = 0;
        }
        match kind {
            0 => {
                let word = self.choose(&WORDS);
                self.result.push_str(word);
            }
            1 => self.result.push(' '),
            2 => self.result.push('\n'),
            3 => {
                let word = self.choose(&WORDS);
                self.result.push_str("% ");
                self.result.push_str(word);
                self.result.push('\n');
            }
            4 => {
                let name = self.choose(&COMMAND_NAMES);
                self.result.push('\\');
                self.result.push_str(name);
                // A separator so that the name does not run into following letters.
                if depth < self.max_depth && self.rng.gen_bool(0.5) {
                    self.result.push('{');
                    self.items(2, depth + 1);
                    self.result.push('}');
                } else {
                    self.result.push(' ');
                }
            }
            5 => {
                self.result.push('{');
                let n = self.rng.gen_range(0..4);
                self.items(n, depth + 1);
                self.result.push('}');
            }
            6 => {
                self.result.push('$');
                self.math(depth);
                self.result.push_str("$ ");
            }
            7 => {
                let (open, close) = if self.rng.gen_bool(0.5) {
                    ("$$", "$$ ")
                } else {
                    ("\\[", "\\] ")
                };
                self.result.push_str(open);
                self.math(depth);
                self.result.push_str(close);
            }
            8 => {
                let name = self.choose(&ENVIRONMENT_NAMES);
                self.result.push_str(&format!["\\begin{{{name}}}\n"]);
                let n = self.rng.gen_range(0..6);
                self.items(n, depth + 1);
                self.result.push_str(&format!["\n\\end{{{name}}}"]);
            }
            9 => {
                let name = self.choose(&MATH_ENVIRONMENT_NAMES);
                self.result.push_str(&format!["\\begin{{{name}}}"]);
                self.math(depth);
                self.result.push_str(&format!["\\end{{{name}}}"]);
            }
            10 => {
                self.result.push_str("\\begin{verbatim}\n");
                let word = self.choose(&WORDS);
                self.result
                    .push_str(&format!["% {word}\n\\textbf{{{word}}} {{ $ \\end{{x}}\n"]);
                self.result.push_str("\\end{verbatim}");
            }
            11 => {
                let word = self.choose(&WORDS);
                self.result.push_str(&format!["\\verb|{{{word}$|"]);
            }
            _ => {
                let a = self.rng.gen_range(0..10);
                let b = self.rng.gen_range(0..10);
                self.result.push_str(&format![" [{a}, {b}]"]);
            }
        }
    }

    fn math(&mut self, depth: usize) {
        let n = self.rng.gen_range(1..5);
        for _ in 0..n {
            if depth < self.max_depth && self.rng.gen_ratio(1, 10) {
                self.result.push_str("\\text{");
                self.items(2, depth + 1);
                self.result.push('}');
            } else {
                let atom = self.choose(&MATH_ATOMS);
                self.result.push_str(atom);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn generation_is_deterministic() {
        let weights = Default::default();
        let a = generate_random_latex_document(&mut StdRng::seed_from_u64(7), 50, 3, &weights);
        let b = generate_random_latex_document(&mut StdRng::seed_from_u64(7), 50, 3, &weights);
        assert_eq!(a, b);
    }

    #[test]
    fn groups_are_balanced() {
        let weights = Weights {
            raw_environment: 0,
            verb: 0,
            ..Default::default()
        };
        for seed in 0..20 {
            let doc = generate_random_latex_document(&mut StdRng::seed_from_u64(seed), 100, 4, &weights);
            let mut depth: i64 = 0;
            let mut escaped = false;
            for c in doc.chars() {
                match c {
                    '\\' => {
                        escaped = !escaped;
                        continue;
                    }
                    '{' if !escaped => depth += 1,
                    '}' if !escaped => depth -= 1,
                    _ => {}
                }
                escaped = false;
                assert!(depth >= 0, "{doc}");
            }
            assert_eq!(depth, 0, "{doc}");
        }
    }
}
