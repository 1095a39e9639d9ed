//! Text accumulation for human-readable command output.
//!
//! `Texture` is a small append-only string builder with consistent
//! prefixes and alignment. Commands build their text output through it
//! instead of interleaving `println!` calls, so the same rendering path
//! serves both direct printing and the output envelope.

use std::fmt::Display;
use std::sync::OnceLock;

use is_terminal::IsTerminal;
use regex::Regex;

/// Fixed indentation used by [`Texture::indent`].
pub const INDENT: &str = "   ";

const NEWLINE: char = '\n';
const DEFAULT_COLUMN_DIVIDER: &str = "    ";

fn styling_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| {
        std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
    })
}

fn styled(value: &str, build: fn(console::Style) -> console::Style) -> String {
    if styling_enabled() {
        build(console::Style::new().force_styling(true))
            .apply_to(value)
            .to_string()
    } else {
        value.to_string()
    }
}

/// Bold text, when styling is enabled.
pub fn bold(value: &str) -> String {
    styled(value, |s| s.bold())
}

fn dim(value: &str) -> String {
    styled(value, |s| s.dim())
}

fn green(value: &str) -> String {
    styled(value, |s| s.green())
}

fn red(value: &str) -> String {
    styled(value, |s| s.red())
}

fn yellow(value: &str) -> String {
    styled(value, |s| s.yellow())
}

/// Wrap every quoted substring in bold, stripping the quote characters.
///
/// Both single- and double-quoted spans are matched non-greedily and
/// independently. Backslashes are not an escape character here: `\'`
/// ends a single-quoted span like any other `'`.
pub fn bold_quoted_words(value: &str) -> String {
    static SINGLE: OnceLock<Regex> = OnceLock::new();
    static DOUBLE: OnceLock<Regex> = OnceLock::new();
    let single = SINGLE.get_or_init(|| Regex::new(r"'([^']+)'").unwrap());
    let double = DOUBLE.get_or_init(|| Regex::new(r#""([^"]+)""#).unwrap());

    let value = single.replace_all(value, |caps: &regex::Captures| bold(&caps[1]));
    double
        .replace_all(&value, |caps: &regex::Captures| bold(&caps[1]))
        .into_owned()
}

/// Render a value the way a human wants to read it: strings verbatim,
/// everything else through its `Display` form.
pub fn inspect(value: &dyn Display) -> String {
    value.to_string()
}

/// Parameters for [`Texture::columns`].
pub struct Columns {
    /// Text between columns. Defaults to four spaces.
    pub divider: Option<String>,
    /// Row-major cell matrix. Ragged rows are padded with empty cells.
    pub rows: Vec<Vec<String>>,
}

fn layout_columns(parameters: &Columns) -> String {
    let divider = parameters
        .divider
        .as_deref()
        .unwrap_or(DEFAULT_COLUMN_DIVIDER);

    let column_count = parameters
        .rows
        .iter()
        .map(|row| row.len())
        .max()
        .unwrap_or(0);
    let mut widths = vec![0usize; column_count];
    for row in &parameters.rows {
        for (index, cell) in row.iter().enumerate() {
            widths[index] = widths[index].max(cell.chars().count());
        }
    }

    let lines: Vec<String> = parameters
        .rows
        .iter()
        .map(|row| {
            (0..column_count)
                .map(|index| {
                    let cell = row.get(index).map(String::as_str).unwrap_or("");
                    let padding = widths[index] - cell.chars().count();
                    format!("{cell}{}", " ".repeat(padding))
                })
                .collect::<Vec<_>>()
                .join(divider)
        })
        .collect();

    lines.join("\n")
}

/// Append-only multi-line text builder.
///
/// Every method fully computes its addition before touching the
/// accumulator, then appends exactly once.
#[derive(Debug, Default, Clone)]
pub struct Texture {
    value: String,
}

impl Texture {
    pub fn new() -> Self {
        Self::default()
    }

    /// The accumulated text.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Consume the builder and return the accumulated text.
    pub fn into_value(self) -> String {
        self.value
    }

    /// Append a line.
    pub fn line(&mut self, value: impl AsRef<str>) -> &mut Self {
        let mut addition = String::from(value.as_ref());
        addition.push(NEWLINE);
        self.value.push_str(&addition);
        self
    }

    /// Append a bare newline.
    pub fn line_empty(&mut self) -> &mut Self {
        self.value.push(NEWLINE);
        self
    }

    /// Append another builder's text verbatim. No extra newline is
    /// added since builders already terminate their own lines.
    pub fn block(&mut self, other: &Texture) -> &mut Self {
        self.value.push_str(&other.value);
        self
    }

    /// Append a line indented by three spaces.
    pub fn indent(&mut self, value: impl AsRef<str>) -> &mut Self {
        let mut addition = String::from(INDENT);
        addition.push_str(value.as_ref());
        addition.push(NEWLINE);
        self.value.push_str(&addition);
        self
    }

    /// Append a `=== `-prefixed header line with the value bolded.
    pub fn header(&mut self, value: impl AsRef<str>) -> &mut Self {
        let addition = format!("{}{}\n", dim("=== "), bold(value.as_ref()));
        self.value.push_str(&addition);
        self
    }

    /// Append a ✔-prefixed line.
    pub fn success(&mut self, value: impl Display) -> &mut Self {
        let addition = format!("{} {}\n", green("✔"), inspect(&value));
        self.value.push_str(&addition);
        self
    }

    /// Append a ✖-prefixed line.
    pub fn failure(&mut self, value: impl Display) -> &mut Self {
        let addition = format!("{} {}\n", red("✖"), inspect(&value));
        self.value.push_str(&addition);
        self
    }

    /// Append an ℹ-prefixed line.
    pub fn info(&mut self, value: impl Display) -> &mut Self {
        let addition = format!("{} {}\n", yellow("ℹ"), inspect(&value));
        self.value.push_str(&addition);
        self
    }

    /// Append a ⚠-prefixed line.
    pub fn warning(&mut self, value: impl Display) -> &mut Self {
        let addition = format!("{} {}\n", yellow("⚠"), inspect(&value));
        self.value.push_str(&addition);
        self
    }

    /// Append a column-aligned block. Every cell is padded to the
    /// widest cell in its column.
    pub fn columns(&mut self, parameters: Columns) -> &mut Self {
        let mut addition = layout_columns(&parameters);
        addition.push(NEWLINE);
        self.value.push_str(&addition);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(cells: &[&[&str]]) -> Vec<Vec<String>> {
        cells
            .iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn plain_text_passes_through_bolding_unchanged() {
        let input = "no quotes in here at all";
        assert_eq!(bold_quoted_words(input), input);
    }

    #[test]
    fn single_quoted_text_is_bolded_and_stripped() {
        // NO_COLOR is not guaranteed in the test environment, but test
        // binaries never run against a tty so bold() is the identity.
        assert_eq!(bold_quoted_words("field 'User.name' was removed"), "field User.name was removed");
    }

    #[test]
    fn double_quoted_text_is_bolded_and_stripped() {
        assert_eq!(bold_quoted_words(r#"type "Query" changed"#), "type Query changed");
    }

    #[test]
    fn multiple_quoted_spans_are_bolded_independently() {
        assert_eq!(
            bold_quoted_words(r#"'a' and "b" and 'c'"#),
            "a and b and c"
        );
    }

    #[test]
    fn backslash_is_not_an_escape_character() {
        // The backslash belongs to the matched span; the quote after it
        // still closes the span.
        assert_eq!(bold_quoted_words(r"'a\' b"), r"a\ b");
    }

    #[test]
    fn unmatched_quote_is_left_alone() {
        assert_eq!(bold_quoted_words("it's fine"), "it's fine");
    }

    #[test]
    fn builder_appends_in_call_order() {
        let mut t = Texture::new();
        t.line("one").indent("two").line_empty().line("three");
        assert_eq!(t.value(), "one\n   two\n\nthree\n");
    }

    #[test]
    fn nested_builder_is_appended_without_extra_newline() {
        let mut inner = Texture::new();
        inner.line("inner");
        let mut outer = Texture::new();
        outer.line("before").block(&inner).line("after");
        assert_eq!(outer.value(), "before\ninner\nafter\n");
    }

    #[test]
    fn glyph_lines_use_fixed_prefixes() {
        let mut t = Texture::new();
        t.success("ok").failure("bad").info("fyi").warning("careful");
        assert_eq!(t.value(), "✔ ok\n✖ bad\nℹ fyi\n⚠ careful\n");
    }

    #[test]
    fn header_prefix() {
        let mut t = Texture::new();
        t.header("Summary");
        assert_eq!(t.value(), "=== Summary\n");
    }

    #[test]
    fn columns_pad_each_cell_to_the_widest_in_its_column() {
        let text = layout_columns(&Columns {
            divider: None,
            rows: rows(&[&["a", "bbb"], &["cc", "d"]]),
        });
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["a     bbb", "cc    d  "]);
        // Column zero is two wide in both rows, divider is four spaces.
        assert!(lines.iter().all(|l| l.chars().count() == 9));
    }

    #[test]
    fn columns_accept_ragged_rows() {
        let text = layout_columns(&Columns {
            divider: Some(" | ".into()),
            rows: rows(&[&["x"], &["yy", "z"]]),
        });
        assert_eq!(text, "x  |  \nyy | z");
    }
}
