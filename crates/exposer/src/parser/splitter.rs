//! Splitting of comma separated argument lists.

const DELIMITER: char = ',';
const QUALIFIER: char = '"';

/// Splits `input` on commas outside double quotes.
///
/// Whitespace around each delimiter is dropped. A token keeps its quotes
/// unless it both starts and ends with one and is longer than one
/// character, in which case exactly the outer pair is removed. Trailing empty
/// tokens are dropped, so empty input yields no arguments.
#[must_use]
pub fn split_arguments(input: &str) -> Vec<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for character in trimmed.chars() {
        match character {
            QUALIFIER => {
                quoted = !quoted;
                current.push(character);
            }
            DELIMITER if !quoted => tokens.push(std::mem::take(&mut current)),
            _ => current.push(character),
        }
    }
    tokens.push(current);
    while tokens.last().is_some_and(|token| token.trim().is_empty()) {
        tokens.pop();
    }
    tokens.iter().map(|token| unqualify(token.trim())).collect()
}

fn unqualify(token: &str) -> String {
    if token.chars().count() > 1 {
        if let Some(inner) = token
            .strip_prefix(QUALIFIER)
            .and_then(|rest| rest.strip_suffix(QUALIFIER))
        {
            return inner.to_owned();
        }
    }
    token.to_owned()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::empty("", &[])]
    #[case::blank("   ", &[])]
    #[case::single("hello", &["hello"])]
    #[case::spaces_around_commas("a ,b,  c", &["a", "b", "c"])]
    #[case::quoted_comma("\"a, b\", c", &["a, b", "c"])]
    #[case::inner_spaces_kept("\" padded \"", &[" padded "])]
    #[case::lone_quote("\"", &["\""])]
    #[case::empty_quotes("\"\"", &[""])]
    #[case::half_quoted("\"abc", &["\"abc"])]
    #[case::empty_middle("a,,b", &["a", "", "b"])]
    #[case::trailing_comma("a, b, ", &["a", "b"])]
    #[case::only_commas(" , ,", &[])]
    #[case::trailing_empty_quotes("a, \"\"", &["a", ""])]
    #[case::quote_inside("say \"hi\" now", &["say \"hi\" now"])]
    fn splits(#[case] input: &str, #[case] expected: &[&str]) {
        assert_eq!(split_arguments(input), expected);
    }
}
