//! Per-position character-class synthesis for free-text columns.

/// Character class a single position can fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Digit,
    UpperLatin,
    LowerLatin,
    UpperCyrillic,
    LowerCyrillic,
    Literal(char),
}

impl Bucket {
    fn of(ch: char) -> Self {
        match ch {
            '0'..='9' => Bucket::Digit,
            'A'..='Z' => Bucket::UpperLatin,
            'a'..='z' => Bucket::LowerLatin,
            'А'..='Я' => Bucket::UpperCyrillic,
            'а'..='я' => Bucket::LowerCyrillic,
            other => Bucket::Literal(other),
        }
    }

    fn push_to(self, group: &mut String, first: bool) {
        match self {
            Bucket::Digit => group.push_str("0-9"),
            Bucket::UpperLatin => group.push_str("A-Z"),
            Bucket::LowerLatin => group.push_str("a-z"),
            Bucket::UpperCyrillic => group.push_str("А-Я"),
            Bucket::LowerCyrillic => group.push_str("а-я"),
            Bucket::Literal(ch) => {
                let escape = matches!(ch, '\\' | '[' | ']' | '^' | '&' | '~')
                    || (ch == '-' && !first);
                if escape {
                    group.push('\\');
                }
                group.push(ch);
            }
        }
    }
}

/// Build a regular expression matching every input string position by
/// position.
///
/// Each position becomes one bracket group holding the union of classes seen
/// there, in first-seen order. The output has as many groups as the longest
/// input; an empty input yields an empty pattern.
///
/// ```
/// use tabmimic_profile::infer_pattern;
///
/// assert_eq!(infer_pattern(["abc", "a0c", "xyz"]), "[a-z][a-z0-9][a-z]");
/// ```
pub fn infer_pattern<I, S>(strings: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut positions: Vec<Vec<Bucket>> = Vec::new();
    for string in strings {
        for (index, ch) in string.as_ref().chars().enumerate() {
            if positions.len() <= index {
                positions.push(Vec::new());
            }
            let bucket = Bucket::of(ch);
            let seen = &mut positions[index];
            if !seen.contains(&bucket) {
                seen.push(bucket);
            }
        }
    }

    let mut pattern = String::new();
    for buckets in positions {
        let mut group = String::new();
        for (idx, bucket) in buckets.into_iter().enumerate() {
            bucket.push_to(&mut group, idx == 0);
        }
        pattern.push('[');
        pattern.push_str(&group);
        pattern.push(']');
    }
    pattern
}
