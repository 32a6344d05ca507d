use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Chunk<'a> {
    Text(String),
    Digits(&'a str),
}

fn chunks(value: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_digits = false;
    for (idx, ch) in value.char_indices() {
        let digit = ch.is_ascii_digit();
        if idx == 0 {
            in_digits = digit;
            continue;
        }
        if digit != in_digits {
            out.push(chunk(&value[start..idx], in_digits));
            start = idx;
            in_digits = digit;
        }
    }
    if !value.is_empty() {
        out.push(chunk(&value[start..], in_digits));
    }
    // Keep text and digit chunks at the same positions for every key.
    if matches!(out.first(), Some(Chunk::Digits(_))) {
        out.insert(0, Chunk::Text(String::new()));
    }
    out
}

fn chunk(raw: &str, digits: bool) -> Chunk<'_> {
    if digits {
        Chunk::Digits(raw)
    } else {
        Chunk::Text(raw.to_lowercase())
    }
}

/// Compares two digit runs by numeric value without parsing, so runs longer
/// than any integer type still order correctly.
fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Natural ordering: digit runs compare as numbers, everything else
/// compares case-insensitively, so `Q2` sorts before `Q10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let left = chunks(a);
    let right = chunks(b);
    for (l, r) in left.iter().zip(right.iter()) {
        let ord = match (l, r) {
            (Chunk::Digits(x), Chunk::Digits(y)) => compare_digits(x, y),
            (Chunk::Text(x), Chunk::Text(y)) => x.cmp(y),
            (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Less,
            (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    left.len().cmp(&right.len())
}

#[cfg(test)]
mod tests {
    use super::natural_cmp;
    use std::cmp::Ordering;

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut out = names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        out.sort_by(|a, b| natural_cmp(a, b));
        out
    }

    #[test]
    fn digit_runs_compare_numerically() {
        assert_eq!(sorted(&["Q10", "Q2", "Q1"]), vec!["Q1", "Q2", "Q10"]);
        assert_eq!(
            sorted(&["DEV.Q.10.IN", "DEV.Q.9.IN", "DEV.Q.9.A"]),
            vec!["DEV.Q.9.A", "DEV.Q.9.IN", "DEV.Q.10.IN"]
        );
    }

    #[test]
    fn text_runs_ignore_case() {
        assert_eq!(sorted(&["beta", "Alpha", "ALPHA2"]), vec!["Alpha", "ALPHA2", "beta"]);
        assert_eq!(natural_cmp("dev.queue", "DEV.QUEUE"), Ordering::Equal);
    }

    #[test]
    fn leading_zeros_and_huge_runs_are_numeric() {
        assert_eq!(natural_cmp("Q007", "Q7"), Ordering::Equal);
        assert_eq!(
            natural_cmp("Q99999999999999999999999", "Q100000000000000000000000"),
            Ordering::Less
        );
    }

    #[test]
    fn leading_digits_sort_before_letters() {
        assert_eq!(sorted(&["A", "10", "2"]), vec!["2", "10", "A"]);
        assert_eq!(sorted(&["Q1A", "Q1"]), vec!["Q1", "Q1A"]);
    }
}
