//! Natural ordering of legend labels ("2" < "10", "c2" < "C10")

use std::cmp::Ordering;

#[derive(Debug, Clone)]
enum Chunk {
    Number(f64),
    Text(String),
}

impl Chunk {
    /// Text below `'0'`, then numbers, then all other text. This is where a
    /// digit run lands in a plain string comparison, kept consistent for
    /// signed and fractional numbers.
    fn rank(&self) -> u8 {
        match self {
            Chunk::Text(t) if t.as_str() < "0" => 0,
            Chunk::Number(_) => 1,
            Chunk::Text(_) => 2,
        }
    }
}

/// Whether a label reads as a number, e.g. `"3"`, `"-0.5"`, `"1e3"`
pub fn looks_numeric(label: &str) -> bool {
    parse_number(label.trim()).is_some()
}

fn parse_number(s: &str) -> Option<f64> {
    // "nan", "inf" and friends parse as f64 but are words to a reader
    if s.is_empty() || s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn chunks(label: &str) -> Vec<Chunk> {
    let s = label.trim().to_lowercase();
    if let Some(value) = parse_number(&s) {
        return vec![Chunk::Number(value)];
    }

    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_digits = false;
    for c in s.chars() {
        let is_digit = c.is_ascii_digit();
        if !current.is_empty() && is_digit != in_digits {
            out.push(finish(std::mem::take(&mut current), in_digits));
        }
        in_digits = is_digit;
        current.push(c);
    }
    if !current.is_empty() {
        out.push(finish(current, in_digits));
    }
    out
}

fn finish(run: String, digits: bool) -> Chunk {
    match digits.then(|| run.parse::<f64>().ok()).flatten() {
        Some(value) => Chunk::Number(value),
        None => Chunk::Text(run),
    }
}

/// Compare two labels naturally.
///
/// Labels are split into digit and non-digit runs. Digit runs compare as
/// numbers, other runs compare case-insensitively. A number facing text
/// sorts the way its leading digit would in a string comparison: after text
/// starting with a space or punctuation below `'0'`, before everything else.
/// A label that reads as a whole number, sign included, is one number run.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (xa, xb) = (chunks(a), chunks(b));
    for (ca, cb) in xa.iter().zip(xb.iter()) {
        let ord = match (ca, cb) {
            (Chunk::Number(na), Chunk::Number(nb)) => na.total_cmp(nb),
            (Chunk::Text(ta), Chunk::Text(tb)) => ta.cmp(tb),
            _ => ca.rank().cmp(&cb.rank()),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    xa.len().cmp(&xb.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut labels: Vec<&str>) -> Vec<&str> {
        labels.sort_by(|a, b| natural_cmp(a, b));
        labels
    }

    #[test]
    fn test_numbers_sort_numerically() {
        assert_eq!(sorted(vec!["10", "9", "1", "-2", "2.5"]), vec!["-2", "1", "2.5", "9", "10"]);
    }

    #[test]
    fn test_embedded_numbers() {
        assert_eq!(
            sorted(vec!["cluster 10", "cluster 2", "Cluster 1", "cluster 2b"]),
            vec!["Cluster 1", "cluster 2", "cluster 2b", "cluster 10"]
        );
    }

    #[test]
    fn test_text_is_case_insensitive() {
        assert_eq!(natural_cmp("beta", "Alpha"), Ordering::Greater);
        assert_eq!(natural_cmp("ALPHA", "alpha"), Ordering::Equal);
    }

    #[test]
    fn test_mixed_runs_compare_as_strings() {
        // "1x" vs "x1": digit run against text run, compared as "1" < "x"
        assert_eq!(natural_cmp("1x", "x1"), Ordering::Less);
        assert_eq!(natural_cmp("x1", "1x"), Ordering::Greater);
        assert_eq!(natural_cmp(" x", "1"), Ordering::Less);
    }

    #[test]
    fn test_signed_numbers_and_punctuation_order_consistently() {
        let labels = vec![".", "+50", "10", "-3", "_a", "a1", "#", "1.5", "+", "x", " 2", "-", "10a", "(b)", "7"];
        for a in &labels {
            for b in &labels {
                assert_eq!(natural_cmp(a, b), natural_cmp(b, a).reverse(), "{a:?} vs {b:?}");
                for c in &labels {
                    if natural_cmp(a, b).is_le() && natural_cmp(b, c).is_le() {
                        assert!(natural_cmp(a, c).is_le(), "{a:?} <= {b:?} <= {c:?}");
                    }
                }
            }
        }

        let mut shuffled = labels.clone();
        shuffled.reverse();
        shuffled.rotate_left(4);
        let sorted = sorted(shuffled);
        for pair in sorted.windows(2) {
            assert!(natural_cmp(pair[0], pair[1]).is_le(), "{:?}", pair);
        }
        let dot = sorted.iter().position(|l| *l == ".").unwrap();
        let ten = sorted.iter().position(|l| *l == "10").unwrap();
        let fifty = sorted.iter().position(|l| *l == "+50").unwrap();
        assert!(dot < ten && ten < fifty);
    }

    #[test]
    fn test_looks_numeric() {
        assert!(looks_numeric("3"));
        assert!(looks_numeric(" -0.5 "));
        assert!(looks_numeric("1e3"));
        assert!(!looks_numeric(""));
        assert!(!looks_numeric("nan"));
        assert!(!looks_numeric("inf"));
        assert!(!looks_numeric("T cells"));
    }
}
