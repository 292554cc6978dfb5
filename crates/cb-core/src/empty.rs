//! Labels that carry no information and get the neutral legend color

use serde::{Serialize, Deserialize};

/// Which legend labels count as "no value"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmptyLabelConfig {
    /// Labels drawn with the neutral color
    pub labels: Vec<String>,

    /// Ignore surrounding whitespace
    pub trim_whitespace: bool,

    /// Compare labels exactly instead of ASCII case-insensitively
    pub case_sensitive: bool,
}

impl Default for EmptyLabelConfig {
    fn default() -> Self {
        let labels = ["", "none", "unknown", "nan", "na", "undefined"];
        Self {
            labels: labels.iter().map(|s| s.to_string()).collect(),
            trim_whitespace: true,
            case_sensitive: false,
        }
    }
}

impl EmptyLabelConfig {
    /// Whether `label` reads as "no value"
    pub fn is_empty_label(&self, label: &str) -> bool {
        let label = if self.trim_whitespace { label.trim() } else { label };
        if self.case_sensitive {
            self.labels.iter().any(|l| l == label)
        } else {
            self.labels.iter().any(|l| l.eq_ignore_ascii_case(label))
        }
    }

    /// Treat one more label as empty
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        if !self.labels.contains(&label) {
            self.labels.push(label);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_empty_labels() {
        let config = EmptyLabelConfig::default();
        for label in ["", "   ", "none", "None", "UNKNOWN", "NaN", "NA", "na", "undefined", " Na "] {
            assert!(config.is_empty_label(label), "{label:?} should look empty");
        }
        for label in ["0", "T cell", "nan1", "n/a"] {
            assert!(!config.is_empty_label(label), "{label:?} should not look empty");
        }
    }

    #[test]
    fn test_extra_label() {
        let config = EmptyLabelConfig::default().with_label("n/a").with_label("n/a");
        assert_eq!(config.labels.len(), 7);
        assert!(config.is_empty_label("N/A"));
    }

    #[test]
    fn test_case_sensitive_matching() {
        let config = EmptyLabelConfig { case_sensitive: true, ..Default::default() };
        assert!(config.is_empty_label("none"));
        assert!(!config.is_empty_label("None"));
    }
}
