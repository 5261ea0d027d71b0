pub mod blocks;
pub mod sections;

use sections::Section;

/// An issue body parsed once into labeled sections: text → blocks → sections.
#[derive(Debug, Clone)]
pub struct Form {
    sections: Vec<Section>,
}

impl Form {
    pub fn parse(body: &str) -> Self {
        let blocks = blocks::classify_lines(body);
        Self {
            sections: sections::cluster_sections(&blocks),
        }
    }

    fn section(&self, label: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.is_labeled(label))
    }

    /// Free-text value under `label`; empty when the label is absent.
    pub fn field(&self, label: &str) -> String {
        self.section(label).map(Section::text).unwrap_or_default()
    }

    /// Checked options listed under `label`; empty when absent.
    pub fn checked(&self, label: &str) -> Vec<String> {
        self.section(label).map(Section::checked).unwrap_or_default()
    }
}

pub fn extract_field(body: &str, label: &str) -> String {
    Form::parse(body).field(label)
}

pub fn extract_checked(body: &str, label: &str) -> Vec<String> {
    Form::parse(body).checked(label)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.md", name)).unwrap()
    }

    #[test]
    fn sunshine_fields() {
        let body = fixture("sunshine");
        assert_eq!(extract_field(&body, "Activity name"), "Sunshine Playground");
        assert_eq!(extract_field(&body, "City"), "Taoyuan");
        assert_eq!(extract_field(&body, "Cost Range (NTD)"), "0");
        assert_eq!(extract_field(&body, "Indoor / Outdoor"), "Outdoor");
    }

    #[test]
    fn sunshine_checkboxes() {
        let body = fixture("sunshine");
        assert_eq!(
            extract_checked(&body, "Categories (select at least one)"),
            vec!["Playground".to_string(), "Park".to_string()]
        );
        assert_eq!(
            extract_checked(&body, "Features"),
            vec!["Natural shade".to_string()]
        );
    }

    #[test]
    fn issue_form_headings() {
        let body = fixture("issue_form");
        assert_eq!(extract_field(&body, "Activity name"), "Riverside Science Hall");
        assert_eq!(extract_field(&body, "Official Website (optional)"), "");
        assert_eq!(
            extract_checked(&body, "Categories (select at least one)"),
            vec!["Museum".to_string()]
        );
    }

    #[test]
    fn missing_label_is_empty() {
        let body = fixture("sunshine");
        assert_eq!(extract_field(&body, "Nonexistent"), "");
        assert!(extract_checked(&body, "Nonexistent").is_empty());
    }

    #[test]
    fn value_runs_to_end_without_trailing_label() {
        let body = "**Activity name**: A\n**Description**: line one\nline two\n";
        assert_eq!(extract_field(body, "Description"), "line one\nline two");
    }

    #[test]
    fn first_section_wins() {
        let body = "**City**: First\n**City**: Second";
        assert_eq!(extract_field(body, "City"), "First");
    }

    #[test]
    fn garbage_never_fails() {
        for body in ["", "\r\n\r\n", "**", "- [x]", "**City**", "### \n- [y] nope", "\u{0}\u{feff}"] {
            let form = Form::parse(body);
            let _ = form.field("City");
            let _ = form.checked("Features");
        }
        assert_eq!(extract_field("**City**", "City"), "");
    }
}
