use crate::types::ContentElement;

/// Joins the trimmed text of every element that has non-blank text, in element
/// order, separated by single spaces.
pub fn consolidate_elements(elements: &[ContentElement]) -> String {
    elements
        .iter()
        .filter_map(|element| element.text.as_deref())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_and_absent_text_and_trims() {
        let elements = vec![
            ContentElement::with_text(" a "),
            ContentElement::with_text(""),
            ContentElement::default(),
            ContentElement::with_text("b"),
        ];
        assert_eq!(consolidate_elements(&elements), "a b");
    }

    #[test]
    fn whitespace_only_elements_are_dropped() {
        let elements = vec![
            ContentElement::with_text("\n\t "),
            ContentElement::with_text("Chapter 1"),
        ];
        assert_eq!(consolidate_elements(&elements), "Chapter 1");
    }

    #[test]
    fn inner_whitespace_is_preserved() {
        let elements = vec![
            ContentElement::with_text("two  spaces"),
            ContentElement::with_text("line\nbreak "),
        ];
        assert_eq!(consolidate_elements(&elements), "two  spaces line\nbreak");
    }

    #[test]
    fn no_usable_text_gives_empty_string() {
        assert_eq!(consolidate_elements(&[]), "");
        assert_eq!(consolidate_elements(&[ContentElement::default()]), "");
    }
}
