/// Separator placed between composing participant names.
pub const NAME_SEPARATOR: &str = ", ";

const NAMES_PLACEHOLDER: &str = "{names}";
const COUNT_PLACEHOLDER: &str = "{count}";

/// Plural forms for the "is composing" label.
///
/// Both forms may reference `{names}` and `{count}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposingTemplate {
    pub one: String,
    pub other: String,
}

impl Default for ComposingTemplate {
    fn default() -> Self {
        Self {
            one: "{names} is composing…".to_owned(),
            other: "{names} are composing…".to_owned(),
        }
    }
}

impl ComposingTemplate {
    pub fn format(&self, names: &[String]) -> String {
        if names.is_empty() {
            return String::new();
        }

        let form = if names.len() == 1 {
            &self.one
        } else {
            &self.other
        };

        form.replace(COUNT_PLACEHOLDER, &names.len().to_string())
            .replace(NAMES_PLACEHOLDER, &names.join(NAME_SEPARATOR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_owned()).collect()
    }

    #[test]
    fn empty_set_yields_empty_label() {
        assert_eq!(ComposingTemplate::default().format(&[]), "");
    }

    #[test]
    fn single_name_uses_singular_form() {
        let label = ComposingTemplate::default().format(&names(&["Alice"]));

        assert_eq!(label, "Alice is composing…");
    }

    #[test]
    fn several_names_use_plural_form_without_trailing_separator() {
        let label = ComposingTemplate::default().format(&names(&["Alice", "Bob"]));

        assert_eq!(label, "Alice, Bob are composing…");
        assert!(!label.contains(", are"));
    }

    #[test]
    fn count_placeholder_is_substituted() {
        let template = ComposingTemplate {
            one: "{names} tippt".to_owned(),
            other: "{count} Personen tippen: {names}".to_owned(),
        };

        assert_eq!(
            template.format(&names(&["A", "B", "C"])),
            "3 Personen tippen: A, B, C"
        );
    }
}
