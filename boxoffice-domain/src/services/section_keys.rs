// Logical section keys
// Maps the keys used by seat maps onto stored section names

/// Stored name and optional subsection qualifier a section key refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionLookup {
    pub name: String,
    pub subsection: Option<String>,
}

const BALCONY: &str = "Balcon";

const BASE_SECTIONS: &[(&str, &str)] = &[
    ("general", "General"),
    ("platea", "Platea"),
    ("orchestra", "Platea"),
    ("palco", "Palco"),
    ("box", "Palco"),
    ("balcon", BALCONY),
    ("balcony", BALCONY),
];

const BALCONY_PREFIXES: &[&str] = &["balcony", "balcon"];

const SIDES: &[(&str, &str)] = &[
    ("izquierdo", "Izquierdo"),
    ("izquierda", "Izquierdo"),
    ("left", "Izquierdo"),
    ("derecho", "Derecho"),
    ("derecha", "Derecho"),
    ("right", "Derecho"),
];

impl SectionLookup {
    /// Decomposes a logical key such as `general`, `balconIzquierdo` or
    /// `balcony-left`. Keys outside the known vocabulary are looked up
    /// verbatim.
    pub fn parse(key: &str) -> Self {
        let trimmed = key.trim();
        let compact: String = trimmed
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();

        if let Some((_, name)) = BASE_SECTIONS.iter().find(|(alias, _)| *alias == compact) {
            return Self {
                name: (*name).to_string(),
                subsection: None,
            };
        }

        for prefix in BALCONY_PREFIXES {
            let Some(rest) = compact.strip_prefix(prefix) else {
                continue;
            };
            if let Some((_, side)) = SIDES.iter().find(|(alias, _)| *alias == rest) {
                return Self {
                    name: BALCONY.to_string(),
                    subsection: Some((*side).to_string()),
                };
            }
        }

        Self {
            name: trimmed.to_string(),
            subsection: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_vocabulary_is_case_insensitive() {
        assert_eq!(SectionLookup::parse("GENERAL").name, "General");
        assert_eq!(SectionLookup::parse("platea").name, "Platea");
        assert_eq!(SectionLookup::parse("Orchestra").name, "Platea");
        assert_eq!(SectionLookup::parse("box").name, "Palco");
        assert_eq!(SectionLookup::parse("balcon").subsection, None);
    }

    #[test]
    fn balcony_sides_decompose_into_subsections() {
        let left = SectionLookup::parse("balconIzquierdo");
        assert_eq!(left.name, "Balcon");
        assert_eq!(left.subsection.as_deref(), Some("Izquierdo"));

        let right = SectionLookup::parse("balcony-right");
        assert_eq!(right.name, "Balcon");
        assert_eq!(right.subsection.as_deref(), Some("Derecho"));
    }

    #[test]
    fn unknown_keys_pass_through_trimmed() {
        let lookup = SectionLookup::parse("  Sala VIP ");
        assert_eq!(lookup.name, "Sala VIP");
        assert_eq!(lookup.subsection, None);
    }

    #[test]
    fn balcony_with_unknown_side_is_not_rewritten() {
        let lookup = SectionLookup::parse("balconCentro");
        assert_eq!(lookup.name, "balconCentro");
        assert_eq!(lookup.subsection, None);
    }
}
