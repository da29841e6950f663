//! Ranking-page link construction
//!
//! Specialty pages live under lepoint.fr with accent-stripped, hyphenated
//! slugs; no-specialty answers point at the overall honor rolls. The
//! methodology page is always included.

use crate::messages;
use palmares_common::dataset::InstitutionType;
use palmares_common::text;

/// URL of one specialty ranking page for one sector
pub fn specialty_url(specialty: &str, category: InstitutionType) -> String {
    let slug = text::strip_accents(specialty)
        .to_lowercase()
        .replace(' ', "-");
    let sector = match category {
        InstitutionType::Public => "public",
        InstitutionType::Private => "prive",
    };
    format!(
        "https://www.lepoint.fr/hopitaux/classements/{}-{}.php",
        slug, sector
    )
}

/// Links for an answer covering `categories`, in stable order
pub fn build(specialty: Option<&str>, categories: &[InstitutionType]) -> Vec<String> {
    let mut links = Vec::new();
    for category in [InstitutionType::Public, InstitutionType::Private] {
        if !categories.contains(&category) {
            continue;
        }
        match specialty {
            Some(name) => links.push(specialty_url(name, category)),
            None => links.push(match category {
                InstitutionType::Public => messages::PUBLIC_RANKING_URL.to_string(),
                InstitutionType::Private => messages::PRIVATE_RANKING_URL.to_string(),
            }),
        }
    }
    links.push(messages::METHODOLOGY_URL.to_string());
    links
}
