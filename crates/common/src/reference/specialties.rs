//! Medical specialty taxonomy
//!
//! Categories group the specialties a user can be ranked on. Category
//! variations are the everyday words people use for a category; matching one
//! of those yields several candidate specialties rather than a single one.

use crate::text;

/// Specialty categories with their member specialties
pub const SPECIALTY_CATEGORIES: &[(&str, &[&str])] = &[
    ("Maternités", &["Accouchements normaux", "Accouchements à risques"]),
    (
        "Cardiologie",
        &[
            "Angioplastie coronaire",
            "Cardiologie interventionnelle",
            "Chirurgie cardiaque adulte",
            "Chirurgie cardiaque pédiatrique",
            "Infarctus du myocarde",
            "Insuffisance cardiaque",
            "Rythmologie",
        ],
    ),
    (
        "Veines et artères",
        &[
            "Ablation des varices",
            "Chirurgie des artères",
            "Chirurgie des carotides",
            "Hypertension artérielle",
            "Médecine vasculaire",
        ],
    ),
    (
        "Orthopédie",
        &[
            "Arthrose de la main",
            "Chirurgie de l'épaule",
            "Chirurgie de la cheville",
            "Chirurgie du canal carpien",
            "Chirurgie du dos de l'adulte",
            "Chirurgie du dos de l'enfant et de l'adolescent",
            "Chirurgie du pied",
            "Ligaments du genou",
            "Prothèse de genou",
            "Prothèse de hanche",
        ],
    ),
    (
        "Ophtalmologie",
        &[
            "Cataracte",
            "Chirurgie de la cornée",
            "Chirurgie de la rétine",
            "Glaucome",
            "Strabisme",
        ],
    ),
    (
        "Gynécologie et cancers de la femme",
        &[
            "Cancer de l'ovaire",
            "Cancer de l'utérus",
            "Cancer du sein",
            "Endométriose",
            "Fibrome utérin",
        ],
    ),
    (
        "Appareil digestif",
        &[
            "Appendicite",
            "Cancer de l'estomac ou de l'œsophage",
            "Cancer du côlon ou de l'intestin",
            "Cancer du foie",
            "Cancer du pancréas",
            "Chirurgie de l'obésité",
            "Chirurgie du rectum",
            "Hernies de l'abdomen",
            "Maladies inflammatoires chroniques de l'intestin (MICI)",
            "Proctologie",
        ],
    ),
    ("Psychiatrie", &["Dépression", "Schizophrénie"]),
    (
        "Urologie",
        &[
            "Adénome de la prostate",
            "Calculs urinaires",
            "Cancer de la prostate",
            "Cancer de la vessie",
            "Cancer du rein",
            "Chirurgie des testicules de l'adulte",
            "Chirurgie des testicules de l'enfant et de l'adolescent",
        ],
    ),
    (
        "Tête et cou",
        &[
            "Amygdales et végétations",
            "Audition",
            "Cancer ORL",
            "Chirurgie dentaire et orale de l'adulte",
            "Chirurgie dentaire et orale de l'enfant et de l'adolescent",
            "Chirurgie du nez et des sinus",
            "Chirurgie maxillo-faciale",
            "Glandes salivaires",
        ],
    ),
    (
        "Neurologie",
        &[
            "Accidents vasculaires cérébraux",
            "Epilepsie de l'adulte",
            "Epilepsie de l'enfant et de l'adolescent",
            "Maladie de Parkinson",
        ],
    ),
    (
        "Cancerologie",
        &[
            "Cancer de la thyroïde",
            "Cancer des os de l'enfant et de l'adolescent",
            "Cancer du poumon",
            "Cancers de la peau",
            "Chirurgie des cancers osseux de l'adulte",
            "Chirurgie des sarcomes des tissus mous",
            "Leucémie de l'adulte",
            "Leucémie de l'enfant et de l'adolescent",
            "Lymphome-myélome de l'adulte",
            "Tumeurs du cerveau de l'adulte",
        ],
    ),
    (
        "Diabète",
        &["Diabète de l'adulte", "Diabète de l'enfant et de l'adolescent"],
    ),
];

/// Everyday vocabulary mapped to a category
pub const CATEGORY_VARIATIONS: &[(&str, &[&str])] = &[
    (
        "Maternités",
        &[
            "maternité", "maternités", "accouchement", "accouchements", "grossesse",
            "enceinte", "bébé", "nouveau-né",
        ],
    ),
    (
        "Gynécologie et cancers de la femme",
        &[
            "gynécologie", "gynéco", "femme", "femmes", "utérus", "ovaires", "sein",
            "seins", "gynécologique",
        ],
    ),
    (
        "Ophtalmologie",
        &[
            "ophtalmologie", "ophtalmologique", "yeux", "œil", "oeil", "vision", "vue",
            "regard", "ophtalmo",
        ],
    ),
    (
        "Appareil digestif",
        &[
            "digestif", "digestion", "intestin", "intestins", "estomac", "ventre",
            "abdomen", "abdominal", "gastro",
        ],
    ),
    (
        "Tête et cou",
        &[
            "tête", "cou", "orl", "oreille", "nez", "gorge", "bouche", "dents",
            "dentaire", "maxillo",
        ],
    ),
    (
        "Veines et artères",
        &[
            "veines", "artères", "vasculaire", "circulation", "sang", "vaisseaux",
            "cardio-vasculaire",
        ],
    ),
    (
        "Orthopédie",
        &[
            "orthopédie", "orthopédique", "os", "articulation", "articulations",
            "squelette", "fracture", "prothèse", "prothèses",
        ],
    ),
    (
        "Cardiologie",
        &[
            "cardiologie", "cardiaque", "cardiaques", "cœur", "coeur", "cardio",
            "tension", "artérielle",
        ],
    ),
    (
        "Urologie",
        &[
            "urologie", "urologique", "urine", "vessie", "rein", "reins", "prostate",
            "urinaire",
        ],
    ),
    (
        "Psychiatrie",
        &[
            "psychiatrie", "psychiatrique", "mental", "mentale", "psychologique",
            "dépression", "anxiété", "stress",
        ],
    ),
    (
        "Cancerologie",
        &[
            "cancérologie", "cancero", "oncologie", "oncologique", "tumeur", "tumeurs",
            "métastase", "chimiothérapie",
        ],
    ),
    (
        "Neurologie",
        &[
            "neurologie", "neurologique", "neuro", "cerveau", "système nerveux",
            "parkinson", "alzheimer", "avc",
        ],
    ),
    (
        "Diabète",
        &["diabète", "diabétique", "sucre", "glycémie", "insuline", "endocrinologie"],
    ),
];

/// Phrases that mean cancer in general rather than a specific cancer type
pub const GENERAL_CANCER_TERMS: &[&str] = &[
    "cancer",
    "cancers",
    "le cancer",
    "les cancers",
    "du cancer",
    "des cancers",
    "pour cancer",
    "pour le cancer",
    "pour les cancers",
    "concernant le cancer",
    "concernant les cancers",
    "sur le cancer",
    "sur les cancers",
    "au niveau du cancer",
    "au niveau des cancers",
    "question cancer",
    "question cancers",
];

/// Query interface over the taxonomy tables
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecialtyTaxonomy;

impl SpecialtyTaxonomy {
    pub fn new() -> Self {
        Self
    }

    /// Every specialty known to the taxonomy
    pub fn all_specialties(&self) -> impl Iterator<Item = &'static str> {
        SPECIALTY_CATEGORIES
            .iter()
            .flat_map(|(_, specialties)| specialties.iter().copied())
    }

    /// Member specialties of a category, empty if the category is unknown
    pub fn category_specialties(&self, category: &str) -> Vec<&'static str> {
        let wanted = text::normalize(category);
        SPECIALTY_CATEGORIES
            .iter()
            .find(|(name, _)| text::normalize(name) == wanted)
            .map(|(_, specialties)| specialties.to_vec())
            .unwrap_or_default()
    }

    /// Category names in declaration order
    pub fn categories(&self) -> impl Iterator<Item = &'static str> {
        SPECIALTY_CATEGORIES.iter().map(|(name, _)| *name)
    }

    /// Cancer specialties excluding the surgical ones
    ///
    /// A question about cancer in general should offer the medical cancer
    /// specialties, not surgical procedures.
    pub fn cancer_specialties(&self) -> Vec<&'static str> {
        self.all_specialties()
            .filter(|s| {
                let lower = text::normalize(s);
                lower.contains("cancer") && !lower.contains("chirurgie")
            })
            .collect()
    }

    /// Whether the message talks about cancer without naming a specific type
    pub fn is_general_cancer_query(&self, message: &str) -> bool {
        let normalized = text::normalize(message);
        let mentions_cancer = GENERAL_CANCER_TERMS
            .iter()
            .any(|term| text::contains_term(&normalized, &text::normalize(term)));
        if !mentions_cancer {
            return false;
        }
        !self
            .cancer_specialties()
            .iter()
            .any(|s| normalized.contains(&text::normalize(s)))
    }

    /// Variation vocabulary of a category, empty if none is recorded
    pub fn category_variations(&self, category: &str) -> Vec<&'static str> {
        let wanted = text::normalize(category);
        CATEGORY_VARIATIONS
            .iter()
            .find(|(name, _)| text::normalize(name) == wanted)
            .map(|(_, variations)| variations.to_vec())
            .unwrap_or_default()
    }

    /// Category whose variation vocabulary matches the text, if any
    pub fn category_for_variation(&self, value: &str) -> Option<&'static str> {
        let normalized = text::normalize(value);
        for (category, variations) in CATEGORY_VARIATIONS {
            for variation in *variations {
                if text::contains_term(&normalized, &text::normalize(variation)) {
                    return Some(category);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancer_specialties_exclude_surgery() {
        let taxonomy = SpecialtyTaxonomy::new();
        let specialties = taxonomy.cancer_specialties();
        assert!(specialties.contains(&"Cancer du poumon"));
        assert!(specialties.contains(&"Cancer du sein"));
        assert!(!specialties.iter().any(|s| s.contains("Chirurgie")));
    }

    #[test]
    fn test_general_cancer_query_detection() {
        let taxonomy = SpecialtyTaxonomy::new();
        assert!(taxonomy.is_general_cancer_query("J'ai un cancer"));
        assert!(!taxonomy.is_general_cancer_query("J'ai un cancer du poumon"));
        assert!(!taxonomy.is_general_cancer_query("Où accoucher à Lyon ?"));
    }

    #[test]
    fn test_category_for_variation() {
        let taxonomy = SpecialtyTaxonomy::new();
        assert_eq!(taxonomy.category_for_variation("problème de cœur"), Some("Cardiologie"));
        assert_eq!(taxonomy.category_for_variation("les yeux"), Some("Ophtalmologie"));
        assert_eq!(taxonomy.category_for_variation("rien de médical"), None);
    }

    #[test]
    fn test_category_variations_lookup() {
        let taxonomy = SpecialtyTaxonomy::new();
        assert!(taxonomy.category_variations("Maternités").contains(&"grossesse"));
        assert!(taxonomy.category_variations("inconnue").is_empty());
    }

    #[test]
    fn test_category_specialties_lookup_is_accent_insensitive() {
        let taxonomy = SpecialtyTaxonomy::new();
        assert_eq!(taxonomy.category_specialties("orthopedie").len(), 10);
        assert!(taxonomy.category_specialties("inconnue").is_empty());
    }
}
