//! French administrative gazetteer
//!
//! Regions and departments are compiled in; the commune list is large and
//! loaded from a CSV file at startup. Regions and communes are matched
//! fuzzily, departments and postal codes only by exact membership.

use crate::errors::{AppError, Result};
use crate::text;
use std::collections::BTreeSet;
use std::path::Path;

/// The 18 French administrative regions
pub const REGIONS: &[&str] = &[
    "Auvergne-Rhône-Alpes",
    "Bourgogne-Franche-Comté",
    "Bretagne",
    "Centre-Val de Loire",
    "Corse",
    "Grand Est",
    "Guadeloupe",
    "Guyane",
    "Hauts-de-France",
    "Île-de-France",
    "La Réunion",
    "Martinique",
    "Mayotte",
    "Normandie",
    "Nouvelle-Aquitaine",
    "Occitanie",
    "Pays de la Loire",
    "Provence-Alpes-Côte d'Azur",
];

/// Department names, metropolitan and overseas
pub const DEPARTMENTS: &[&str] = &[
    "Ain", "Aisne", "Allier", "Alpes-de-Haute-Provence", "Hautes-Alpes",
    "Alpes-Maritimes", "Ardèche", "Ardennes", "Ariège", "Aube", "Aude",
    "Aveyron", "Bouches-du-Rhône", "Calvados", "Cantal", "Charente",
    "Charente-Maritime", "Cher", "Corrèze", "Corse-du-Sud", "Haute-Corse",
    "Côte-d'Or", "Côtes-d'Armor", "Creuse", "Dordogne", "Doubs", "Drôme",
    "Eure", "Eure-et-Loir", "Finistère", "Gard", "Haute-Garonne", "Gers",
    "Gironde", "Hérault", "Ille-et-Vilaine", "Indre", "Indre-et-Loire",
    "Isère", "Jura", "Landes", "Loir-et-Cher", "Loire", "Haute-Loire",
    "Loire-Atlantique", "Loiret", "Lot", "Lot-et-Garonne", "Lozère",
    "Maine-et-Loire", "Manche", "Marne", "Haute-Marne", "Mayenne",
    "Meurthe-et-Moselle", "Meuse", "Morbihan", "Moselle", "Nièvre", "Nord",
    "Oise", "Orne", "Pas-de-Calais", "Puy-de-Dôme", "Pyrénées-Atlantiques",
    "Hautes-Pyrénées", "Pyrénées-Orientales", "Bas-Rhin", "Haut-Rhin",
    "Rhône", "Haute-Saône", "Saône-et-Loire", "Sarthe", "Savoie",
    "Haute-Savoie", "Paris", "Seine-Maritime", "Seine-et-Marne", "Yvelines",
    "Deux-Sèvres", "Somme", "Tarn", "Tarn-et-Garonne", "Var", "Vaucluse",
    "Vendée", "Vienne", "Haute-Vienne", "Vosges", "Yonne",
    "Territoire de Belfort", "Essonne", "Hauts-de-Seine",
    "Seine-Saint-Denis", "Val-de-Marne", "Val-d'Oise", "Guadeloupe",
    "Martinique", "Guyane", "La Réunion", "Mayotte",
];

/// Normalized place names for each administrative level
pub struct Gazetteer {
    regions: Vec<String>,
    departments: BTreeSet<String>,
    communes: Vec<String>,
    /// Original spelling keyed by normalized form
    canonical: std::collections::HashMap<String, String>,
}

impl Gazetteer {
    /// Gazetteer without commune data; commune matching accepts nothing
    pub fn builtin() -> Self {
        Self::from_parts(Vec::<String>::new())
    }

    /// Gazetteer with an explicit commune list
    pub fn from_parts<I, S>(communes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut canonical = std::collections::HashMap::new();
        let mut regions = Vec::new();
        for region in REGIONS {
            let norm = text::normalize(region);
            canonical.insert(norm.clone(), region.to_string());
            regions.push(norm);
        }
        let mut departments = BTreeSet::new();
        for department in DEPARTMENTS {
            let norm = text::normalize(department);
            canonical.insert(norm.clone(), department.to_string());
            departments.insert(norm);
        }
        // Department codes are valid identifiers too
        for code in department_codes() {
            departments.insert(code.clone());
            canonical.insert(code.clone(), code);
        }
        let mut commune_norms = Vec::new();
        for commune in communes {
            let commune = commune.into();
            let norm = text::normalize(&commune);
            canonical.insert(norm.clone(), commune);
            commune_norms.push(norm);
        }
        Self {
            regions,
            departments,
            communes: commune_norms,
            canonical,
        }
    }

    /// Load the commune list from a one-column CSV (header `commune`)
    pub fn load(communes_path: &str) -> Result<Self> {
        let path = Path::new(communes_path);
        let mut reader = csv::Reader::from_path(path).map_err(|e| AppError::Dataset {
            message: format!("failed to open {}: {}", path.display(), e),
        })?;
        let mut communes = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| AppError::Dataset {
                message: format!("{}: {}", path.display(), e),
            })?;
            if let Some(name) = row.get(0) {
                if !name.trim().is_empty() {
                    communes.push(name.trim().to_string());
                }
            }
        }
        tracing::info!(communes = communes.len(), "gazetteer loaded");
        Ok(Self::from_parts(communes))
    }

    /// Fuzzy-match a region name, returning the canonical spelling
    pub fn match_region(&self, value: &str) -> Option<&str> {
        text::fuzzy_match(value, self.regions.iter().map(String::as_str))
            .map(|norm| self.canonical[norm].as_str())
    }

    /// Fuzzy-match a commune name, returning the canonical spelling
    pub fn match_commune(&self, value: &str) -> Option<&str> {
        text::fuzzy_match(value, self.communes.iter().map(String::as_str))
            .map(|norm| self.canonical[norm].as_str())
    }

    /// Exact membership check for a department name or code
    pub fn match_department(&self, value: &str) -> Option<&str> {
        let norm = text::normalize(value);
        self.departments
            .get(&norm)
            .map(|found| self.canonical[found].as_str())
    }

    /// A postal code is valid when it starts with a known department code
    pub fn match_postal_code(&self, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.len() != 5 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let prefix2 = &trimmed[..2];
        let prefix3 = &trimmed[..3];
        let is_known = self.departments.contains(prefix2)
            || self.departments.contains(prefix3)
            // Corsican postal codes keep the numeric 20 prefix
            || prefix2 == "20";
        is_known.then(|| trimmed.to_string())
    }

    pub fn has_communes(&self) -> bool {
        !self.communes.is_empty()
    }
}

fn department_codes() -> Vec<String> {
    let mut codes: Vec<String> = (1..=95)
        .filter(|n| *n != 20)
        .map(|n| format!("{:02}", n))
        .collect();
    codes.push("2a".to_string());
    codes.push("2b".to_string());
    codes.extend((971..=976).map(|n| n.to_string()));
    codes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gazetteer() -> Gazetteer {
        Gazetteer::from_parts(["Lyon", "Paris", "Saint-Étienne", "Marseille"])
    }

    #[test]
    fn test_builtin_matches_regions_but_no_communes() {
        let g = Gazetteer::builtin();
        assert!(!g.has_communes());
        assert_eq!(g.match_commune("Lyon"), None);
        assert_eq!(g.match_region("Bretagne"), Some("Bretagne"));
        assert_eq!(g.match_department("69"), Some("69"));
    }

    #[test]
    fn test_region_fuzzy_match() {
        let g = gazetteer();
        assert_eq!(g.match_region("ile de france"), Some("Île-de-France"));
        assert_eq!(g.match_region("Bretagne"), Some("Bretagne"));
        assert_eq!(g.match_region("Bavière"), None);
    }

    #[test]
    fn test_commune_fuzzy_match_tolerates_typos() {
        let g = gazetteer();
        assert_eq!(g.match_commune("Lyon"), Some("Lyon"));
        assert_eq!(g.match_commune("saint etienne"), Some("Saint-Étienne"));
        assert_eq!(g.match_commune("Marseile"), Some("Marseille"));
        assert_eq!(g.match_commune("Berlin"), None);
    }

    #[test]
    fn test_department_exact_membership() {
        let g = gazetteer();
        assert_eq!(g.match_department("Rhône"), Some("Rhône"));
        assert_eq!(g.match_department("69"), Some("69"));
        assert_eq!(g.match_department("2A"), Some("2a"));
        // Departments are not fuzzy
        assert_eq!(g.match_department("Rhonee"), None);
    }

    #[test]
    fn test_postal_code_validation() {
        let g = gazetteer();
        assert_eq!(g.match_postal_code("69002"), Some("69002".to_string()));
        assert_eq!(g.match_postal_code("97400"), Some("97400".to_string()));
        assert_eq!(g.match_postal_code("20000"), Some("20000".to_string()));
        assert_eq!(g.match_postal_code("6900"), None);
        assert_eq!(g.match_postal_code("99999"), None);
        assert_eq!(g.match_postal_code("ABCDE"), None);
    }
}
