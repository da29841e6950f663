//! French answer formatting
//!
//! Turns a selection into the final listing: one header stating what was
//! searched, then per-category blocks that always say how many institutions
//! were actually found relative to the requested count.

use super::lookup::SelectedRecord;
use crate::analysis::LocationScope;
use palmares_common::dataset::InstitutionType;

/// Header above the listing
pub fn header(
    found: usize,
    requested: usize,
    specialty: Option<&str>,
    location: Option<&LocationScope>,
    radius_used: Option<f64>,
) -> String {
    let shown = found.min(requested);
    let mut out = if shown == 1 {
        "Voici le meilleur établissement".to_string()
    } else {
        format!("Voici les {} meilleurs établissements", shown)
    };
    match specialty {
        Some(name) => out.push_str(&format!(" pour la pathologie {}", name)),
        None => out.push_str(" du palmarès général"),
    }
    if let (Some(scope), Some(radius)) = (location, radius_used) {
        out.push_str(&format!(
            " dans un rayon de {} km autour de {}",
            radius as i64,
            scope.place_name()
        ));
    }
    out.push_str(" :");
    out
}

/// Per-category listing blocks, public then private
pub fn category_blocks(records: &[SelectedRecord], requested: usize) -> String {
    let mut out = String::new();
    for category in [InstitutionType::Public, InstitutionType::Private] {
        let of_category: Vec<&SelectedRecord> = records
            .iter()
            .filter(|s| s.record.category == category)
            .take(requested)
            .collect();
        if of_category.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        if of_category.len() < requested {
            out.push_str(&format!(
                "Seulement {} établissement{} {} trouvé{} :\n",
                of_category.len(),
                plural(of_category.len()),
                category.plural_label(),
                plural(of_category.len()),
            ));
        } else {
            out.push_str(&format!(
                "Voici les établissements {} :\n",
                category.plural_label()
            ));
        }
        for selected in of_category {
            out.push_str(&line(selected));
            out.push('\n');
        }
    }
    out.trim_end().to_string()
}

/// One listing line, with the distance when the radius strategy ran
fn line(selected: &SelectedRecord) -> String {
    match selected.distance_km {
        Some(distance) => format!(
            "{} : un établissement {} situé à {} km, avec une note de {} sur 20",
            selected.record.institution,
            selected.record.category.label(),
            distance.round() as i64,
            selected.record.score,
        ),
        None => format!(
            "{} : un établissement {}, avec une note de {} sur 20",
            selected.record.institution,
            selected.record.category.label(),
            selected.record.score,
        ),
    }
}

/// Rank report for one named institution
pub fn named_rank(
    name: &str,
    ranked: Option<(usize, f64)>,
    specialty: Option<&str>,
) -> String {
    match (ranked, specialty) {
        (Some((position, score)), Some(specialty)) => format!(
            "{} est classé n°{} pour la pathologie {}, avec une note de {} sur 20.",
            name, position, specialty, score
        ),
        (Some((position, score)), None) => format!(
            "{} est classé n°{} au palmarès général, avec une note de {} sur 20.",
            name, position, score
        ),
        (None, Some(specialty)) => format!(
            "{} n'est pas présent dans le classement pour la pathologie {}, vous pouvez \
             cependant consulter le classement suivant :",
            name, specialty
        ),
        (None, None) => format!(
            "{} ne fait pas partie des meilleurs établissements du palmarès général.",
            name
        ),
    }
}

fn plural(count: usize) -> &'static str {
    if count > 1 {
        "s"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palmares_common::dataset::RankingRecord;

    fn selected(name: &str, category: InstitutionType, score: f64, distance: Option<f64>) -> SelectedRecord {
        SelectedRecord {
            record: RankingRecord {
                institution: name.to_string(),
                category,
                specialty: "Cardiologie".to_string(),
                score,
                city: "Lyon".to_string(),
                latitude: 45.76,
                longitude: 4.83,
            },
            distance_km: distance,
        }
    }

    #[test]
    fn test_header_with_specialty_and_radius() {
        let scope = LocationScope::Commune("Lyon".to_string());
        let text = header(3, 3, Some("Cardiologie"), Some(&scope), Some(50.0));
        assert_eq!(
            text,
            "Voici les 3 meilleurs établissements pour la pathologie Cardiologie \
             dans un rayon de 50 km autour de Lyon :"
        );
    }

    #[test]
    fn test_header_single_result_general_table() {
        let text = header(1, 1, None, None, None);
        assert_eq!(text, "Voici le meilleur établissement du palmarès général :");
    }

    #[test]
    fn test_blocks_state_shortfall() {
        let records = vec![
            selected("CHU de Lyon", InstitutionType::Public, 18.0, Some(3.0)),
            selected("Clinique du Parc", InstitutionType::Private, 16.5, Some(7.0)),
        ];
        let text = category_blocks(&records, 3);
        assert!(text.contains("Seulement 1 établissement publics trouvé"));
        assert!(text.contains("Seulement 1 établissement privés trouvé"));
        assert!(text.contains("CHU de Lyon : un établissement public situé à 3 km"));
    }

    #[test]
    fn test_blocks_full_count() {
        let records = vec![
            selected("A", InstitutionType::Public, 18.0, None),
            selected("B", InstitutionType::Public, 17.0, None),
        ];
        let text = category_blocks(&records, 2);
        assert!(text.contains("Voici les établissements publics :"));
        assert!(text.contains("A : un établissement public, avec une note de 18 sur 20"));
    }

    #[test]
    fn test_named_rank_messages() {
        assert_eq!(
            named_rank("CHU de Lyon", Some((2, 18.5)), Some("Cardiologie")),
            "CHU de Lyon est classé n°2 pour la pathologie Cardiologie, \
             avec une note de 18.5 sur 20."
        );
        assert!(named_rank("CHU de Lyon", None, Some("Cardiologie"))
            .contains("n'est pas présent dans le classement"));
    }
}
