//! Prompt builders for every chat-model call in the pipeline
//!
//! Each function formats one self-contained French instruction. Detection
//! prompts ask for a minimal, machine-parseable answer (a word, a number or
//! a JSON object) so the parsing helpers stay simple.

use crate::Turn;

/// Render prior turns for inclusion in a prompt
pub fn format_history(history: &[Turn]) -> String {
    let mut out = String::new();
    for turn in history {
        out.push_str("Utilisateur : ");
        out.push_str(&turn.user);
        out.push_str("\nAssistant : ");
        out.push_str(&turn.assistant);
        out.push('\n');
    }
    out
}

/// Specialty extraction, with the taxonomy keyword mapping as context
pub fn specialty_detection(text: &str, keyword_context: &str) -> String {
    format!(
        "Tu es un assistant qui identifie la spécialité médicale mentionnée dans une \
         question sur le classement des hôpitaux.\n\
         Voici les spécialités connues et leurs mots-clés associés :\n{keyword_context}\n\n\
         Question : {text}\n\n\
         Réponds uniquement par le nom exact de la spécialité. Si plusieurs spécialités \
         correspondent, sépare-les par des virgules. Si aucune spécialité n'est \
         mentionnée, réponds : aucune correspondance"
    )
}

/// First location stage: classify the geographic mention
///
/// The answer is a single digit: 0 none, 1 foreign, 2 ambiguous, 3 mentioned.
pub fn location_status(text: &str, history: &str) -> String {
    format!(
        "Analyse la question suivante et détermine si elle mentionne une localisation.\n\
         Historique de la conversation :\n{history}\n\
         Question : {text}\n\n\
         Réponds uniquement par un chiffre :\n\
         0 si aucune localisation n'est mentionnée\n\
         1 si la localisation mentionnée est hors de France\n\
         2 si la localisation est ambiguë ou impossible à identifier\n\
         3 si une localisation française est clairement mentionnée"
    )
}

/// Second location stage: extract structured fields
pub fn location_extraction(text: &str, history: &str) -> String {
    format!(
        "Extrais la localisation mentionnée dans la question suivante.\n\
         Historique de la conversation :\n{history}\n\
         Question : {text}\n\n\
         Réponds uniquement par un objet JSON de la forme :\n\
         {{\"location\": [{{\"type\": \"region|department|city_commune|postal_code\", \
         \"value\": \"...\"}}]}}\n\
         Inclus une entrée par localisation détectée."
    )
}

/// Named institutions plus the intent tag
pub fn institution_names(text: &str) -> String {
    format!(
        "Identifie les établissements de santé nommément cités dans la question \
         suivante, ainsi que l'intention de l'utilisateur.\n\
         Question : {text}\n\n\
         Réponds uniquement par un objet JSON de la forme :\n\
         {{\"institutions\": [\"nom\", ...], \"intent\": \"single|multi|compare|none\"}}\n\
         Si aucun établissement n'est cité, réponds : \
         {{\"institutions\": [], \"intent\": \"none\"}}"
    )
}

/// Public/private classification
pub fn institution_type(text: &str) -> String {
    format!(
        "La question suivante précise-t-elle un type d'établissement ?\n\
         Question : {text}\n\n\
         Réponds uniquement par un mot : public, privé, ou aucune correspondance"
    )
}

/// Requested number of results
pub fn result_count(text: &str) -> String {
    format!(
        "Combien d'établissements l'utilisateur souhaite-t-il voir dans la question \
         suivante ?\n\
         Question : {text}\n\n\
         Réponds uniquement par un nombre entier. Si la question ne précise pas de \
         nombre, réponds : aucune correspondance"
    )
}

/// Sanity-gate pertinence check, also reused as the classifier's first check
pub fn pertinence(text: &str, history: &str) -> String {
    format!(
        "Tu es le filtre d'un assistant spécialisé dans le classement annuel des \
         hôpitaux et cliniques français.\n\
         Historique de la conversation :\n{history}\n\
         Message : {text}\n\n\
         Ce message concerne-t-il le classement des établissements de santé, une \
         pathologie, ou la recherche d'un établissement ? Réponds uniquement par \
         TRUE ou FALSE."
    )
}

/// Is this turn a follow-up to the previous one
pub fn continuity(text: &str, history: &str) -> String {
    format!(
        "Historique de la conversation :\n{history}\n\
         Nouveau message : {text}\n\n\
         Ce message est-il la continuation de la demande précédente (il la précise, \
         la modifie ou s'y réfère) plutôt qu'une question indépendante ? Réponds \
         uniquement par TRUE ou FALSE."
    )
}

/// Does answering require a new lookup in the ranking data
pub fn search_needed(text: &str, history: &str) -> String {
    format!(
        "Historique de la conversation :\n{history}\n\
         Nouveau message : {text}\n\n\
         Répondre à ce message nécessite-t-il une nouvelle recherche dans les données \
         du classement des hôpitaux ? Réponds uniquement par TRUE ou FALSE."
    )
}

/// Should new constraints replace the prior ones (TRUE) or add to them (FALSE)
pub fn merge_query(text: &str, history: &str) -> String {
    format!(
        "Historique de la conversation :\n{history}\n\
         Nouveau message : {text}\n\n\
         Les critères de ce message remplacent-ils des critères de la demande \
         précédente (TRUE) ou s'y ajoutent-ils (FALSE) ? Réponds uniquement par \
         TRUE ou FALSE."
    )
}

/// Rewrite a follow-up into a standalone question, replacing conflicting
/// constraints from the prior turn
pub fn rewrite_merge(text: &str, history: &str) -> String {
    format!(
        "Historique de la conversation :\n{history}\n\
         Nouveau message : {text}\n\n\
         Réécris le nouveau message en une question autonome sur le classement des \
         hôpitaux. Conserve les critères de la demande précédente sauf ceux que le \
         nouveau message remplace. Réponds uniquement par la question réécrite."
    )
}

/// Rewrite a follow-up into a standalone question, keeping all prior
/// constraints and adding the new ones
pub fn rewrite_add(text: &str, history: &str) -> String {
    format!(
        "Historique de la conversation :\n{history}\n\
         Nouveau message : {text}\n\n\
         Réécris le nouveau message en une question autonome sur le classement des \
         hôpitaux. Conserve tous les critères de la demande précédente et ajoute \
         ceux du nouveau message. Réponds uniquement par la question réécrite."
    )
}

/// Free-form conversational reply, no ranking lookup
pub fn conversational_reply(text: &str, history: &str) -> String {
    format!(
        "Tu es un assistant spécialisé dans le classement annuel des hôpitaux et \
         cliniques français. Réponds brièvement et en français au message suivant, \
         sans inventer de données de classement.\n\
         Historique de la conversation :\n{history}\n\
         Message : {text}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_history() {
        let history = vec![Turn::new("Bonjour", "Bonjour, comment puis-je aider ?")];
        let rendered = format_history(&history);
        assert!(rendered.contains("Utilisateur : Bonjour"));
        assert!(rendered.contains("Assistant : Bonjour, comment puis-je aider ?"));
    }

    #[test]
    fn test_prompts_embed_question() {
        let text = "Quel est le meilleur hôpital pour cardiologie ?";
        for prompt in [
            specialty_detection(text, "Cardiologie: cœur"),
            location_status(text, ""),
            institution_type(text),
            result_count(text),
            pertinence(text, ""),
        ] {
            assert!(prompt.contains(text));
        }
    }
}
