//! Fixed French user-facing messages and ranking page URLs

/// Message too long
pub const MESSAGE_TOO_LONG: &str = "Votre message est trop long. Merci de le raccourcir.";

/// Message rejected by the pertinence check
pub const MESSAGE_OFF_TOPIC: &str = "Cet assistant a pour but de fournir des informations sur \
    les classements des établissements de soins de cette année. Merci de reformuler une \
    question relative aux classements des hôpitaux.";

/// Conversation exceeded the turn limit
pub const CONVERSATION_TOO_LONG: &str =
    "La conversation est trop longue. Merci de commencer une nouvelle conversation.";

/// Classifier could not make sense of a follow-up
pub const FALLBACK_UNCLEAR: &str = "Je n'ai pas bien saisi la nature de votre demande. Merci \
    de reformuler une question relative aux classements des hôpitaux.";

/// Several specialties match, caller must pick one
pub const MULTIPLE_SPECIALTIES: &str = "Plusieurs spécialités ont été détectées dans votre \
    question. Merci de sélectionner une spécialité pour continuer.";

/// Opposite-type fallback notices
pub const NO_PUBLIC_FALLBACK: &str = "Nous n'avons pas d'établissement public pour cette \
    pathologie, mais un classement des établissements privés existe.";
pub const NO_PRIVATE_FALLBACK: &str = "Nous n'avons pas d'établissement privé pour cette \
    pathologie, mais un classement des établissements publics existe.";

/// Neither category has data
pub const NO_RESULTS: &str = "Aucun établissement n'est disponible pour votre demande.";

/// Radius ladder exhausted without a single hit
pub const NO_RESULTS_IN_RADIUS: &str =
    "Aucun résultat trouvé dans un rayon de 100 km autour de votre localisation.";

/// Overall honor-roll ranking pages
pub const PUBLIC_RANKING_URL: &str =
    "https://www.lepoint.fr/hopitaux/classements/tableau-d-honneur-public.php";
pub const PRIVATE_RANKING_URL: &str =
    "https://www.lepoint.fr/hopitaux/classements/tableau-d-honneur-prive.php";

/// Ranking methodology page
pub const METHODOLOGY_URL: &str = "https://www.lepoint.fr/sante/la-methodologie-du-palmares-\
    des-hopitaux-et-cliniques-du-point-2024--04-12-2024-2577146_40.php";
