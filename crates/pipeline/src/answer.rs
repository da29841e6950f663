//! End-to-end answer cycle
//!
//! Glues the sanity gate, the continuation classifier, the query analyst and
//! the resolution engine into one `answer` call. Every cycle ends in exactly
//! one outcome, which is recorded in metrics and the audit log.

use crate::analysis::QueryAnalyst;
use crate::audit::AuditLog;
use crate::checks::SanityGate;
use crate::conversation::{ContinuationClassifier, ConversationCase};
use crate::messages;
use crate::resolve::{Resolution, ResolutionEngine};
use crate::Turn;
use palmares_common::metrics::record_answer_cycle;
use palmares_common::{CallUsage, CostLedger, Result};
use std::time::Instant;

/// Final outcome of one answer cycle
#[derive(Debug, Clone)]
pub enum AnswerOutcome {
    Answer { text: String, links: Vec<String> },
    Disambiguation {
        prompt: String,
        candidates: Vec<String>,
    },
}

pub struct AnswerPipeline {
    gate: SanityGate,
    classifier: ContinuationClassifier,
    analyst: QueryAnalyst,
    engine: ResolutionEngine,
    audit: AuditLog,
}

impl AnswerPipeline {
    pub fn new(
        gate: SanityGate,
        classifier: ContinuationClassifier,
        analyst: QueryAnalyst,
        engine: ResolutionEngine,
        audit: AuditLog,
    ) -> Self {
        Self {
            gate,
            classifier,
            analyst,
            engine,
            audit,
        }
    }

    /// Run one full cycle for a user message
    ///
    /// Validation failures and rejected messages come back as regular
    /// answers carrying the fixed French message; only capability outages
    /// surface as errors.
    pub async fn answer(&self, message: &str, history: &[Turn]) -> Result<AnswerOutcome> {
        let started = Instant::now();
        let (outcome, label, ledger, result_count) = self.run_cycle(message, history).await?;
        record_answer_cycle(started.elapsed().as_secs_f64(), label, result_count);

        let answer_text = match &outcome {
            AnswerOutcome::Answer { text, .. } => text.as_str(),
            AnswerOutcome::Disambiguation { prompt, .. } => prompt.as_str(),
        };
        if let Err(error) = self.audit.record(message, answer_text, label, &ledger) {
            tracing::warn!(%error, "audit write failed");
        }

        Ok(outcome)
    }

    /// Every path fills the ledger's gate and conversation fields, so the
    /// audit row carries the real spend even when no search ran.
    async fn run_cycle(
        &self,
        message: &str,
        history: &[Turn],
    ) -> Result<(AnswerOutcome, &'static str, CostLedger, usize)> {
        let verdict = self.gate.run(message, history).await?;
        let gate_usage = verdict.usage;
        if let Some(rejection) = verdict.rejection {
            let ledger = CostLedger {
                gate: gate_usage,
                ..CostLedger::default()
            };
            return Ok((
                AnswerOutcome::Answer {
                    text: rejection,
                    links: Vec::new(),
                },
                "rejected",
                ledger,
                0,
            ));
        }

        let mut conversation_usage = CallUsage::ZERO;
        let (outcome, label, mut ledger, found) = if history.is_empty() {
            self.search(message, history).await?
        } else {
            let classification = self.classifier.classify(message, history).await?;
            conversation_usage += classification.usage;
            tracing::info!(case = ?classification.case, "continuation classified");
            match classification.case {
                ConversationCase::OffTopic => (
                    AnswerOutcome::Answer {
                        text: messages::MESSAGE_OFF_TOPIC.to_string(),
                        links: Vec::new(),
                    },
                    "off_topic",
                    CostLedger::default(),
                    0,
                ),
                ConversationCase::ContinuationMerge | ConversationCase::ContinuationAdd => {
                    let (rewritten, usage) = self
                        .classifier
                        .rewrite(classification.case, message, history)
                        .await?;
                    conversation_usage += usage;
                    tracing::debug!(%rewritten, "continuation rewritten");
                    self.search(&rewritten, history).await?
                }
                ConversationCase::NewQuestionWithSearch => self.search(message, history).await?,
                ConversationCase::ContinuationNoSearch
                | ConversationCase::FallbackConversational => {
                    let (reply, usage) = self.classifier.reply(message, history).await?;
                    conversation_usage += usage;
                    (
                        AnswerOutcome::Answer {
                            text: reply,
                            links: Vec::new(),
                        },
                        "conversational",
                        CostLedger::default(),
                        0,
                    )
                }
            }
        };
        ledger.gate = gate_usage;
        ledger.conversation = conversation_usage;
        Ok((outcome, label, ledger, found))
    }

    async fn search(
        &self,
        message: &str,
        history: &[Turn],
    ) -> Result<(AnswerOutcome, &'static str, CostLedger, usize)> {
        let params = match self.analyst.resolve(message, history).await? {
            Ok(params) => params,
            Err(halted) => {
                tracing::info!(failure = %halted.failure, "resolution aborted by validation");
                return Ok((
                    AnswerOutcome::Answer {
                        text: halted.failure.user_message(),
                        links: Vec::new(),
                    },
                    "aborted",
                    halted.ledger,
                    0,
                ));
            }
        };
        let ledger = params.ledger;

        match self.engine.resolve(&params).await? {
            Resolution::Disambiguation { prompt, candidates } => Ok((
                AnswerOutcome::Disambiguation { prompt, candidates },
                "disambiguation",
                ledger,
                0,
            )),
            Resolution::Answer {
                text,
                links,
                outcome,
            } => {
                let found = outcome.records.len();
                Ok((AnswerOutcome::Answer { text, links }, "answered", ledger, found))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palmares_common::config::{AuditConfig, LimitsConfig, SearchConfig};
    use palmares_common::dataset::{InstitutionType, RankingRecord, RankingStore};
    use palmares_common::geo::{Coordinates, FixedGeocoder};
    use palmares_common::llm::{ChatModel, ScriptedModel};
    use palmares_common::reference::{Gazetteer, InstitutionRegistry};
    use std::sync::Arc;

    fn record(name: &str, category: InstitutionType, specialty: &str, score: f64) -> RankingRecord {
        RankingRecord {
            institution: name.to_string(),
            category,
            specialty: specialty.to_string(),
            score,
            city: "Lyon".to_string(),
            latitude: 45.7578,
            longitude: 4.8320,
        }
    }

    fn store() -> Arc<RankingStore> {
        Arc::new(RankingStore::from_records(
            vec![
                record("CHU de Lyon", InstitutionType::Public, "Cardiologie", 18.5),
                record("Hôpital Saint-Joseph", InstitutionType::Public, "Cardiologie", 17.0),
                record("Clinique de la Sauvegarde", InstitutionType::Private, "Cardiologie", 16.5),
            ],
            vec![record("CHU de Lyon", InstitutionType::Public, "", 18.9)],
        ))
    }

    fn search_config() -> SearchConfig {
        SearchConfig {
            radius_ladder_km: vec![5.0, 10.0, 50.0, 100.0],
            default_result_count: 3,
            min_result_count: 1,
            max_result_count: 50,
        }
    }

    fn pipeline(model: Arc<dyn ChatModel>) -> AnswerPipeline {
        pipeline_with_audit(model, AuditLog::disabled())
    }

    fn pipeline_with_audit(model: Arc<dyn ChatModel>, audit: AuditLog) -> AnswerPipeline {
        let store = store();
        let specialties = Arc::new(
            store
                .specialties()
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>(),
        );
        let gazetteer = Arc::new(Gazetteer::from_parts(vec!["Lyon".to_string()]));
        let registry = Arc::new(InstitutionRegistry::from_store(&store));
        let geocoder = Arc::new(FixedGeocoder::new([(
            "Lyon",
            Coordinates::new(45.7640, 4.8357),
        )]));

        AnswerPipeline::new(
            SanityGate::new(
                model.clone(),
                LimitsConfig {
                    max_message_length: 500,
                    max_turns: 10,
                },
            ),
            ContinuationClassifier::new(model.clone()),
            QueryAnalyst::new(model, specialties, gazetteer, registry, search_config()),
            ResolutionEngine::new(store, geocoder, search_config()),
            audit,
        )
    }

    #[tokio::test]
    async fn test_first_turn_question_gets_a_ranked_answer() {
        let model = Arc::new(ScriptedModel::with_rules([
            ("filtre d'un assistant", "TRUE"),
            ("mentionne une localisation", "0"),
            ("nommément cités", r#"{"institutions": [], "intent": "none"}"#),
            ("type d'établissement", "aucune correspondance"),
            ("Combien d'établissements", "1"),
        ]));
        let pipeline = pipeline(model);

        let outcome = pipeline
            .answer("Quel est le meilleur hôpital pour la cardiologie ?", &[])
            .await
            .unwrap();

        let AnswerOutcome::Answer { text, links } = outcome else {
            panic!("expected an answer");
        };
        assert!(text.contains("Voici le meilleur établissement pour la pathologie Cardiologie"));
        assert!(text.contains("CHU de Lyon"));
        assert!(links.iter().any(|l| l.contains("cardiologie-public.php")));
    }

    #[tokio::test]
    async fn test_off_topic_message_is_rejected_at_the_gate() {
        let model = Arc::new(ScriptedModel::with_rules([(
            "filtre d'un assistant",
            "FALSE",
        )]));
        let pipeline = pipeline(model);

        let outcome = pipeline
            .answer("Quelle est la capitale de l'Australie ?", &[])
            .await
            .unwrap();

        let AnswerOutcome::Answer { text, links } = outcome else {
            panic!("expected an answer");
        };
        assert_eq!(text, messages::MESSAGE_OFF_TOPIC);
        assert!(links.is_empty());
    }

    #[tokio::test]
    async fn test_continuation_merge_rewrites_then_searches() {
        // "Et en privé ?" replaces the sector constraint of the prior turn
        let model = Arc::new(ScriptedModel::with_rules([
            ("filtre d'un assistant", "TRUE"),
            ("continuation de la demande", "TRUE"),
            ("nouvelle recherche", "TRUE"),
            ("remplacent-ils", "TRUE"),
            (
                "sauf ceux que le nouveau message remplace",
                "Quelles sont les meilleures cliniques privées pour la cardiologie à Lyon ?",
            ),
            ("mentionne une localisation", "3"),
            (
                "Extrais la localisation",
                r#"{"location": [{"type": "city_commune", "value": "Lyon"}]}"#,
            ),
            ("nommément cités", r#"{"institutions": [], "intent": "none"}"#),
            ("type d'établissement", "privé"),
            ("Combien d'établissements", "aucune correspondance"),
        ]));
        let pipeline = pipeline(model);
        let history = vec![Turn::new(
            "Quels sont les meilleurs hôpitaux publics pour la cardiologie à Lyon ?",
            "Voici les 3 meilleurs établissements pour la pathologie Cardiologie :",
        )];

        let outcome = pipeline.answer("Et en privé ?", &history).await.unwrap();

        let AnswerOutcome::Answer { text, links } = outcome else {
            panic!("expected an answer");
        };
        assert!(text.contains("Clinique de la Sauvegarde"));
        assert!(!text.contains("CHU de Lyon"));
        assert!(links.iter().any(|l| l.contains("cardiologie-prive.php")));
    }

    #[tokio::test]
    async fn test_no_search_continuation_answers_conversationally() {
        let model = Arc::new(ScriptedModel::with_rules([
            ("filtre d'un assistant", "TRUE"),
            ("continuation de la demande", "TRUE"),
            ("nouvelle recherche", "FALSE"),
            (
                "sans inventer",
                "Le classement est mis à jour chaque année par Le Point.",
            ),
        ]));
        let pipeline = pipeline(model);
        let history = vec![Turn::new(
            "Quel est le meilleur hôpital pour la cardiologie ?",
            "Voici le meilleur établissement pour la pathologie Cardiologie :",
        )];

        let outcome = pipeline
            .answer("D'où viennent ces données ?", &history)
            .await
            .unwrap();

        let AnswerOutcome::Answer { text, links } = outcome else {
            panic!("expected an answer");
        };
        assert!(text.contains("mis à jour chaque année"));
        assert!(links.is_empty());
    }

    #[tokio::test]
    async fn test_aborting_validation_failure_becomes_the_answer() {
        let model = Arc::new(ScriptedModel::with_rules([
            ("filtre d'un assistant", "TRUE"),
            ("identifie la spécialité", "aucune correspondance"),
            ("mentionne une localisation", "0"),
            (
                "nommément cités",
                r#"{"institutions": ["Hôpital Imaginaire"], "intent": "single"}"#,
            ),
            ("type d'établissement", "aucune correspondance"),
            ("Combien d'établissements", "aucune correspondance"),
        ]));
        let pipeline = pipeline(model);

        let outcome = pipeline
            .answer("Où est classé l'Hôpital Imaginaire ?", &[])
            .await
            .unwrap();

        let AnswerOutcome::Answer { text, .. } = outcome else {
            panic!("expected an answer");
        };
        assert!(text.contains("n'a pas été évalué"));
    }

    #[tokio::test]
    async fn test_audit_rows_carry_spend_for_cycles_without_a_search() {
        // Rejected, aborted and conversational cycles still pay for model
        // calls; their audit rows must carry that spend.
        let dir = std::env::temp_dir().join(format!("palmares-answer-audit-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("audit.csv");
        let config = AuditConfig {
            enabled: true,
            path: path.to_string_lossy().to_string(),
        };

        // Gate, specialty, location status and institution names: four calls
        // before the unrecognized name aborts the cycle.
        let model = Arc::new(ScriptedModel::with_rules([
            ("filtre d'un assistant", "TRUE"),
            ("identifie la spécialité", "aucune correspondance"),
            ("mentionne une localisation", "0"),
            (
                "nommément cités",
                r#"{"institutions": ["Hôpital Imaginaire"], "intent": "single"}"#,
            ),
        ]));
        let pipeline = pipeline_with_audit(model, AuditLog::open(&config).unwrap());
        pipeline
            .answer("Où est classé l'Hôpital Imaginaire ?", &[])
            .await
            .unwrap();

        // One gate call, then rejection.
        let model = Arc::new(ScriptedModel::with_rules([(
            "filtre d'un assistant",
            "FALSE",
        )]));
        let pipeline = pipeline_with_audit(model, AuditLog::open(&config).unwrap());
        pipeline
            .answer("Quelle est la capitale de l'Australie ?", &[])
            .await
            .unwrap();

        // Gate, three continuation checks and the reply: five calls.
        let model = Arc::new(ScriptedModel::with_rules([
            ("filtre d'un assistant", "TRUE"),
            ("continuation de la demande", "TRUE"),
            ("nouvelle recherche", "FALSE"),
            ("sans inventer", "Les données viennent du classement annuel."),
        ]));
        let pipeline = pipeline_with_audit(model, AuditLog::open(&config).unwrap());
        let history = vec![Turn::new(
            "Quel est le meilleur hôpital pour la cardiologie ?",
            "Voici le meilleur établissement pour la pathologie Cardiologie :",
        )];
        pipeline
            .answer("D'où viennent ces données ?", &history)
            .await
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let row = |label: &str| {
            contents
                .lines()
                .find(|l| l.contains(label))
                .unwrap_or_else(|| panic!("no {label} row"))
                .to_string()
        };
        // The tokens column is last; 40 tokens per scripted call
        assert!(row("aborted").ends_with(",160"), "{}", row("aborted"));
        assert!(row("rejected").ends_with(",40"), "{}", row("rejected"));
        assert!(row("conversational").ends_with(",200"), "{}", row("conversational"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_oversized_message_is_rejected_without_model_calls() {
        // No rules registered: any model call would error
        let model = Arc::new(ScriptedModel::with_rules(Vec::<(&str, &str)>::new()));
        let pipeline = pipeline(model);

        let long = "a".repeat(501);
        let outcome = pipeline.answer(&long, &[]).await.unwrap();

        let AnswerOutcome::Answer { text, .. } = outcome else {
            panic!("expected an answer");
        };
        assert_eq!(text, messages::MESSAGE_TOO_LONG);
    }
}
