//! Conflict resolution use case
//!
//! Given a disagreement between participants' positions, the resolver picks
//! a resolution method from severity, time pressure and conflict type, runs
//! it, and returns a structured [`Resolution`] with dissent and confidence.
//! A conflict is resolved atomically by one method call; a failure inside
//! the chosen method escalates instead of propagating.

use crate::ports::observer::{LifecycleEvent, NoObserver, OrchestrationObserver};
use conductor_domain::{
    Compromise, Conflict, ConflictSeverity, ConflictType, Dissent, DomainError, FollowUp, Position,
    Resolution, ResolutionMethod, Value, calculate_agreement, find_middle_ground, score_evidence,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Tunable thresholds for resolution
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Agreement level at which mediation stops, in [0, 1]
    pub agreement_threshold: f64,
    /// Maximum mediation rounds before settling for the best result
    pub max_mediation_rounds: u32,
    /// Time constraints below this force voting, in milliseconds
    pub urgent_time_ms: u64,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            agreement_threshold: 0.7,
            max_mediation_rounds: 5,
            urgent_time_ms: 5000,
        }
    }
}

/// Aggregate statistics for one resolution method
#[derive(Debug, Clone, PartialEq)]
pub struct MethodStats {
    pub count: usize,
    pub mean_agreement: f64,
    pub mean_duration_ms: f64,
}

/// Aggregate statistics over the resolution history
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionStatistics {
    pub total: usize,
    pub by_method: BTreeMap<String, MethodStats>,
    pub mean_agreement: f64,
    pub mean_duration_ms: f64,
    /// Escalations over total resolutions
    pub escalation_rate: f64,
}

/// Named mediation steps, ordered per conflict type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediationStep {
    ClarifyValues,
    ClarifyInterpretation,
    EvaluateEvidence,
    IdentifyCommonGround,
    SeekCompromise,
    FindMiddleGround,
}

impl MediationStep {
    fn as_str(&self) -> &'static str {
        match self {
            MediationStep::ClarifyValues => "clarify-values",
            MediationStep::ClarifyInterpretation => "clarify-interpretation",
            MediationStep::EvaluateEvidence => "evaluate-evidence",
            MediationStep::IdentifyCommonGround => "identify-common-ground",
            MediationStep::SeekCompromise => "seek-compromise",
            MediationStep::FindMiddleGround => "find-middle-ground",
        }
    }
}

/// Resolves conflicts and keeps a history for aggregate statistics
pub struct ConflictResolver {
    settings: ResolverSettings,
    observer: Arc<dyn OrchestrationObserver>,
    history: Vec<Resolution>,
}

impl Default for ConflictResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConflictResolver {
    pub fn new() -> Self {
        Self {
            settings: ResolverSettings::default(),
            observer: Arc::new(NoObserver),
            history: Vec::new(),
        }
    }

    pub fn with_settings(mut self, settings: ResolverSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn OrchestrationObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Resolve one conflict
    ///
    /// Never returns an error: a failure inside the chosen method escalates,
    /// recording a follow-up for a human decision.
    pub fn resolve(&mut self, conflict: &Conflict) -> Resolution {
        let started = Instant::now();
        let method = self.select_method(conflict);
        debug!(
            conflict = %conflict.id,
            method = %method,
            positions = conflict.positions.len(),
            "resolving conflict"
        );
        self.observer.on_event(&LifecycleEvent::ConflictStarted {
            conflict_id: conflict.id.clone(),
            method,
        });

        let mut resolution = match self.apply(method, conflict) {
            Ok(resolution) => resolution,
            Err(err) => {
                warn!(conflict = %conflict.id, %err, "resolution method failed, escalating");
                self.escalate(conflict)
                    .explain(format!("{method} failed: {err}"))
            }
        };
        resolution.conflict_id = conflict.id.clone();
        resolution.duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        self.observer.on_event(&LifecycleEvent::ConflictResolved {
            conflict_id: conflict.id.clone(),
            method: resolution.method,
            agreement: resolution.agreement_level,
        });
        self.history.push(resolution.clone());
        resolution
    }

    /// Pick the resolution method for a conflict
    ///
    /// Critical severity always arbitrates. A tight time constraint forces
    /// voting. Otherwise the conflict type's preferred method applies; minor
    /// deferrable conflicts without one are deferred, and mediation is the
    /// last resort.
    pub fn select_method(&self, conflict: &Conflict) -> ResolutionMethod {
        if conflict.severity == ConflictSeverity::Critical {
            return ResolutionMethod::Arbitration;
        }
        if conflict
            .context
            .time_constraint_ms
            .is_some_and(|t| t < self.settings.urgent_time_ms)
        {
            return ResolutionMethod::Voting;
        }
        if let Some(method) = preferred_method(conflict.conflict_type) {
            return method;
        }
        if conflict.severity == ConflictSeverity::Minor && conflict.context.requirements.can_defer {
            return ResolutionMethod::Deferral;
        }
        ResolutionMethod::Mediation
    }

    /// Aggregate the resolution history
    ///
    /// Pure read: calling twice without intervening resolutions returns
    /// identical numbers.
    pub fn statistics(&self) -> ResolutionStatistics {
        let total = self.history.len();
        if total == 0 {
            return ResolutionStatistics {
                total: 0,
                by_method: BTreeMap::new(),
                mean_agreement: 0.0,
                mean_duration_ms: 0.0,
                escalation_rate: 0.0,
            };
        }

        let mut by_method: BTreeMap<String, (usize, f64, f64)> = BTreeMap::new();
        let mut agreement_sum = 0.0;
        let mut duration_sum = 0.0;
        let mut escalations = 0usize;
        for resolution in &self.history {
            let entry = by_method
                .entry(resolution.method.as_str().to_string())
                .or_insert((0, 0.0, 0.0));
            entry.0 += 1;
            entry.1 += resolution.agreement_level;
            entry.2 += resolution.duration_ms;
            agreement_sum += resolution.agreement_level;
            duration_sum += resolution.duration_ms;
            if resolution.method == ResolutionMethod::Escalation {
                escalations += 1;
            }
        }

        ResolutionStatistics {
            total,
            by_method: by_method
                .into_iter()
                .map(|(method, (count, agreement, duration))| {
                    (
                        method,
                        MethodStats {
                            count,
                            mean_agreement: agreement / count as f64,
                            mean_duration_ms: duration / count as f64,
                        },
                    )
                })
                .collect(),
            mean_agreement: agreement_sum / total as f64,
            mean_duration_ms: duration_sum / total as f64,
            escalation_rate: escalations as f64 / total as f64,
        }
    }

    fn apply(
        &self,
        method: ResolutionMethod,
        conflict: &Conflict,
    ) -> Result<Resolution, DomainError> {
        match method {
            ResolutionMethod::Mediation => self.mediate(conflict),
            ResolutionMethod::Arbitration => self.arbitrate(conflict),
            ResolutionMethod::Synthesis => self.synthesize(conflict),
            ResolutionMethod::Voting => self.conduct_voting(conflict),
            ResolutionMethod::EvidenceEvaluation => self.evaluate_evidence(conflict),
            ResolutionMethod::Compromise => self.find_compromise(conflict),
            ResolutionMethod::Partition => self.partition(conflict),
            ResolutionMethod::Deferral => Ok(self.defer(conflict)),
            ResolutionMethod::Escalation => Ok(self.escalate(conflict)),
        }
    }

    /// Run mediation rounds until agreement clears the threshold
    fn mediate(&self, conflict: &Conflict) -> Result<Resolution, DomainError> {
        if conflict.positions.is_empty() {
            return Err(DomainError::NoPositions);
        }

        let steps = mediation_steps(conflict.conflict_type);
        let mut working = conflict.positions.clone();
        let mut compromises: Vec<Compromise> = Vec::new();
        let mut explanation = vec![format!(
            "mediating {} positions on '{}'",
            working.len(),
            conflict.topic
        )];

        let mut best_agreement = calculate_agreement(&working);
        let mut best_outcome = majority_stance(&working);

        for round in 1..=self.settings.max_mediation_rounds {
            for step in steps {
                apply_mediation_step(*step, &mut working, &mut compromises);
                let agreement = calculate_agreement(&working);
                if agreement > best_agreement {
                    best_agreement = agreement;
                    best_outcome = majority_stance(&working);
                }
                if agreement >= self.settings.agreement_threshold {
                    explanation.push(format!(
                        "round {round}: agreement {agreement:.2} reached after {}",
                        step.as_str()
                    ));
                    let mut resolution = Resolution::new(ResolutionMethod::Mediation)
                        .with_outcome(majority_stance(&working))
                        .with_agreement(agreement)
                        .with_confidence(agreement);
                    resolution.explanation = explanation;
                    resolution.compromises = compromises;
                    return Ok(resolution);
                }
            }
            // loosen positions before the next round
            for position in &mut working {
                position.flexibility = (position.flexibility * 1.1).min(1.0);
                position.confidence *= 0.95;
            }
            explanation.push(format!(
                "round {round}: agreement {:.2}, loosening positions",
                calculate_agreement(&working)
            ));
        }

        explanation.push(format!(
            "rounds exhausted, best agreement {best_agreement:.2}"
        ));
        let mut resolution = Resolution::new(ResolutionMethod::Mediation)
            .with_outcome(best_outcome)
            .with_agreement(best_agreement)
            .with_confidence(best_agreement);
        resolution.explanation = explanation;
        resolution.compromises = compromises;
        Ok(resolution)
    }

    /// Adopt the strongest position outright
    fn arbitrate(&self, conflict: &Conflict) -> Result<Resolution, DomainError> {
        let scored: Vec<(usize, f64)> = conflict
            .positions
            .iter()
            .enumerate()
            .map(|(i, p)| (i, p.confidence * 0.5 + score_evidence(&p.evidence) * 0.5))
            .collect();
        let (winner_idx, winner_score) = scored
            .iter()
            .copied()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .ok_or(DomainError::NoPositions)?;
        let winner = &conflict.positions[winner_idx];

        let dissent = conflict
            .positions
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != winner_idx)
            .map(|(_, p)| Dissent::accepted(&p.participant, "Overruled by arbitration"))
            .collect();

        let mut resolution = Resolution::new(ResolutionMethod::Arbitration)
            .with_outcome(winner.stance.clone())
            .with_agreement(winner.confidence)
            .with_confidence(winner_score.min(1.0))
            .explain(format!(
                "arbitrated in favor of {} (score {winner_score:.2})",
                winner.participant
            ));
        resolution.dissent = dissent;
        Ok(resolution)
    }

    /// Merge the best-supported value per aspect into one stance
    fn synthesize(&self, conflict: &Conflict) -> Result<Resolution, DomainError> {
        if conflict.positions.is_empty() {
            return Err(DomainError::NoPositions);
        }

        let mut keys: Vec<String> = conflict
            .positions
            .iter()
            .filter_map(|p| p.stance.as_map())
            .flat_map(|m| m.keys().cloned())
            .collect();
        keys.sort();
        keys.dedup();

        let outcome = if keys.is_empty() {
            // nothing structured to merge; take the most confident stance
            conflict
                .positions
                .iter()
                .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
                .map(|p| p.stance.clone())
                .ok_or(DomainError::NoPositions)?
        } else {
            let mut merged = BTreeMap::new();
            for key in keys {
                let best = conflict
                    .positions
                    .iter()
                    .filter(|p| p.stance.get(&key).is_some())
                    .max_by(|a, b| a.confidence.total_cmp(&b.confidence));
                if let Some(position) = best {
                    if let Some(value) = position.stance.get(&key) {
                        merged.insert(key, value.clone());
                    }
                }
            }
            Value::Map(merged)
        };

        // synthesis is assumed constructive, not measured
        Ok(Resolution::new(ResolutionMethod::Synthesis)
            .with_outcome(outcome)
            .with_agreement(0.8)
            .with_confidence(0.75)
            .explain("synthesized the best-supported value per aspect"))
    }

    /// Weighted vote over distinct stances
    fn conduct_voting(&self, conflict: &Conflict) -> Result<Resolution, DomainError> {
        if conflict.positions.is_empty() {
            return Err(DomainError::NoPositions);
        }

        let mut ballots: BTreeMap<String, (f64, Value, Vec<String>)> = BTreeMap::new();
        let mut total_weight = 0.0;
        for position in &conflict.positions {
            let entry = ballots
                .entry(position.stance.canonical())
                .or_insert_with(|| (0.0, position.stance.clone(), Vec::new()));
            entry.0 += position.confidence;
            entry.2.push(position.participant.clone());
            total_weight += position.confidence;
        }

        let (winner_weight, winner_stance, winner_holders) = ballots
            .values()
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .cloned()
            .ok_or(DomainError::NoPositions)?;

        let agreement = if total_weight > 0.0 {
            winner_weight / total_weight
        } else {
            0.0
        };
        let dissent = conflict
            .positions
            .iter()
            .filter(|p| !winner_holders.contains(&p.participant))
            .map(|p| Dissent::accepted(&p.participant, "Voted for a different outcome"))
            .collect();

        let mut resolution = Resolution::new(ResolutionMethod::Voting)
            .with_outcome(winner_stance)
            .with_agreement(agreement)
            .with_confidence(agreement)
            .explain(format!(
                "vote won with weight {winner_weight:.2} of {total_weight:.2}"
            ));
        resolution.dissent = dissent;
        Ok(resolution)
    }

    /// Rank positions by evidence-weighted confidence and adopt the best
    ///
    /// The reported agreement is the winner's score over the top score,
    /// which is 1.0 by construction.
    fn evaluate_evidence(&self, conflict: &Conflict) -> Result<Resolution, DomainError> {
        let mut scored: Vec<(&Position, f64)> = conflict
            .positions
            .iter()
            .map(|p| (p, score_evidence(&p.evidence) * p.confidence))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        let (winner, winner_score) = *scored.first().ok_or(DomainError::NoPositions)?;
        let top_score = scored[0].1;

        let agreement = if top_score > 0.0 {
            winner_score / top_score
        } else {
            1.0
        };
        let dissent = scored
            .iter()
            .skip(1)
            .map(|(p, _)| Dissent::accepted(&p.participant, "Weaker supporting evidence"))
            .collect();

        let mut resolution = Resolution::new(ResolutionMethod::EvidenceEvaluation)
            .with_outcome(winner.stance.clone())
            .with_agreement(agreement)
            .with_confidence(winner_score.min(1.0))
            .explain(format!(
                "evidence ranked {} first with score {winner_score:.2}",
                winner.participant
            ));
        resolution.dissent = dissent;
        Ok(resolution)
    }

    /// Compute and adopt a middle-ground value
    fn find_compromise(&self, conflict: &Conflict) -> Result<Resolution, DomainError> {
        let middle = find_middle_ground(&conflict.positions).ok_or(DomainError::NoPositions)?;
        let mut resolution = Resolution::new(ResolutionMethod::Compromise)
            .with_outcome(middle)
            .with_agreement(0.7)
            .with_confidence(0.7)
            .explain("middle ground computed across all stances");
        resolution.compromises.push(Compromise {
            description: "all participants accept the middle ground".to_string(),
            terms: conflict
                .positions
                .iter()
                .map(|p| format!("{} moves off their original stance", p.participant))
                .collect(),
        });
        Ok(resolution)
    }

    /// Give each participant their own sub-decision slot
    fn partition(&self, conflict: &Conflict) -> Result<Resolution, DomainError> {
        if conflict.positions.is_empty() {
            return Err(DomainError::NoPositions);
        }
        let outcome = Value::Map(
            conflict
                .positions
                .iter()
                .map(|p| (p.participant.clone(), p.stance.clone()))
                .collect(),
        );
        // no shared decision is forced, so agreement is full
        Ok(Resolution::new(ResolutionMethod::Partition)
            .with_outcome(outcome)
            .with_agreement(1.0)
            .with_confidence(0.8)
            .explain("partitioned into per-participant sub-decisions"))
    }

    /// Put the conflict off for the orchestrator to revisit
    fn defer(&self, conflict: &Conflict) -> Resolution {
        let mut resolution = Resolution::new(ResolutionMethod::Deferral)
            .explain(format!("deferred '{}' for later revisit", conflict.topic));
        resolution.follow_ups.push(FollowUp::revisit());
        resolution
    }

    /// Hand the conflict to a human
    fn escalate(&self, conflict: &Conflict) -> Resolution {
        let mut resolution = Resolution::new(ResolutionMethod::Escalation)
            .explain(format!("escalated '{}' for a human decision", conflict.topic));
        resolution.follow_ups.push(FollowUp::await_human());
        resolution
    }
}

/// Preferred method per conflict type
fn preferred_method(conflict_type: ConflictType) -> Option<ResolutionMethod> {
    Some(match conflict_type {
        ConflictType::ValueDisagreement => ResolutionMethod::EvidenceEvaluation,
        ConflictType::Interpretation => ResolutionMethod::Synthesis,
        ConflictType::Methodology => ResolutionMethod::Compromise,
        ConflictType::Priority => ResolutionMethod::Voting,
        ConflictType::Scope => ResolutionMethod::Partition,
        ConflictType::Definition => ResolutionMethod::Arbitration,
        ConflictType::Prediction => ResolutionMethod::EvidenceEvaluation,
    })
}

/// Ordered mediation steps per conflict type
fn mediation_steps(conflict_type: ConflictType) -> &'static [MediationStep] {
    use MediationStep::*;
    match conflict_type {
        ConflictType::ValueDisagreement => &[ClarifyValues, EvaluateEvidence, SeekCompromise],
        ConflictType::Interpretation => &[ClarifyInterpretation, IdentifyCommonGround, SeekCompromise],
        ConflictType::Methodology => &[IdentifyCommonGround, FindMiddleGround],
        ConflictType::Priority => &[ClarifyValues, SeekCompromise],
        ConflictType::Scope => &[IdentifyCommonGround, SeekCompromise],
        ConflictType::Definition => &[ClarifyInterpretation, EvaluateEvidence],
        ConflictType::Prediction => &[EvaluateEvidence, FindMiddleGround],
    }
}

fn apply_mediation_step(
    step: MediationStep,
    working: &mut [Position],
    compromises: &mut Vec<Compromise>,
) {
    match step {
        MediationStep::ClarifyValues | MediationStep::ClarifyInterpretation => {
            for position in working.iter_mut() {
                if position.evidence.is_empty() {
                    position.confidence *= 0.9;
                }
            }
        }
        MediationStep::EvaluateEvidence => {
            let best = working
                .iter()
                .enumerate()
                .max_by(|a, b| score_evidence(&a.1.evidence).total_cmp(&score_evidence(&b.1.evidence)))
                .map(|(i, _)| i);
            if let Some(best) = best {
                for (i, position) in working.iter_mut().enumerate() {
                    if i == best {
                        position.confidence = (position.confidence * 1.1).min(1.0);
                    } else {
                        position.confidence *= 0.95;
                    }
                }
            }
        }
        MediationStep::IdentifyCommonGround => {
            let maps: Vec<_> = working.iter().filter_map(|p| p.stance.as_map()).collect();
            if maps.len() == working.len() && !maps.is_empty() {
                let shared: Vec<String> = maps[0]
                    .iter()
                    .filter(|(key, value)| maps.iter().all(|m| m.get(*key) == Some(*value)))
                    .map(|(key, _)| key.clone())
                    .collect();
                let description = "agreed ground identified across positions".to_string();
                if !shared.is_empty() && !compromises.iter().any(|c| c.description == description) {
                    compromises.push(Compromise {
                        description,
                        terms: shared,
                    });
                }
            }
        }
        MediationStep::SeekCompromise | MediationStep::FindMiddleGround => {
            if let Some(middle) = find_middle_ground(working) {
                let mut moved = Vec::new();
                for position in working.iter_mut() {
                    if position.flexibility >= 0.5 && position.stance != middle {
                        position.stance = middle.clone();
                        moved.push(position.participant.clone());
                    }
                }
                if !moved.is_empty() {
                    compromises.push(Compromise {
                        description: "flexible participants adopted the middle ground".to_string(),
                        terms: moved,
                    });
                }
            }
        }
    }
}

/// The stance held by the highest-confidence group of identical stances
fn majority_stance(positions: &[Position]) -> Value {
    let mut groups: BTreeMap<String, (f64, Value)> = BTreeMap::new();
    for position in positions {
        let entry = groups
            .entry(position.stance.canonical())
            .or_insert_with(|| (0.0, position.stance.clone()));
        entry.0 += position.confidence;
    }
    groups
        .into_values()
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, stance)| stance)
        .unwrap_or(Value::Flag(false))
}
