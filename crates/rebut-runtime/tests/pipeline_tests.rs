//! Round pipeline behaviour against scripted providers

use async_trait::async_trait;
use rebut_agents::{AgentConfig, DebateAgents, EvidenceRetriever};
use rebut_core::{
    DebateMode, DebateSession, DebateStatus, EndReason, Owner, StanceAnalysis, UnlockedAchievement,
    UserStats, Winner,
};
use rebut_llm::{Metrics, MockProvider, MockSearchProvider};
use rebut_persist::{
    MemoryBackend, MemoryStatsStore, ProfileStore, StatsStore, StorageBackend, StorageError,
};
use rebut_runtime::{DebateError, PipelineConfig, RoundPipeline, StartDebate, StatsLedger};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

const TOPIC: &str = "Should cities ban cars downtown?";
const OPENING: &str = "I am for banning cars downtown because it cuts pollution and noise.";

struct Harness {
    pipeline: RoundPipeline,
    llm: Arc<MockProvider>,
    search: Arc<MockSearchProvider>,
    stats: Arc<dyn StatsStore>,
    metrics: Arc<Metrics>,
}

fn harness_with(llm: MockProvider, stats: Arc<dyn StatsStore>) -> Harness {
    let llm = Arc::new(llm);
    let search = Arc::new(MockSearchProvider::with_sample_hits());
    let metrics = Arc::new(Metrics::new());
    let agents = DebateAgents::new(
        llm.clone(),
        search.clone(),
        AgentConfig::default(),
        metrics.clone(),
    );
    let backend: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
    let ledger = StatsLedger::new(stats.clone(), ProfileStore::new(backend));
    let pipeline = RoundPipeline::new(agents, ledger, metrics.clone(), PipelineConfig::default());
    Harness {
        pipeline,
        llm,
        search,
        stats,
        metrics,
    }
}

fn harness(llm: MockProvider) -> Harness {
    harness_with(llm, Arc::new(MemoryStatsStore::new()))
}

fn start_request(owner: Owner, max_rounds: Option<u32>) -> StartDebate {
    StartDebate {
        topic: TOPIC.to_string(),
        user_stance: OPENING.to_string(),
        mode: DebateMode::Normal,
        max_rounds,
        owner,
    }
}

fn user(id: &str) -> Owner {
    Owner::User(id.to_string())
}

fn moderator_calls(llm: &MockProvider) -> usize {
    llm.requests()
        .iter()
        .filter(|r| r.system.contains("moderator"))
        .count()
}

#[tokio::test]
async fn test_start_plays_round_one_without_moderator() {
    let h = harness(MockProvider::smart());

    let response = h
        .pipeline
        .start(start_request(Owner::Guest, Some(5)))
        .await
        .unwrap();

    assert_eq!(response.round_number, 1);
    assert!(!response.is_debate_ended);
    assert_eq!((response.user_score, response.ai_score), (50, 50));
    assert_eq!(
        response.suggestions.as_deref(),
        Some("Make your next argument stronger with specific evidence!")
    );
    assert!(!response.ai_counter_argument.is_empty());
    assert!(response.evidence.len() <= 3);
    assert!(response
        .evidence
        .iter()
        .all(|e| e.snippet.chars().count() <= 300));
    assert_eq!(moderator_calls(&h.llm), 0);

    // Detected "for", so evidence is gathered for the other side
    let searches = h.search.requests();
    assert_eq!(searches.len(), 1);
    assert_eq!(
        searches[0].query,
        EvidenceRetriever::query(TOPIC, &format!("against {}", TOPIC))
    );

    let session = h.pipeline.session(response.debate_id).await.unwrap();
    assert_eq!(session.round_count(), 1);
    assert_eq!(session.status(), DebateStatus::InProgress);
    assert_eq!(session.stance.stance, "for");
    assert_eq!(session.rounds()[0].user_argument, OPENING);
    assert_eq!(h.metrics.snapshot().debates_started, 1);
}

#[tokio::test]
async fn test_continue_uses_moderator_scores() {
    let h = harness(MockProvider::smart());
    let started = h
        .pipeline
        .start(start_request(Owner::Guest, Some(5)))
        .await
        .unwrap();

    let argument = "Downtown businesses rely on drivers, and deliveries would become far more expensive.";
    let response = h
        .pipeline
        .continue_debate(started.debate_id, argument)
        .await
        .unwrap();

    assert_eq!(response.round_number, 2);
    assert!(!response.is_debate_ended);
    assert_eq!((response.user_score, response.ai_score), (55, 45));
    assert_eq!(
        response.suggestions.as_deref(),
        Some("Back your next point with a concrete study.")
    );

    // Evidence for later rounds is searched with the raw utterance
    let searches = h.search.requests();
    assert_eq!(searches[1].query, EvidenceRetriever::query(TOPIC, argument));

    let session = h.pipeline.session(started.debate_id).await.unwrap();
    assert_eq!(session.round_count(), 2);
    assert_eq!(session.rounds()[1].user_argument, argument);
    assert_eq!(session.user_score(), 55);
}

#[tokio::test]
async fn test_last_round_ends_and_records_stats_once() {
    let h = harness(MockProvider::smart());
    let started = h
        .pipeline
        .start(start_request(user("alice"), Some(3)))
        .await
        .unwrap();
    let id = started.debate_id;

    let second = h
        .pipeline
        .continue_debate(id, "Parking revenue funds public services across the whole city.")
        .await
        .unwrap();
    assert!(!second.is_debate_ended);

    let third = h
        .pipeline
        .continue_debate(id, "Emergency vehicles need unobstructed access to every street.")
        .await
        .unwrap();
    assert!(third.is_debate_ended);
    assert_eq!(third.round_number, 3);
    assert_eq!(
        third.ai_counter_argument,
        "Debate concluded. A well-argued exchange."
    );
    assert!(third.evidence.is_empty());

    let session = h.pipeline.session(id).await.unwrap();
    assert_eq!(session.status(), DebateStatus::Ended);
    assert_eq!(session.conclusion().unwrap().reason, EndReason::Moderator);

    // 100 + 10*3 + 5*9, then first_blood and perfectionist
    let stats = h.stats.load_stats("alice").await.unwrap().unwrap();
    assert_eq!(stats.total_debates, 1);
    assert_eq!(stats.debates_won, 1);
    assert_eq!(stats.total_rounds, 3);
    assert_eq!(stats.evidence_cited, 9);
    assert_eq!(stats.total_points, 175 + 50 + 150);

    // Further submissions replay the conclusion without touching anything
    let calls_before = (h.llm.call_count(), h.search.call_count());
    let replay = h
        .pipeline
        .continue_debate(id, "One more thing about traffic flow on ring roads nearby.")
        .await
        .unwrap();
    assert!(replay.is_debate_ended);
    assert_eq!(replay.round_number, 3);
    assert_eq!(replay.ai_counter_argument, third.ai_counter_argument);
    assert_eq!((h.llm.call_count(), h.search.call_count()), calls_before);

    let stats = h.stats.load_stats("alice").await.unwrap().unwrap();
    assert_eq!(stats.total_debates, 1);
    assert_eq!(h.metrics.snapshot().debates_ended, 1);
}

#[tokio::test]
async fn test_concession_short_circuits_and_overrides_feedback() {
    let llm = MockProvider::smart().with_rule(
        "debate moderator",
        r#"{"should_end": false, "user_score": 30, "ai_score": 70, "final_feedback": "The AI was sharper."}"#,
    );
    let h = harness(llm);
    let started = h
        .pipeline
        .start(start_request(user("bob"), Some(5)))
        .await
        .unwrap();
    let searches_before = h.search.call_count();

    let response = h
        .pipeline
        .continue_debate(started.debate_id, "I agree, you win this one.")
        .await
        .unwrap();

    assert!(response.is_debate_ended);
    assert_eq!(response.round_number, 2);
    assert_eq!(
        response.suggestions.as_deref(),
        Some("You conceded, showing intellectual honesty. Great debate!")
    );
    assert_eq!(
        response.ai_counter_argument,
        "Debate concluded. You conceded, showing intellectual honesty. Great debate!"
    );
    assert_eq!((response.user_score, response.ai_score), (30, 70));
    assert_eq!(h.search.call_count(), searches_before);
    // Only the final pass consults the moderator
    assert_eq!(moderator_calls(&h.llm), 1);

    let session = h.pipeline.session(started.debate_id).await.unwrap();
    let conceded = &session.rounds()[1];
    assert!(conceded.ai_argument.starts_with("You've conceded the point."));
    assert!(conceded.evidence.is_empty());
    assert!(conceded.user_fallacies.is_empty());
    assert_eq!(session.conclusion().unwrap().reason, EndReason::Conceded);

    // 25 flat plus 5 per evidence item from round 1
    let stats = h.stats.load_stats("bob").await.unwrap().unwrap();
    assert_eq!(stats.debates_lost, 1);
    assert_eq!(stats.concessions, 1);
    assert_eq!(stats.current_streak, 0);
    assert_eq!(stats.total_points, 40);
    assert_eq!(h.metrics.snapshot().concessions, 1);
}

#[tokio::test]
async fn test_guest_debates_leave_no_stats() {
    let h = harness(MockProvider::smart());
    let started = h
        .pipeline
        .start(start_request(Owner::Guest, Some(3)))
        .await
        .unwrap();
    h.pipeline
        .continue_debate(started.debate_id, "You're right about that.")
        .await
        .unwrap();

    assert!(h.stats.top_by_points(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_submission_past_max_rounds_is_discarded() {
    let h = harness(MockProvider::smart());

    let mut session = DebateSession::new(
        TOPIC,
        DebateMode::Normal,
        3,
        Owner::Guest,
        OPENING,
        StanceAnalysis::fallback(OPENING),
    );
    for i in 1..=3 {
        session
            .push_round(format!("user {}", i), format!("ai {}", i), vec![], vec![])
            .unwrap();
    }
    let id = session.id;
    h.pipeline.sessions().create(session).await;

    let response = h
        .pipeline
        .continue_debate(id, "Congestion pricing already solved this problem in several capitals.")
        .await
        .unwrap();

    assert!(response.is_debate_ended);
    assert_eq!(response.round_number, 3);

    let session = h.pipeline.session(id).await.unwrap();
    assert_eq!(session.round_count(), 3);
    assert_eq!(session.conclusion().unwrap().reason, EndReason::MaxRounds);
}

#[tokio::test]
async fn test_unknown_debate_is_not_found() {
    let h = harness(MockProvider::smart());
    let id = Uuid::new_v4();

    let err = h
        .pipeline
        .continue_debate(id, "Anything at all about the topic.")
        .await
        .unwrap_err();
    assert!(matches!(err, DebateError::NotFound(missing) if missing == id));
    assert!(matches!(
        h.pipeline.session(id).await,
        Err(DebateError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_argument_failure_surfaces_as_upstream() {
    let h = harness(MockProvider::failing("model offline"));

    let err = h
        .pipeline
        .start(start_request(Owner::Guest, None))
        .await
        .unwrap_err();
    assert!(matches!(err, DebateError::Upstream(_)));
}

#[tokio::test]
async fn test_summary_only_after_end() {
    let h = harness(MockProvider::smart());
    let started = h
        .pipeline
        .start(start_request(Owner::Guest, Some(3)))
        .await
        .unwrap();
    let id = started.debate_id;

    assert!(matches!(
        h.pipeline.summary(id).await,
        Err(DebateError::NotEnded(_))
    ));

    h.pipeline
        .continue_debate(id, "Cars give elderly residents independence they cannot get otherwise.")
        .await
        .unwrap();
    h.pipeline
        .continue_debate(id, "Public transport is not accessible for many disabled residents.")
        .await
        .unwrap();

    let summary = h.pipeline.summary(id).await.unwrap();
    assert_eq!(summary.total_rounds, 3);
    assert_eq!(summary.winner, Winner::User);
    assert_eq!(summary.key_arguments.len(), 3);
    assert_eq!(summary.overall_feedback, "A well-argued exchange.");
}

#[tokio::test]
async fn test_concurrent_submissions_append_in_order() {
    let h = harness(MockProvider::smart().with_latency(5));
    let started = h
        .pipeline
        .start(start_request(Owner::Guest, Some(15)))
        .await
        .unwrap();
    let id = started.debate_id;

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let pipeline = h.pipeline.clone();
            tokio::spawn(async move {
                pipeline
                    .continue_debate(
                        id,
                        &format!(
                            "Argument {} about how transit investment reshapes dense urban districts.",
                            i
                        ),
                    )
                    .await
            })
        })
        .collect();

    let mut numbers = HashSet::new();
    for result in futures::future::join_all(tasks).await {
        let response = result.unwrap().unwrap();
        assert!(!response.is_debate_ended);
        assert!(numbers.insert(response.round_number));
    }
    assert_eq!(numbers, (2..=9).collect::<HashSet<u32>>());

    let session = h.pipeline.session(id).await.unwrap();
    let rounds: Vec<u32> = session.rounds().iter().map(|r| r.round).collect();
    assert_eq!(rounds, (1..=9).collect::<Vec<u32>>());
}

/// Stats store that is always down
#[derive(Debug)]
struct UnreachableStats;

#[async_trait]
impl StatsStore for UnreachableStats {
    async fn load_stats(&self, _: &str) -> Result<Option<UserStats>, StorageError> {
        Err(StorageError::Connection("stats store offline".to_string()))
    }

    async fn save_stats(&self, _: &UserStats) -> Result<(), StorageError> {
        Err(StorageError::Connection("stats store offline".to_string()))
    }

    async fn unlocked(&self, _: &str) -> Result<Vec<UnlockedAchievement>, StorageError> {
        Err(StorageError::Connection("stats store offline".to_string()))
    }

    async fn insert_unlock(&self, _: &str, _: &UnlockedAchievement) -> Result<bool, StorageError> {
        Err(StorageError::Connection("stats store offline".to_string()))
    }

    async fn unlock_count(&self, _: &str) -> Result<u32, StorageError> {
        Err(StorageError::Connection("stats store offline".to_string()))
    }

    async fn top_by_points(&self, _: usize) -> Result<Vec<UserStats>, StorageError> {
        Err(StorageError::Connection("stats store offline".to_string()))
    }
}

#[tokio::test]
async fn test_ledger_failure_does_not_fail_the_round() {
    let h = harness_with(MockProvider::smart(), Arc::new(UnreachableStats));
    let started = h
        .pipeline
        .start(start_request(user("carol"), Some(3)))
        .await
        .unwrap();

    let response = h
        .pipeline
        .continue_debate(started.debate_id, "Fair point, I concede.")
        .await
        .unwrap();

    assert!(response.is_debate_ended);
    assert_eq!(h.metrics.snapshot().ledger_failures, 1);
}
