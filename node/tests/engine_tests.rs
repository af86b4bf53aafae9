//! Engine tests: full rounds over the nullable gateway and clock.
//!
//! Window and grace timers run on tokio's paused clock where a test needs
//! them to elapse.

use guardian_committee::CommitteeSelection;
use guardian_consensus::{ConsensusError, FailureReason};
use guardian_node::{GuardianEngine, NodeConfig, NodeError};
use guardian_nullables::{test_pool, NullClock, NullGateway, TestOracle};
use guardian_registry::OracleUpdate;
use guardian_types::stake::threshold_weight;
use guardian_types::{DataHash, RoundId, Seed, Stake};
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const STAKES: [u128; 10] = [100, 100, 100, 100, 100, 50, 50, 50, 50, 50];

fn config() -> NodeConfig {
    let mut config = NodeConfig::default();
    config.params.committee.min_committee_size = 4;
    config.params.committee.max_committee_size = 6;
    config.params.committee.target_committee_size = 5;
    config.params.round.consensus_threshold_bps = 6_700;
    config.params.round.min_oracles = 3;
    config.params.round.submission_window_secs = 30;
    config.shutdown_grace_secs = 2;
    config.refresh_retries = 3;
    config.refresh_backoff_ms = 100;
    config
}

struct Harness {
    engine: GuardianEngine,
    oracles: Vec<TestOracle>,
    gateway: Arc<NullGateway>,
    clock: Arc<NullClock>,
}

async fn harness(stakes: &[u128]) -> Harness {
    let (oracles, gateway) = test_pool(stakes);
    gateway.set_block_hash(Seed::new([7; 32]));
    let gateway = Arc::new(gateway);
    let clock = Arc::new(NullClock::new(1_000));
    let engine = GuardianEngine::new(config(), gateway.clone(), clock.clone()).unwrap();
    engine.refresh_registry().await.unwrap();
    Harness {
        engine,
        oracles,
        gateway,
        clock,
    }
}

fn members<'a>(oracles: &'a [TestOracle], selection: &CommitteeSelection) -> Vec<&'a TestOracle> {
    oracles
        .iter()
        .filter(|o| selection.contains(&o.address()))
        .collect()
}

/// The three committee members with the most stake, highest first.
async fn top_three<'a>(h: &'a Harness, selection: &CommitteeSelection) -> (Vec<&'a TestOracle>, Stake) {
    let snapshot = h.engine.registry_snapshot().await;
    let stake_of = |o: &TestOracle| snapshot.get(&o.address()).map_or(0, |info| info.stake());
    let mut committee = members(&h.oracles, selection);
    committee.sort_by_key(|o| std::cmp::Reverse(stake_of(*o)));
    committee.truncate(3);
    let stake: Stake = committee.iter().map(|o| stake_of(*o)).sum();
    (committee, stake)
}

fn hash(b: u8) -> DataHash {
    DataHash::new([b; 32])
}

/// Submit `data_hash` from each oracle until one submission finalizes the round.
async fn submit_all(
    engine: &GuardianEngine,
    round_id: RoundId,
    voters: &[&TestOracle],
    data_hash: DataHash,
) -> Option<guardian_consensus::ConsensusResult> {
    for oracle in voters {
        let signature = oracle.sign(round_id, &data_hash);
        if let Some(result) = engine
            .submit(round_id, oracle.address(), data_hash, signature)
            .await
            .unwrap()
        {
            return Some(result);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn committee_round_reaches_consensus_and_is_anchored() {
    let h = harness(&STAKES).await;
    assert_eq!(h.engine.registry_snapshot().await.len(), 10);

    let round_id = h.engine.start_round().await.unwrap();
    let selection = h.engine.selection(round_id).await.unwrap();
    assert_eq!(selection.external_seed, Seed::new([7; 32]));
    assert_eq!(selection.committee_size(), 5);
    assert!(h.engine.verify_selection(&selection).await);

    let committee = members(&h.oracles, &selection);
    assert_eq!(committee.len(), 5);

    let result = submit_all(&h.engine, round_id, &committee, hash(0xAA))
        .await
        .expect("all members agreeing must finalize the round");
    assert!(result.reached());
    assert_eq!(result.consensus_hash, Some(hash(0xAA)));
    assert_eq!(result.total_weight, selection.total_stake);
    assert!(result.submissions.len() >= 3);
    assert_eq!(h.engine.pending_timers().await, 0);
    assert!(h.engine.open_rounds().await.is_empty());

    let report = guardian_verification::verify_result(&result, &h.engine.config().params).unwrap();
    assert!(report.reached);

    // Shutdown waits for in-flight anchoring.
    assert!(h.engine.shutdown().await.is_empty());
    let anchored = h.gateway.anchored();
    assert_eq!(anchored.len(), 1);
    assert_eq!(anchored[0].round_id, round_id);
    assert_eq!(anchored[0].data_hash, hash(0xAA));
    assert_eq!(Some(anchored[0].weight), result.consensus_weight);

    let metrics = h.engine.metrics();
    assert_eq!(metrics.rounds_started.get(), 1);
    assert_eq!(metrics.consensus_reached.get(), 1);
    assert_eq!(metrics.submissions_accepted.get(), result.submissions.len() as u64);
    assert_eq!(metrics.anchor_failures.get(), 0);
}

#[tokio::test(start_paused = true)]
async fn window_timer_fails_the_round() {
    let h = harness(&STAKES).await;
    let round_id = h.engine.start_round().await.unwrap();
    let selection = h.engine.selection(round_id).await.unwrap();
    let committee = members(&h.oracles, &selection);

    assert!(submit_all(&h.engine, round_id, &committee[..1], hash(1)).await.is_none());
    assert!(h.engine.result(round_id).await.is_none());

    tokio::time::sleep(Duration::from_secs(31)).await;

    let result = h.engine.result(round_id).await.expect("timer finalized the round");
    assert!(!result.reached());
    assert_eq!(result.failure, Some(FailureReason::WindowExpired));
    assert_eq!(result.submissions.len(), 1);
    assert_eq!(h.engine.pending_timers().await, 0);
    assert_eq!(h.engine.metrics().consensus_failed.get(), 1);
    assert_eq!(h.engine.metrics().open_rounds.get(), 0);
    assert!(h.gateway.anchored().is_empty());
}

#[tokio::test(start_paused = true)]
async fn late_submission_after_window_is_refused() {
    let h = harness(&STAKES).await;
    let round_id = h.engine.start_round().await.unwrap();
    let selection = h.engine.selection(round_id).await.unwrap();
    let member = members(&h.oracles, &selection)[0];

    tokio::time::sleep(Duration::from_secs(31)).await;

    let err = h
        .engine
        .submit(round_id, member.address(), hash(1), member.sign(round_id, &hash(1)))
        .await
        .unwrap_err();
    assert_eq!(
        err.as_consensus(),
        Some(&ConsensusError::RoundAlreadyFinalized(round_id))
    );
    assert_eq!(h.engine.metrics().submissions_rejected.get(), 1);
}

#[tokio::test]
async fn submission_past_deadline_closes_round_before_timer() {
    let h = harness(&STAKES).await;
    let round_id = h.engine.start_round().await.unwrap();
    let selection = h.engine.selection(round_id).await.unwrap();
    let committee = members(&h.oracles, &selection);
    assert!(submit_all(&h.engine, round_id, &committee[..1], hash(8)).await.is_none());

    // The engine clock passes the deadline while the window timer is still pending.
    h.clock.advance(30);
    let late = committee[1];
    let err = h
        .engine
        .submit(round_id, late.address(), hash(8), late.sign(round_id, &hash(8)))
        .await
        .unwrap_err();
    assert_eq!(
        err.as_consensus(),
        Some(&ConsensusError::RoundAlreadyFinalized(round_id))
    );

    let result = h.engine.result(round_id).await.unwrap();
    assert_eq!(result.failure, Some(FailureReason::WindowExpired));
    assert_eq!(result.consensus_weight, None);
    assert_eq!(result.submissions.len(), 1);
    assert_eq!(h.engine.pending_timers().await, 0);
    assert!(h.engine.open_rounds().await.is_empty());
    assert_eq!(h.engine.metrics().open_rounds.get(), 0);
    assert_eq!(h.engine.metrics().consensus_failed.get(), 1);
}

#[tokio::test]
async fn three_heaviest_members_carry_the_round() {
    let h = harness(&STAKES).await;
    let round_id = h.engine.start_round().await.unwrap();
    let selection = h.engine.selection(round_id).await.unwrap();
    assert!((4..=6).contains(&selection.committee_size()));
    let member_stake: Stake = members(&h.oracles, &selection)
        .iter()
        .filter_map(|o| h.oracles.iter().position(|p| p.address() == o.address()))
        .map(|i| STAKES[i])
        .sum();
    assert_eq!(selection.total_stake, member_stake);
    assert!(selection.total_stake >= 4 * 50 && selection.total_stake <= 6 * 100);

    // Seed [7; 32] draws three 100s and two 50s: 300 of 400 clears 268.
    let (top, top_stake) = top_three(&h, &selection).await;
    assert_eq!(selection.total_stake, 400);
    assert_eq!(top_stake, 300);
    assert_eq!(threshold_weight(selection.total_stake, 6_700), 268);

    let result = submit_all(&h.engine, round_id, &top, hash(0xC1))
        .await
        .expect("three heaviest members hold the threshold");
    assert_eq!(result.submissions.len(), 3);
    assert_eq!(result.consensus_hash, Some(hash(0xC1)));
    assert_eq!(result.consensus_weight, Some(300));
    assert_eq!(result.total_weight, 400);

    h.engine.shutdown().await;
    let anchored = h.gateway.anchored();
    assert_eq!(anchored.len(), 1);
    assert_eq!(anchored[0].weight, 300);
}

#[tokio::test(start_paused = true)]
async fn three_heaviest_members_short_of_threshold_time_out() {
    // Whatever the draw, the top three hold at most 200 of a 300+ committee
    // when only one oracle stakes 100.
    let mut stakes = vec![50u128; 10];
    stakes[0] = 100;
    let h = harness(&stakes).await;
    let round_id = h.engine.start_round().await.unwrap();
    let selection = h.engine.selection(round_id).await.unwrap();
    let (top, top_stake) = top_three(&h, &selection).await;
    assert!(top_stake < threshold_weight(selection.total_stake, 6_700));

    assert!(submit_all(&h.engine, round_id, &top, hash(0xC2)).await.is_none());
    tokio::time::sleep(Duration::from_secs(31)).await;

    let result = h.engine.result(round_id).await.expect("timer finalized the round");
    assert!(!result.reached());
    assert_eq!(result.failure, Some(FailureReason::WindowExpired));
    assert_eq!(result.consensus_weight, None);
    assert_eq!(result.leading_weight, top_stake);
    assert_eq!(result.submissions.len(), 3);
    assert!(h.gateway.anchored().is_empty());
}

#[tokio::test]
async fn non_member_submission_is_rejected_and_counted() {
    let h = harness(&STAKES).await;
    let round_id = h.engine.start_round().await.unwrap();
    let selection = h.engine.selection(round_id).await.unwrap();
    let outsider = h
        .oracles
        .iter()
        .find(|o| !selection.contains(&o.address()))
        .unwrap();

    let err = h
        .engine
        .submit(round_id, outsider.address(), hash(2), outsider.sign(round_id, &hash(2)))
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_consensus(),
        Some(ConsensusError::InvalidSubmission { .. })
    ));
    assert_eq!(h.engine.metrics().submissions_rejected.get(), 1);
    assert_eq!(h.engine.metrics().submissions_accepted.get(), 0);
}

#[tokio::test]
async fn unknown_round_is_reported() {
    let h = harness(&STAKES).await;
    let oracle = &h.oracles[0];
    let round_id = RoundId::new(42);
    let err = h
        .engine
        .submit(round_id, oracle.address(), hash(3), oracle.sign(round_id, &hash(3)))
        .await
        .unwrap_err();
    assert_eq!(err.as_consensus(), Some(&ConsensusError::RoundNotFound(round_id)));
}

#[tokio::test]
async fn small_pool_cannot_start_a_round() {
    let h = harness(&[100, 100, 100]).await;
    let err = h.engine.start_round().await.unwrap_err();
    assert!(err.as_consensus().is_some_and(ConsensusError::is_insufficient_pool));
    assert_eq!(h.engine.metrics().consensus_failed.get(), 1);
    assert!(h.engine.open_rounds().await.is_empty());
    assert_eq!(h.engine.pending_timers().await, 0);
}

#[tokio::test(start_paused = true)]
async fn refresh_retries_through_transient_failures() {
    let h = harness(&STAKES).await;
    h.gateway.add_oracle(
        TestOracle::new(10).address(),
        75,
        guardian_types::Reputation::MAX,
    );
    h.gateway.fail_next(2);

    let oracles = h.engine.refresh_registry_with_retry().await.unwrap();
    assert_eq!(oracles, 11);
    assert_eq!(h.engine.metrics().refresh_failures.get(), 2);
    assert_eq!(h.engine.metrics().registry_oracles.get(), 11);
}

#[tokio::test(start_paused = true)]
async fn refresh_gives_up_and_keeps_last_snapshot() {
    let h = harness(&STAKES).await;
    let before = h.engine.registry_snapshot().await;
    h.gateway.set_unavailable(true);

    let err = h.engine.refresh_registry_with_retry().await.unwrap_err();
    assert!(matches!(&err, NodeError::Registry(e) if e.is_retryable()));
    // One first attempt plus three retries.
    assert_eq!(h.engine.metrics().refresh_failures.get(), 4);

    let after = h.engine.registry_snapshot().await;
    assert_eq!(after.version(), before.version());
    assert_eq!(after.len(), 10);
}

#[tokio::test]
async fn registry_update_does_not_disturb_open_round() {
    let h = harness(&STAKES).await;
    let round_id = h.engine.start_round().await.unwrap();
    let selection = h.engine.selection(round_id).await.unwrap();
    let committee = members(&h.oracles, &selection);
    let slashed = committee[0];

    h.engine
        .apply_update(OracleUpdate::Slashed(slashed.address()))
        .await
        .unwrap();
    assert_eq!(h.engine.registry_snapshot().await.len(), 9);

    // The round still counts the slashed member: it votes on the snapshot it
    // was opened with.
    let result = submit_all(&h.engine, round_id, &committee, hash(4)).await.unwrap();
    assert!(result.reached());
    assert!(result.submissions.iter().any(|s| s.oracle == slashed.address()));
}

#[tokio::test]
async fn anchoring_failure_keeps_local_result() {
    let h = harness(&STAKES).await;
    let round_id = h.engine.start_round().await.unwrap();
    let selection = h.engine.selection(round_id).await.unwrap();
    let committee = members(&h.oracles, &selection);

    h.gateway.set_unavailable(true);
    let result = submit_all(&h.engine, round_id, &committee, hash(5)).await.unwrap();
    assert!(result.reached());

    h.engine.shutdown().await;
    assert!(h.gateway.anchored().is_empty());
    assert_eq!(h.engine.metrics().anchor_failures.get(), 1);
    assert_eq!(h.engine.result(round_id).await, Some(result));
}

#[tokio::test(start_paused = true)]
async fn shutdown_force_finalizes_after_grace() {
    let h = harness(&STAKES).await;
    let round_id = h.engine.start_round().await.unwrap();
    let selection = h.engine.selection(round_id).await.unwrap();
    let committee = members(&h.oracles, &selection);
    submit_all(&h.engine, round_id, &committee[..1], hash(6)).await;

    let forced = h.engine.shutdown().await;
    assert_eq!(forced.len(), 1);
    assert_eq!(forced[0].round_id, round_id);
    assert_eq!(forced[0].failure, Some(FailureReason::ShutDown));
    assert_eq!(h.engine.pending_timers().await, 0);

    let err = h.engine.start_round().await.unwrap_err();
    assert_eq!(err.as_consensus(), Some(&ConsensusError::ShuttingDown));
}

#[tokio::test(start_paused = true)]
async fn maintenance_loop_stops_on_shutdown() {
    let h = harness(&STAKES).await;
    let maintenance = h.engine.spawn_maintenance();
    h.gateway.add_oracle(
        TestOracle::new(10).address(),
        75,
        guardian_types::Reputation::MAX,
    );

    // One refresh period.
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(h.engine.registry_snapshot().await.len(), 11);

    h.engine.shutdown().await;
    tokio::time::timeout(Duration::from_secs(1), maintenance)
        .await
        .expect("maintenance loop exits")
        .unwrap();
}

#[tokio::test]
async fn consecutive_rounds_rotate_committees() {
    let h = harness(&STAKES).await;
    let first = h.engine.start_round().await.unwrap();
    let second = h.engine.start_round().await.unwrap();
    assert_eq!(second, first.next());

    let a = h.engine.selection(first).await.unwrap();
    let b = h.engine.selection(second).await.unwrap();
    // Cooldown of one round keeps round one's committee out of round two.
    assert!(b.selected_oracles.iter().all(|o| !a.contains(o)));
    assert_eq!(h.engine.open_rounds().await, vec![first, second]);
    assert_eq!(h.engine.pending_timers().await, 2);
}

#[tokio::test]
async fn metrics_exposition_reflects_activity() {
    let h = harness(&STAKES).await;
    h.engine.start_round().await.unwrap();
    let text = h.engine.metrics().gather_text().unwrap();
    assert!(text.contains("guardian_rounds_started_total 1"));
    assert!(text.contains("guardian_open_rounds 1"));
    assert!(text.contains("guardian_registry_oracles 10"));
}
