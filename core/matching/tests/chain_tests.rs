// Integration tests for chain discovery and acceptance:
// - A closed 3-cycle discovered from the board materializes into exactly
//   three accepted exchanges wired modulo chain length
// - A pending or rejected link produces zero exchanges
// - Concurrent accepts on one link: exactly one wins, the other conflicts

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tradeloop_exchange::{ExchangeStatus, ExchangeStore};
use tradeloop_matching::{
    ChainDiscovery, ChainEngine, ChainProposal, ChainStatus, ChainSuggestion, LinkStatus,
    MatchError, SkillBoard,
};
use tradeloop_primitives::{NeededSkill, OfferedSkill, Skill, SkillId, Urgency, UserId, UserProfile};

struct Fixture {
    board: Arc<SkillBoard>,
    exchanges: Arc<ExchangeStore>,
    engine: ChainEngine,
    john: UserId,
    sarah: UserId,
    mike: UserId,
}

fn fixture() -> Fixture {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let board = Arc::new(SkillBoard::new());
    let exchanges = Arc::new(ExchangeStore::new());
    let engine = ChainEngine::new(Arc::clone(&board), Arc::clone(&exchanges));

    let design = board.add_skill(Skill::new("Graphic Design").unwrap());
    let dev = board.add_skill(Skill::new("Web Development").unwrap());
    let writing = board.add_skill(Skill::new("Content Writing").unwrap());

    let john = board.register_user(UserProfile::new("designer_john"));
    let sarah = board.register_user(UserProfile::new("dev_sarah"));
    let mike = board.register_user(UserProfile::new("writer_mike"));

    publish(&board, john, design, dec!(50), dev);
    publish(&board, sarah, dev, dec!(40), writing);
    publish(&board, mike, writing, dec!(25), design);

    Fixture {
        board,
        exchanges,
        engine,
        john,
        sarah,
        mike,
    }
}

fn publish(board: &SkillBoard, user: UserId, offers: SkillId, rate: Decimal, needs: SkillId) {
    board
        .publish_offer(OfferedSkill::new(user, offers, "", "", rate))
        .unwrap();
    board
        .publish_need(NeededSkill::new(user, needs, "", Urgency::Medium, None))
        .unwrap();
}

async fn discovered_proposal(f: &Fixture) -> ChainProposal {
    let discovery = ChainDiscovery::new(Arc::clone(&f.board));
    let suggestions = discovery.discover(f.john).await;
    match suggestions.into_iter().next() {
        Some(ChainSuggestion::Cycle(proposal)) => proposal,
        other => panic!("expected a cycle, got {other:?}"),
    }
}

#[tokio::test]
async fn test_full_acceptance_materializes_three_exchanges() -> anyhow::Result<()> {
    let f = fixture();
    let proposal = discovered_proposal(&f).await;
    let chain = f
        .engine
        .propose_from(&proposal, "design-dev-copy loop", f.john)
        .await?;
    assert_eq!(chain.status, ChainStatus::Pending);
    assert_eq!(chain.participant_count(), 3);
    assert_eq!(chain.total_hours(), dec!(3));

    let first = f.engine.respond(chain.id, f.john, true).await?;
    assert!(first.materialized.is_empty());
    let second = f.engine.respond(chain.id, f.sarah, true).await?;
    assert!(second.materialized.is_empty());
    assert!(f.exchanges.is_empty());

    let last = f.engine.respond(chain.id, f.mike, true).await?;
    assert_eq!(last.chain.status, ChainStatus::Accepted);
    assert!(last.chain.accepted_at.is_some());
    assert_eq!(last.materialized.len(), 3);
    assert_eq!(f.exchanges.len(), 3);

    // Each link's user is the initiator; the next link's user (modulo 3)
    // is the responder contributing their own offer.
    let users = [f.john, f.sarah, f.mike];
    for (index, exchange) in last.materialized.iter().enumerate() {
        assert_eq!(exchange.status, ExchangeStatus::Accepted);
        assert!(exchange.accepted_at.is_some());
        assert_eq!(exchange.initiator, users[index]);
        assert_eq!(exchange.responder, users[(index + 1) % 3]);
        assert_eq!(exchange.initiator_hours_required, dec!(1));
        assert_eq!(exchange.responder_hours_required, dec!(1));
    }

    // With one nominal hour per link, aggregate give and receive values
    // coincide.
    assert_eq!(f.engine.fairness(chain.id).await?, dec!(100.0));
    Ok(())
}

#[tokio::test]
async fn test_pending_link_blocks_materialization() {
    let f = fixture();
    let proposal = discovered_proposal(&f).await;
    let chain = f
        .engine
        .propose_from(&proposal, "incomplete loop", f.john)
        .await
        .unwrap();

    f.engine.respond(chain.id, f.john, true).await.unwrap();
    f.engine.respond(chain.id, f.sarah, true).await.unwrap();

    let stored = f.engine.get(chain.id).await.unwrap();
    assert_eq!(stored.status, ChainStatus::Pending);
    assert_eq!(
        stored.link_for(f.mike).unwrap().status,
        LinkStatus::Pending
    );
    assert!(f.exchanges.is_empty());
}

#[tokio::test]
async fn test_rejected_link_parks_the_chain() {
    let f = fixture();
    let proposal = discovered_proposal(&f).await;
    let chain = f
        .engine
        .propose_from(&proposal, "rejected loop", f.john)
        .await
        .unwrap();

    f.engine.respond(chain.id, f.john, true).await.unwrap();
    let outcome = f.engine.respond(chain.id, f.sarah, false).await.unwrap();
    assert!(outcome.materialized.is_empty());
    assert!(outcome.chain.any_rejected());
    assert_eq!(outcome.chain.status, ChainStatus::Pending);

    // The remaining accept cannot close a chain with a rejected link.
    f.engine.respond(chain.id, f.mike, true).await.unwrap();
    assert!(f.exchanges.is_empty());
    assert_eq!(
        f.engine.get(chain.id).await.unwrap().status,
        ChainStatus::Pending
    );
}

#[tokio::test]
async fn test_double_response_is_a_conflict() {
    let f = fixture();
    let proposal = discovered_proposal(&f).await;
    let chain = f
        .engine
        .propose_from(&proposal, "loop", f.john)
        .await
        .unwrap();

    f.engine.respond(chain.id, f.sarah, true).await.unwrap();
    let err = f.engine.respond(chain.id, f.sarah, true).await.unwrap_err();
    assert!(matches!(
        err,
        MatchError::LinkConflict {
            status: LinkStatus::Accepted,
            ..
        }
    ));
}

#[tokio::test]
async fn test_concurrent_accepts_exactly_one_wins() {
    let f = fixture();
    let proposal = discovered_proposal(&f).await;
    let chain = f
        .engine
        .propose_from(&proposal, "raced loop", f.john)
        .await
        .unwrap();

    let engine = Arc::new(f.engine);
    let (a, b) = tokio::join!(
        {
            let engine = Arc::clone(&engine);
            async move { engine.respond(chain.id, f.sarah, true).await }
        },
        {
            let engine = Arc::clone(&engine);
            async move { engine.respond(chain.id, f.sarah, true).await }
        }
    );

    let oks = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(oks, 1);
    let conflict = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
    assert!(matches!(conflict, MatchError::LinkConflict { .. }));

    let stored = engine.get(chain.id).await.unwrap();
    assert_eq!(
        stored.link_for(f.sarah).unwrap().status,
        LinkStatus::Accepted
    );
    // Only one link accepted: nothing materialized.
    assert!(f.exchanges.is_empty());
}

#[tokio::test]
async fn test_outsider_cannot_respond() {
    let f = fixture();
    let proposal = discovered_proposal(&f).await;
    let chain = f
        .engine
        .propose_from(&proposal, "loop", f.john)
        .await
        .unwrap();

    let outsider = UserId::new();
    let err = f.engine.respond(chain.id, outsider, true).await.unwrap_err();
    assert!(matches!(err, MatchError::NotChainParticipant { .. }));
}

#[tokio::test]
async fn test_closed_chain_refuses_further_responses() {
    let f = fixture();
    let proposal = discovered_proposal(&f).await;
    let chain = f
        .engine
        .propose_from(&proposal, "loop", f.john)
        .await
        .unwrap();

    for user in [f.john, f.sarah, f.mike] {
        f.engine.respond(chain.id, user, true).await.unwrap();
    }

    let err = f.engine.respond(chain.id, f.john, true).await.unwrap_err();
    assert!(matches!(
        err,
        MatchError::ChainClosed {
            status: ChainStatus::Accepted,
            ..
        }
    ));
}
