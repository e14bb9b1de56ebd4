//! # Gossip Scenarios
//!
//! The three reference scenarios, run against the real signature service,
//! registry and gossip engine with only the network replaced.
//!
//! | Scenario | Input | Expected |
//! |----------|-------|----------|
//! | A | valid `ping`, hop 0, infect 3, die 2 | one dispatch, 3 forwards at hop 1 |
//! | B | same fingerprint twice | second: no dispatch, no forward, no strike |
//! | C | failing signature | strike +1; jailed after `jail_strikes` |

use super::fixtures::{signer, GossipNode, Inbox};
use mm_01_signatures::SignatureApi;
use mm_02_peer_registry::{StrikeOutcome, StrikeReason};
use mm_03_gossip::{Disposition, GossipApi, GossipMessage, GossipPayload, RejectReason};
use serde_json::{json, Value};
use shared_types::{GossipConfig, PeerId};
use std::collections::HashSet;

fn scenario_config() -> GossipConfig {
    GossipConfig {
        infect: 3,
        die: 2,
        parallel_peers: 8,
        ..GossipConfig::for_testing()
    }
}

fn signed(signatures: &dyn SignatureApi, kind: &str, data: Value, hop_count: u32) -> GossipMessage {
    let payload = GossipPayload::new(kind, data);
    let attestation = signatures.attest(&payload.to_value()).unwrap();
    GossipMessage {
        hop_count,
        ..GossipMessage::new(payload, attestation)
    }
}

#[test]
fn scenario_a_valid_message_dispatched_once_and_forwarded_to_three() {
    let x = GossipNode::new(scenario_config());
    let inbox = Inbox::default();
    x.gossip.register_handler("ping", inbox.handler()).unwrap();

    let peers = x.connect_peers(6);
    let y = signer();
    let y_id = y.local_address().unwrap();
    let sender = peers[0].clone();

    let message = signed(&y, "ping", json!("ping"), 0);
    let disposition = x.gossip.handle_inbound(&sender, message.clone());

    let Disposition::Accepted {
        dispatched,
        forwarded_to,
    } = disposition
    else {
        panic!("expected acceptance, got {disposition:?}");
    };
    assert!(dispatched);
    assert_eq!(forwarded_to.len(), 3);
    assert!(!forwarded_to.contains(&sender));

    assert_eq!(inbox.received(), vec![(y_id, json!("ping"))]);

    let sent = x.network.sent();
    assert_eq!(sent.len(), 3);
    let targets: HashSet<_> = sent.iter().map(|(peer, _)| peer.clone()).collect();
    assert_eq!(targets.len(), 3);
    for (_, relayed) in &sent {
        assert_eq!(relayed.hop_count, 1);
        assert_eq!(relayed.fingerprint(), message.fingerprint());
        assert!(y.verify(&relayed.attestation(), &relayed.payload.to_value()));
    }
}

#[test]
fn scenario_b_duplicate_is_absorbed_silently() {
    let x = GossipNode::new(scenario_config());
    let inbox = Inbox::default();
    x.gossip.register_handler("ping", inbox.handler()).unwrap();
    let peers = x.connect_peers(5);

    let message = signed(&signer(), "ping", json!({"seq": 1}), 0);
    assert!(matches!(
        x.gossip.handle_inbound(&peers[0], message.clone()),
        Disposition::Accepted { .. }
    ));
    x.network.clear();

    // again, from a different peer and one hop further along
    let again = message.relayed();
    assert_eq!(x.gossip.handle_inbound(&peers[1], again), Disposition::Duplicate);

    assert_eq!(inbox.len(), 1);
    assert!(x.network.sent().is_empty());
    for peer in &peers {
        assert_eq!(x.registry.get(peer).unwrap().strikes, 0);
    }
}

#[test]
fn scenario_c_bad_signatures_strike_then_jail() {
    let config = scenario_config();
    let x = GossipNode::new(config.clone());
    let inbox = Inbox::default();
    x.gossip.register_handler("ping", inbox.handler()).unwrap();
    let peers = x.connect_peers(4);
    let z = peers[0].clone();
    let forger = signer();

    for round in 1..=config.jail_strikes {
        let mut message = signed(&forger, "ping", json!({"round": round}), 0);
        message.payload.data = json!({"round": round, "tampered": true});

        let disposition = x.gossip.handle_inbound(&z, message);
        let Disposition::Rejected { reason, strike } = disposition else {
            panic!("expected rejection, got {disposition:?}");
        };
        assert_eq!(reason, RejectReason::InvalidSignature);

        if round < config.jail_strikes {
            assert_eq!(strike, StrikeOutcome::Counted { strikes: round });
            assert!(x.registry.is_eligible_for_gossip(&z));
        } else {
            let expected_until = x.registry.now().add_duration(config.jail_duration);
            assert_eq!(strike, StrikeOutcome::Jailed { until: expected_until });
        }
    }

    assert!(inbox.is_empty());
    assert!(x.network.sent().is_empty());
    assert!(!x.registry.is_eligible_for_gossip(&z));

    // jailed: even a valid message is refused, and no further strike lands
    let valid = signed(&forger, "ping", json!("late"), 0);
    assert_eq!(x.gossip.handle_inbound(&z, valid.clone()), Disposition::Refused);
    assert_eq!(x.registry.get(&z).unwrap().strikes, 0);

    // never released early
    x.clock.advance(config.jail_duration.as_secs() - 1);
    assert!(x.registry.is_jailed(&z));
    x.clock.advance(1);
    assert!(x.registry.is_jailed(&z));

    x.clock.advance_millis(1);
    assert!(!x.registry.is_jailed(&z));
    assert!(x.registry.is_eligible_for_gossip(&z));
    assert!(matches!(
        x.gossip.handle_inbound(&z, valid),
        Disposition::Accepted { dispatched: true, .. }
    ));
}

#[test]
fn jailed_peer_is_excluded_from_fanout() {
    let x = GossipNode::new(GossipConfig {
        infect: 8,
        ..scenario_config()
    });
    let peers = x.connect_peers(4);
    let offender = peers[3].clone();
    for _ in 0..x.config.jail_strikes {
        x.registry.record_strike(&offender, StrikeReason::MalformedFrame);
    }

    let report = x.gossip.publish("ping", json!(1)).unwrap();
    assert_eq!(report.forwarded_to.len(), 3);
    assert!(!report.forwarded_to.contains(&offender));
}

#[test]
fn message_at_die_is_dispatched_but_not_relayed() {
    let config = scenario_config();
    let x = GossipNode::new(config.clone());
    let inbox = Inbox::default();
    x.gossip.register_handler("ping", inbox.handler()).unwrap();
    let peers = x.connect_peers(5);

    let message = signed(&signer(), "ping", json!("last hop"), config.die);
    assert_eq!(
        x.gossip.handle_inbound(&peers[0], message),
        Disposition::Accepted {
            dispatched: true,
            forwarded_to: Vec::new(),
        }
    );
    assert_eq!(inbox.len(), 1);
    assert!(x.network.sent().is_empty());
}

#[test]
fn relay_depth_is_bounded_across_a_chain() {
    // a hand-run chain: each hop's output is the next node's input
    let config = scenario_config();
    let origin = signer();
    let mut message = signed(&origin, "ping", json!("chain"), 0);
    let mut hops = 0;

    loop {
        let node = GossipNode::new(config.clone());
        let peers = node.connect_peers(3);
        let Disposition::Accepted { forwarded_to, .. } =
            node.gossip.handle_inbound(&peers[0], message.clone())
        else {
            panic!("chain node rejected the message");
        };
        if forwarded_to.is_empty() {
            break;
        }
        hops += 1;
        message = node.network.sent()[0].1.clone();
    }

    assert_eq!(hops, config.die);
    assert_eq!(message.hop_count, config.die);
}

#[test]
fn strike_against_unknown_sender_is_reported() {
    let x = GossipNode::new(scenario_config());
    let stranger = PeerId::from("never-connected");
    let mut message = signed(&signer(), "ping", json!(1), 0);
    message.signature = message.signature.chars().rev().collect();

    let disposition = x.gossip.handle_inbound(&stranger, message);
    assert!(matches!(
        disposition,
        Disposition::Rejected {
            reason: RejectReason::InvalidSignature,
            strike: StrikeOutcome::UnknownPeer,
        }
    ));
}

#[test]
fn seen_window_expires() {
    let x = GossipNode::new(scenario_config());
    let inbox = Inbox::default();
    x.gossip.register_handler("ping", inbox.handler()).unwrap();
    let peers = x.connect_peers(2);
    let message = signed(&signer(), "ping", json!("window"), 0);

    x.gossip.handle_inbound(&peers[0], message.clone());
    x.clock.advance(24 * 3600);
    assert!(x.gossip.prune_seen() >= 1);

    assert!(matches!(
        x.gossip.handle_inbound(&peers[1], message),
        Disposition::Accepted { .. }
    ));
    assert_eq!(inbox.len(), 2);
}
