//! # Quorum Evidence over Gossip
//!
//! Several nodes attest the same fact, one collects the attestations into an
//! aggregate and gossips it; receivers check the aggregate against the fact.

use super::fixtures::{signer, GossipNode, Inbox};
use mm_01_signatures::{AggregateAttestation, Attestation, SignatureApi, SignatureError};
use mm_03_gossip::{Disposition, GossipApi, GossipMessage, GossipPayload};
use serde_json::{json, Value};
use shared_types::GossipConfig;

fn fact() -> Value {
    json!({"height": 1024, "root": "8f2c9a", "round": 7})
}

fn attest_all(count: usize, fact: &Value) -> Vec<Attestation> {
    (0..count).map(|_| signer().attest(fact).unwrap()).collect()
}

#[test]
fn aggregate_travels_and_verifies() {
    let collector = signer();
    let mut attestations = attest_all(4, &fact());
    // a forged entry and a repeated signer are dropped during collection
    attestations.push(Attestation {
        signer: attestations[0].signer.clone(),
        signature: attestations[1].signature.clone(),
    });
    attestations.push(attestations[2].clone());

    let evidence = AggregateAttestation::collect(&collector, &fact(), attestations).unwrap();
    assert_eq!(evidence.attestations.len(), 4);
    assert!(evidence.is_valid(&collector, &fact()));

    let payload = GossipPayload::new(
        "quorum",
        json!({"fact": fact(), "evidence": serde_json::to_value(&evidence).unwrap()}),
    );
    let attestation = collector.attest(&payload.to_value()).unwrap();
    let message = GossipMessage::new(payload.clone(), attestation);

    let receiver = GossipNode::new(GossipConfig::for_testing());
    let inbox = Inbox::default();
    receiver.gossip.register_handler("quorum", inbox.handler()).unwrap();
    let peers = receiver.connect_peers(3);

    assert!(matches!(
        receiver.gossip.handle_inbound(&peers[0], message),
        Disposition::Accepted { dispatched: true, .. }
    ));

    let (origin, data) = inbox.received().remove(0);
    assert_eq!(Some(origin), collector.local_address());

    let verifier = signer();
    let evidence: AggregateAttestation = serde_json::from_value(data["evidence"].clone()).unwrap();
    assert!(evidence.is_valid(&verifier, &data["fact"]));
    assert!(!evidence.is_valid(&verifier, &json!({"height": 1025})));
}

#[test]
fn evidence_with_a_dropped_signer_fails() {
    let collector = signer();
    let evidence =
        AggregateAttestation::collect(&collector, &fact(), attest_all(3, &fact())).unwrap();

    let mut trimmed = evidence.clone();
    trimmed.attestations.pop();
    assert!(!trimmed.is_valid(&collector, &fact()));
}

#[test]
fn batch_verification_matches_individual() {
    let verifier = signer();
    let facts: Vec<Value> = (0..6).map(|i| json!({"seq": i})).collect();
    let mut items: Vec<(Attestation, Value)> = facts
        .iter()
        .map(|f| (signer().attest(f).unwrap(), f.clone()))
        .collect();
    items[4].1 = json!({"seq": 99});

    let results = verifier.verify_batch(&items);
    let individual: Vec<bool> = items.iter().map(|(a, v)| verifier.verify(a, v)).collect();
    assert_eq!(results, individual);
    assert_eq!(results.iter().filter(|ok| !**ok).count(), 1);
    assert!(!results[4]);
}

#[test]
fn nothing_valid_means_no_evidence() {
    let collector = signer();
    let wrong = attest_all(2, &json!("something else"));
    assert_eq!(
        AggregateAttestation::collect(&collector, &fact(), wrong).unwrap_err(),
        SignatureError::NoValidAttestations
    );
}
