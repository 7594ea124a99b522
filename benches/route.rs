use criterion::{criterion_group, criterion_main, Criterion};
use signal_relay::relay::{route, InboundMessage, Peer, Room};
use signal_relay::ConnectionHandle;

fn bench_decode_and_route(c: &mut Criterion) {
    let candidate = "candidate:842163049 1 udp 1677729535 203.0.113.7 46154 typ srflx raddr 10.0.0.2 rport 46154";
    let text = serde_json::json!({ "to": 1, "event": "addIceCandidate", "data": candidate }).to_string();

    c.bench_function("decode_and_route_candidate", |b| {
        b.iter(|| {
            let message = InboundMessage::from_json(&text).expect("decode");
            route(message, 0).expect("route")
        })
    });
}

fn bench_lookup_and_deliver(c: &mut Criterion) {
    let room = Room::new("bench");
    let mut outboxes = Vec::new();
    for _ in 0..16 {
        let id = room.next_peer_id();
        let (handle, outbox) = ConnectionHandle::new(id, 1024);
        room.add_peer(Peer::new(id, handle)).expect("add peer");
        outboxes.push(outbox);
    }
    let text = r#"{"to": 7, "event": "createOffer", "data": "v=0"}"#;

    c.bench_function("lookup_and_deliver", |b| {
        b.iter(|| {
            let message = InboundMessage::from_json(text).expect("decode");
            let (target, outbound) = route(message, 0).expect("route");
            let recipient = room.lookup(target).expect("lookup");
            recipient.deliver(outbound).expect("deliver");
            outboxes[target as usize].try_recv().expect("drain");
        })
    });
}

criterion_group!(benches, bench_decode_and_route, bench_lookup_and_deliver);
criterion_main!(benches);
