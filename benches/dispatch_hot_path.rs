use cmdrouter::access::{AccessAuthentication, AccessRules, ActorSession};
use cmdrouter::action::{action_fn, ActionDescriptor, ActionRegistry};
use cmdrouter::affinity::{affinity_key, AffinityConfig, AffinityRouter, ExecutorMode};
use cmdrouter::cmd::CmdMerge;
use cmdrouter::codec::{ByteValueList, JsonDataCodec, ValueType};
use cmdrouter::dispatcher::{Dispatcher, RequestMessage};
use cmdrouter::parser::{MethodParsers, ParamShape};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use std::hint::black_box;
use std::sync::Arc;

/// Route merge and executor selection, done for every request
fn bench_route_and_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("route_and_select");

    group.bench_function("cmd_merge", |b| {
        b.iter(|| CmdMerge::merge(black_box(100), black_box(1)));
    });

    let route = CmdMerge::merge(100, 1).unwrap_or_default();
    group.bench_function("affinity_key_actor", |b| {
        b.iter(|| affinity_key(black_box(42), None, route));
    });
    group.bench_function("affinity_key_channel", |b| {
        b.iter(|| affinity_key(0, black_box(Some("gate-1/conn-77")), route));
    });

    let router = AffinityRouter::<()>::new(
        AffinityConfig::new(8, "Bench", false, 0x10000, ExecutorMode::Thread),
        |_, ()| {},
    );
    if let Ok(router) = router {
        group.bench_function("select", |b| {
            b.iter(|| router.select(black_box(123_456_789)));
        });
    }

    group.finish();
}

/// Access gate check against a rule set of growing size
fn bench_access_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("access_check");
    let session = ActorSession::verified(42);

    for rules in [0, 16, 256] {
        let mut set = AccessRules::new();
        for cmd in 0..rules {
            set = set.ignore_cmd_merge(CmdMerge::merge(cmd, 1).unwrap_or_default());
        }
        let access = AccessAuthentication::new(set);
        let route = CmdMerge::merge(7, 7).unwrap_or_default();

        group.bench_with_input(BenchmarkId::new("check", rules), &rules, |b, _| {
            b.iter(|| access.check(black_box(&session), black_box(route)));
        });
    }

    group.finish();
}

/// List parameter decode through the default parser
fn bench_list_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_parse");
    let parsers = MethodParsers::default();
    let parser = parsers.resolve(ParamShape::list(ValueType::long()));

    for len in [1usize, 16, 256] {
        let items: Vec<_> = (0..len).map(|i| json!(i)).collect();
        let Ok(wire) = ByteValueList::encode_values(&JsonDataCodec, &items) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::new("long_list", len), &wire, |b, wire| {
            b.iter(|| parser.parse_param(black_box(Some(wire.as_slice())), &parsers.context()));
        });
    }

    group.finish();
}

/// Full request round trip through one executor
fn bench_dispatch_call(c: &mut Criterion) {
    let mut registry = ActionRegistry::new(Arc::new(MethodParsers::default()));
    let Ok(double) = registry.register_action(
        1,
        1,
        ActionDescriptor::new("double")
            .with_param(ParamShape::scalar(ValueType::int()))
            .with_result(ParamShape::scalar(ValueType::int())),
        action_fn(|_flow, n: i32| Ok(n.wrapping_mul(2))),
    ) else {
        return;
    };

    let access = AccessAuthentication::new(AccessRules::new().verify_identity(false));
    let Ok(dispatcher) = Dispatcher::new(
        Arc::new(registry),
        Arc::new(access),
        AffinityConfig::new(2, "Bench", false, 0x10000, ExecutorMode::Thread),
        None,
    ) else {
        return;
    };

    c.bench_function("dispatch_call", |b| {
        b.iter(|| {
            let request = RequestMessage::new(double)
                .with_session(ActorSession::verified(42))
                .with_data(b"21".to_vec());
            dispatcher.call(black_box(request))
        });
    });
}

criterion_group!(
    benches,
    bench_route_and_select,
    bench_access_check,
    bench_list_parse,
    bench_dispatch_call
);
criterion_main!(benches);
