// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test readability
#![allow(clippy::cast_possible_truncation)] // Test parameters
#![allow(clippy::cast_possible_wrap)] // Test conversions
#![allow(clippy::missing_panics_doc)] // Tests panic on failure
#![allow(clippy::too_many_lines)] // Scenario tests

//! End-to-end monitoring scenarios.
//!
//! Drives a [`Server`] through its mutation entry points and checks the
//! reports produced by [`Monitor`]:
//! - connection counters after a publish round trip
//! - default ordering, state scoping and pagination of connz
//! - sort key directions over closed connections
//! - subscription test filter validation
//! - concurrent polling while connections churn

use broker_monitor::time::parse_uptime;
use broker_monitor::{
    ClosedState, ConnInfo, ConnState, ConnectInfo, ConnzOptions, Monitor, MonitorConfig,
    MonitorError, RouteSpec, RoutezOptions, Server, SortOpt, SubszOptions,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

fn setup(config: MonitorConfig) -> (Arc<Server>, Monitor) {
    let server = Arc::new(Server::with_id(config, "NE2E"));
    let monitor = Monitor::new(Arc::clone(&server));
    (server, monitor)
}

fn connect(server: &Server, port: u16) -> u64 {
    server.accept_client(SocketAddr::from(([127, 0, 0, 1], port)))
}

fn connz(monitor: &Monitor, opts: ConnzOptions) -> Vec<ConnInfo> {
    monitor.connz(&opts).expect("connz").connections
}

#[test]
fn test_single_connection_round_trip() {
    let (server, monitor) = setup(MonitorConfig::default());
    let cid = connect(&server, 50000);
    server
        .set_connect_info(
            cid,
            ConnectInfo {
                name: "e2e".into(),
                lang: "rust".into(),
                version: "1.0.0".into(),
                ..Default::default()
            },
        )
        .unwrap();

    let inbox = "_INBOX.e2e";
    server.subscribe(cid, inbox, None, "1").unwrap();
    assert_eq!(server.publish(cid, inbox, b"Hello").unwrap(), 1);
    server.unsubscribe(cid, "1").unwrap();

    let c = monitor.connz(&ConnzOptions::default()).unwrap();
    assert_eq!(c.server_id, "NE2E");
    assert_eq!(c.num_connections, 1);
    assert_eq!(c.total, 1);
    let ci = &c.connections[0];
    assert_eq!(ci.cid, cid);
    assert_eq!(ci.ip, "127.0.0.1");
    assert_eq!(ci.port, 50000);
    assert_eq!(ci.name, "e2e");
    assert_eq!(ci.lang, "rust");
    assert_eq!(ci.num_subs, 0);
    assert_eq!((ci.in_msgs, ci.out_msgs), (1, 1));
    assert_eq!((ci.in_bytes, ci.out_bytes), (5, 5));
    assert!(ci.last_activity >= ci.start);
    assert!(ci.tls_version.is_empty());
    assert!(parse_uptime(&ci.uptime).is_some());
    assert!(parse_uptime(&ci.idle).is_some());
}

#[test]
fn test_default_sort_is_ascending_cid() {
    let (server, monitor) = setup(MonitorConfig::default());
    for port in 0..4 {
        let cid = connect(&server, 51000 + port);
        // Give later connections more traffic so a counter sort would differ.
        for _ in 0..port {
            server.publish(cid, "foo", b"x").unwrap();
        }
    }
    let conns = connz(&monitor, ConnzOptions::default());
    assert_eq!(conns.len(), 4);
    assert!(conns.windows(2).all(|w| w[0].cid < w[1].cid));

    let by_in = connz(
        &monitor,
        ConnzOptions {
            sort: SortOpt::ByInMsgs,
            ..Default::default()
        },
    );
    let counts: Vec<u64> = by_in.iter().map(|c| c.in_msgs).collect();
    assert_eq!(counts, vec![3, 2, 1, 0]);
}

#[test]
fn test_state_scoping() {
    let (server, monitor) = setup(MonitorConfig::default());
    let cids: Vec<u64> = (0..20).map(|i| connect(&server, 52000 + i)).collect();
    for cid in cids.iter().step_by(2) {
        server.close_connection(*cid, ClosedState::ClientClosed).unwrap();
    }

    let count = |state| {
        monitor
            .connz(&ConnzOptions {
                state,
                ..Default::default()
            })
            .unwrap()
            .num_connections
    };
    assert_eq!(count(ConnState::Open), 10);
    assert_eq!(count(ConnState::Closed), 10);
    assert_eq!(count(ConnState::Any), 20);

    let closed = connz(
        &monitor,
        ConnzOptions {
            state: ConnState::Closed,
            ..Default::default()
        },
    );
    for c in &closed {
        let stop = c.stop.expect("closed record has stop");
        assert!(c.last_activity <= stop);
        assert!(stop >= c.start);
        let idle = parse_uptime(&c.idle).expect("idle parses");
        let uptime = parse_uptime(&c.uptime).expect("uptime parses");
        assert!(idle <= uptime);
        assert_eq!(c.reason.as_deref(), Some("Client Closed"));
    }
}

#[test]
fn test_unknown_cid_is_empty_not_error() {
    let (server, monitor) = setup(MonitorConfig::default());
    connect(&server, 53000);
    let c = monitor
        .connz(&ConnzOptions {
            cid: 999,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(c.num_connections, 0);
    assert_eq!(c.total, 0);
    assert!(matches!(
        monitor.connection(999),
        Err(MonitorError::NotFound(_))
    ));
}

#[test]
fn test_page_size_property() {
    let (server, monitor) = setup(MonitorConfig::default());
    for i in 0..12 {
        connect(&server, 54000 + i);
    }
    for offset in 0..15i64 {
        for limit in 1..15i64 {
            let c = monitor
                .connz(&ConnzOptions {
                    offset,
                    limit,
                    ..Default::default()
                })
                .unwrap();
            let expected = (limit as usize).min(12usize.saturating_sub(offset as usize));
            assert_eq!(c.num_connections, expected, "offset={} limit={}", offset, limit);
            assert_eq!(c.total, 12);
        }
    }
}

#[test]
fn test_closed_sort_keys() {
    let (server, monitor) = setup(MonitorConfig::default());
    let reasons = [
        ClosedState::ClientClosed,
        ClosedState::StaleConnection,
        ClosedState::ReadError,
        ClosedState::AuthenticationTimeout,
        ClosedState::SlowConsumerWriteDeadline,
    ];
    for i in 0..30u16 {
        let cid = connect(&server, 55000 + i);
        for _ in 0..fastrand::usize(0..5) {
            server.subscribe(cid, "foo", None, &fastrand::u32(..).to_string()).unwrap();
        }
        for _ in 0..fastrand::usize(0..5) {
            server.publish(cid, "bar", &vec![0u8; fastrand::usize(1..64)]).unwrap();
        }
        let reason = reasons[fastrand::usize(0..reasons.len())];
        server.close_connection(cid, reason).unwrap();
    }

    let sorted = |sort| {
        connz(
            &monitor,
            ConnzOptions {
                sort,
                state: ConnState::Closed,
                ..Default::default()
            },
        )
    };

    let by_stop = sorted(SortOpt::ByStop);
    assert!(by_stop.windows(2).all(|w| w[0].stop >= w[1].stop));

    let by_reason = sorted(SortOpt::ByReason);
    assert!(by_reason.windows(2).all(|w| w[0].reason <= w[1].reason));

    let by_subs = sorted(SortOpt::BySubs);
    assert!(by_subs.windows(2).all(|w| w[0].num_subs >= w[1].num_subs));

    let by_bytes = sorted(SortOpt::ByInBytes);
    assert!(by_bytes.windows(2).all(|w| w[0].in_bytes >= w[1].in_bytes));

    for sort in SortOpt::ALL {
        let first = sorted(sort);
        let second = sorted(sort);
        let a: Vec<u64> = first.iter().map(|c| c.cid).collect();
        let b: Vec<u64> = second.iter().map(|c| c.cid).collect();
        assert_eq!(a, b, "sort {} not deterministic", sort);
        for c in &first {
            assert!(parse_uptime(&c.idle).is_some());
        }
    }
}

#[test]
fn test_closed_only_sorts_need_closed_scope() {
    let (server, monitor) = setup(MonitorConfig::default());
    connect(&server, 56000);
    for sort in [SortOpt::ByStop, SortOpt::ByReason] {
        let err = monitor
            .connz(&ConnzOptions {
                sort,
                state: ConnState::Any,
                ..Default::default()
            })
            .unwrap_err();
        assert!(err.is_request_error());
        assert!(matches!(err, MonitorError::IncompatibleScope { .. }));
    }
}

#[test]
fn test_ring_eviction_through_server() {
    let (server, monitor) = setup(MonitorConfig {
        max_closed_connections: 5,
        ..Default::default()
    });
    let cids: Vec<u64> = (0..8).map(|i| connect(&server, 57000 + i)).collect();
    for cid in &cids {
        server.close_connection(*cid, ClosedState::ClientClosed).unwrap();
    }
    let closed = connz(
        &monitor,
        ConnzOptions {
            state: ConnState::Closed,
            ..Default::default()
        },
    );
    let got: Vec<u64> = closed.iter().map(|c| c.cid).collect();
    assert_eq!(got, cids[3..].to_vec());
}

#[test]
fn test_subsz_test_subject() {
    let (server, monitor) = setup(MonitorConfig::default());
    let cid = connect(&server, 58000);
    server.subscribe(cid, "foo.*", None, "1").unwrap();
    server.subscribe(cid, "foo.bar", None, "2").unwrap();
    server.subscribe(cid, "foo.foo", None, "3").unwrap();

    let err = monitor
        .subsz(&SubszOptions {
            subscriptions: true,
            test: "foo.*".into(),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, MonitorError::InvalidParameter { .. }));

    let s = monitor
        .subsz(&SubszOptions {
            subscriptions: true,
            test: "foo.bar".into(),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(s.subs.len(), 2);
    assert_eq!(s.num_subscriptions, 3);
}

#[test]
fn test_routes_report_remote_interest() {
    let (server, monitor) = setup(MonitorConfig::default());
    let rid = server.add_route(RouteSpec {
        remote_id: "NREMOTE".into(),
        ip: "127.0.0.1".into(),
        port: 6222,
        did_solicit: false,
        is_configured: false,
        permissions: None,
    });
    server.subscribe(rid, "hello.bar", None, "1").unwrap();
    let client = connect(&server, 59000);
    server.publish(client, "hello.bar", b"hi").unwrap();

    let r = monitor.routez(&RoutezOptions { subscriptions: true }).unwrap();
    assert_eq!(r.num_routes, 1);
    let route = &r.routes[0];
    assert_eq!(route.rid, rid);
    assert_eq!(route.remote_id, "NREMOTE");
    assert_eq!(route.num_subs, 1);
    assert_eq!(route.subs, vec!["hello.bar".to_string()]);
    assert_eq!((route.out_msgs, route.out_bytes), (1, 2));
}

#[test]
fn test_concurrent_polling_during_churn() {
    let (server, monitor) = setup(MonitorConfig {
        max_closed_connections: 50,
        ..Default::default()
    });
    let monitor = Arc::new(monitor);
    let stop = Arc::new(AtomicBool::new(false));

    let writer = {
        let server = Arc::clone(&server);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut port = 60000u16;
            while !stop.load(Ordering::Relaxed) {
                let cid = connect(&server, port);
                port = port.wrapping_add(1);
                server.subscribe(cid, "churn.>", None, "1").unwrap();
                server.publish(cid, "churn.x", b"payload").unwrap();
                server.close_connection(cid, ClosedState::ClientClosed).unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let monitor = Arc::clone(&monitor);
            thread::spawn(move || {
                for _ in 0..200 {
                    let c = monitor
                        .connz(&ConnzOptions {
                            state: ConnState::Any,
                            subscriptions: true,
                            ..Default::default()
                        })
                        .unwrap();
                    let mut cids: Vec<u64> = c.connections.iter().map(|c| c.cid).collect();
                    let n = cids.len();
                    cids.dedup();
                    assert_eq!(cids.len(), n, "connection reported twice");
                    assert!(c.connections.len() <= 51);
                    monitor.subsz(&SubszOptions::default()).unwrap();
                    monitor.varz(&Default::default()).unwrap();
                }
            })
        })
        .collect();

    for reader in readers {
        reader.join().expect("reader thread");
    }
    stop.store(true, Ordering::Relaxed);
    writer.join().expect("writer thread");
}
