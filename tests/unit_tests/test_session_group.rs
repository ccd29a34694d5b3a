// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use smpp_session_rs::cfg::config::{CreateFn, SessionGroupConfig, SessionGroupManagerConfig};
use smpp_session_rs::group::{SessionGroup, SessionGroupManager};
use smpp_session_rs::session::{Session, SessionConfig};

use super::support::{make_client_connection, spawn_echo_responder};

type CreateOutput = Pin<Box<dyn Future<Output = anyhow::Result<Arc<Session<()>>>> + Send>>;

fn dialing_create_fn(label: &'static str) -> CreateFn<()> {
    Arc::new(move |_group: &SessionGroup<()>| -> CreateOutput {
        Box::pin(async move {
            let (conn, server_task) = make_client_connection(label);
            let (session, server) = tokio::join!(Session::new(conn, SessionConfig::<()>::default()), server_task);
            let server = server?;
            spawn_echo_responder(server);
            let session = session?;
            Ok(session)
        })
    })
}

#[tokio::test]
async fn group_auto_fills_rebalances_and_shrinks() {
    let config = SessionGroupConfig {
        group_id: "pool-a".to_string(),
        capacity: 3,
        auto_fill: true,
        values: Arc::new(()),
        create_fn: dialing_create_fn("pool-a"),
        failed_fn: None,
    };

    let group = SessionGroup::new(config);
    group.adjust().await;
    assert_eq!(group.all().await.len(), 3);

    let picked = group.round().await.expect("round should return a session while the pool is non-empty");
    assert!(group.all().await.iter().any(|s| s.id() == picked.id()));

    let victim = group.all().await[0].id().to_string();
    group.del(&victim).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(group.all().await.len(), 3, "auto_fill should replace the deleted session");
    assert!(group.get(&victim).await.is_none());

    group.set_capacity(1).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(group.all().await.len(), 1);

    group.destroy().await;
    assert_eq!(group.all().await.len(), 0);

    group.destroy().await;
}

#[tokio::test]
async fn group_add_rejects_past_capacity_and_after_destroy() {
    let config = SessionGroupConfig {
        group_id: "pool-b".to_string(),
        capacity: 1,
        auto_fill: false,
        values: Arc::new(()),
        create_fn: dialing_create_fn("pool-b"),
        failed_fn: None,
    };

    let group = SessionGroup::new(config);
    assert_eq!(group.all().await.len(), 0, "auto_fill is off, so nothing is created up front");

    let (conn, server_task) = make_client_connection("pool-b-manual");
    let (session, server) = tokio::join!(Session::new(conn, SessionConfig::<()>::default()), server_task);
    let _echo = spawn_echo_responder(server.expect("server task panicked"));
    let session = session.expect("dial failed");

    group.add(session.clone()).await.expect("first add should fit within capacity");
    assert!(group.add(session.clone()).await.is_err(), "second add should overflow capacity 1");

    group.destroy().await;
    assert!(group.add(session).await.is_err(), "add after destroy must fail");
}

#[tokio::test]
async fn manager_registers_and_unregisters_groups() {
    let manager: Arc<SessionGroupManager<()>> = SessionGroupManager::new(SessionGroupManagerConfig {
        adjust_interval: Duration::from_secs(3600),
    });

    let config = SessionGroupConfig {
        group_id: "pool-c".to_string(),
        capacity: 2,
        auto_fill: true,
        values: Arc::new(()),
        create_fn: dialing_create_fn("pool-c"),
        failed_fn: None,
    };

    manager.register(config).await.expect("register should succeed");
    let group = manager.get("pool-c").await.expect("group should be registered");
    assert_eq!(group.all().await.len(), 2);

    let duplicate = SessionGroupConfig {
        group_id: "pool-c".to_string(),
        capacity: 1,
        auto_fill: false,
        values: Arc::new(()),
        create_fn: dialing_create_fn("pool-c-dup"),
        failed_fn: None,
    };
    assert!(manager.register(duplicate).await.is_err(), "duplicate group id must be rejected");

    manager.unregister("pool-c").await;
    assert!(manager.get("pool-c").await.is_none());
}
