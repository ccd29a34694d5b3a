// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::{Arc, Mutex};
use std::time::Duration;

use smpp_session_rs::pdu::{Address, Pdu, SubmitSmBody, next_sequence_number};
use smpp_session_rs::session::{CloseReason, Session, SessionConfig};

use super::support::{make_client_connection, make_redialing_client_connection, spawn_echo_responder, spawn_silent_responder};

#[derive(Default, Clone)]
struct TestState {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    responses: Vec<Result<(), String>>,
    closed: Option<(CloseReason, String)>,
}

fn conf_with(state: TestState) -> SessionConfig<TestState> {
    SessionConfig {
        context: Arc::new(state.clone()),
        on_respond: Some(Arc::new(|response, ctx: &TestState| {
            let outcome = match &response.error {
                Some(err) => Err(err.to_string()),
                None => Ok(()),
            };
            ctx.inner.lock().expect("test state mutex poisoned").responses.push(outcome);
        })),
        on_closed: Some(Arc::new(|_session, reason, desc, ctx: &TestState| {
            ctx.inner.lock().expect("test state mutex poisoned").closed = Some((reason, desc.to_string()));
        })),
        ..Default::default()
    }
}

fn submit_sm_pdu() -> Pdu {
    Pdu::submit_sm(
        next_sequence_number(),
        SubmitSmBody {
            source_addr: Address::international("15550001111"),
            dest_addr: Address::international("15559998888"),
            short_message: b"hi".to_vec(),
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn submit_sm_round_trips_through_the_window() {
    let (conn, server_task) = make_client_connection("test-submit");
    let state = TestState::default();

    let (session, server) = tokio::join!(Session::new(conn, conf_with(state.clone())), server_task);
    let session = session.expect("initial dial failed");
    let _echo = spawn_echo_responder(server.expect("server task panicked"));

    session.write(submit_sm_pdu(), state.clone()).await.expect("submit failed");

    tokio::time::sleep(Duration::from_millis(100)).await;

    let responses = std::mem::take(&mut state.inner.lock().expect("test state mutex poisoned").responses);
    assert_eq!(responses.len(), 1);
    assert!(responses[0].is_ok());

    session.close();
    tokio::time::sleep(Duration::from_millis(250)).await;
}

#[tokio::test]
async fn explicit_close_drains_unbind_and_fires_on_closed() {
    let (conn, server_task) = make_client_connection("test-close");
    let state = TestState::default();

    let (session, server) = tokio::join!(Session::new(conn, conf_with(state.clone())), server_task);
    let session = session.expect("initial dial failed");
    let _echo = spawn_echo_responder(server.expect("server task panicked"));

    assert!(session.is_active());

    session.close();
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(session.closed());
    assert!(session.closed_explicitly());

    let closed = state.inner.lock().expect("test state mutex poisoned").closed.clone();
    let (reason, _desc) = closed.expect("on_closed was never called");
    assert_eq!(reason, CloseReason::Explicit);
}

#[tokio::test]
async fn backpressure_rejects_submissions_once_the_window_is_full() {
    let (conn, server_task) = make_client_connection("test-backpressure");
    let state = TestState::default();
    let mut conf = conf_with(state.clone());
    conf.window_size = 1;

    let (session, server) = tokio::join!(Session::new(conn, conf), server_task);
    let session = session.expect("initial dial failed");
    let _silent = spawn_silent_responder(server.expect("server task panicked"));

    session.write(submit_sm_pdu(), state.clone()).await.expect("first submit enqueued");
    tokio::time::sleep(Duration::from_millis(50)).await;
    session.write(submit_sm_pdu(), state.clone()).await.expect("second submit enqueued");
    tokio::time::sleep(Duration::from_millis(100)).await;

    let responses = std::mem::take(&mut state.inner.lock().expect("test state mutex poisoned").responses);
    assert_eq!(responses.len(), 1, "only the second, window-full submission should have responded so far");
    match &responses[0] {
        Err(desc) => assert_eq!(desc, "window full"),
        Ok(()) => panic!("second submission should have been rejected for window full"),
    }

    session.close();
    tokio::time::sleep(Duration::from_millis(250)).await;
}

#[tokio::test]
async fn sweep_worker_times_out_a_request_the_peer_never_answers() {
    let (conn, server_task) = make_client_connection("test-sweep");
    let state = TestState::default();
    let mut conf = conf_with(state.clone());
    conf.window_wait = Duration::from_millis(100);
    conf.window_scan_interval = Duration::from_millis(50);

    let (session, server) = tokio::join!(Session::new(conn, conf), server_task);
    let session = session.expect("initial dial failed");
    let _silent = spawn_silent_responder(server.expect("server task panicked"));

    session.write(submit_sm_pdu(), state.clone()).await.expect("submit enqueued");
    tokio::time::sleep(Duration::from_millis(300)).await;

    let responses = std::mem::take(&mut state.inner.lock().expect("test state mutex poisoned").responses);
    assert_eq!(responses.len(), 1);
    match &responses[0] {
        Err(desc) => assert_eq!(desc, "response timeout"),
        Ok(()) => panic!("request should have timed out waiting for a response"),
    }

    session.close();
    tokio::time::sleep(Duration::from_millis(250)).await;
}

#[tokio::test]
async fn session_redials_after_a_dropped_connection_and_status_string_tracks_each_phase() {
    let (conn, mut servers) = make_redialing_client_connection("test-redial");
    let state = TestState::default();
    let mut conf = conf_with(state.clone());
    conf.attempt_dial_interval = Duration::from_millis(300);

    let session = Session::new(conn, conf).await.expect("initial dial failed");
    let first_server = servers.recv().await.expect("first bind should have completed");
    assert_eq!(session.status_string(), "Active");

    drop(first_server);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(session.status_string(), "Dialing");

    let second_server = tokio::time::timeout(Duration::from_secs(1), servers.recv())
        .await
        .expect("redial should complete within 1s")
        .expect("second bind should have completed");
    let _echo = spawn_echo_responder(second_server);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(session.status_string(), "Active");

    session.close();
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(session.status_string(), "Closed");
}

#[tokio::test]
async fn write_rejects_session_internal_pdus() {
    let (conn, server_task) = make_client_connection("test-reject");
    let state = TestState::default();

    let (session, server) = tokio::join!(Session::new(conn, conf_with(state.clone())), server_task);
    let session = session.expect("initial dial failed");
    let _echo = spawn_echo_responder(server.expect("server task panicked"));

    session
        .write(Pdu::unbind(next_sequence_number()), state.clone())
        .await
        .expect("enqueue should succeed, rejection happens in the write worker");

    tokio::time::sleep(Duration::from_millis(100)).await;

    let responses = std::mem::take(&mut state.inner.lock().expect("test state mutex poisoned").responses);
    assert_eq!(responses.len(), 1);
    match &responses[0] {
        Err(desc) => assert_eq!(desc, "not allowed"),
        Ok(()) => panic!("unbind should have been rejected by allow_write"),
    }

    session.close();
    tokio::time::sleep(Duration::from_millis(250)).await;
}
