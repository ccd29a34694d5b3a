// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Exercises `SessionConfig::build_window` through the `Window<T>` trait object, rather
//! than poking `MapWindow`/`QueueWindow` directly the way their own module-local tests
//! do — the thing worth covering here is that both `WindowKind` variants really do
//! satisfy the same trait and behave identically from a caller holding only `Box<dyn
//! Window<T>>`.

use smpp_session_rs::pdu::Pdu;
use smpp_session_rs::request::{Request, Submitter};
use smpp_session_rs::session::config::{SessionConfig, WindowKind};

fn req(seq: u32) -> Request<()> {
    Request::new(Pdu::enquire_link(seq), (), "sess1".into(), "sys1".into(), Submitter::User)
}

fn exercise(kind: WindowKind) {
    let conf = SessionConfig::<()> {
        window_kind: kind,
        window_size: 2,
        ..Default::default()
    };
    let mut window = conf.build_window("sys1");

    window.put(req(1)).expect("first put succeeds");
    window.put(req(2)).expect("second put succeeds");
    assert!(window.full());

    let rejected = window.put(req(3)).err().expect("third put should be rejected at capacity 2");
    assert_eq!(rejected.pdu.sequence_number, 3);

    let taken = window.take(1).expect("seq 1 is outstanding");
    assert_eq!(taken.pdu.sequence_number, 1);
    assert!(!window.full());
    assert_eq!(window.len(), 1);
}

#[test]
fn map_window_satisfies_the_window_contract_via_build_window() {
    exercise(WindowKind::Map);
}

#[test]
fn queue_window_satisfies_the_window_contract_via_build_window() {
    exercise(WindowKind::Queue);
}

#[test]
fn new_window_fn_override_takes_priority_over_window_kind() {
    let conf = SessionConfig::<()> {
        window_kind: WindowKind::Map,
        window_size: 4,
        new_window_fn: Some(std::sync::Arc::new(|_system_id: &str| {
            Box::new(smpp_session_rs::window::QueueWindow::new(1, 60)) as Box<dyn smpp_session_rs::window::Window<()>>
        })),
        ..Default::default()
    };

    let mut window = conf.build_window("sys1");
    window.put(req(1)).expect("put succeeds");
    assert!(window.full(), "new_window_fn built a capacity-1 window, not the configured size-4 one");
}
