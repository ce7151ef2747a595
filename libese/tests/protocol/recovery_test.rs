#[path = "../common/mod.rs"]
mod common;

use libese::protocol::{Frame, Pcb, SupervisoryKind};
use libese::test_support::{
    card_i_block, card_r_block, card_response, fast_options, opened_mock_session,
};
use libese::transport::mock::{MockTransport, Reply};
use libese::types::{Seq, SequenceState};
use libese::{EngineError, Error, ErrorCode};

fn resync_requests(sent: &[Frame]) -> usize {
    sent.iter()
        .filter(|f| f.pcb.is_request(SupervisoryKind::Resync))
        .count()
}

#[test]
fn corrupted_reply_gets_parity_error_ack() -> anyhow::Result<()> {
    common::init_logging();
    let mut mock = MockTransport::new();
    mock.push_reply(Reply::Raw(common::card_ok_corrupted()));
    mock.push_reply(Reply::Raw(common::card_ok_wire()));
    let (mut ese, shared) = opened_mock_session(mock)?;

    let mut rx = [0u8; 4];
    assert_eq!(ese.transceive(&common::select_apdu(), &mut rx)?, 2);
    let sent = shared.borrow().sent_frames();
    assert_eq!(
        sent[1].pcb,
        Pcb::ReceiveReady {
            seq: Seq::ZERO,
            parity_error: true,
            other_error: false
        }
    );
    assert_eq!(sent.len(), 2);
    Ok(())
}

#[test]
fn timeout_gets_other_error_ack() -> anyhow::Result<()> {
    let mut mock = MockTransport::new();
    mock.push_reply(Reply::Timeout);
    mock.push_reply(card_i_block(Seq::ZERO, false, &[0x90, 0x00]));
    let (mut ese, shared) = opened_mock_session(mock)?;

    let mut rx = [0u8; 4];
    assert_eq!(ese.transceive(b"\x00", &mut rx)?, 2);
    let sent = shared.borrow().sent_frames();
    assert_eq!(
        sent[1].pcb,
        Pcb::ReceiveReady {
            seq: Seq::ZERO,
            parity_error: false,
            other_error: true
        }
    );
    Ok(())
}

#[test]
fn repeated_nack_escalates_to_resync() -> anyhow::Result<()> {
    common::init_logging();
    let mut mock = MockTransport::new();
    for _ in 0..4 {
        mock.push_reply(card_r_block(Seq::ZERO));
    }
    mock.push_reply(card_response(SupervisoryKind::Resync, &[]));
    mock.push_reply(card_i_block(Seq::ZERO, false, &[0x90, 0x00]));
    let (mut ese, shared) = opened_mock_session(mock)?;

    let mut rx = [0u8; 4];
    assert_eq!(ese.transceive(b"\x00\xB0", &mut rx)?, 2);

    let sent = shared.borrow().sent_frames();
    // Original plus three retransmits, then the resync, then a fresh I(0).
    assert_eq!(sent.len(), 6);
    for frame in &sent[..4] {
        assert_eq!(
            frame.pcb,
            Pcb::Information {
                seq: Seq::ZERO,
                more: false
            }
        );
        assert_eq!(frame.inf, b"\x00\xB0".to_vec());
    }
    assert!(sent[4].pcb.is_request(SupervisoryKind::Resync));
    assert_eq!(sent[5].pcb, sent[0].pcb);
    assert_eq!(
        ese.sequence(),
        SequenceState {
            host: Seq::ZERO,
            card: Seq::ZERO
        }
    );
    Ok(())
}

#[test]
fn resync_resets_sequence_numbers() -> anyhow::Result<()> {
    let mut mock = MockTransport::new();
    // First call leaves host = 0, card = 0.
    mock.push_reply(card_i_block(Seq::ZERO, false, &[0x90, 0x00]));
    // Second call: host sends I(1); force a resync, then I(0) from scratch.
    for _ in 0..4 {
        mock.push_reply(card_r_block(Seq::ONE));
    }
    mock.push_reply(card_response(SupervisoryKind::Resync, &[]));
    mock.push_reply(card_i_block(Seq::ZERO, false, &[0x90, 0x00]));
    let (mut ese, shared) = opened_mock_session(mock)?;

    let mut rx = [0u8; 4];
    ese.transceive(b"\x01", &mut rx)?;
    ese.transceive(b"\x02", &mut rx)?;

    let sent = shared.borrow().sent_frames();
    assert_eq!(
        sent[1].pcb,
        Pcb::Information {
            seq: Seq::ONE,
            more: false
        }
    );
    assert_eq!(
        sent.last().map(|f| f.pcb),
        Some(Pcb::Information {
            seq: Seq::ZERO,
            more: false
        })
    );
    Ok(())
}

#[test]
fn unanswered_resync_is_a_hard_failure() -> anyhow::Result<()> {
    let mut mock = MockTransport::new();
    for _ in 0..4 {
        mock.push_reply(card_r_block(Seq::ZERO));
    }
    let (mut ese, shared) = opened_mock_session(mock)?;

    let mut rx = [0u8; 4];
    let err = ese.transceive(b"\x00", &mut rx).unwrap_err();
    assert!(matches!(err, Error::HardFail(_)));
    assert_eq!(ese.error_code(), Some(ErrorCode::Engine(EngineError::HardFail)));

    let sent = shared.borrow().sent_frames();
    // The resync request itself is retransmitted at most three times.
    assert_eq!(resync_requests(&sent), 4);
    assert_eq!(sent.len(), 8);
    Ok(())
}

#[test]
fn silent_card_gets_one_hardware_reset() -> anyhow::Result<()> {
    common::init_logging();
    let (mut ese, shared) = opened_mock_session(MockTransport::new())?;

    let mut rx = [0u8; 4];
    let err = ese.transceive(b"\x00", &mut rx).unwrap_err();
    assert!(matches!(err, Error::DeviceReset(_)));
    assert_eq!(
        ese.error_code(),
        Some(ErrorCode::Engine(EngineError::DeviceReset))
    );

    let mock = shared.borrow();
    assert_eq!(mock.hardware_resets, 1);
    assert!(mock.poll_timeouts.iter().all(|t| *t == fast_options().bwt));
    Ok(())
}

#[test]
fn failed_hardware_reset_is_reported() -> anyhow::Result<()> {
    let mut mock = MockTransport::new();
    mock.reset_fails = true;
    let (mut ese, shared) = opened_mock_session(mock)?;

    let mut rx = [0u8; 4];
    match ese.transceive(b"\x00", &mut rx).unwrap_err() {
        Error::DeviceReset(msg) => assert!(msg.contains("hardware reset failed")),
        other => panic!("expected device reset error, got: {:?}", other),
    }
    assert_eq!(shared.borrow().hardware_resets, 1);
    Ok(())
}

#[test]
fn endless_resyncs_escalate_to_hardware_reset() -> anyhow::Result<()> {
    let mut mock = MockTransport::new();
    // A card that answers every I-block with "send it again" and accepts
    // every resync.
    mock.set_responder(Box::new(|frame: &Frame| match frame.pcb {
        Pcb::Information { seq, .. } => Reply::Frame(Frame::receive_ready(seq)),
        _ => Reply::Frame(Frame::response(SupervisoryKind::Resync, Vec::new())),
    }));
    let (mut ese, shared) = opened_mock_session(mock)?;

    let mut rx = [0u8; 4];
    match ese.transceive(b"\x00", &mut rx).unwrap_err() {
        Error::DeviceReset(msg) => assert!(msg.contains("budget")),
        other => panic!("expected device reset error, got: {:?}", other),
    }

    let mock = shared.borrow();
    assert_eq!(mock.hardware_resets, 1);
    // Five session resets before the hardware reset, five more after it.
    assert_eq!(resync_requests(&mock.sent_frames()), 10);
    Ok(())
}

#[test]
fn error_ack_from_card_resends_the_same_block() -> anyhow::Result<()> {
    let mut mock = MockTransport::new();
    mock.push_reply(Reply::Frame(Frame::receive_ready_error(Seq::ZERO, false)));
    mock.push_reply(card_i_block(Seq::ZERO, false, &[]));
    let (mut ese, shared) = opened_mock_session(mock)?;

    let mut rx = [0u8; 4];
    assert_eq!(ese.transceive(b"ABCD", &mut rx)?, 0);

    let sent = shared.borrow().sent_frames();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);
    assert_eq!(
        sent[0].pcb,
        Pcb::Information {
            seq: Seq::ZERO,
            more: false
        }
    );
    Ok(())
}

#[test]
fn timeouts_retransmit_the_error_ack_three_times_then_resync() -> anyhow::Result<()> {
    let (mut ese, shared) = opened_mock_session(MockTransport::new())?;

    let mut rx = [0u8; 4];
    match ese.transceive(b"\x00", &mut rx).unwrap_err() {
        Error::DeviceReset(msg) => assert!(msg.contains("last error: timeout")),
        other => panic!("expected device reset error, got: {:?}", other),
    }

    let sent = shared.borrow().sent_frames();
    let error_ack = Pcb::ReceiveReady {
        seq: Seq::ZERO,
        parity_error: false,
        other_error: true,
    };
    let first_cycle: Vec<Pcb> = sent.iter().take(6).map(|f| f.pcb).collect();
    assert_eq!(
        first_cycle,
        vec![
            Pcb::Information {
                seq: Seq::ZERO,
                more: false
            },
            error_ack,
            error_ack,
            error_ack,
            error_ack,
            Pcb::Supervisory {
                kind: SupervisoryKind::Resync,
                response: false
            },
        ]
    );
    // After the hardware reset the same cycle runs once more.
    assert_eq!(sent.len(), 12);
    assert_eq!(sent[6].pcb, first_cycle[0]);
    Ok(())
}

#[test]
fn unanswered_resync_quotes_the_last_receive_error() -> anyhow::Result<()> {
    let mut mock = MockTransport::new();
    for _ in 0..4 {
        mock.push_reply(card_r_block(Seq::ZERO));
    }
    let (mut ese, _shared) = opened_mock_session(mock)?;

    let mut rx = [0u8; 4];
    match ese.transceive(b"\x00", &mut rx).unwrap_err() {
        Error::HardFail(msg) => {
            assert!(msg.contains("resync not acknowledged"));
            assert!(msg.contains("last error: timeout"));
        }
        other => panic!("expected hard failure, got: {:?}", other),
    }
    Ok(())
}
