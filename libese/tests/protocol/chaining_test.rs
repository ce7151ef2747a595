#[path = "../common/mod.rs"]
mod common;

use libese::protocol::{Pcb, SupervisoryKind};
use libese::test_support::{card_i_block, card_response, chaining_card, opened_mock_session};
use libese::transport::mock::{MockTransport, Reply};
use libese::types::{Seq, SequenceState};
use libese::{EngineError, Error, ErrorCode};

fn information(seq: Seq, more: bool) -> Pcb {
    Pcb::Information { seq, more }
}

#[test]
fn single_block_exchange() -> anyhow::Result<()> {
    common::init_logging();
    let mut mock = MockTransport::new();
    mock.push_reply(Reply::Raw(common::card_ok_wire()));
    let (mut ese, shared) = opened_mock_session(mock)?;

    let mut rx = [0u8; 16];
    let n = ese.transceive(&common::select_apdu(), &mut rx)?;
    assert_eq!(&rx[..n], &[0x90, 0x00]);

    let mock = shared.borrow();
    assert_eq!(mock.sent, vec![common::select_wire()]);
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
fn sequence_alternates_across_calls() -> anyhow::Result<()> {
    let mut mock = MockTransport::new();
    mock.push_reply(card_i_block(Seq::ZERO, false, &[0x90, 0x00]));
    mock.push_reply(card_i_block(Seq::ONE, false, &[0x90, 0x00]));
    mock.push_reply(card_i_block(Seq::ZERO, false, &[0x90, 0x00]));
    let (mut ese, shared) = opened_mock_session(mock)?;

    let mut rx = [0u8; 2];
    for _ in 0..3 {
        assert_eq!(ese.transceive(b"\x80\xCA", &mut rx)?, 2);
    }

    let pcbs: Vec<Pcb> = shared.borrow().sent_frames().iter().map(|f| f.pcb).collect();
    assert_eq!(
        pcbs,
        vec![
            information(Seq::ZERO, false),
            information(Seq::ONE, false),
            information(Seq::ZERO, false),
        ]
    );
    Ok(())
}

#[test]
fn card_chained_response_is_acknowledged() -> anyhow::Result<()> {
    let mut mock = MockTransport::new();
    mock.push_reply(card_i_block(Seq::ZERO, true, b"AB"));
    mock.push_reply(card_i_block(Seq::ONE, false, b"CD"));
    let (mut ese, shared) = opened_mock_session(mock)?;

    let mut rx = [0u8; 8];
    let n = ese.transceive(b"\x00", &mut rx)?;
    assert_eq!(&rx[..n], b"ABCD");

    let pcbs: Vec<Pcb> = shared.borrow().sent_frames().iter().map(|f| f.pcb).collect();
    assert_eq!(pcbs[0], information(Seq::ZERO, false));
    assert_eq!(
        pcbs[1],
        Pcb::ReceiveReady {
            seq: Seq::ONE,
            parity_error: false,
            other_error: false
        }
    );
    assert_eq!(pcbs.len(), 2);
    Ok(())
}

#[test]
fn long_messages_chain_both_ways() -> anyhow::Result<()> {
    common::init_logging();
    let request = common::payload(762, 0x3C);
    let response = common::payload(762, 0xC3);
    let mut mock = MockTransport::new();
    mock.set_responder(chaining_card(response.clone(), 254));
    let (mut ese, shared) = opened_mock_session(mock)?;

    let mut rx = vec![0u8; 1024];
    let n = ese.transceive(&request, &mut rx)?;
    assert_eq!(n, 762);
    assert_eq!(&rx[..n], &response[..]);

    let sent = shared.borrow().sent_frames();
    let pcbs: Vec<Pcb> = sent.iter().map(|f| f.pcb).collect();
    assert_eq!(
        pcbs,
        vec![
            information(Seq::ZERO, true),
            information(Seq::ONE, true),
            information(Seq::ZERO, false),
            Pcb::ReceiveReady {
                seq: Seq::ONE,
                parity_error: false,
                other_error: false
            },
            Pcb::ReceiveReady {
                seq: Seq::ZERO,
                parity_error: false,
                other_error: false
            },
        ]
    );
    assert!(sent.iter().all(|f| f.inf.len() <= 254));
    assert_eq!(common::information_bytes(&sent), request);
    Ok(())
}

#[test]
fn scattered_segments_are_one_message() -> anyhow::Result<()> {
    let response = common::payload(300, 0x11);
    let mut mock = MockTransport::new();
    mock.set_responder(chaining_card(response.clone(), 100));
    let (mut ese, shared) = opened_mock_session(mock)?;

    let head = common::payload(200, 1);
    let tail = common::payload(100, 2);
    let mut a = vec![0u8; 10];
    let mut b = vec![0u8; 290];
    let n = ese.transceive_scattered(&[&head[..], &tail[..]], &mut [&mut a[..], &mut b[..]])?;
    assert_eq!(n, 300);
    assert_eq!(a, response[..10].to_vec());
    assert_eq!(b, response[10..].to_vec());

    let sent = shared.borrow().sent_frames();
    let expected: Vec<u8> = head.iter().chain(tail.iter()).copied().collect();
    assert_eq!(common::information_bytes(&sent), expected);
    // 300 bytes at IFS 254: one chained block, one final block.
    assert_eq!(sent.iter().filter(|f| f.pcb.is_information()).count(), 2);
    Ok(())
}

#[test]
fn overflowing_chain_is_aborted_and_reported() -> anyhow::Result<()> {
    let mut mock = MockTransport::new();
    mock.push_reply(card_i_block(Seq::ZERO, true, b"ABCD"));
    mock.push_reply(card_response(SupervisoryKind::Abort, &[]));
    let (mut ese, shared) = opened_mock_session(mock)?;

    let mut rx = [0u8; 2];
    let err = ese.transceive(b"\x00", &mut rx).unwrap_err();
    assert!(matches!(err, Error::CommFailure(_)));
    assert_eq!(
        ese.error_code(),
        Some(ErrorCode::Engine(EngineError::CommFailure))
    );
    assert!(ese.error_message().is_some_and(|m| m.contains("overflow")));

    let sent = shared.borrow().sent_frames();
    assert_eq!(sent.len(), 2);
    assert!(sent[1].pcb.is_request(SupervisoryKind::Abort));
    Ok(())
}

#[test]
fn truncated_final_block_is_reported() -> anyhow::Result<()> {
    let mut mock = MockTransport::new();
    mock.push_reply(card_i_block(Seq::ZERO, false, b"ABCDEF"));
    let (mut ese, shared) = opened_mock_session(mock)?;

    let mut rx = [0u8; 2];
    let err = ese.transceive(b"\x00", &mut rx).unwrap_err();
    assert!(matches!(err, Error::CommFailure(_)));
    assert_eq!(
        ese.error_code(),
        Some(ErrorCode::Engine(EngineError::CommFailure))
    );
    assert_eq!(&rx, b"AB");
    // Nothing left to abort: the card already finished its chain.
    assert_eq!(shared.borrow().sent.len(), 1);
    Ok(())
}

#[test]
fn response_filling_rx_exactly_succeeds() -> anyhow::Result<()> {
    let mut mock = MockTransport::new();
    mock.push_reply(card_i_block(Seq::ZERO, true, b"AB"));
    mock.push_reply(card_i_block(Seq::ONE, false, &[0x90, 0x00]));
    let (mut ese, _shared) = opened_mock_session(mock)?;

    let mut rx = [0u8; 4];
    assert_eq!(ese.transceive(b"\x00", &mut rx)?, 4);
    assert_eq!(&rx, &[b'A', b'B', 0x90, 0x00]);
    assert!(!ese.has_error());
    Ok(())
}

#[test]
fn empty_reply_completes_after_one_transmission() -> anyhow::Result<()> {
    let mut mock = MockTransport::new();
    mock.push_reply(card_i_block(Seq::ZERO, false, &[]));
    let (mut ese, shared) = opened_mock_session(mock)?;

    let mut rx = [0u8; 8];
    assert_eq!(ese.transceive(b"ABCD", &mut rx)?, 0);

    let sent = shared.borrow().sent_frames();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].inf, b"ABCD".to_vec());
    Ok(())
}
