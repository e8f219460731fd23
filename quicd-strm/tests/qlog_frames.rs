//! qlog frame record tests.
//! Every record is compared byte-for-byte against the qlog QUIC event schema.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use quicd_strm::frames::{
    AckFrame, AckRange, ConnectionCloseFrame, CryptoFrame, DataBlockedFrame, DatagramFrame,
    EcnCounts, Frame, MaxDataFrame, MaxStreamDataFrame, MaxStreamsFrame, NewConnectionIdFrame,
    NewTokenFrame, PathChallengeFrame, PathResponseFrame, ResetStreamFrame,
    RetireConnectionIdFrame, StopSendingFrame, StreamDataBlockedFrame, StreamFrame,
    StreamsBlockedFrame,
};
use quicd_strm::qlog::write_frame;
use quicd_strm::{ConnectionId, Span, StreamId, Token};

fn record(frame: &Frame<'_>) -> String {
    let mut buf = BytesMut::new();
    write_frame(&mut buf, frame).unwrap();
    String::from_utf8(buf.to_vec()).unwrap()
}

fn ack(first_ack_range: u64) -> AckFrame {
    AckFrame::new(1000000007, Duration::from_millis(31), first_ack_range)
}

#[test]
fn test_padding_and_ping() {
    assert_eq!(record(&Frame::Padding), r#"{"frame_type":"padding"},"#);
    assert_eq!(record(&Frame::Ping), r#"{"frame_type":"ping"},"#);
}

#[test]
fn test_ack_single_packet() {
    assert_eq!(
        record(&Frame::Ack(ack(0))),
        r#"{"frame_type":"ack","ack_delay":31,"acked_ranges":[[1000000007]]},"#
    );
}

#[test]
fn test_ack_with_range() {
    let mut fr = ack(11);
    fr.ack_ranges.push(AckRange { gap: 17, length: 73 });
    assert_eq!(
        record(&Frame::Ack(fr)),
        r#"{"frame_type":"ack","ack_delay":31,"acked_ranges":[[999999996,1000000007],[999999904,999999977]]},"#
    );
}

#[test]
fn test_ack_with_single_packet_range() {
    let mut fr = ack(11);
    fr.ack_ranges.push(AckRange { gap: 17, length: 73 });
    fr.ack_ranges.push(AckRange { gap: 0, length: 0 });
    assert_eq!(
        record(&Frame::Ack(fr)),
        r#"{"frame_type":"ack","ack_delay":31,"acked_ranges":[[999999996,1000000007],[999999904,999999977],[999999902]]},"#
    );
}

#[test]
fn test_ack_ecn() {
    let mut fr = ack(0);
    fr.ecn_counts = Some(EcnCounts {
        ect0_count: 892363,
        ect1_count: 678912,
        ce_count: 956923,
    });
    assert_eq!(
        record(&Frame::Ack(fr)),
        r#"{"frame_type":"ack","ack_delay":31,"acked_ranges":[[1000000007]],"ect1":678912,"ect0":892363,"ce":956923},"#
    );
}

#[test]
fn test_reset_stream() {
    let fr = ResetStreamFrame {
        stream_id: StreamId::new(1000000009),
        error_code: 761111,
        final_size: 1000000007,
    };
    assert_eq!(
        record(&Frame::ResetStream(fr)),
        r#"{"frame_type":"reset_stream","stream_id":1000000009,"error_code":761111,"final_size":1000000007},"#
    );
}

#[test]
fn test_stop_sending() {
    let fr = StopSendingFrame {
        stream_id: StreamId::new(1000000009),
        error_code: 3119999,
    };
    assert_eq!(
        record(&Frame::StopSending(fr)),
        r#"{"frame_type":"stop_sending","stream_id":1000000009,"error_code":3119999},"#
    );
}

#[test]
fn test_crypto() {
    let data = vec![0u8; 111187];
    let spans = [Span::new(&data)];
    let fr = CryptoFrame {
        offset: 65000011,
        data: &spans,
    };
    assert_eq!(
        record(&Frame::Crypto(fr)),
        r#"{"frame_type":"crypto","offset":65000011,"length":111187},"#
    );
}

#[test]
fn test_new_token() {
    let fr = NewTokenFrame {
        token: Token::from_slice(&[0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0]),
    };
    assert_eq!(
        record(&Frame::NewToken(fr)),
        r#"{"frame_type":"new_token","length":8,"token":{"data":"123456789abcdef0"}},"#
    );
}

#[test]
fn test_stream_fin_only_when_set() {
    let data = vec![0u8; 8888888];
    let spans = [Span::new(&data)];
    let mut fr = StreamFrame {
        stream_id: StreamId::new(1000000007),
        offset: 1000000009,
        fin: true,
        data: &spans,
    };
    assert_eq!(
        record(&Frame::Stream(fr.clone())),
        r#"{"frame_type":"stream","stream_id":1000000007,"offset":1000000009,"length":8888888,"fin":true},"#
    );

    fr.fin = false;
    assert_eq!(
        record(&Frame::Stream(fr)),
        r#"{"frame_type":"stream","stream_id":1000000007,"offset":1000000009,"length":8888888},"#
    );
}

#[test]
fn test_flow_control_frames() {
    assert_eq!(
        record(&Frame::MaxData(MaxDataFrame {
            maximum_data: 89624231
        })),
        r#"{"frame_type":"max_data","maximum":89624231},"#
    );
    assert_eq!(
        record(&Frame::MaxStreamData(MaxStreamDataFrame {
            stream_id: StreamId::new(1000000009),
            maximum_stream_data: 3479131413562775697,
        })),
        r#"{"frame_type":"max_stream_data","stream_id":1000000009,"maximum":3479131413562775697},"#
    );
    assert_eq!(
        record(&Frame::DataBlocked(DataBlockedFrame {
            data_limit: 141245489541204826
        })),
        r#"{"frame_type":"data_blocked","limit":141245489541204826},"#
    );
    assert_eq!(
        record(&Frame::StreamDataBlocked(StreamDataBlockedFrame {
            stream_id: StreamId::new(1000000007),
            stream_data_limit: 3510083742766371473,
        })),
        r#"{"frame_type":"stream_data_blocked","stream_id":1000000007,"limit":3510083742766371473},"#
    );
}

#[test]
fn test_stream_count_frames() {
    assert_eq!(
        record(&Frame::MaxStreams(MaxStreamsFrame {
            maximum_streams: 3947405932436725448,
            bidirectional: true,
        })),
        r#"{"frame_type":"max_streams","stream_type":"bidirectional","maximum":3947405932436725448},"#
    );
    assert_eq!(
        record(&Frame::MaxStreams(MaxStreamsFrame {
            maximum_streams: 2650981103699753174,
            bidirectional: false,
        })),
        r#"{"frame_type":"max_streams","stream_type":"unidirectional","maximum":2650981103699753174},"#
    );
    assert_eq!(
        record(&Frame::StreamsBlocked(StreamsBlockedFrame {
            stream_limit: 267807966110011001,
            bidirectional: true,
        })),
        r#"{"frame_type":"streams_blocked","stream_type":"bidirectional","limit":267807966110011001},"#
    );
    assert_eq!(
        record(&Frame::StreamsBlocked(StreamsBlockedFrame {
            stream_limit: 4147150966951874727,
            bidirectional: false,
        })),
        r#"{"frame_type":"streams_blocked","stream_type":"unidirectional","limit":4147150966951874727},"#
    );
}

#[test]
fn test_new_connection_id() {
    let fr = NewConnectionIdFrame {
        sequence_number: 2322933918954521341,
        retire_prior_to: 353598537829135415,
        connection_id: ConnectionId::from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap(),
        stateless_reset_token: [
            0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x1b, 0x1c, 0x1d, 0x1e,
            0x1f, 0x10,
        ],
    };
    assert_eq!(
        record(&Frame::NewConnectionId(fr)),
        concat!(
            r#"{"frame_type":"new_connection_id","sequence_number":2322933918954521341,"#,
            r#""retire_prior_to":353598537829135415,"connection_id_length":8,"#,
            r#""connection_id":"0102030405060708","#,
            r#""stateless_reset_token":{"data":"1112131415161718191a1b1c1d1e1f10"}},"#
        )
    );
}

#[test]
fn test_retire_connection_id() {
    let fr = RetireConnectionIdFrame {
        sequence_number: 923246273261945495,
    };
    assert_eq!(
        record(&Frame::RetireConnectionId(fr)),
        r#"{"frame_type":"retire_connection_id","sequence_number":923246273261945495},"#
    );
}

#[test]
fn test_path_validation() {
    let challenge = PathChallengeFrame {
        data: [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88],
    };
    assert_eq!(
        record(&Frame::PathChallenge(challenge)),
        r#"{"frame_type":"path_challenge","data":"1122334455667788"},"#
    );

    let response = PathResponseFrame {
        data: [0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99],
    };
    assert_eq!(
        record(&Frame::PathResponse(response)),
        r#"{"frame_type":"path_response","data":"2233445566778899"},"#
    );
}

#[test]
fn test_connection_close() {
    let transport = ConnectionCloseFrame {
        error_code: 3270540419184339176,
        application_close: false,
    };
    assert_eq!(
        record(&Frame::ConnectionClose(transport)),
        r#"{"frame_type":"connection_close","error_space":"transport","error_code":3270540419184339176,"raw_error_code":3270540419184339176},"#
    );

    let application = ConnectionCloseFrame {
        error_code: 1069447711149177103,
        application_close: true,
    };
    assert_eq!(
        record(&Frame::ConnectionClose(application)),
        r#"{"frame_type":"connection_close","error_space":"application","error_code":1069447711149177103,"raw_error_code":1069447711149177103},"#
    );
}

#[test]
fn test_handshake_done() {
    assert_eq!(
        record(&Frame::HandshakeDone),
        r#"{"frame_type":"handshake_done"},"#
    );
}

#[test]
fn test_datagram() {
    let data = vec![0u8; 1301458];
    let spans = [Span::new(&data)];
    let fr = DatagramFrame { data: &spans };
    assert_eq!(
        record(&Frame::Datagram(fr)),
        r#"{"frame_type":"datagram","length":1301458},"#
    );
}

#[test]
fn test_token_from_bytes() {
    let token = Token::new(Bytes::from_static(b"\x00\xff"));
    let fr = NewTokenFrame { token };
    assert_eq!(
        record(&Frame::NewToken(fr)),
        r#"{"frame_type":"new_token","length":2,"token":{"data":"00ff"}},"#
    );
}
