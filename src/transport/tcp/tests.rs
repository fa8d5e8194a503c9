use super::*;
use crate::protocol::messages::{Smb2NegotiateRequest, Smb2NegotiateResponse};
use crate::protocol::{NtStatus, PacketBody, Smb2Command, Smb2Dialect, Smb2Header};
use tokio::net::TcpListener;

async fn read_raw_frame(stream: &mut TcpStream) -> Vec<u8> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await.unwrap();
    let len = u32::from_be_bytes(len_buf) & 0x00FF_FFFF;
    let mut payload = vec![0u8; len as usize];
    stream.read_exact(&mut payload).await.unwrap();
    payload
}

#[tokio::test]
async fn test_tcp_dispatcher_exchange() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = Packet::decode(&read_raw_frame(&mut stream).await).unwrap();
        assert_eq!(request.command(), Smb2Command::Negotiate);

        let mut header = Smb2Header::response(Smb2Command::Negotiate, NtStatus::Success);
        header.message_id = request.header.message_id;
        let response = Packet::new(
            header,
            PacketBody::NegotiateResponse(Smb2NegotiateResponse::new(Smb2Dialect::Smb210)),
        );

        // A keepalive ahead of the real reply must be skipped
        stream.write_all(&[0x85, 0, 0, 0]).await.unwrap();
        let frame = encode_frame(&response.encode().unwrap()).unwrap();
        stream.write_all(&frame).await.unwrap();
    });

    let mut dispatcher = TcpDispatcher::connect(addr).await.unwrap();
    assert_eq!(dispatcher.remote_addr(), Some(addr));

    let request = Packet::new(
        Smb2Header::new(Smb2Command::Negotiate),
        PacketBody::NegotiateRequest(Smb2NegotiateRequest::new(vec![Smb2Dialect::Smb210])),
    );
    dispatcher.send_packet(&request).await.unwrap();

    let response = dispatcher.recv_packet().await.unwrap();
    match response.body {
        PacketBody::NegotiateResponse(body) => {
            assert_eq!(body.dialect_revision, Smb2Dialect::Smb210)
        }
        other => panic!("unexpected body {:?}", other),
    }

    server.await.unwrap();
}

#[tokio::test]
async fn test_tcp_dispatcher_reports_closed_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        drop(stream);
    });

    let mut dispatcher = TcpDispatcher::connect(addr).await.unwrap();
    server.await.unwrap();

    let err = dispatcher.recv_packet().await.unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_tcp_dispatcher_reports_malformed_packet() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let frame = encode_frame(b"\xffSMB not smb2").unwrap();
        stream.write_all(&frame).await.unwrap();
    });

    let mut dispatcher = TcpDispatcher::connect(addr).await.unwrap();
    let err = dispatcher.recv_packet().await.unwrap_err();
    assert!(err.is_malformed());

    server.await.unwrap();
}

#[tokio::test]
async fn test_client_handshake_over_loopback() {
    use crate::client::{Client, ClientState};
    use crate::testing::{challenge_response, session_setup_response, RecordingProvider};

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        let negotiate = Packet::decode(&read_raw_frame(&mut stream).await).unwrap();
        assert_eq!(negotiate.header.message_id, 0);
        let reply = Packet::new(
            Smb2Header::response(Smb2Command::Negotiate, NtStatus::Success),
            PacketBody::NegotiateResponse(Smb2NegotiateResponse::new(Smb2Dialect::Smb302)),
        );
        stream
            .write_all(&encode_frame(&reply.encode().unwrap()).unwrap())
            .await
            .unwrap();

        let first = Packet::decode(&read_raw_frame(&mut stream).await).unwrap();
        assert_eq!(first.command(), Smb2Command::SessionSetup);
        let reply = challenge_response(0x0400_0000_0001, first.header.message_id, vec![2; 8]);
        stream
            .write_all(&encode_frame(&reply.encode().unwrap()).unwrap())
            .await
            .unwrap();

        let second = Packet::decode(&read_raw_frame(&mut stream).await).unwrap();
        assert_eq!(second.header.session_id, 0x0400_0000_0001);
        let reply = session_setup_response(
            NtStatus::Success,
            0x0400_0000_0001,
            second.header.message_id,
        );
        stream
            .write_all(&encode_frame(&reply.encode().unwrap()).unwrap())
            .await
            .unwrap();
    });

    let dispatcher = TcpDispatcher::connect(addr).await.unwrap();
    let mut client = Client::new(dispatcher, RecordingProvider::new(), "alice", "secret");

    client.negotiate().await.unwrap();
    assert_eq!(client.dialect(), Some(Smb2Dialect::Smb302));

    assert_eq!(client.authenticate().await.unwrap(), NtStatus::Success);
    assert_eq!(client.state(), ClientState::Authenticated);
    assert_eq!(client.session_id(), Some(0x0400_0000_0001));

    server.await.unwrap();
}
