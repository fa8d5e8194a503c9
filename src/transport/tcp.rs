//! TCP dispatcher for SMB2 over direct TCP (port 445)

use super::frame::{encode_frame, FrameHeader, FrameType};
use super::PacketDispatcher;
use crate::error::{Error, Result};
use crate::protocol::Packet;
use async_trait::async_trait;
use bytes::{BufMut, BytesMut};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::{debug, trace};

/// Well-known SMB2 direct TCP port
pub const SMB2_TCP_PORT: u16 = 445;

/// Packet dispatcher over a tokio TCP stream
pub struct TcpDispatcher {
    stream: TcpStream,
    read_buffer: BytesMut,
    remote_addr: Option<SocketAddr>,
}

impl TcpDispatcher {
    /// Connect to an SMB2 server
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let dispatcher = Self::from_stream(stream);
        debug!("Connected to {:?}", dispatcher.remote_addr);
        Ok(dispatcher)
    }

    /// Create a dispatcher from an existing stream
    pub fn from_stream(stream: TcpStream) -> Self {
        let remote_addr = stream.peer_addr().ok();
        Self {
            stream,
            read_buffer: BytesMut::with_capacity(65536),
            remote_addr,
        }
    }

    /// Get the remote address
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Close the connection
    pub async fn shutdown(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        self.read_buffer.clear();
        Ok(())
    }

    /// Read one session message payload, skipping keepalives
    async fn read_frame(&mut self) -> Result<BytesMut> {
        loop {
            while self.read_buffer.len() < FrameHeader::SIZE {
                self.read_more().await?;
            }

            let header = FrameHeader::parse(&self.read_buffer)?;
            let total_size = FrameHeader::SIZE + header.length;

            while self.read_buffer.len() < total_size {
                self.read_more().await?;
            }

            let mut frame = self.read_buffer.split_to(total_size);
            match header.frame_type {
                FrameType::SessionMessage => return Ok(frame.split_off(FrameHeader::SIZE)),
                FrameType::Keepalive => trace!("Skipping session keepalive"),
            }
        }
    }

    /// Read more data from the stream into the buffer
    async fn read_more(&mut self) -> Result<usize> {
        let mut temp_buf = [0u8; 8192];
        let n = self.stream.read(&mut temp_buf).await?;
        if n == 0 {
            return Err(Error::ConnectionClosed);
        }
        self.read_buffer.put_slice(&temp_buf[..n]);
        Ok(n)
    }
}

#[async_trait]
impl PacketDispatcher for TcpDispatcher {
    async fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        let frame = encode_frame(&packet.encode()?)?;
        trace!(
            "Sending {} ({} bytes, message id {})",
            packet.body.name(),
            frame.len(),
            packet.header.message_id
        );
        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn recv_packet(&mut self) -> Result<Packet> {
        let payload = self.read_frame().await?;
        let packet = Packet::decode(&payload)?;
        trace!(
            "Received {} ({} bytes, message id {})",
            packet.body.name(),
            payload.len(),
            packet.header.message_id
        );
        Ok(packet)
    }
}

#[cfg(test)]
mod tests;
