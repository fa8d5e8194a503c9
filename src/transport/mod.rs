//! Transport layer for the SMB2 handshake
//!
//! The client only ever talks to a [`PacketDispatcher`]: hand it a packet to send,
//! or wait for the next complete packet. Timeouts and cancellation belong to the
//! dispatcher (or the caller wrapping it), never to the handshake engine.

use crate::error::Result;
use crate::protocol::Packet;
use async_trait::async_trait;

pub mod frame;
pub mod tcp;

pub use tcp::TcpDispatcher;

/// Sends and receives whole SMB2 packets
#[async_trait]
pub trait PacketDispatcher: Send {
    /// Transmit a fully built packet
    async fn send_packet(&mut self, packet: &Packet) -> Result<()>;

    /// Wait until one complete packet has been received and decoded
    async fn recv_packet(&mut self) -> Result<Packet>;
}

#[async_trait]
impl<D: PacketDispatcher + ?Sized> PacketDispatcher for &mut D {
    async fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        (**self).send_packet(packet).await
    }

    async fn recv_packet(&mut self) -> Result<Packet> {
        (**self).recv_packet().await
    }
}

#[async_trait]
impl<D: PacketDispatcher + ?Sized> PacketDispatcher for Box<D> {
    async fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        (**self).send_packet(packet).await
    }

    async fn recv_packet(&mut self) -> Result<Packet> {
        (**self).recv_packet().await
    }
}
