//! Typed send helpers for callers elsewhere in the client.
//!
//! Each helper composes the right identity and intent into a header and
//! sends it toward the controller's designated outbound channel. Open
//! carries the interface snapshot as payload, close carries nothing, and
//! send carries the raw frame to inject.

use std::net::Ipv4Addr;

use crate::codec;
use crate::domain::{Intent, InterfaceSnapshot, Protocol};
use crate::transport::ControlChannel;

/// Start an address-resolution capture stream bound to `peer`.
pub fn open_arp(
    channel: &mut dyn ControlChannel,
    iface: &InterfaceSnapshot,
    peer: Ipv4Addr,
) -> crate::Result<usize> {
    let header = codec::encode(Protocol::Arp, Intent::Start, iface.index, Some(peer));
    Ok(channel.send(&header, &iface.to_bytes())?)
}

/// Stop the address-resolution stream bound to `peer`.
pub fn close_arp(
    channel: &mut dyn ControlChannel,
    iface: &InterfaceSnapshot,
    peer: Ipv4Addr,
) -> crate::Result<usize> {
    let header = codec::encode(Protocol::Arp, Intent::Stop, iface.index, Some(peer));
    Ok(channel.send(&header, &[])?)
}

/// Inject a frame through the address-resolution stream bound to `peer`.
pub fn send_arp(
    channel: &mut dyn ControlChannel,
    iface: &InterfaceSnapshot,
    peer: Ipv4Addr,
    data: &[u8],
) -> crate::Result<usize> {
    let header = codec::encode(Protocol::Arp, Intent::Data, iface.index, Some(peer));
    Ok(channel.send(&header, data)?)
}

/// Start the host-configuration capture stream for an interface.
pub fn open_bootp(
    channel: &mut dyn ControlChannel,
    iface: &InterfaceSnapshot,
) -> crate::Result<usize> {
    let header = codec::encode(Protocol::Bootp, Intent::Start, iface.index, None);
    Ok(channel.send(&header, &iface.to_bytes())?)
}

/// Stop the host-configuration stream for an interface.
pub fn close_bootp(
    channel: &mut dyn ControlChannel,
    iface: &InterfaceSnapshot,
) -> crate::Result<usize> {
    let header = codec::encode(Protocol::Bootp, Intent::Stop, iface.index, None);
    Ok(channel.send(&header, &[])?)
}

/// Inject a frame through an interface's host-configuration stream.
pub fn send_bootp(
    channel: &mut dyn ControlChannel,
    iface: &InterfaceSnapshot,
    data: &[u8],
) -> crate::Result<usize> {
    let header = codec::encode(Protocol::Bootp, Intent::Data, iface.index, None);
    Ok(channel.send(&header, data)?)
}
