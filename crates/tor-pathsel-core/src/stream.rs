//! Client stream requests: the workload a simulation run assigns to circuits.

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

use crate::time::UnixTime;

/// What kind of connection a stream represents.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamType {
    /// A DNS-style name resolution, carried over an internal circuit.
    Resolve,
    /// A connection to a specific destination address and port.
    Generic,
}

/// One client request to be assigned to a circuit at the tick containing
/// `time`.
///
/// A `generic` stream must carry both `ip` and `port`; a `resolve` stream
/// carries neither, since it has no destination beyond "do a lookup".
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Stream {
    /// When the stream is requested.
    pub time: UnixTime,
    /// The stream's kind.
    #[serde(rename = "type")]
    pub stream_type: StreamType,
    /// The destination address, required for `generic` streams.
    pub ip: Option<Ipv4Addr>,
    /// The destination port, required for `generic` streams.
    pub port: Option<u16>,
}
