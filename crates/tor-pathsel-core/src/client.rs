//! One simulated client's circuit pool and port-need tracker, and the
//! per-tick processing algorithm that drives them.

use std::collections::{BTreeMap, VecDeque};

use rand::Rng;

use crate::circuit::{build_circuit, BuildRequest, Circuit};
use crate::consensus::ConsensusPeriod;
use crate::consts::{is_long_lived_port, DIRTY_CIRCUIT_LIFETIME, INITIAL_PORT_NEED, PORT_NEED_LIFETIME};
use crate::error::Error;
use crate::guardmgr::GuardEntry;
use crate::relay::Fingerprint;
use crate::stream::{Stream, StreamType};
use crate::time::UnixTime;

/// A tracked requirement that some clean exit circuit support a given port.
#[derive(Clone, Debug)]
pub struct PortNeed {
    /// How many live clean circuits currently satisfy this need.
    pub covered_count: usize,
    /// When this need expires and may be dropped. Absent means it never
    /// expires on its own — true only of the initial port-80 seed, which
    /// never gains a concrete expiry (see [`ClientState::record_stream_port`]).
    pub expires: Option<UnixTime>,
    /// Whether a circuit covering this need must be Fast-flagged.
    pub fast: bool,
    /// Whether a circuit covering this need must be Stable-flagged.
    pub stable: bool,
}

/// One simulated client: its persistent guards, its circuit pool, and its
/// port-need tracker.
pub struct ClientState {
    /// An identifier for this client, used only for output labeling.
    pub id: String,
    /// This client's entry guards, in insertion order.
    pub guards: Vec<GuardEntry>,
    /// Tracked port needs, keyed by port.
    pub port_needs: BTreeMap<u16, PortNeed>,
    /// Never-used exit circuits, front = most recently built.
    pub clean_exit_circuits: VecDeque<Circuit>,
    /// Exit circuits that have carried at least one stream, front = most
    /// recently dirtied (see invariant P7).
    pub dirty_exit_circuits: VecDeque<Circuit>,
    /// The client's spare internal circuit, if one is built and unused.
    pub clean_internal_circuit: Option<Circuit>,
    /// The client's in-use internal circuit, if any.
    pub dirty_internal_circuit: Option<Circuit>,
}

impl ClientState {
    /// Build a fresh client with no guards, no circuits, and the initial
    /// port-80 seed need.
    pub fn new(id: impl Into<String>) -> Self {
        let mut port_needs = BTreeMap::new();
        port_needs.insert(
            INITIAL_PORT_NEED,
            PortNeed {
                covered_count: 0,
                expires: None,
                fast: true,
                stable: false,
            },
        );
        ClientState {
            id: id.into(),
            guards: Vec::new(),
            port_needs,
            clean_exit_circuits: VecDeque::new(),
            dirty_exit_circuits: VecDeque::new(),
            clean_internal_circuit: None,
            dirty_internal_circuit: None,
        }
    }
}

/// Return true if `circuit` would satisfy `need`, ignoring whether it is
/// still live or the need still active.
fn circuit_covers_port_need(circuit: &Circuit, port: u16, need: &PortNeed) -> bool {
    circuit.exit_policy.can_exit_to_port(port)
        && (!need.fast || circuit.fast)
        && (!need.stable || circuit.stable)
}

/// Return true if `circuit` (assumed live) can carry `stream`.
fn circuit_supports_stream(circuit: &Circuit, stream: &Stream) -> bool {
    match stream.stream_type {
        StreamType::Resolve => circuit.internal,
        StreamType::Generic => {
            let (Some(ip), Some(port)) = (stream.ip, stream.port) else {
                return false;
            };
            !circuit.internal
                && circuit.exit_policy.can_exit_to(ip, port)
                && (circuit.stable || !is_long_lived_port(port))
        }
    }
}

impl ClientState {
    /// Drop the oldest expired dirty circuits. `dirty_exit_circuits` is
    /// ordered front = newest, so expired entries accumulate at the back.
    fn kill_old_dirty_circuits(&mut self, cur_time: UnixTime) {
        while let Some(oldest) = self.dirty_exit_circuits.back() {
            let Some(dirty_time) = oldest.dirty_time else {
                break;
            };
            if dirty_time <= cur_time.saturating_sub(DIRTY_CIRCUIT_LIFETIME) {
                tracing::debug!(client = %self.id, cur_time, dirty_time, "killed exit circuit");
                self.dirty_exit_circuits.pop_back();
            } else {
                break;
            }
        }
        if let Some(dirty_time) = self.dirty_internal_circuit.as_ref().and_then(|c| c.dirty_time) {
            if dirty_time <= cur_time.saturating_sub(DIRTY_CIRCUIT_LIFETIME) {
                tracing::debug!(client = %self.id, cur_time, dirty_time, "killed internal circuit");
                self.dirty_internal_circuit = None;
            }
        }
    }

    /// Drop port needs whose `expires` has passed. Needs with no expiry are
    /// never dropped this way.
    fn expire_port_needs(&mut self, cur_time: UnixTime) {
        self.port_needs
            .retain(|_, need| !need.expires.is_some_and(|e| e <= cur_time));
    }

    /// Build a fresh clean circuit for every currently-uncovered port need,
    /// and let each new circuit also cover any other need it happens to
    /// satisfy.
    fn cover_port_needs<R: Rng + ?Sized>(
        &mut self,
        period: &ConsensusPeriod,
        cur_time: UnixTime,
        potential_exits: &[Fingerprint],
        potential_middles: &[Fingerprint],
        rng: &mut R,
    ) -> Result<(), Error> {
        // Iterate a snapshot of the ports (ascending, for determinism), but
        // re-check each one's live `covered_count`: a circuit built earlier
        // in this same pass may already have covered a port visited later.
        let ports: Vec<u16> = self.port_needs.keys().copied().collect();

        for port in ports {
            let Some(need) = self.port_needs.get(&port).filter(|need| need.covered_count == 0) else {
                continue;
            };
            let need = need.clone();
            let mut circuit = build_circuit(
                period,
                &mut self.guards,
                BuildRequest {
                    time: cur_time,
                    fast: need.fast,
                    stable: need.stable,
                    internal: false,
                    ip: None,
                    port: Some(port),
                    potential_exits: Some(potential_exits),
                    potential_middles: Some(potential_middles),
                },
                rng,
            )?;

            for (other_port, other_need) in self.port_needs.iter_mut() {
                if circuit_covers_port_need(&circuit, *other_port, other_need) {
                    other_need.covered_count += 1;
                    circuit.covering.insert(*other_port);
                }
            }
            tracing::debug!(client = %self.id, cur_time, port, "created circuit to cover port");
            self.clean_exit_circuits.push_front(circuit);
        }
        Ok(())
    }

    /// Build a clean internal circuit if the client doesn't already have a
    /// spare one.
    fn ensure_clean_internal_circuit<R: Rng + ?Sized>(
        &mut self,
        period: &ConsensusPeriod,
        cur_time: UnixTime,
        potential_exits: &[Fingerprint],
        potential_middles: &[Fingerprint],
        rng: &mut R,
    ) -> Result<(), Error> {
        if self.clean_internal_circuit.is_some() {
            return Ok(());
        }
        let circuit = build_circuit(
            period,
            &mut self.guards,
            BuildRequest {
                time: cur_time,
                fast: true,
                stable: true,
                internal: true,
                ip: None,
                port: None,
                potential_exits: Some(potential_exits),
                potential_middles: Some(potential_middles),
            },
            rng,
        )?;
        self.clean_internal_circuit = Some(circuit);
        Ok(())
    }

    /// Assign one resolve stream to an internal circuit, promoting the
    /// clean spare or building on demand as needed.
    fn assign_resolve_stream<R: Rng + ?Sized>(
        &mut self,
        period: &ConsensusPeriod,
        stream: &Stream,
        potential_exits: &[Fingerprint],
        potential_middles: &[Fingerprint],
        rng: &mut R,
    ) -> Result<(), Error> {
        if self.dirty_internal_circuit.is_some() {
            tracing::debug!(client = %self.id, time = stream.time, "resolve stream: reusing dirty internal circuit");
            return Ok(());
        }
        if let Some(mut circuit) = self.clean_internal_circuit.take() {
            tracing::debug!(client = %self.id, time = stream.time, "resolve stream: promoting clean internal circuit");
            circuit.dirty_time = Some(stream.time);
            self.dirty_internal_circuit = Some(circuit);
            return Ok(());
        }
        let mut circuit = build_circuit(
            period,
            &mut self.guards,
            BuildRequest {
                time: stream.time,
                fast: true,
                stable: true,
                internal: true,
                ip: None,
                port: None,
                potential_exits: Some(potential_exits),
                potential_middles: Some(potential_middles),
            },
            rng,
        )?;
        circuit.dirty_time = Some(stream.time);
        self.dirty_internal_circuit = Some(circuit);
        Ok(())
    }

    /// Assign one generic stream to an exit circuit: reuse a dirty one,
    /// promote a clean one, or build fresh, per the design's ordered search.
    fn assign_generic_stream<R: Rng + ?Sized>(
        &mut self,
        period: &ConsensusPeriod,
        stream: &Stream,
        potential_exits: &[Fingerprint],
        potential_middles: &[Fingerprint],
        rng: &mut R,
    ) -> Result<(), Error> {
        if self
            .dirty_exit_circuits
            .iter()
            .any(|c| circuit_supports_stream(c, stream))
        {
            tracing::debug!(client = %self.id, time = stream.time, "generic stream: reusing dirty exit circuit");
            return Ok(());
        }

        let pos = self
            .clean_exit_circuits
            .iter()
            .position(|c| circuit_supports_stream(c, stream));
        if let Some(mut circuit) = pos.and_then(|pos| self.clean_exit_circuits.remove(pos)) {
            circuit.dirty_time = Some(stream.time);
            for port in circuit.covering.iter() {
                if let Some(need) = self.port_needs.get_mut(port) {
                    need.covered_count = need.covered_count.saturating_sub(1);
                }
            }
            tracing::debug!(client = %self.id, time = stream.time, exit = %circuit.exit(), "generic stream: promoting clean exit circuit");
            self.dirty_exit_circuits.push_front(circuit);
            return Ok(());
        }

        let port = stream.port.ok_or(Error::MissingPort)?;
        let mut circuit = build_circuit(
            period,
            &mut self.guards,
            BuildRequest {
                time: stream.time,
                fast: true,
                stable: is_long_lived_port(port),
                internal: false,
                ip: stream.ip,
                port: Some(port),
                potential_exits: Some(potential_exits),
                potential_middles: Some(potential_middles),
            },
            rng,
        )?;
        circuit.dirty_time = Some(stream.time);
        self.dirty_exit_circuits.push_front(circuit);
        Ok(())
    }

    /// Create or extend the port need for a generic stream's destination port.
    fn record_stream_port(&mut self, stream: &Stream) {
        let Some(port) = stream.port else { return };
        let new_expiry = stream.time + PORT_NEED_LIFETIME;
        self.port_needs
            .entry(port)
            .and_modify(|need| {
                if need.expires.is_some_and(|e| e < new_expiry) {
                    need.expires = Some(new_expiry);
                }
            })
            .or_insert(PortNeed {
                covered_count: 0,
                expires: Some(new_expiry),
                fast: true,
                stable: is_long_lived_port(port),
            });
    }

    /// Run one 60-second tick of processing for this client, per the
    /// design's five-step algorithm.
    pub fn process_tick<R: Rng + ?Sized>(
        &mut self,
        period: &ConsensusPeriod,
        cur_time: UnixTime,
        streams: &[Stream],
        potential_exits: &[Fingerprint],
        potential_middles: &[Fingerprint],
        rng: &mut R,
    ) -> Result<(), Error> {
        self.kill_old_dirty_circuits(cur_time);
        self.expire_port_needs(cur_time);
        self.cover_port_needs(period, cur_time, potential_exits, potential_middles, rng)?;
        self.ensure_clean_internal_circuit(period, cur_time, potential_exits, potential_middles, rng)?;

        for stream in streams {
            match stream.stream_type {
                StreamType::Resolve => {
                    self.assign_resolve_stream(period, stream, potential_exits, potential_middles, rng)?;
                }
                StreamType::Generic => {
                    self.assign_generic_stream(period, stream, potential_exits, potential_middles, rng)?;
                }
            }
            self.record_stream_port(stream);
        }
        Ok(())
    }
}
