//! The simulation driver: consensus-period iteration, 60-second
//! time-stepping, and stream windowing.

use rand::Rng;

use crate::client::ClientState;
use crate::consensus::ConsensusPeriod;
use crate::consts::TICK;
use crate::error::Error;
use crate::filter::{filter_exits, filter_middles};
use crate::guardmgr::update_guards;
use crate::stream::Stream;
use crate::time::UnixTime;

/// Drives a set of client states across an ordered, gapless sequence of
/// consensus periods, assigning each period's streams to ticks as it goes.
pub struct Simulation<'a> {
    /// The client states being simulated, in the order they were created.
    pub clients: Vec<ClientState>,
    streams: &'a [Stream],
    stream_start: usize,
    stream_end: usize,
    previous_fresh_until: Option<UnixTime>,
}

impl<'a> Simulation<'a> {
    /// Build a simulation with `num_samples` fresh client states, all
    /// sharing `streams` as their workload.
    pub fn new(num_samples: usize, streams: &'a [Stream]) -> Self {
        let clients = (0..num_samples).map(|i| ClientState::new(i.to_string())).collect();
        Simulation {
            clients,
            streams,
            stream_start: 0,
            stream_end: 0,
            previous_fresh_until: None,
        }
    }

    /// Process one consensus period: update every client's guards, then
    /// step through it one tick at a time, assigning the period's streams.
    ///
    /// `period` must abut the previously processed period (its
    /// `valid_after` must equal the prior period's `fresh_until`), or the
    /// very first period processed by this simulation.
    pub fn run_period<R: Rng + ?Sized>(&mut self, period: &ConsensusPeriod, rng: &mut R) -> Result<(), Error> {
        if let Some(previous_fresh_until) = self.previous_fresh_until {
            if previous_fresh_until != period.valid_after {
                return Err(Error::PeriodGap {
                    previous_fresh_until,
                    next_valid_after: period.valid_after,
                });
            }
        }
        self.previous_fresh_until = Some(period.fresh_until);

        for client in &mut self.clients {
            update_guards(&mut client.guards, period);
        }

        let potential_exits = filter_exits(&period.relays, &period.descriptors);
        let potential_middles = filter_middles(&period.relays, &period.descriptors);

        let mut cur_time = period.valid_after;
        while cur_time < period.fresh_until {
            self.advance_stream_window(cur_time);
            let tick_streams = &self.streams[self.stream_start..self.stream_end];

            for client in &mut self.clients {
                tracing::debug!(client = %client.id, cur_time, "processing tick");
                client.process_tick(period, cur_time, tick_streams, &potential_exits, &potential_middles, rng)?;
            }
            cur_time += TICK;
        }
        Ok(())
    }

    /// Advance the `[stream_start, stream_end)` window to cover streams
    /// whose `time` falls in `[cur_time, cur_time + TICK)`. Both indices
    /// only ever move forward, across the whole simulation.
    fn advance_stream_window(&mut self, cur_time: UnixTime) {
        while self.stream_start < self.streams.len() && self.streams[self.stream_start].time < cur_time {
            self.stream_start += 1;
        }
        self.stream_end = self.stream_start;
        while self.stream_end < self.streams.len() && self.streams[self.stream_end].time < cur_time + TICK {
            self.stream_end += 1;
        }
    }
}
