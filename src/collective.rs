/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Collective operations among a fixed group of workers.
//!
//! The distributed PageRank computation needs only two collective
//! primitives, described by the [`Collective`] trait: an element-wise sum of
//! full-length vectors, and a gather of disjoint row ranges into a
//! full-length vector. Every call is a barrier: no worker completes its *k*-th
//! call before all workers have contributed to it.
//!
//! [`ThreadCollective`] implements the trait for workers living in the same
//! process, connected by [`crossbeam_channel`] channels. By default calls
//! block indefinitely, so a worker that stops answering stalls the whole
//! group; a timeout can be set when creating the group.

use crate::{Error, Float, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

/// Collective operations of a worker belonging to a statically sized group.
///
/// All workers must perform the same sequence of calls.
pub trait Collective {
    /// Returns the index of this worker in the group.
    fn rank(&self) -> usize;

    /// Returns the number of workers in the group.
    fn num_workers(&self) -> usize;

    /// Returns the element-wise sum of the vectors supplied by all workers.
    ///
    /// All workers must supply vectors of the same length, and all of them
    /// receive the same result.
    fn reduce_sum(&mut self, local: &[Float]) -> Result<Vec<Float>>;

    /// Returns a vector of length `len` in which the contribution of each
    /// worker has been copied starting at its row offset.
    ///
    /// Row ranges must be disjoint; entries not covered by any worker are
    /// zero.
    fn gather_rows(&mut self, local: &[Float], row_offset: usize, len: usize)
        -> Result<Vec<Float>>;
}

#[derive(Debug, Clone)]
enum Payload {
    Sum(Arc<[Float]>),
    Rows { offset: usize, values: Arc<[Float]> },
}

#[derive(Debug)]
struct Message {
    round: u64,
    from: usize,
    payload: Payload,
}

/// A [`Collective`] implementation for threads of the same process.
///
/// Each call sends the local contribution to every other worker and waits
/// for theirs. Contributions are combined in worker order, so all workers
/// obtain bit-identical results.
///
/// # Examples
///
/// ```
/// use pprank::collective::{Collective, ThreadCollective};
///
/// let group = ThreadCollective::group(3, None);
/// let sums = std::thread::scope(|s| {
///     let handles = group
///         .into_iter()
///         .map(|mut c| s.spawn(move || c.reduce_sum(&[c.rank() as pprank::Float, 1.0])))
///         .collect::<Vec<_>>();
///     handles
///         .into_iter()
///         .map(|h| h.join().unwrap())
///         .collect::<Result<Vec<_>, _>>()
/// })?;
/// for sum in sums {
///     assert_eq!(sum, vec![3.0, 3.0]);
/// }
/// # Ok::<(), pprank::Error>(())
/// ```
#[derive(Debug)]
pub struct ThreadCollective {
    rank: usize,
    num_workers: usize,
    peers: Vec<Sender<Message>>,
    receiver: Receiver<Message>,
    /// Messages of the next round received while waiting for the current one.
    pending: Vec<Message>,
    round: u64,
    timeout: Option<Duration>,
}

impl ThreadCollective {
    /// Creates a group of `n` connected workers, returned in rank order.
    ///
    /// If `timeout` is `Some`, waiting for a contribution longer than the
    /// given duration makes the call fail with [`Error::Timeout`]; otherwise,
    /// calls block until all contributions arrive.
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero.
    pub fn group(n: usize, timeout: Option<Duration>) -> Vec<Self> {
        assert!(n > 0, "A group must contain at least one worker");
        let (senders, receivers): (Vec<_>, Vec<_>) =
            (0..n).map(|_| crossbeam_channel::unbounded()).unzip();
        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, receiver)| Self {
                rank,
                num_workers: n,
                peers: senders
                    .iter()
                    .enumerate()
                    .filter(|&(peer, _)| peer != rank)
                    .map(|(_, sender)| sender.clone())
                    .collect(),
                receiver,
                pending: vec![],
                round: 0,
                timeout,
            })
            .collect()
    }

    /// Returns the timeout of collective calls.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Sends a payload to all peers and returns their payloads for the same
    /// round, sorted by sender.
    fn exchange(&mut self, payload: Payload) -> Result<Vec<(usize, Payload)>> {
        let round = self.round;
        self.round += 1;
        let rank = self.rank;

        for peer in &self.peers {
            peer.send(Message {
                round,
                from: rank,
                payload: payload.clone(),
            })
            .map_err(|_| Error::Disconnected { rank, round })?;
        }

        // A peer can be at most one round ahead of us
        let (mut received, later): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|m| m.round == round);
        self.pending = later;

        while received.len() < self.peers.len() {
            let message = match self.timeout {
                Some(timeout) => self.receiver.recv_timeout(timeout).map_err(|e| match e {
                    RecvTimeoutError::Timeout => Error::Timeout { rank, round },
                    RecvTimeoutError::Disconnected => Error::Disconnected { rank, round },
                })?,
                None => self
                    .receiver
                    .recv()
                    .map_err(|_| Error::Disconnected { rank, round })?,
            };
            if message.round == round {
                received.push(message);
            } else {
                debug_assert_eq!(message.round, round + 1);
                self.pending.push(message);
            }
        }

        received.sort_by_key(|m| m.from);
        Ok(received.into_iter().map(|m| (m.from, m.payload)).collect())
    }
}

impl Collective for ThreadCollective {
    fn rank(&self) -> usize {
        self.rank
    }

    fn num_workers(&self) -> usize {
        self.num_workers
    }

    fn reduce_sum(&mut self, local: &[Float]) -> Result<Vec<Float>> {
        if self.num_workers == 1 {
            return Ok(local.to_vec());
        }
        let round = self.round;
        let received = self.exchange(Payload::Sum(local.into()))?;

        let mut sum = vec![0.0; local.len()];
        let mut add = |values: &[Float]| -> Result<()> {
            if values.len() != sum.len() {
                return Err(Error::Dimension {
                    expected: sum.len(),
                    actual: values.len(),
                });
            }
            for (s, &v) in sum.iter_mut().zip(values) {
                *s += v;
            }
            Ok(())
        };

        // Add contributions in rank order, ours included
        let mut local = Some(local);
        for (from, payload) in received {
            if from > self.rank {
                if let Some(local) = local.take() {
                    add(local)?;
                }
            }
            match payload {
                Payload::Sum(values) => add(&values)?,
                Payload::Rows { .. } => {
                    return Err(Error::Mismatch {
                        rank: self.rank,
                        peer: from,
                        round,
                    })
                }
            }
        }
        if let Some(local) = local {
            add(local)?;
        }
        Ok(sum)
    }

    fn gather_rows(
        &mut self,
        local: &[Float],
        row_offset: usize,
        len: usize,
    ) -> Result<Vec<Float>> {
        let mut result = vec![0.0; len];
        let mut place = |offset: usize, values: &[Float]| -> Result<()> {
            if offset + values.len() > len {
                return Err(Error::Dimension {
                    expected: len,
                    actual: offset + values.len(),
                });
            }
            result[offset..offset + values.len()].copy_from_slice(values);
            Ok(())
        };

        place(row_offset, local)?;
        if self.num_workers > 1 {
            let round = self.round;
            let received = self.exchange(Payload::Rows {
                offset: row_offset,
                values: local.into(),
            })?;
            for (from, payload) in received {
                match payload {
                    Payload::Rows { offset, values } => place(offset, &values)?,
                    Payload::Sum(_) => {
                        return Err(Error::Mismatch {
                            rank: self.rank,
                            peer: from,
                            round,
                        })
                    }
                }
            }
        }
        Ok(result)
    }
}
