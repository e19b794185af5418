/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use pprank::prelude::*;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::time::Duration;

/// Runs `f` on every member of a group of `n` workers, each in its own
/// thread, and returns the results in rank order.
fn run_group<T: Send>(
    n: usize,
    timeout: Option<Duration>,
    f: impl Fn(&mut ThreadCollective) -> pprank::Result<T> + Sync,
) -> Vec<pprank::Result<T>> {
    let f = &f;
    std::thread::scope(|s| {
        ThreadCollective::group(n, timeout)
            .into_iter()
            .map(|mut c| s.spawn(move || f(&mut c)))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect()
    })
}

#[test]
fn test_reduce_sum() -> Result<()> {
    for result in run_group(4, None, |c| {
        let r = c.rank() as Float;
        c.reduce_sum(&[r, 1.0, r * r])
    }) {
        assert_eq!(result?, vec![6.0, 4.0, 14.0]);
    }
    Ok(())
}

#[test]
fn test_reduce_sum_is_bit_identical() -> Result<()> {
    const N: usize = 5;
    const LEN: usize = 1000;
    let mut rng = SmallRng::seed_from_u64(0);
    let contributions = (0..N)
        .map(|_| {
            (0..LEN)
                .map(|_| rng.random_range(-1.0..1.0))
                .collect::<Vec<Float>>()
        })
        .collect::<Vec<_>>();

    // Sequential sum in rank order
    let mut expected = vec![0.0; LEN];
    for contribution in &contributions {
        for (e, &x) in expected.iter_mut().zip(contribution) {
            *e += x;
        }
    }

    let contributions = &contributions;
    for result in run_group(N, None, |c| c.reduce_sum(&contributions[c.rank()])) {
        assert_eq!(result?, expected);
    }
    Ok(())
}

#[test]
fn test_gather_rows() -> Result<()> {
    let offsets = [0, 2, 5];
    let results = run_group(3, None, |c| {
        let rank = c.rank();
        let len = [2, 3, 1][rank];
        let local = vec![(rank + 1) as Float; len];
        c.gather_rows(&local, offsets[rank], 7)
    });
    for result in results {
        assert_eq!(result?, vec![1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 0.0]);
    }
    Ok(())
}

#[test]
fn test_many_rounds() -> Result<()> {
    const ROUNDS: usize = 200;
    let results = run_group(3, None, |c| {
        let rank = c.rank();
        let mut totals = vec![];
        for round in 0..ROUNDS {
            if round % 3 == 2 {
                let gathered = c.gather_rows(&[round as Float], rank, 3)?;
                totals.push(gathered.iter().sum::<Float>());
            } else {
                let sum = c.reduce_sum(&[(round + rank) as Float])?;
                totals.push(sum[0]);
            }
        }
        Ok(totals)
    });
    for result in results {
        let totals = result?;
        assert_eq!(totals.len(), ROUNDS);
        for (round, total) in totals.into_iter().enumerate() {
            // The sum of three copies of round, plus 0 + 1 + 2 for reductions
            let expected = 3 * round + if round % 3 == 2 { 0 } else { 3 };
            assert_eq!(total, expected as Float);
        }
    }
    Ok(())
}

#[test]
fn test_single_worker() -> Result<()> {
    let mut group = ThreadCollective::group(1, None);
    assert_eq!(group.len(), 1);
    let c = &mut group[0];
    assert_eq!(c.rank(), 0);
    assert_eq!(c.num_workers(), 1);
    assert_eq!(c.timeout(), None);
    assert_eq!(c.reduce_sum(&[1.0, 2.0])?, vec![1.0, 2.0]);
    Ok(())
}

#[test]
fn test_timeout() {
    let mut group = ThreadCollective::group(2, Some(Duration::from_millis(50)));
    // Worker 1 is alive but never answers
    let _silent = group.pop();
    let c = &mut group[0];
    assert!(matches!(
        c.reduce_sum(&[1.0]),
        Err(Error::Timeout { rank: 0, round: 0 })
    ));
}

#[test]
fn test_disconnected() {
    let mut group = ThreadCollective::group(2, None);
    drop(group.pop());
    let c = &mut group[0];
    assert!(matches!(
        c.reduce_sum(&[1.0]),
        Err(Error::Disconnected { rank: 0, round: 0 })
    ));
}

#[test]
fn test_length_mismatch() {
    for result in run_group(2, None, |c| {
        let local = vec![1.0; 2 + c.rank()];
        c.reduce_sum(&local)
    }) {
        assert!(matches!(result, Err(Error::Dimension { .. })));
    }
}

#[test]
#[should_panic]
fn test_empty_group() {
    ThreadCollective::group(0, None);
}

#[test]
fn test_mismatched_calls() {
    let results = run_group(2, None, |c| {
        if c.rank() == 0 {
            c.reduce_sum(&[1.0, 2.0])
        } else {
            c.gather_rows(&[1.0], 1, 2)
        }
    });
    assert!(matches!(
        results[0],
        Err(Error::Mismatch {
            rank: 0,
            peer: 1,
            round: 0
        })
    ));
    assert!(matches!(
        results[1],
        Err(Error::Mismatch {
            rank: 1,
            peer: 0,
            round: 0
        })
    ));
}
