//! Property-based tests for the ring's sequential invariants and the
//! pool's range/conservation invariants, driven by arbitrary operation
//! sequences.

use idpool::{IdPool, Ring};
use proptest::prelude::*;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
enum RingOp {
    Enqueue(u32),
    Dequeue,
}

fn ring_op_strategy() -> impl Strategy<Value = RingOp> {
    prop_oneof![
        any::<u32>().prop_map(RingOp::Enqueue),
        Just(RingOp::Dequeue),
    ]
}

proptest! {
    /// A single-threaded ring must behave exactly like a bounded FIFO
    /// queue: every dequeue returns the oldest still-enqueued value, and
    /// enqueue fails precisely when the model queue is at capacity.
    #[test]
    fn ring_matches_bounded_fifo_model(ops in prop::collection::vec(ring_op_strategy(), 0..500)) {
        const CAPACITY: usize = 16;
        let ring = Ring::new(CAPACITY).unwrap();
        let mut model: VecDeque<u32> = VecDeque::new();

        for op in ops {
            match op {
                RingOp::Enqueue(v) => {
                    let accepted = ring.enqueue(v);
                    if model.len() < CAPACITY {
                        prop_assert!(accepted);
                        model.push_back(v);
                    } else {
                        prop_assert!(!accepted);
                    }
                }
                RingOp::Dequeue => {
                    let got = ring.dequeue();
                    prop_assert_eq!(got, model.pop_front());
                }
            }
        }

        prop_assert_eq!(ring.len(), model.len());
        prop_assert_eq!(ring.is_empty(), model.is_empty());
        prop_assert_eq!(ring.is_full(), model.len() == CAPACITY);
    }

    /// Every ID ever returned by `new_id` lies in `[base, base + n_ids)`,
    /// for any base/width/user-count combination and any sequence of
    /// alloc/free calls.
    #[test]
    fn issued_ids_always_in_range(
        base in 0u32..1_000_000,
        n_ids in 1u32..500,
        nb_user in 1usize..6,
        uids in prop::collection::vec(0usize..8, 0..200),
    ) {
        let pool = IdPool::create(nb_user, base, n_ids).unwrap();
        let mut held = Vec::new();

        for (i, uid) in uids.into_iter().enumerate() {
            if i % 3 == 0 && !held.is_empty() {
                let id = held.pop().unwrap();
                pool.free_id(uid, id);
            } else if let Some(id) = pool.new_id(uid) {
                prop_assert!(id >= base && id < base + n_ids);
                held.push(id);
            }
        }
    }
}
