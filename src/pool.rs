//! Process-wide recycling pool for [`HPack`] instances.
//!
//! Connections come and go far more often than codec state is worth
//! reallocating: the dynamic table, field records and their byte buffers
//! all hold reusable capacity. The pool is a plain free list behind a
//! mutex, safe for concurrent acquire/release from unrelated connections.

use std::sync::Mutex;

use crate::hpack::HPack;

static POOL: Mutex<Vec<HPack>> = Mutex::new(Vec::new());

/// Take an instance from the pool, or create a fresh one.
pub fn acquire_hpack() -> HPack {
    POOL.lock()
        .unwrap_or_else(|e| e.into_inner())
        .pop()
        .unwrap_or_default()
}

/// Reset `hpack` and return it to the pool.
///
/// Pooled instances cross connection boundaries, so the dynamic table and
/// every size parameter are reset before the instance is stored; only the
/// recycled buffers survive.
pub fn release_hpack(mut hpack: HPack) {
    hpack.reset();
    POOL.lock().unwrap_or_else(|e| e.into_inner()).push(hpack);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_instances_come_back_clean() {
        let mut hpack = acquire_hpack();
        hpack.disable_huffman = true;
        hpack.set_max_table_size(128);
        hpack.add(b"x-session".as_slice(), b"abc".as_slice());
        let mut block = Vec::new();
        hpack.encode(&mut block).unwrap();
        assert!(hpack.dynamic_len() > 0);
        release_hpack(hpack);

        // Whatever instance we get now must look factory-fresh.
        let hpack = acquire_hpack();
        assert_eq!(hpack.dynamic_len(), 0);
        assert_eq!(hpack.max_table_size(), crate::hpack::DEFAULT_MAX_TABLE_SIZE);
        assert!(hpack.fields().is_empty());
        assert!(!hpack.disable_huffman);
        release_hpack(hpack);
    }

    #[test]
    fn concurrent_acquire_release() {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                std::thread::spawn(|| {
                    for _ in 0..100 {
                        let mut hpack = acquire_hpack();
                        hpack.add(b":method".as_slice(), b"GET".as_slice());
                        let mut block = Vec::new();
                        hpack.encode(&mut block).unwrap();
                        assert_eq!(block, [0x82]);
                        release_hpack(hpack);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
