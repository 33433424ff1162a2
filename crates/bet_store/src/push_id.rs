//! Time-ordered 20-char ids in the Firebase push-ID format.

use std::sync::{Mutex, OnceLock};

use chrono::Utc;
use rand::Rng;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

#[derive(Default)]
struct PushState {
    last_ms: i64,
    last_rand: [u8; 12],
}

#[derive(Default)]
pub struct PushIdGenerator {
    state: Mutex<PushState>,
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> String {
        self.next_at(Utc::now().timestamp_millis())
    }

    pub fn next_at(&self, now_ms: i64) -> String {
        let mut st = self.state.lock().unwrap_or_else(|p| p.into_inner());

        if now_ms == st.last_ms {
            // same millisecond: increment the random suffix so ids stay ordered
            for i in (0..12).rev() {
                if st.last_rand[i] == 63 {
                    st.last_rand[i] = 0;
                } else {
                    st.last_rand[i] += 1;
                    break;
                }
            }
        } else {
            st.last_ms = now_ms;
            let mut rng = rand::thread_rng();
            for slot in st.last_rand.iter_mut() {
                *slot = rng.gen_range(0..64);
            }
        }

        let mut ts = now_ms.max(0);
        let mut head = [0u8; 8];
        for slot in head.iter_mut().rev() {
            *slot = PUSH_CHARS[(ts % 64) as usize];
            ts /= 64;
        }

        let mut id = String::with_capacity(20);
        id.extend(head.iter().map(|&c| c as char));
        id.extend(st.last_rand.iter().map(|&r| PUSH_CHARS[r as usize] as char));
        id
    }
}

/// Process-wide generator.
pub fn next_push_id() -> String {
    static GENERATOR: OnceLock<PushIdGenerator> = OnceLock::new();
    GENERATOR.get_or_init(PushIdGenerator::new).next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_twenty_chars_and_ordered() {
        let g = PushIdGenerator::new();
        let a = g.next_at(1_700_000_000_000);
        let b = g.next_at(1_700_000_000_000);
        let c = g.next_at(1_700_000_000_001);
        assert_eq!(a.len(), 20);
        assert!(a < b, "{a} !< {b}");
        assert!(b < c, "{b} !< {c}");
        assert_eq!(&a[..8], &b[..8]);
    }

    #[test]
    fn alphabet_order_matches_byte_order() {
        let mut sorted = PUSH_CHARS.to_vec();
        sorted.sort_unstable();
        assert_eq!(&sorted[..], &PUSH_CHARS[..]);
    }
}
