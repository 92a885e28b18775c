//! Ratcliff/Obershelp string similarity.
//!
//! The ratio is `2 * M / T` where `M` is the number of characters in the
//! matching blocks and `T` the combined length of both strings. Matching
//! blocks are found by taking the longest common substring and recursing on
//! the unmatched text to its left and right.

/// Similarity of `a` and `b` in `[0, 1]`.
///
/// Symmetric, `1.0` only for identical strings and `0.0` only when no
/// character matches. Lengths are counted in `char`s.
pub fn similarity(a: &str, b: &str) -> f64 {
    // Tie-breaking between equally long blocks depends on argument order, so
    // the pair is always evaluated in the same order.
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    let first = first.chars().collect::<Vec<_>>();
    let second = second.chars().collect::<Vec<_>>();

    let total = first.len() + second.len();
    if total == 0 {
        return 1.0;
    }

    let matched = matched_chars(&first, &second);
    2.0 * matched as f64 / total as f64
}

fn matched_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
        let block = longest_common_block(a, b, a_lo, a_hi, b_lo, b_hi);
        if block.len == 0 {
            continue;
        }

        matched += block.len;
        if a_lo < block.a_start && b_lo < block.b_start {
            pending.push((a_lo, block.a_start, b_lo, block.b_start));
        }
        let a_end = block.a_start + block.len;
        let b_end = block.b_start + block.len;
        if a_end < a_hi && b_end < b_hi {
            pending.push((a_end, a_hi, b_end, b_hi));
        }
    }

    matched
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    a_start: usize,
    b_start: usize,
    len: usize,
}

/// Longest common substring of `a[a_lo..a_hi]` and `b[b_lo..b_hi]`. Among
/// equally long blocks the one starting earliest in `a`, then in `b`, wins.
fn longest_common_block(
    a: &[char],
    b: &[char],
    a_lo: usize,
    a_hi: usize,
    b_lo: usize,
    b_hi: usize,
) -> Block {
    let mut best = Block {
        a_start: a_lo,
        b_start: b_lo,
        len: 0,
    };
    let width = b_hi - b_lo + 1;
    let mut previous = vec![0_usize; width];
    let mut current = vec![0_usize; width];

    for i in a_lo..a_hi {
        for j in b_lo..b_hi {
            let slot = j - b_lo + 1;
            if a[i] == b[j] {
                let run = previous[slot - 1] + 1;
                current[slot] = run;
                if run > best.len {
                    best = Block {
                        a_start: i + 1 - run,
                        b_start: j + 1 - run,
                        len: run,
                    };
                }
            } else {
                current[slot] = 0;
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }

    best
}
