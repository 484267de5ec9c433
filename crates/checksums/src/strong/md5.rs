use std::fmt;
use std::io;

use super::to_hex;

/// Size of one MD5 input block in bytes.
pub const BLOCK_LEN: usize = 64;

/// Size of an MD5 digest in bytes.
pub const DIGEST_LEN: usize = 16;

/// Offset of the length field inside the final padded block.
const LENGTH_OFFSET: usize = BLOCK_LEN - 8;

/// MD5 initial state constants.
const INIT_STATE: [u32; 4] = [0x6745_2301, 0xefcd_ab89, 0x98ba_dcfe, 0x1032_5476];

/// MD5 round constants.
const K: [u32; 64] = [
    0xd76a_a478, 0xe8c7_b756, 0x2420_70db, 0xc1bd_ceee, 0xf57c_0faf, 0x4787_c62a, 0xa830_4613,
    0xfd46_9501, 0x6980_98d8, 0x8b44_f7af, 0xffff_5bb1, 0x895c_d7be, 0x6b90_1122, 0xfd98_7193,
    0xa679_438e, 0x49b4_0821, 0xf61e_2562, 0xc040_b340, 0x265e_5a51, 0xe9b6_c7aa, 0xd62f_105d,
    0x0244_1453, 0xd8a1_e681, 0xe7d3_fbc8, 0x21e1_cde6, 0xc337_07d6, 0xf4d5_0d87, 0x455a_14ed,
    0xa9e3_e905, 0xfcef_a3f8, 0x676f_02d9, 0x8d2a_4c8a, 0xfffa_3942, 0x8771_f681, 0x6d9d_6122,
    0xfde5_380c, 0xa4be_ea44, 0x4bde_cfa9, 0xf6bb_4b60, 0xbebf_bc70, 0x289b_7ec6, 0xeaa1_27fa,
    0xd4ef_3085, 0x0488_1d05, 0xd9d4_d039, 0xe6db_99e5, 0x1fa2_7cf8, 0xc4ac_5665, 0xf429_2244,
    0x432a_ff97, 0xab94_23a7, 0xfc93_a039, 0x655b_59c3, 0x8f0c_cc92, 0xffef_f47d, 0x8584_5dd1,
    0x6fa8_7e4f, 0xfe2c_e6e0, 0xa301_4314, 0x4e08_11a1, 0xf753_7e82, 0xbd3a_f235, 0x2ad7_d2bb,
    0xeb86_d391,
];

/// Per-round left-rotation amounts.
const SHIFTS: [u32; 64] = [
    7, 12, 17, 22, 7, 12, 17, 22, 7, 12, 17, 22, 7, 12, 17, 22, //
    5, 9, 14, 20, 5, 9, 14, 20, 5, 9, 14, 20, 5, 9, 14, 20, //
    4, 11, 16, 23, 4, 11, 16, 23, 4, 11, 16, 23, 4, 11, 16, 23, //
    6, 10, 15, 21, 6, 10, 15, 21, 6, 10, 15, 21, 6, 10, 15, 21,
];

/// Padding source: a single `0x80` byte followed by zeros.
const PADDING: [u8; BLOCK_LEN] = {
    let mut padding = [0_u8; BLOCK_LEN];
    padding[0] = 0x80;
    padding
};

/// Streaming MD5 hasher (RFC 1321).
///
/// Input may be supplied in arbitrarily sized pieces; the hasher buffers the
/// tail of the current 64-byte block between calls. Unlike the consuming
/// `finalize` of most digest crates, [`Md5::finalize`] borrows the hasher and
/// caches its result so the digest can be queried repeatedly.
#[derive(Clone)]
pub struct Md5 {
    state: [u32; 4],
    /// Message length in bits, low word first.
    bit_count: [u32; 2],
    block: [u8; BLOCK_LEN],
    digest: [u8; DIGEST_LEN],
    finalized: bool,
}

impl Md5 {
    /// Creates a hasher with an empty state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: INIT_STATE,
            bit_count: [0, 0],
            block: [0; BLOCK_LEN],
            digest: [0; DIGEST_LEN],
            finalized: false,
        }
    }

    /// Convenience helper that computes the MD5 digest for `data` in one shot.
    #[must_use]
    pub fn compute(data: &[u8]) -> [u8; DIGEST_LEN] {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }

    /// Feeds additional bytes into the digest state.
    ///
    /// Input supplied after [`Md5::finalize`] is ignored; call
    /// [`Md5::reset`] to start a new message.
    pub fn update(&mut self, data: &[u8]) {
        if self.finalized {
            tracing::trace!(len = data.len(), "md5 update after finalize ignored");
            return;
        }
        self.absorb(data);
    }

    /// Finalises the digest and returns the 128-bit MD5 output.
    ///
    /// The first call appends the RFC 1321 padding and length; later calls
    /// return the cached digest unchanged.
    pub fn finalize(&mut self) -> [u8; DIGEST_LEN] {
        if self.finalized {
            return self.digest;
        }

        let [low, high] = self.bit_count;
        let mut length = [0_u8; 8];
        length[..4].copy_from_slice(&low.to_le_bytes());
        length[4..].copy_from_slice(&high.to_le_bytes());

        let filled = self.filled();
        let pad_len = if filled < LENGTH_OFFSET {
            LENGTH_OFFSET - filled
        } else {
            BLOCK_LEN + LENGTH_OFFSET - filled
        };
        self.absorb(&PADDING[..pad_len]);
        self.absorb(&length);
        debug_assert_eq!(self.filled(), 0);

        for (out, word) in self.digest.chunks_exact_mut(4).zip(self.state) {
            out.copy_from_slice(&word.to_le_bytes());
        }
        self.block = [0; BLOCK_LEN];
        self.bit_count = [low, high];
        self.finalized = true;
        self.digest
    }

    /// Returns the digest, finalising the hasher if necessary.
    pub fn digest(&mut self) -> [u8; DIGEST_LEN] {
        self.finalize()
    }

    /// Returns the digest rendered as hexadecimal, finalising if necessary.
    pub fn to_hex_string(&mut self, upper: bool) -> String {
        let digest = self.finalize();
        to_hex(&digest, upper)
    }

    /// Reports whether [`Md5::finalize`] has run since creation or the last reset.
    #[must_use]
    pub const fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Returns the number of message bytes absorbed so far (modulo 2^61).
    #[must_use]
    pub const fn len(&self) -> u64 {
        ((self.bit_count[1] as u64) << 29) | ((self.bit_count[0] as u64) >> 3)
    }

    /// Reports whether no message bytes have been absorbed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bit_count[0] == 0 && self.bit_count[1] == 0
    }

    /// Returns the hasher to its initial state for reuse.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn filled(&self) -> usize {
        ((self.bit_count[0] >> 3) as usize) & (BLOCK_LEN - 1)
    }

    fn absorb(&mut self, data: &[u8]) {
        let filled = self.filled();

        // The count is kept as two halves so it wraps like a 64-bit counter.
        let bits = (data.len() as u64) << 3;
        let (low, carry) = self.bit_count[0].overflowing_add(bits as u32);
        self.bit_count[0] = low;
        self.bit_count[1] = self.bit_count[1]
            .wrapping_add((bits >> 32) as u32)
            .wrapping_add(u32::from(carry));

        let mut input = data;
        if filled > 0 {
            let take = (BLOCK_LEN - filled).min(input.len());
            self.block[filled..filled + take].copy_from_slice(&input[..take]);
            input = &input[take..];
            if filled + take < BLOCK_LEN {
                return;
            }
            let block = self.block;
            transform(&mut self.state, &block);
        }

        let mut blocks = input.chunks_exact(BLOCK_LEN);
        for block in &mut blocks {
            transform(&mut self.state, block);
        }
        let tail = blocks.remainder();
        self.block[..tail.len()].copy_from_slice(tail);
    }
}

impl Default for Md5 {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Md5 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Md5")
            .field("len", &self.len())
            .field("finalized", &self.finalized)
            .finish_non_exhaustive()
    }
}

impl io::Write for Md5 {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Applies the MD5 compression function to one 64-byte block.
fn transform(state: &mut [u32; 4], block: &[u8]) {
    debug_assert_eq!(block.len(), BLOCK_LEN);

    let mut x = [0_u32; 16];
    for (word, bytes) in x.iter_mut().zip(block.chunks_exact(4)) {
        *word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    }

    let [mut a, mut b, mut c, mut d] = *state;
    for i in 0..64 {
        let (f, g) = match i / 16 {
            0 => ((b & c) | (!b & d), i),
            1 => ((b & d) | (c & !d), (5 * i + 1) % 16),
            2 => (b ^ c ^ d, (3 * i + 5) % 16),
            _ => (c ^ (b | !d), (7 * i) % 16),
        };
        let rotated = a
            .wrapping_add(f)
            .wrapping_add(K[i])
            .wrapping_add(x[g])
            .rotate_left(SHIFTS[i]);
        a = d;
        d = c;
        c = b;
        b = b.wrapping_add(rotated);
    }

    state[0] = state[0].wrapping_add(a);
    state[1] = state[1].wrapping_add(b);
    state[2] = state[2].wrapping_add(c);
    state[3] = state[3].wrapping_add(d);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn md5_streaming_matches_rfc_vectors() {
        let vectors = [
            (b"".as_slice(), "d41d8cd98f00b204e9800998ecf8427e"),
            (b"a".as_slice(), "0cc175b9c0f1b6a831c399e269772661"),
            (b"abc".as_slice(), "900150983cd24fb0d6963f7d28e17f72"),
            (
                b"message digest".as_slice(),
                "f96b697d7cb7938d525a2f31aaf161d0",
            ),
        ];

        for (input, expected_hex) in vectors {
            let mut hasher = Md5::new();
            let mid = input.len() / 2;
            hasher.update(&input[..mid]);
            hasher.update(&input[mid..]);
            assert_eq!(hasher.to_hex_string(false), expected_hex);

            let one_shot = Md5::compute(input);
            assert_eq!(to_hex(&one_shot, false), expected_hex);
        }
    }

    #[test]
    fn finalize_is_idempotent() {
        let mut hasher = Md5::new();
        hasher.update(b"abc");
        let first = hasher.finalize();
        let second = hasher.finalize();
        assert_eq!(first, second);
        assert!(hasher.is_finalized());
    }

    #[test]
    fn update_after_finalize_is_ignored() {
        let mut hasher = Md5::new();
        hasher.update(b"abc");
        let before = hasher.finalize();
        hasher.update(b"more");
        assert_eq!(hasher.finalize(), before);
        assert_eq!(hasher.len(), 3);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut hasher = Md5::new();
        hasher.update(b"discard me");
        let _ = hasher.finalize();
        hasher.reset();
        assert!(!hasher.is_finalized());
        assert!(hasher.is_empty());
        assert_eq!(
            hasher.to_hex_string(false),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }

    #[test]
    fn uppercase_hex_rendering() {
        let mut hasher = Md5::new();
        hasher.update(b"abc");
        assert_eq!(
            hasher.to_hex_string(true),
            "900150983CD24FB0D6963F7D28E17F72"
        );
    }

    #[test]
    fn bit_count_carries_into_high_word() {
        let mut hasher = Md5::new();
        hasher.bit_count = [u32::MAX - 7, 0];
        hasher.absorb(&[0_u8; 2]);
        assert_eq!(hasher.bit_count, [8, 1]);
    }

    #[test]
    fn length_tracks_absorbed_bytes() {
        let mut hasher = Md5::new();
        hasher.update(&[0_u8; 130]);
        assert_eq!(hasher.len(), 130);
        assert_eq!(hasher.filled(), 2);
    }
}
