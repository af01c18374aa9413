//! Huffman codec for HPACK (RFC 7541 Appendix B).
//!
//! Encoding walks the canonical code table through a 64-bit bit buffer and
//! pads the final byte with the high bits of EOS. Decoding runs a flat
//! state machine of 256 states by 16 nibble transitions, derived once at
//! startup from the code table.

use std::sync::OnceLock;

use crate::error::HpackError;

/// End-of-string symbol. Valid only as padding, never in decoded output.
const EOS: u16 = 256;

/// Canonical code table: `(code, bit_length)` per symbol, indexed by byte
/// value, with EOS at 256. Bit lengths run from 5 to 30.
const CODES: [(u32, u8); 257] = [
    (0x1ff8, 13), // 0
    (0x7fffd8, 23), // 1
    (0xfffffe2, 28), // 2
    (0xfffffe3, 28), // 3
    (0xfffffe4, 28), // 4
    (0xfffffe5, 28), // 5
    (0xfffffe6, 28), // 6
    (0xfffffe7, 28), // 7
    (0xfffffe8, 28), // 8
    (0xffffea, 24), // 9
    (0x3ffffffc, 30), // 10
    (0xfffffe9, 28), // 11
    (0xfffffea, 28), // 12
    (0x3ffffffd, 30), // 13
    (0xfffffeb, 28), // 14
    (0xfffffec, 28), // 15
    (0xfffffed, 28), // 16
    (0xfffffee, 28), // 17
    (0xfffffef, 28), // 18
    (0xffffff0, 28), // 19
    (0xffffff1, 28), // 20
    (0xffffff2, 28), // 21
    (0x3ffffffe, 30), // 22
    (0xffffff3, 28), // 23
    (0xffffff4, 28), // 24
    (0xffffff5, 28), // 25
    (0xffffff6, 28), // 26
    (0xffffff7, 28), // 27
    (0xffffff8, 28), // 28
    (0xffffff9, 28), // 29
    (0xffffffa, 28), // 30
    (0xffffffb, 28), // 31
    (0x14, 6), // 32
    (0x3f8, 10), // 33
    (0x3f9, 10), // 34
    (0xffa, 12), // 35
    (0x1ff9, 13), // 36
    (0x15, 6), // 37
    (0xf8, 8), // 38
    (0x7fa, 11), // 39
    (0x3fa, 10), // 40
    (0x3fb, 10), // 41
    (0xf9, 8), // 42
    (0x7fb, 11), // 43
    (0xfa, 8), // 44
    (0x16, 6), // 45
    (0x17, 6), // 46
    (0x18, 6), // 47
    (0x0, 5), // 48
    (0x1, 5), // 49
    (0x2, 5), // 50
    (0x19, 6), // 51
    (0x1a, 6), // 52
    (0x1b, 6), // 53
    (0x1c, 6), // 54
    (0x1d, 6), // 55
    (0x1e, 6), // 56
    (0x1f, 6), // 57
    (0x5c, 7), // 58
    (0xfb, 8), // 59
    (0x7ffc, 15), // 60
    (0x20, 6), // 61
    (0xffb, 12), // 62
    (0x3fc, 10), // 63
    (0x1ffa, 13), // 64
    (0x21, 6), // 65
    (0x5d, 7), // 66
    (0x5e, 7), // 67
    (0x5f, 7), // 68
    (0x60, 7), // 69
    (0x61, 7), // 70
    (0x62, 7), // 71
    (0x63, 7), // 72
    (0x64, 7), // 73
    (0x65, 7), // 74
    (0x66, 7), // 75
    (0x67, 7), // 76
    (0x68, 7), // 77
    (0x69, 7), // 78
    (0x6a, 7), // 79
    (0x6b, 7), // 80
    (0x6c, 7), // 81
    (0x6d, 7), // 82
    (0x6e, 7), // 83
    (0x6f, 7), // 84
    (0x70, 7), // 85
    (0x71, 7), // 86
    (0x72, 7), // 87
    (0xfc, 8), // 88
    (0x73, 7), // 89
    (0xfd, 8), // 90
    (0x1ffb, 13), // 91
    (0x7fff0, 19), // 92
    (0x1ffc, 13), // 93
    (0x3ffc, 14), // 94
    (0x22, 6), // 95
    (0x7ffd, 15), // 96
    (0x3, 5), // 97
    (0x23, 6), // 98
    (0x4, 5), // 99
    (0x24, 6), // 100
    (0x5, 5), // 101
    (0x25, 6), // 102
    (0x26, 6), // 103
    (0x27, 6), // 104
    (0x6, 5), // 105
    (0x74, 7), // 106
    (0x75, 7), // 107
    (0x28, 6), // 108
    (0x29, 6), // 109
    (0x2a, 6), // 110
    (0x7, 5), // 111
    (0x2b, 6), // 112
    (0x76, 7), // 113
    (0x2c, 6), // 114
    (0x8, 5), // 115
    (0x9, 5), // 116
    (0x2d, 6), // 117
    (0x77, 7), // 118
    (0x78, 7), // 119
    (0x79, 7), // 120
    (0x7a, 7), // 121
    (0x7b, 7), // 122
    (0x7ffe, 15), // 123
    (0x7fc, 11), // 124
    (0x3ffd, 14), // 125
    (0x1ffd, 13), // 126
    (0xffffffc, 28), // 127
    (0xfffe6, 20), // 128
    (0x3fffd2, 22), // 129
    (0xfffe7, 20), // 130
    (0xfffe8, 20), // 131
    (0x3fffd3, 22), // 132
    (0x3fffd4, 22), // 133
    (0x3fffd5, 22), // 134
    (0x7fffd9, 23), // 135
    (0x3fffd6, 22), // 136
    (0x7fffda, 23), // 137
    (0x7fffdb, 23), // 138
    (0x7fffdc, 23), // 139
    (0x7fffdd, 23), // 140
    (0x7fffde, 23), // 141
    (0xffffeb, 24), // 142
    (0x7fffdf, 23), // 143
    (0xffffec, 24), // 144
    (0xffffed, 24), // 145
    (0x3fffd7, 22), // 146
    (0x7fffe0, 23), // 147
    (0xffffee, 24), // 148
    (0x7fffe1, 23), // 149
    (0x7fffe2, 23), // 150
    (0x7fffe3, 23), // 151
    (0x7fffe4, 23), // 152
    (0x1fffdc, 21), // 153
    (0x3fffd8, 22), // 154
    (0x7fffe5, 23), // 155
    (0x3fffd9, 22), // 156
    (0x7fffe6, 23), // 157
    (0x7fffe7, 23), // 158
    (0xffffef, 24), // 159
    (0x3fffda, 22), // 160
    (0x1fffdd, 21), // 161
    (0xfffe9, 20), // 162
    (0x3fffdb, 22), // 163
    (0x3fffdc, 22), // 164
    (0x7fffe8, 23), // 165
    (0x7fffe9, 23), // 166
    (0x1fffde, 21), // 167
    (0x7fffea, 23), // 168
    (0x3fffdd, 22), // 169
    (0x3fffde, 22), // 170
    (0xfffff0, 24), // 171
    (0x1fffdf, 21), // 172
    (0x3fffdf, 22), // 173
    (0x7fffeb, 23), // 174
    (0x7fffec, 23), // 175
    (0x1fffe0, 21), // 176
    (0x1fffe1, 21), // 177
    (0x3fffe0, 22), // 178
    (0x1fffe2, 21), // 179
    (0x7fffed, 23), // 180
    (0x3fffe1, 22), // 181
    (0x7fffee, 23), // 182
    (0x7fffef, 23), // 183
    (0xfffea, 20), // 184
    (0x3fffe2, 22), // 185
    (0x3fffe3, 22), // 186
    (0x3fffe4, 22), // 187
    (0x7ffff0, 23), // 188
    (0x3fffe5, 22), // 189
    (0x3fffe6, 22), // 190
    (0x7ffff1, 23), // 191
    (0x3ffffe0, 26), // 192
    (0x3ffffe1, 26), // 193
    (0xfffeb, 20), // 194
    (0x7fff1, 19), // 195
    (0x3fffe7, 22), // 196
    (0x7ffff2, 23), // 197
    (0x3fffe8, 22), // 198
    (0x1ffffec, 25), // 199
    (0x3ffffe2, 26), // 200
    (0x3ffffe3, 26), // 201
    (0x3ffffe4, 26), // 202
    (0x7ffffde, 27), // 203
    (0x7ffffdf, 27), // 204
    (0x3ffffe5, 26), // 205
    (0xfffff1, 24), // 206
    (0x1ffffed, 25), // 207
    (0x7fff2, 19), // 208
    (0x1fffe3, 21), // 209
    (0x3ffffe6, 26), // 210
    (0x7ffffe0, 27), // 211
    (0x7ffffe1, 27), // 212
    (0x3ffffe7, 26), // 213
    (0x7ffffe2, 27), // 214
    (0xfffff2, 24), // 215
    (0x1fffe4, 21), // 216
    (0x1fffe5, 21), // 217
    (0x3ffffe8, 26), // 218
    (0x3ffffe9, 26), // 219
    (0xffffffd, 28), // 220
    (0x7ffffe3, 27), // 221
    (0x7ffffe4, 27), // 222
    (0x7ffffe5, 27), // 223
    (0xfffec, 20), // 224
    (0xfffff3, 24), // 225
    (0xfffed, 20), // 226
    (0x1fffe6, 21), // 227
    (0x3fffe9, 22), // 228
    (0x1fffe7, 21), // 229
    (0x1fffe8, 21), // 230
    (0x7ffff3, 23), // 231
    (0x3fffea, 22), // 232
    (0x3fffeb, 22), // 233
    (0x1ffffee, 25), // 234
    (0x1ffffef, 25), // 235
    (0xfffff4, 24), // 236
    (0xfffff5, 24), // 237
    (0x3ffffea, 26), // 238
    (0x7ffff4, 23), // 239
    (0x3ffffeb, 26), // 240
    (0x7ffffe6, 27), // 241
    (0x3ffffec, 26), // 242
    (0x3ffffed, 26), // 243
    (0x7ffffe7, 27), // 244
    (0x7ffffe8, 27), // 245
    (0x7ffffe9, 27), // 246
    (0x7ffffea, 27), // 247
    (0x7ffffeb, 27), // 248
    (0xffffffe, 28), // 249
    (0x7ffffec, 27), // 250
    (0x7ffffed, 27), // 251
    (0x7ffffee, 27), // 252
    (0x7ffffef, 27), // 253
    (0x7fffff0, 27), // 254
    (0x3ffffee, 26), // 255
    (0x3fffffff, 30), // 256
];

// -- Encoding --

/// Return the Huffman-encoded length of `data` in bytes, without encoding.
pub fn encoded_len(data: &[u8]) -> usize {
    let mut bits = 0usize;
    for &byte in data {
        bits += CODES[byte as usize].1 as usize;
    }
    bits.div_ceil(8)
}

/// Huffman-encode `data` and append to `out`.
pub fn encode(data: &[u8], out: &mut Vec<u8>) {
    let mut bits: u64 = 0;
    let mut bit_count = 0u8;

    for &byte in data {
        let (code, len) = CODES[byte as usize];
        bits = (bits << len) | u64::from(code);
        bit_count += len;

        while bit_count >= 8 {
            bit_count -= 8;
            out.push((bits >> bit_count) as u8);
        }
    }

    // Pad the last partial byte with the high bits of EOS (all ones).
    if bit_count > 0 {
        bits <<= 8 - bit_count;
        bits |= (1u64 << (8 - bit_count)) - 1;
        out.push(bits as u8);
    }
}

// -- Decoding --

const FLAG_SYM: u8 = 1;
const FLAG_FAIL: u8 = 1 << 1;
const FLAG_EOS: u8 = 1 << 2;
const FLAG_ACCEPTED: u8 = 1 << 3;

/// One nibble step: next state, emitted symbol (when `FLAG_SYM`), flags.
#[derive(Debug, Clone, Copy, Default)]
struct Transition {
    next: u8,
    sym: u8,
    flags: u8,
}

/// Decode a Huffman-encoded byte slice, appending plaintext to `out`.
pub fn decode(data: &[u8], out: &mut Vec<u8>) -> Result<(), HpackError> {
    let table = decode_table();
    let mut state = 0usize;
    let mut accepted = true;

    for &byte in data {
        for nibble in [byte >> 4, byte & 0x0f] {
            let t = table[(state << 4) | nibble as usize];
            if t.flags & FLAG_EOS != 0 {
                return Err(HpackError::HuffmanEosInStream);
            }
            if t.flags & FLAG_FAIL != 0 {
                return Err(HpackError::HuffmanInvalidCode);
            }
            if t.flags & FLAG_SYM != 0 {
                out.push(t.sym);
            }
            state = t.next as usize;
            accepted = t.flags & FLAG_ACCEPTED != 0;
        }
    }

    // Whatever is left in the current state must be an EOS prefix of at
    // most 7 bits.
    if !accepted {
        return Err(HpackError::HuffmanBadPadding);
    }
    Ok(())
}

fn decode_table() -> &'static [Transition] {
    static TABLE: OnceLock<Vec<Transition>> = OnceLock::new();
    TABLE.get_or_init(build_decode_table)
}

/// A trie child: an internal node, a terminal symbol, or nothing.
#[derive(Clone, Copy)]
enum Child {
    Empty,
    Node(u16),
    Sym(u16),
}

struct TrieNode {
    children: [Child; 2],
    /// The path from the root is all 1-bits, i.e. an EOS prefix.
    all_ones: bool,
    depth: u8,
}

/// Build the binary trie of the code table. The code is a full prefix
/// code over 257 symbols, so the trie has exactly 256 internal nodes and
/// every internal node ends up with two children.
fn build_trie() -> Vec<TrieNode> {
    let mut nodes = vec![TrieNode {
        children: [Child::Empty; 2],
        all_ones: true,
        depth: 0,
    }];

    for (sym, &(code, len)) in CODES.iter().enumerate() {
        let mut idx = 0usize;
        for i in (0..len).rev() {
            let bit = ((code >> i) & 1) as usize;
            if i == 0 {
                nodes[idx].children[bit] = Child::Sym(sym as u16);
            } else {
                match nodes[idx].children[bit] {
                    Child::Node(n) => idx = n as usize,
                    Child::Empty => {
                        let n = nodes.len() as u16;
                        let all_ones = nodes[idx].all_ones && bit == 1;
                        let depth = nodes[idx].depth.saturating_add(1);
                        nodes.push(TrieNode {
                            children: [Child::Empty; 2],
                            all_ones,
                            depth,
                        });
                        nodes[idx].children[bit] = Child::Node(n);
                        idx = n as usize;
                    }
                    Child::Sym(_) => unreachable!("prefix code collision"),
                }
            }
        }
    }

    debug_assert_eq!(nodes.len(), 256);
    nodes
}

/// Derive the flat nibble transition table from the trie.
///
/// The minimum code length is 5 bits, so at most one symbol completes per
/// 4-bit step. A transition is accepted when its resting node sits on an
/// all-ones path of at most 7 bits; reaching the EOS leaf is an error in
/// a data stream.
fn build_decode_table() -> Vec<Transition> {
    let trie = build_trie();
    let mut table = vec![Transition::default(); trie.len() * 16];

    for state in 0..trie.len() {
        for nibble in 0..16u8 {
            let mut t = Transition::default();
            let mut idx = state;
            for shift in (0..4).rev() {
                let bit = ((nibble >> shift) & 1) as usize;
                match trie[idx].children[bit] {
                    Child::Node(n) => idx = n as usize,
                    Child::Sym(EOS) => {
                        t.flags |= FLAG_EOS | FLAG_FAIL;
                        break;
                    }
                    Child::Sym(sym) => {
                        t.sym = sym as u8;
                        t.flags |= FLAG_SYM;
                        idx = 0;
                    }
                    Child::Empty => {
                        t.flags |= FLAG_FAIL;
                        break;
                    }
                }
            }
            if t.flags & FLAG_FAIL == 0 {
                t.next = idx as u8;
                if trie[idx].all_ones && trie[idx].depth <= 7 {
                    t.flags |= FLAG_ACCEPTED;
                }
            }
            table[(state << 4) | nibble as usize] = t;
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_vec(data: &[u8]) -> Result<Vec<u8>, HpackError> {
        let mut out = Vec::new();
        decode(data, &mut out)?;
        Ok(out)
    }

    #[test]
    fn roundtrip_simple_strings() {
        let test_cases: &[&[u8]] = &[
            b"",
            b"a",
            b"hello",
            b"www.example.com",
            b"Mon, 21 Oct 2013 20:13:21 GMT",
            b"text/html; charset=utf-8",
        ];

        for &input in test_cases {
            let mut encoded = Vec::new();
            encode(input, &mut encoded);
            let decoded = decode_vec(&encoded).unwrap();
            assert_eq!(
                input,
                decoded.as_slice(),
                "roundtrip failed for {:?}",
                std::str::from_utf8(input)
            );
        }
    }

    #[test]
    fn rfc7541_appendix_c4_request_strings() {
        let mut encoded = Vec::new();
        encode(b"www.example.com", &mut encoded);
        assert_eq!(
            encoded,
            [0xf1, 0xe3, 0xc2, 0xe5, 0xf2, 0x3a, 0x6b, 0xa0, 0xab, 0x90, 0xf4, 0xff]
        );

        let mut encoded = Vec::new();
        encode(b"no-cache", &mut encoded);
        assert_eq!(encoded, [0xa8, 0xeb, 0x10, 0x64, 0x9c, 0xbf]);
    }

    #[test]
    fn encoded_len_matches() {
        for input in [
            b"Mon, 21 Oct 2013 20:13:21 GMT".as_slice(),
            b"www.example.com",
            b"",
            b"\x00\x01\xfe\xff",
        ] {
            let mut encoded = Vec::new();
            encode(input, &mut encoded);
            assert_eq!(encoded_len(input), encoded.len());
        }
    }

    #[test]
    fn all_bytes_roundtrip() {
        let input: Vec<u8> = (0..=255).collect();
        let mut encoded = Vec::new();
        encode(&input, &mut encoded);
        let decoded = decode_vec(&encoded).unwrap();
        assert_eq!(input, decoded);
    }

    #[test]
    fn empty_input_is_valid() {
        assert_eq!(decode_vec(&[]).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn zero_padding_rejected() {
        // 'a' is 00011; 0x18 pads it with 000 instead of the EOS prefix.
        assert_eq!(decode_vec(&[0x18]), Err(HpackError::HuffmanBadPadding));
        // 'a' padded correctly decodes.
        assert_eq!(decode_vec(&[0x1f]).unwrap(), b"a");
    }

    #[test]
    fn overlong_padding_rejected() {
        // A full byte of ones is 8 bits of padding, one too many.
        assert_eq!(decode_vec(&[0xff]), Err(HpackError::HuffmanBadPadding));
        // 'a' followed by 11 one-bits.
        assert_eq!(
            decode_vec(&[0x1f, 0xff]),
            Err(HpackError::HuffmanBadPadding)
        );
    }

    #[test]
    fn eos_in_stream_rejected() {
        // 30 one-bits spell EOS.
        assert_eq!(
            decode_vec(&[0xff, 0xff, 0xff, 0xfc]),
            Err(HpackError::HuffmanEosInStream)
        );
    }

    #[test]
    fn table_has_full_coverage() {
        // Every state reachable, every transition defined: the trie is a
        // full binary tree, so no nibble from any state may fail except
        // through EOS.
        let table = decode_table();
        assert_eq!(table.len(), 256 * 16);
        for t in table {
            if t.flags & FLAG_FAIL != 0 {
                assert_ne!(t.flags & FLAG_EOS, 0);
            }
        }
    }
}
