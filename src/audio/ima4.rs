/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Decoder for the Apple IMA4 ADPCM format (FourCC: `ima4`)
//!
//! Resources on IMA ADPCM in general:
//! - MultimediaWiki's [IMA ADPCM](https://wiki.multimedia.cx/index.php?title=IMA_ADPCM) page
//! - The IMA's _Recommended Practices for Enhancing Digital Audio Compatibility
//!   in Multimedia Systems_, which includes a reference decoding algorithm in C.
//!
//! Resources on Apple IMA4:
//! - Apple's [Technical Note TN1081: Understanding the Differences Between Apple and Windows IMA-ADPCM Compressed Sound Files](https://developer.apple.com/library/archive/technotes/tn/tn1081.html)
//!
//! Variable names follow the IMA reference algorithm.

const INDEX_TABLE: [i8; 16] = [-1, -1, -1, -1, 2, 4, 6, 8, -1, -1, -1, -1, 2, 4, 6, 8];

const STEP_SIZE_TABLE: [u16; 89] = [
    7, 8, 9, 10, 11, 12, 13, 14, 16, 17, 19, 21, 23, 25, 28, 31, 34, 37, 41, 45, 50, 55, 60, 66,
    73, 80, 88, 97, 107, 118, 130, 143, 157, 173, 190, 209, 230, 253, 279, 307, 337, 371, 408, 449,
    494, 544, 598, 658, 724, 796, 876, 963, 1060, 1166, 1282, 1411, 1552, 1707, 1878, 2066, 2272,
    2499, 2749, 3024, 3327, 3660, 4026, 4428, 4871, 5358, 5894, 6484, 7132, 7845, 8630, 9493,
    10442, 11487, 12635, 13899, 15289, 16818, 18500, 20350, 22385, 24623, 27086, 29794, 32767,
];

/// Decode one 34-byte IMA4 block of a single channel to 64 signed 16-bit
/// samples.
///
/// A multi-channel packet is one block per channel, in channel order.
pub fn decode_ima4(block: &[u8; 34]) -> [i16; 64] {
    let mut samples = [0i16; 64];

    // The header holds the top 9 bits of the initial predictor and a 7-bit
    // step index.
    let header = u16::from_be_bytes([block[0], block[1]]);
    let mut index = usize::from(header & 0x7f).min(STEP_SIZE_TABLE.len() - 1);
    let mut predicted_sample = (header & 0xff80) as i16;
    let mut step_size = STEP_SIZE_TABLE[index];

    // Low nibble first.
    let nibbles = block[2..]
        .iter()
        .flat_map(|&byte| [byte & 0xf, byte >> 4]);
    for (sample, nibble) in samples.iter_mut().zip(nibbles) {
        let mut difference = step_size >> 3;
        if nibble & 4 != 0 {
            difference += step_size;
        }
        if nibble & 2 != 0 {
            difference += step_size >> 1;
        }
        if nibble & 1 != 0 {
            difference += step_size >> 2;
        }
        predicted_sample = if nibble & 8 != 0 {
            predicted_sample.saturating_sub_unsigned(difference)
        } else {
            predicted_sample.saturating_add_unsigned(difference)
        };
        *sample = predicted_sample;

        index = index
            .saturating_add_signed(INDEX_TABLE[usize::from(nibble)].into())
            .min(STEP_SIZE_TABLE.len() - 1);
        step_size = STEP_SIZE_TABLE[index];
    }

    samples
}
