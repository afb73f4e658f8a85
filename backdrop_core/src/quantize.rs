//! Median-cut color quantization.
//!
//! Splits the foreground pixel bag into up to K representative clusters.
//! Deterministic: identical input sequences always produce identical output.
//! The bucket iteration order, the R > G > B channel tie-break, and stable
//! sorting together pin down every split.

use crate::features::DominantColor;

/// Quantize a bag of RGB triples into at most `k` dominant colors.
///
/// `total_foreground` is the divisor for coverage weights, so weights stay
/// meaningful when `pixels` is a subset of the full foreground. The result is
/// sorted by weight descending.
///
/// `k` should be a power of two (the default is 8); other values are accepted
/// but splitting may stop early.
pub fn quantize(pixels: &[[u8; 3]], k: usize, total_foreground: usize) -> Vec<DominantColor> {
    if pixels.is_empty() || total_foreground == 0 {
        return Vec::new();
    }

    let mut buckets: Vec<Vec<[u8; 3]>> = vec![pixels.to_vec()];

    while buckets.len() < k {
        let mut next: Vec<Vec<[u8; 3]>> = Vec::with_capacity(buckets.len() * 2);
        let round_size = buckets.len();
        for (i, bucket) in buckets.into_iter().enumerate() {
            // Stop splitting once the buckets already produced plus the ones
            // still pending this round reach the target count.
            if bucket.len() <= 1 || next.len() + (round_size - i) >= k {
                next.push(bucket);
            } else {
                split_bucket(bucket, &mut next);
            }
        }
        if next.len() == round_size {
            buckets = next;
            break;
        }
        buckets = next;
    }

    let mut result: Vec<DominantColor> = buckets
        .iter()
        .filter(|b| !b.is_empty())
        .map(|bucket| {
            let n = bucket.len();
            let mut sums = [0u64; 3];
            for px in bucket {
                sums[0] += px[0] as u64;
                sums[1] += px[1] as u64;
                sums[2] += px[2] as u64;
            }
            let mean = |s: u64| ((s as f64 / n as f64).round().clamp(0.0, 255.0)) as u8;
            DominantColor::new(
                mean(sums[0]),
                mean(sums[1]),
                mean(sums[2]),
                n as f64 / total_foreground as f64,
            )
        })
        .collect();

    // Weight-descending; sort_by is stable so equal weights keep cut order
    result.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap());
    result
}

fn split_bucket(mut bucket: Vec<[u8; 3]>, output: &mut Vec<Vec<[u8; 3]>>) {
    let mut min = [255u8; 3];
    let mut max = [0u8; 3];
    for px in &bucket {
        for c in 0..3 {
            min[c] = min[c].min(px[c]);
            max[c] = max[c].max(px[c]);
        }
    }
    let range = [max[0] - min[0], max[1] - min[1], max[2] - min[2]];

    // Uniform bucket: terminal, nothing to split
    if range == [0, 0, 0] {
        output.push(bucket);
        return;
    }

    // Widest channel wins, tie-break R > G > B
    let channel = if range[0] >= range[1] && range[0] >= range[2] {
        0
    } else if range[1] >= range[2] {
        1
    } else {
        2
    };

    bucket.sort_by_key(|px| px[channel]);
    let mid = bucket.len() / 2;
    let upper = bucket.split_off(mid);
    output.push(bucket);
    output.push(upper);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_list() {
        assert!(quantize(&[], 8, 0).is_empty());
    }

    #[test]
    fn solid_color_yields_single_full_weight_cluster() {
        let pixels = vec![[200u8, 10, 40]; 500];
        let result = quantize(&pixels, 8, 500);
        assert_eq!(result.len(), 1);
        assert_eq!((result[0].r, result[0].g, result[0].b), (200, 10, 40));
        assert!((result[0].weight - 1.0).abs() < 1e-12);
    }

    #[test]
    fn two_color_split_yields_two_half_weight_clusters() {
        let mut pixels = vec![[255u8, 255, 255]; 300];
        pixels.extend(vec![[0u8, 0, 0]; 300]);
        let result = quantize(&pixels, 8, 600);
        assert_eq!(result.len(), 2);
        for dc in &result {
            assert!((dc.weight - 0.5).abs() < 1e-12);
        }
        let rgbs: Vec<_> = result.iter().map(|d| (d.r, d.g, d.b)).collect();
        assert!(rgbs.contains(&(255, 255, 255)));
        assert!(rgbs.contains(&(0, 0, 0)));
    }

    #[test]
    fn weights_sum_to_one_and_sorted_descending() {
        let mut pixels = Vec::new();
        for i in 0..512u32 {
            pixels.push([(i % 256) as u8, (i / 2 % 256) as u8, (255 - i % 256) as u8]);
        }
        let n = pixels.len();
        let result = quantize(&pixels, 8, n);
        assert!(result.len() <= 8);
        let total: f64 = result.iter().map(|d| d.weight).sum();
        assert!((total - 1.0).abs() < 1e-9, "weights sum to {}", total);
        for pair in result.windows(2) {
            assert!(pair[0].weight >= pair[1].weight);
        }
    }

    #[test]
    fn deterministic_for_identical_input() {
        let pixels: Vec<[u8; 3]> = (0..1000u32)
            .map(|i| [(i * 7 % 256) as u8, (i * 13 % 256) as u8, (i * 31 % 256) as u8])
            .collect();
        let a = quantize(&pixels, 8, pixels.len());
        let b = quantize(&pixels, 8, pixels.len());
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!((x.r, x.g, x.b), (y.r, y.g, y.b));
            assert_eq!(x.weight.to_bits(), y.weight.to_bits());
        }
    }

    #[test]
    fn widest_channel_tie_breaks_toward_red() {
        // Red and green ranges equal; the first split must slice on red
        let pixels = vec![[0u8, 0, 0], [100, 100, 0], [0, 100, 0], [100, 0, 0]];
        let result = quantize(&pixels, 2, 4);
        assert_eq!(result.len(), 2);
        // Red-channel split: {0,0},{0,100} vs {100,100},{100,0}
        let rgbs: Vec<_> = result.iter().map(|d| (d.r, d.g, d.b)).collect();
        assert!(rgbs.contains(&(0, 50, 0)));
        assert!(rgbs.contains(&(100, 50, 0)));
    }

    #[test]
    fn non_power_of_two_k_is_accepted() {
        let pixels: Vec<[u8; 3]> = (0..64u32).map(|i| [i as u8 * 4, 0, 0]).collect();
        let result = quantize(&pixels, 5, 64);
        assert!(!result.is_empty());
        assert!(result.len() <= 5, "got {} buckets", result.len());
    }
}
