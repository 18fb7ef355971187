// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corner flood-fill: whitens scanner shadows and borders that touch the page
// corners. Each fill grows a 4-connected region from a seed pixel, taking in
// every pixel whose value is within `tolerance` of the seed value.

use std::collections::VecDeque;

use image::{GrayImage, Luma};
use tracing::{debug, instrument, warn};

/// Distance of the corner seeds from the image edges, in pixels.
pub const CORNER_INSET: u32 = 5;

const WHITE: u8 = 0xff;

/// Flood-fill from `seed`, setting the region to white.
///
/// Returns the image and the number of pixels that were filled. A seed that
/// is already white (or outside the image) leaves the image untouched.
pub fn flood_fill(mut image: GrayImage, seed: (u32, u32), tolerance: u8) -> (GrayImage, usize) {
    let (width, height) = image.dimensions();
    let (sx, sy) = seed;
    if sx >= width || sy >= height {
        warn!(sx, sy, width, height, "Flood-fill seed outside image; skipped");
        return (image, 0);
    }

    let seed_value = image.get_pixel(sx, sy).0[0];
    if seed_value == WHITE {
        return (image, 0);
    }

    let within = |value: u8| value.abs_diff(seed_value) <= tolerance;
    let index = |x: u32, y: u32| y as usize * width as usize + x as usize;

    let mut visited = vec![false; width as usize * height as usize];
    let mut queue = VecDeque::new();
    visited[index(sx, sy)] = true;
    queue.push_back((sx, sy));

    let mut filled = 0usize;
    while let Some((x, y)) = queue.pop_front() {
        image.put_pixel(x, y, Luma([WHITE]));
        filled += 1;

        let neighbours = [
            x.checked_sub(1).map(|nx| (nx, y)),
            (x + 1 < width).then_some((x + 1, y)),
            y.checked_sub(1).map(|ny| (x, ny)),
            (y + 1 < height).then_some((x, y + 1)),
        ];
        for (nx, ny) in neighbours.into_iter().flatten() {
            let slot = index(nx, ny);
            if !visited[slot] && within(image.get_pixel(nx, ny).0[0]) {
                visited[slot] = true;
                queue.push_back((nx, ny));
            }
        }
    }

    (image, filled)
}

/// The four seeds inset [`CORNER_INSET`] pixels from each edge, in the order
/// top-left, top-right, bottom-left, bottom-right.
///
/// Seeds that would fall outside a very small image are omitted.
pub fn corner_seeds(width: u32, height: u32) -> Vec<(u32, u32)> {
    let (Some(right), Some(bottom)) = (
        width.checked_sub(CORNER_INSET),
        height.checked_sub(CORNER_INSET),
    ) else {
        return Vec::new();
    };
    [
        (CORNER_INSET, CORNER_INSET),
        (right, CORNER_INSET),
        (CORNER_INSET, bottom),
        (right, bottom),
    ]
    .into_iter()
    .filter(|&(x, y)| x < width && y < height)
    .collect()
}

/// Run [`flood_fill`] from each of the four corner seeds in turn.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn fill_corners(image: GrayImage, tolerance: u8) -> GrayImage {
    let seeds = corner_seeds(image.width(), image.height());
    if seeds.len() < 4 {
        warn!(seeds = seeds.len(), "Image too small for all corner seeds");
    }

    seeds.into_iter().fold(image, |image, seed| {
        let (image, filled) = flood_fill(image, seed, tolerance);
        debug!(?seed, filled, "Corner filled");
        image
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_seed_leaves_image_identical() {
        let mut image = GrayImage::from_pixel(20, 20, Luma([WHITE]));
        image.put_pixel(10, 10, Luma([0]));
        let (out, filled) = flood_fill(image.clone(), (5, 5), 255);
        assert_eq!(filled, 0);
        assert_eq!(out, image);
    }

    #[test]
    fn fills_exactly_the_connected_region_within_tolerance() {
        // Grey frame (120..=130) around a black interior, with one grey pixel
        // inside the interior that is not connected to the frame.
        let mut image = GrayImage::from_fn(12, 12, |x, y| {
            if x < 3 || y < 3 || x > 8 || y > 8 {
                Luma([120 + ((x + y) % 11) as u8])
            } else {
                Luma([0])
            }
        });
        image.put_pixel(6, 6, Luma([125]));
        let seed_value = image.get_pixel(0, 0).0[0];

        let (out, filled) = flood_fill(image.clone(), (0, 0), 10);

        let mut expected = 0;
        for (x, y, pixel) in image.enumerate_pixels() {
            let frame = x < 3 || y < 3 || x > 8 || y > 8;
            if frame && pixel.0[0].abs_diff(seed_value) <= 10 {
                expected += 1;
                assert_eq!(out.get_pixel(x, y).0[0], WHITE, "frame pixel ({x},{y})");
            } else if !frame {
                assert_eq!(out.get_pixel(x, y), pixel, "interior pixel ({x},{y})");
            }
        }
        assert_eq!(filled, expected);
        assert_eq!(out.get_pixel(6, 6).0[0], 125);
    }

    #[test]
    fn zero_tolerance_stops_at_any_difference() {
        let image = GrayImage::from_fn(10, 1, |x, _| Luma([if x < 4 { 50 } else { 51 }]));
        let (out, filled) = flood_fill(image, (0, 0), 0);
        assert_eq!(filled, 4);
        assert_eq!(out.get_pixel(3, 0).0[0], WHITE);
        assert_eq!(out.get_pixel(4, 0).0[0], 51);
    }

    #[test]
    fn region_is_four_connected() {
        // Diagonal neighbours only: must not leak through the corner.
        let mut image = GrayImage::from_pixel(3, 3, Luma([0]));
        image.put_pixel(0, 0, Luma([100]));
        image.put_pixel(1, 1, Luma([100]));
        let (out, filled) = flood_fill(image, (0, 0), 5);
        assert_eq!(filled, 1);
        assert_eq!(out.get_pixel(1, 1).0[0], 100);
    }

    #[test]
    fn seeds_are_inset_from_each_edge() {
        assert_eq!(
            corner_seeds(100, 50),
            vec![(5, 5), (95, 5), (5, 45), (95, 45)]
        );
        assert!(corner_seeds(4, 40).is_empty());
    }

    #[test]
    fn fill_corners_whitens_dark_border_only() {
        let image = GrayImage::from_fn(40, 40, |x, y| {
            let border = x < 8 || y < 8 || x >= 32 || y >= 32;
            let text = (15..25).contains(&x) && (18..20).contains(&y);
            Luma([if border { 30 } else if text { 0 } else { WHITE }])
        });
        let out = fill_corners(image, 40);
        assert_eq!(out.get_pixel(0, 0).0[0], WHITE);
        assert_eq!(out.get_pixel(39, 39).0[0], WHITE);
        assert_eq!(out.get_pixel(20, 19).0[0], 0);
    }
}
