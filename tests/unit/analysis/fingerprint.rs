//! Tests for fingerprint construction and image reduction

#[cfg(test)]
mod tests {
    use greedymosaic::MosaicError;
    use greedymosaic::analysis::fingerprint::{Fingerprint, FingerprintReducer};
    use image::{DynamicImage, Rgb, RgbImage};

    // Tests sample count must match the square of the edge
    // Verified by removing the length check
    #[test]
    fn test_new_validates_length() {
        assert!(Fingerprint::new(2, vec![[0, 0, 0]; 4]).is_ok());
        assert!(Fingerprint::new(2, vec![[0, 0, 0]; 3]).is_err());
        assert!(Fingerprint::new(0, Vec::new()).is_err());
    }

    // Tests uniform fingerprints fill every sample
    // Verified by allocating edge samples instead of edge squared
    #[test]
    fn test_uniform() {
        let fingerprint = Fingerprint::uniform(3, [1, 2, 3]);
        assert_eq!(fingerprint.edge(), 3);
        assert_eq!(fingerprint.len(), 9);
        assert!(!fingerprint.is_empty());
        assert!(fingerprint.pixels().iter().all(|p| *p == [1, 2, 3]));
    }

    // Tests rasters must be square
    // Verified by accepting any raster
    #[test]
    fn test_from_rgb_image_requires_square() {
        let square = RgbImage::from_pixel(2, 2, Rgb([5, 5, 5]));
        let wide = RgbImage::from_pixel(3, 2, Rgb([5, 5, 5]));

        assert_eq!(
            Fingerprint::from_rgb_image(&square).expect("square"),
            Fingerprint::uniform(2, [5, 5, 5])
        );
        assert!(Fingerprint::from_rgb_image(&wide).is_err());
    }

    // Tests the small edge is the tile size divided by the block size
    // Verified by rounding the division up
    #[test]
    fn test_small_edge_for() {
        assert_eq!(FingerprintReducer::small_edge_for(50, 8), 6);
        assert_eq!(FingerprintReducer::small_edge_for(48, 8), 6);
        assert_eq!(FingerprintReducer::small_edge_for(50, 1), 50);
        assert_eq!(FingerprintReducer::small_edge_for(50, 0), 50);
        assert_eq!(FingerprintReducer::small_edge_for(50, 500), 1);
    }

    // Tests zero tile sizes are rejected
    // Verified by removing the zero check
    #[test]
    fn test_reducer_rejects_zero_tile() {
        assert!(matches!(
            FingerprintReducer::new(0, 8),
            Err(MosaicError::InvalidParameter { .. })
        ));
        let reducer = FingerprintReducer::new(50, 8).expect("valid reducer");
        assert_eq!((reducer.tile_size(), reducer.small_edge()), (50, 6));
    }

    // Tests reduction yields square fingerprints of the configured edges
    // Verified by resizing without cropping
    #[test]
    fn test_reduce_edges() {
        let reducer = FingerprintReducer::new(8, 4).expect("valid reducer");
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(30, 12, Rgb([40, 120, 220])));

        let fingerprints = reducer.reduce("wide.png", &img).expect("reduced");
        assert_eq!(fingerprints.large.edge(), 8);
        assert_eq!(fingerprints.small.edge(), 2);
        assert!(fingerprints.large.pixels().iter().all(|p| *p == [40, 120, 220]));
        assert!(fingerprints.small.pixels().iter().all(|p| *p == [40, 120, 220]));
    }

    // Tests the crop is centred so the margins of a wide image are dropped
    // Verified by cropping from the left edge
    #[test]
    fn test_reduce_crops_centre() {
        let mut img = RgbImage::from_pixel(12, 4, Rgb([255, 0, 0]));
        for y in 0..4 {
            for x in 4..8 {
                img.put_pixel(x, y, Rgb([0, 0, 255]));
            }
        }

        let reducer = FingerprintReducer::new(4, 1).expect("valid reducer");
        let fingerprints = reducer
            .reduce("banded.png", &DynamicImage::ImageRgb8(img))
            .expect("reduced");

        assert!(fingerprints.large.pixels().iter().all(|p| *p == [0, 0, 255]));
    }

    // Tests degenerate images are reported as unusable
    // Verified by cropping a zero-sized square
    #[test]
    fn test_reduce_degenerate_image() {
        let reducer = FingerprintReducer::new(8, 4).expect("valid reducer");
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 10));

        match reducer.reduce("empty.png", &empty) {
            Err(MosaicError::UnusableImage { identifier, .. }) => {
                assert_eq!(identifier, "empty.png");
            }
            other => panic!("expected UnusableImage, got {other:?}"),
        }
    }
}
