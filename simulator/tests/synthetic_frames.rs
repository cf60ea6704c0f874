//! Synthetic frames measured with aperture photometry.

use std::f64::consts::PI;

use approx::assert_relative_eq;
use photometry::{find_local_maxima, ApertureConfig, Coordinate, DetectionConfig, Star};
use simulator::{index_frame_center, PointSource, Psf, SyntheticCcd};
use tempfile::tempdir;

#[test]
fn test_total_counts_converge_to_analytic_flux() {
    let psf = Psf::gaussian(2.0, 1.5).unwrap();
    let expected = psf.total_flux().unwrap();
    assert_relative_eq!(expected, 2.0 * PI * 2.0 * 1.5 * 1.5);

    let center = Coordinate::new(30.3, 29.8);
    let mut previous_error = f64::INFINITY;
    for radius in [2.0, 4.0, 8.0, 25.0] {
        let mut ccd = SyntheticCcd::new(61, 61).unwrap();
        ccd.add_point_source(psf.clone(), center, radius).unwrap();
        let error = (ccd.total_counts() - expected).abs();
        assert!(error < previous_error, "radius {radius}: {error} >= {previous_error}");
        previous_error = error;
    }
    assert!(previous_error / expected < 1e-6, "residual {previous_error}");
}

#[test]
fn test_moffat_total_counts() {
    let psf = Psf::moffat(1.0, 1.5, 3.0).unwrap();
    let expected = psf.total_flux().unwrap();

    let mut ccd = SyntheticCcd::new(128, 128).unwrap();
    ccd.add_point_source(psf, Coordinate::new(64.0, 64.0), 60.0)
        .unwrap();
    assert_relative_eq!(ccd.total_counts(), expected, max_relative = 1e-4);
}

#[test]
fn test_source_order_does_not_matter() {
    let sources = vec![
        PointSource::new(Psf::gaussian(5.0, 1.1).unwrap(), Coordinate::new(12.2, 14.7)),
        PointSource::new(Psf::gaussian(3.0, 2.0).unwrap(), Coordinate::new(15.0, 13.5)),
        PointSource::new(Psf::moffat(4.0, 1.2, 2.8).unwrap(), Coordinate::new(13.9, 16.1))
            .with_radius(10.0),
    ];
    let mut reversed = sources.clone();
    reversed.reverse();

    let mut a = SyntheticCcd::new(28, 28).unwrap();
    a.add_point_sources(sources).unwrap();
    let mut b = SyntheticCcd::new(28, 28).unwrap();
    for source in reversed {
        b.add_point_sources(vec![source]).unwrap();
    }

    for (va, vb) in a.grid().values().iter().zip(b.grid().values().iter()) {
        assert_relative_eq!(*va, *vb, max_relative = 1e-12);
    }
    assert_eq!(a.sources().len(), 3);
}

#[test]
fn test_measure_rendered_source() {
    let psf = Psf::gaussian(500.0, 1.3).unwrap();
    let truth = psf.total_flux().unwrap();
    let position = Coordinate::new(40.5, 38.5);

    let mut ccd = SyntheticCcd::new(80, 80).unwrap();
    ccd.add_point_source(psf, position, 25.0).unwrap();
    ccd.add_gaussian_noise(200.0, 4.0, 17).unwrap();

    let grid = ccd.grid();
    let maxima = find_local_maxima(grid, DetectionConfig::default());
    assert_eq!(maxima.len(), 1);
    assert_eq!((maxima[0].x, maxima[0].y), (40, 38));

    let star = Star::new(grid, index_frame_center(position), ApertureConfig::new(6.0, 10.0, 15.0))
        .unwrap();
    assert_relative_eq!(star.flux().unwrap(), truth, max_relative = 0.04);
    assert_relative_eq!(star.annulus().median().unwrap(), 200.0, epsilon = 1.0);
}

#[test]
fn test_calibration_across_rendered_sources() {
    let mut ccd = SyntheticCcd::new(96, 64).unwrap();
    let bright = Psf::gaussian(800.0, 1.2).unwrap();
    let faint = Psf::gaussian(80.0, 1.2).unwrap();
    ccd.add_point_sources(vec![
        PointSource::new(bright, Coordinate::new(24.5, 32.5)),
        PointSource::new(faint, Coordinate::new(70.5, 30.5)),
    ])
    .unwrap();

    let grid = ccd.grid();
    let config = ApertureConfig::default();
    let mut reference = Star::new(grid, Coordinate::new(24.0, 32.0), config).unwrap();
    reference.set_magnitude(8.0);
    let k = reference.zero_point().unwrap();

    let mut target = Star::new(grid, Coordinate::new(70.0, 30.0), config).unwrap();
    target.set_zero_point(k);
    // Ten times fainter is 2.5 magnitudes
    assert_relative_eq!(target.magnitude().unwrap(), 10.5, epsilon = 1e-3);
}

#[test]
fn test_aperture_config_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("apertures.json");
    ApertureConfig::new(5.0, 9.0, 13.0).save_to_file(&path).unwrap();
    let config = ApertureConfig::load_from_file(&path).unwrap();

    let mut ccd = SyntheticCcd::new(48, 48).unwrap();
    ccd.add_point_source(Psf::gaussian(100.0, 1.0).unwrap(), Coordinate::new(24.5, 24.5), 20.0)
        .unwrap();
    let star = Star::new(ccd.grid(), Coordinate::new(24.0, 24.0), config).unwrap();
    assert_relative_eq!(star.flux().unwrap(), 200.0 * PI, max_relative = 1e-3);
}
