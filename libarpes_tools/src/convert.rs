//! Conversions between detector coordinates and physical quantities.
//!
//! Every conversion comes as a scalar kernel working on a single `f64`, and as an
//! `_array` form which maps the kernel over an ndarray of any dimension. The array forms
//! are what should be used on whole detector slices.
//!
//! Nothing here validates physical domains. A negative kinetic energy gives NaN and a
//! zero time-of-flight gives an infinite energy, exactly as IEEE arithmetic dictates, so
//! that one bad element never aborts the conversion of a whole slice. The only error
//! returned is a shape error when two arrays cannot be combined.
use ndarray::{
    Array, Array1, Array2, ArrayBase, ArrayD, ArrayViewD, Data, Dimension, Ix1, IxDyn, Zip,
};
use std::f64::consts::PI;

use super::constants::{
    ELECTRON_MASS, ELEMENTARY_CHARGE, HBAR, INVERSE_METRE_TO_INVERSE_ANGSTROM, NANOSECOND,
    THEMIS_FLIGHT_DISTANCE,
};
use super::error::ConvertError;

/// Parallel momentum k (1/Å) of an electron emitted at `angle` (degrees from the detector
/// normal) with kinetic energy `kinetic_energy` (eV).
pub fn angle_to_k(angle: f64, kinetic_energy: f64) -> f64 {
    (2.0 * ELECTRON_MASS * kinetic_energy * ELEMENTARY_CHARGE).sqrt()
        * ((angle * PI / 180.0).sin() / HBAR * INVERSE_METRE_TO_INVERSE_ANGSTROM)
}

/// Convert cartesian (x, y) to polar (theta in degrees, rho).
///
/// The origin maps to theta = 0.
pub fn cartesian_to_polar(x: f64, y: f64) -> (f64, f64) {
    (y.atan2(x) * 180.0 / PI, x.hypot(y))
}

/// Convert polar (theta in degrees, rho) to cartesian (x, y)
pub fn polar_to_cartesian(theta: f64, rho: f64) -> (f64, f64) {
    let radians = theta / 180.0 * PI;
    (rho * radians.cos(), rho * radians.sin())
}

/// Time-of-flight (ns) of Fermi level electrons through the Themis in DriftMode, given the
/// photon energy and the sample workfunction (both eV).
pub fn photon_energy_to_fermi_tof(photon_energy: f64, workfunction: f64) -> f64 {
    kinetic_energy_to_time_of_flight(photon_energy - workfunction)
}

/// Kinetic energy (eV) of an electron with the given time-of-flight (ns) through the Themis
pub fn time_of_flight_to_kinetic_energy(time_of_flight: f64) -> f64 {
    let velocity = THEMIS_FLIGHT_DISTANCE / time_of_flight / NANOSECOND;
    0.5 * ELECTRON_MASS * velocity.powi(2) / ELEMENTARY_CHARGE
}

/// Time-of-flight (ns) through the Themis of an electron with the given kinetic energy (eV)
pub fn kinetic_energy_to_time_of_flight(kinetic_energy: f64) -> f64 {
    let velocity = (2.0 * kinetic_energy * ELEMENTARY_CHARGE / ELECTRON_MASS).sqrt();
    THEMIS_FLIGHT_DISTANCE / velocity / NANOSECOND
}

/// Shape two arrays broadcast to, numpy style (trailing axes aligned, length 1 stretches)
fn co_broadcast_shape(a: &[usize], b: &[usize]) -> Option<Vec<usize>> {
    let ndim = a.len().max(b.len());
    let mut shape = Vec::with_capacity(ndim);
    for axis in 0..ndim {
        let len_a = if axis < ndim - a.len() { 1 } else { a[axis + a.len() - ndim] };
        let len_b = if axis < ndim - b.len() { 1 } else { b[axis + b.len() - ndim] };
        if len_a == len_b || len_b == 1 {
            shape.push(len_a);
        } else if len_a == 1 {
            shape.push(len_b);
        } else {
            return None;
        }
    }
    Some(shape)
}

/// Broadcast two arrays to their common shape as dynamic views
fn broadcast_pair<'a, S1, S2, D1, D2>(
    a: &'a ArrayBase<S1, D1>,
    b: &'a ArrayBase<S2, D2>,
) -> Result<(ArrayViewD<'a, f64>, ArrayViewD<'a, f64>), ConvertError>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D1: Dimension,
    D2: Dimension,
{
    let mismatch = || ConvertError::ShapeMismatch(a.shape().to_vec(), b.shape().to_vec());
    let shape = IxDyn(&co_broadcast_shape(a.shape(), b.shape()).ok_or_else(mismatch)?);
    let a_view = a.broadcast(shape.clone()).ok_or_else(mismatch)?;
    let b_view = b.broadcast(shape).ok_or_else(mismatch)?;
    Ok((a_view, b_view))
}

/// Elementwise [`angle_to_k`] over two co-broadcast arrays
pub fn angle_to_k_array<S1, S2, D1, D2>(
    angle: &ArrayBase<S1, D1>,
    kinetic_energy: &ArrayBase<S2, D2>,
) -> Result<ArrayD<f64>, ConvertError>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D1: Dimension,
    D2: Dimension,
{
    let (angle, kinetic_energy) = broadcast_pair(angle, kinetic_energy)?;
    Ok(Zip::from(&angle)
        .and(&kinetic_energy)
        .map_collect(|&a, &e| angle_to_k(a, e)))
}

/// [`angle_to_k`] over an array of angles at a single kinetic energy
pub fn angle_to_k_fixed_energy<S, D>(angle: &ArrayBase<S, D>, kinetic_energy: f64) -> Array<f64, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    angle.mapv(|a| angle_to_k(a, kinetic_energy))
}

/// Elementwise [`cartesian_to_polar`] over two co-broadcast arrays. Returns (theta, rho).
pub fn cartesian_to_polar_array<S1, S2, D1, D2>(
    x: &ArrayBase<S1, D1>,
    y: &ArrayBase<S2, D2>,
) -> Result<(ArrayD<f64>, ArrayD<f64>), ConvertError>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D1: Dimension,
    D2: Dimension,
{
    let (x, y) = broadcast_pair(x, y)?;
    let mut theta = ArrayD::<f64>::zeros(x.raw_dim());
    let mut rho = ArrayD::<f64>::zeros(x.raw_dim());
    Zip::from(&mut theta)
        .and(&mut rho)
        .and(&x)
        .and(&y)
        .for_each(|t, r, &x, &y| (*t, *r) = cartesian_to_polar(x, y));
    Ok((theta, rho))
}

/// Elementwise [`polar_to_cartesian`] over two co-broadcast arrays. Returns (x, y).
pub fn polar_to_cartesian_array<S1, S2, D1, D2>(
    theta: &ArrayBase<S1, D1>,
    rho: &ArrayBase<S2, D2>,
) -> Result<(ArrayD<f64>, ArrayD<f64>), ConvertError>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D1: Dimension,
    D2: Dimension,
{
    let (theta, rho) = broadcast_pair(theta, rho)?;
    let mut x = ArrayD::<f64>::zeros(theta.raw_dim());
    let mut y = ArrayD::<f64>::zeros(theta.raw_dim());
    Zip::from(&mut x)
        .and(&mut y)
        .and(&theta)
        .and(&rho)
        .for_each(|x, y, &t, &r| (*x, *y) = polar_to_cartesian(t, r));
    Ok((x, y))
}

/// Convert an angle-angle meshgrid (degrees) into a k-k meshgrid (1/Å) at one kinetic energy.
///
/// Each point is taken to polar coordinates, its radial angle converted to k, and the
/// result taken back to cartesian coordinates. Useful for constant energy slices of 2D
/// systems; with a kz dispersion the slice is not at constant kz.
pub fn angle_grid_to_k_grid<S1, S2, D>(
    x_angle: &ArrayBase<S1, D>,
    y_angle: &ArrayBase<S2, D>,
    kinetic_energy: f64,
) -> Result<(Array<f64, D>, Array<f64, D>), ConvertError>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension,
{
    if x_angle.shape() != y_angle.shape() {
        return Err(ConvertError::ShapeMismatch(
            x_angle.shape().to_vec(),
            y_angle.shape().to_vec(),
        ));
    }
    let mut kx = Array::<f64, D>::zeros(x_angle.raw_dim());
    let mut ky = Array::<f64, D>::zeros(x_angle.raw_dim());
    Zip::from(&mut kx)
        .and(&mut ky)
        .and(x_angle)
        .and(y_angle)
        .for_each(|kx, ky, &x, &y| {
            let (theta, rho) = cartesian_to_polar(x, y);
            (*kx, *ky) = polar_to_cartesian(theta, angle_to_k(rho, kinetic_energy));
        });
    Ok((kx, ky))
}

/// Convert a hemispherical analyzer slice's angle and kinetic energy vectors into
/// a k matrix and a kinetic energy matrix for plotting the slice in k-E.
///
/// Both matrices have shape `(energy.len(), angle.len())`. Row `u` of the k matrix is the
/// angle vector converted at `energy[u]`; every column of the energy matrix is the energy
/// vector. The outputs are always `f64` whatever the input precision.
pub fn angle_energy_to_k_energy_grid<A, B, S1, S2>(
    angle: &ArrayBase<S1, Ix1>,
    energy: &ArrayBase<S2, Ix1>,
) -> (Array2<f64>, Array2<f64>)
where
    A: Copy + Into<f64>,
    B: Copy + Into<f64>,
    S1: Data<Elem = A>,
    S2: Data<Elem = B>,
{
    let angle: Array1<f64> = angle.mapv(|a| a.into());
    let energy: Array1<f64> = energy.mapv(|e| e.into());
    let shape = (energy.len(), angle.len());

    let mut k = Array2::<f64>::zeros(shape);
    for (mut row, &e) in k.rows_mut().into_iter().zip(energy.iter()) {
        row.assign(&angle_to_k_fixed_energy(&angle, e));
    }
    let energy_matrix = Array2::from_shape_fn(shape, |(u, _)| energy[u]);

    (k, energy_matrix)
}

/// Elementwise [`photon_energy_to_fermi_tof`] at a fixed workfunction
pub fn photon_energy_to_fermi_tof_array<S, D>(
    photon_energy: &ArrayBase<S, D>,
    workfunction: f64,
) -> Array<f64, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    photon_energy.mapv(|e| photon_energy_to_fermi_tof(e, workfunction))
}

/// Elementwise [`time_of_flight_to_kinetic_energy`]
pub fn time_of_flight_to_kinetic_energy_array<S, D>(time_of_flight: &ArrayBase<S, D>) -> Array<f64, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    time_of_flight.mapv(time_of_flight_to_kinetic_energy)
}

/// Elementwise [`kinetic_energy_to_time_of_flight`]
pub fn kinetic_energy_to_time_of_flight_array<S, D>(kinetic_energy: &ArrayBase<S, D>) -> Array<f64, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    kinetic_energy.mapv(kinetic_energy_to_time_of_flight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use ndarray::{arr1, arr2};

    #[test]
    fn test_angle_to_k_normal_emission() {
        assert_eq!(angle_to_k(0.0, 10.0), 0.0);
        assert_eq!(angle_to_k(0.0, 123.4), 0.0);
    }

    #[test]
    fn test_angle_to_k_reference() {
        assert_relative_eq!(angle_to_k(10.0, 10.0), 0.2813252812459324, max_relative = 1e-9);
        assert_relative_eq!(angle_to_k(15.0, 16.8), 0.5434873037781522, max_relative = 1e-9);
    }

    #[test]
    fn test_angle_to_k_is_odd() {
        for angle in [0.5, 3.0, 7.25, 14.9] {
            for energy in [1.0, 6.3, 16.8] {
                assert_eq!(angle_to_k(-angle, energy), -angle_to_k(angle, energy));
            }
        }
    }

    #[test]
    fn test_negative_energy_is_nan() {
        assert!(angle_to_k(5.0, -1.0).is_nan());
        assert!(kinetic_energy_to_time_of_flight(-2.0).is_nan());
        assert!(photon_energy_to_fermi_tof(4.0, 4.5).is_nan());
    }

    #[test]
    fn test_zero_tof_is_infinite() {
        let energy = time_of_flight_to_kinetic_energy(0.0);
        assert!(energy.is_infinite() && energy > 0.0);
        assert!(kinetic_energy_to_time_of_flight(0.0).is_infinite());
    }

    #[test]
    fn test_origin_maps_to_zero_theta() {
        assert_eq!(cartesian_to_polar(0.0, 0.0), (0.0, 0.0));
    }

    #[test]
    fn test_polar_round_trip() {
        let points = [(1.0, 2.0), (-3.5, 0.25), (-1e-3, -4.0), (7.0, -7.0), (0.0, 2.0)];
        for (x, y) in points {
            let (theta, rho) = cartesian_to_polar(x, y);
            let (x_back, y_back) = polar_to_cartesian(theta, rho);
            assert_relative_eq!(x_back, x, max_relative = 1e-9, epsilon = 1e-12);
            assert_relative_eq!(y_back, y, max_relative = 1e-9, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_tof_round_trip() {
        for tof in [50.0, 400.0, 591.47, 1200.0, 1e5] {
            let back = kinetic_energy_to_time_of_flight(time_of_flight_to_kinetic_energy(tof));
            assert_relative_eq!(back, tof, max_relative = 1e-6);
        }
        assert_relative_eq!(
            time_of_flight_to_kinetic_energy(500.0),
            8.815913456199917,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_fermi_tof() {
        let tof = photon_energy_to_fermi_tof(10.8, 4.5);
        assert!(tof > 0.0);
        assert_relative_eq!(tof, 591.4709084676007, max_relative = 1e-2);
        assert_relative_eq!(tof, kinetic_energy_to_time_of_flight(6.3), max_relative = 1e-12);
    }

    #[test]
    fn test_broadcast_angle_to_k() {
        let angles = arr1(&[-10.0, 0.0, 10.0]);
        let energies = arr2(&[[10.0], [16.8]]);
        let k = angle_to_k_array(&angles, &energies).unwrap();
        assert_eq!(k.shape(), &[2, 3]);
        assert_eq!(k[[0, 1]], 0.0);
        assert_eq!(k[[1, 2]], angle_to_k(10.0, 16.8));
        assert_eq!(k[[0, 0]], -k[[0, 2]]);
    }

    #[test]
    fn test_broadcast_mismatch() {
        let a = Array1::<f64>::zeros(3);
        let b = Array1::<f64>::zeros(4);
        match angle_to_k_array(&a, &b) {
            Err(ConvertError::ShapeMismatch(sa, sb)) => {
                assert_eq!(sa, vec![3]);
                assert_eq!(sb, vec![4]);
            }
            Ok(_) => panic!("mismatched shapes were broadcast"),
        }
    }

    #[test]
    fn test_polar_arrays_round_trip() {
        let x = arr2(&[[0.0, 1.0], [-2.0, 3.5]]);
        let y = arr2(&[[0.0, -1.0], [4.0, 0.5]]);
        let (theta, rho) = cartesian_to_polar_array(&x, &y).unwrap();
        assert_eq!(theta[[0, 0]], 0.0);
        assert_eq!(rho[[0, 0]], 0.0);
        let (x_back, y_back) = polar_to_cartesian_array(&theta, &rho).unwrap();
        for (a, b) in x_back.iter().zip(x.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
        }
        for (a, b) in y_back.iter().zip(y.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_zero_angle_grid() {
        let zeros = Array2::<f64>::zeros((4, 5));
        for energy in [0.5, 6.3, 100.0] {
            let (kx, ky) = angle_grid_to_k_grid(&zeros, &zeros, energy).unwrap();
            assert!(kx.iter().all(|&k| k == 0.0));
            assert!(ky.iter().all(|&k| k == 0.0));
        }
    }

    #[test]
    fn test_angle_grid_along_axes() {
        let x = arr2(&[[10.0, 0.0]]);
        let y = arr2(&[[0.0, -10.0]]);
        let (kx, ky) = angle_grid_to_k_grid(&x, &y, 10.0).unwrap();
        let k = angle_to_k(10.0, 10.0);
        assert_relative_eq!(kx[[0, 0]], k, max_relative = 1e-12);
        assert_abs_diff_eq!(ky[[0, 0]], 0.0, epsilon = 1e-15);
        assert_abs_diff_eq!(kx[[0, 1]], 0.0, epsilon = 1e-15);
        assert_relative_eq!(ky[[0, 1]], -k, max_relative = 1e-12);
    }

    #[test]
    fn test_angle_grid_shape_mismatch() {
        let x = Array2::<f64>::zeros((2, 3));
        let y = Array2::<f64>::zeros((3, 2));
        assert!(angle_grid_to_k_grid(&x, &y, 10.0).is_err());
    }

    #[test]
    fn test_angle_energy_grid_rows() {
        let angle = arr1(&[-5.0, 12.0]);
        let energy = arr1(&[6.3, 16.8]);
        let (k, e) = angle_energy_to_k_energy_grid(&angle, &energy);
        assert_eq!(k.shape(), &[2, 2]);
        assert_eq!(k.row(0), angle_to_k_fixed_energy(&angle, 6.3));
        assert_eq!(k.row(1), angle_to_k_fixed_energy(&angle, 16.8));
        assert_eq!(e, arr2(&[[6.3, 6.3], [16.8, 16.8]]));
    }

    #[test]
    fn test_angle_energy_grid_widens_precision() {
        let angle = arr1(&[1.5f32, 2.5, 3.5]);
        let energy = arr1(&[10i32]);
        let (k, e) = angle_energy_to_k_energy_grid(&angle, &energy);
        assert_eq!(k.shape(), &[1, 3]);
        assert_eq!(k[[0, 1]], angle_to_k(2.5, 10.0));
        assert_eq!(e[[0, 2]], 10.0);
    }

    #[test]
    fn test_tof_arrays() {
        let tof = arr1(&[300.0, 600.0]);
        let energy = time_of_flight_to_kinetic_energy_array(&tof);
        let back = kinetic_energy_to_time_of_flight_array(&energy);
        for (a, b) in back.iter().zip(tof.iter()) {
            assert_relative_eq!(*a, *b, max_relative = 1e-9);
        }
        let fermi = photon_energy_to_fermi_tof_array(&arr1(&[10.8, 6.0]), 4.5);
        assert_eq!(fermi[0], photon_energy_to_fermi_tof(10.8, 4.5));
    }
}
