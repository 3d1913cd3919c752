use hdf5::types::{FixedAscii, VarLenUnicode};
use hdf5::{File, H5Type};
use ndarray::Array3;
use std::f64::consts::PI;
use std::path::Path;
use std::str::FromStr;

use libarpes_tools::binning::BinningOptions;
use libarpes_tools::error::{LoadError, SourceError};
use libarpes_tools::loader::{load_themis, LoadedData};
use libarpes_tools::metadata::list_datasets;
use libarpes_tools::source::DataSource;
use libarpes_tools::themis_file::ThemisFile;

/// Layout of the event table written by the acquisition software, including a column
/// the loader never reads.
#[derive(H5Type, Clone, Copy)]
#[repr(C)]
struct DldEvent {
    x: i32,
    y: i32,
    time: i32,
    hits: u8,
}

fn write_str_attr(location: &hdf5::Location, name: &str, value: &str) {
    location
        .new_attr::<VarLenUnicode>()
        .create(name)
        .unwrap()
        .write_scalar(&VarLenUnicode::from_str(value).unwrap())
        .unwrap();
}

fn write_f64_attr(location: &hdf5::Location, name: &str, value: f64) {
    location
        .new_attr::<f64>()
        .create(name)
        .unwrap()
        .write_scalar(&value)
        .unwrap();
}

fn write_fixed_attr<const N: usize>(location: &hdf5::Location, name: &str, value: &str) {
    location
        .new_attr::<FixedAscii<N>>()
        .create(name)
        .unwrap()
        .write_scalar(&FixedAscii::<N>::from_ascii(value).unwrap())
        .unwrap();
}

fn write_metadata(group: &hdf5::Group, title: &str) {
    write_str_attr(group, "lensmode", "WideAngleMode");
    write_f64_attr(group, "Kinetic Energy", 6.3);
    write_f64_attr(group, "Pass Energy", 20.0);
    write_str_attr(group, "TITLE", title);
}

fn write_test_file(path: &Path) {
    let file = File::create(path).unwrap();

    let raw = file.create_group("Scan_0001").unwrap();
    write_metadata(&raw, "Au(111)\nFermi surface");
    let events: Vec<DldEvent> = (0..200)
        .map(|i| DldEvent {
            x: i % 20,
            y: i / 20,
            time: 1000 + i,
            hits: 1,
        })
        .collect();
    let table = raw
        .new_dataset_builder()
        .with_data(&events)
        .create("events")
        .unwrap();
    write_f64_attr(&table, "FIELD_2_FACTOR", 0.5);
    write_f64_attr(&table, "FIELD_2_OFFSET", 100.0);

    let converted = file.create_group("Scan_0002").unwrap();
    write_metadata(&converted, "Au(111) converted");
    let cube = Array3::<f64>::from_shape_fn((12, 10, 6), |(i, j, k)| (i + j + k) as f64);
    let dset = converted
        .new_dataset_builder()
        .with_data(&cube)
        .create("converted")
        .unwrap();
    write_f64_attr(&dset, "minimumenergy", 5.5);
    write_f64_attr(&dset, "maximumenergy", 6.5);
    write_f64_attr(&dset, "maximumangle", PI / 12.0);

    let unknown = file.create_group("Scan_0003").unwrap();
    write_metadata(&unknown, "");
    unknown
        .new_dataset_builder()
        .with_data(&[1.0f64, 2.0])
        .create("spectrum")
        .unwrap();
}

#[test]
fn test_load_raw_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("themis.h5");
    write_test_file(&path);

    let options = BinningOptions {
        bins: [4, 5, 10],
        subsample_size: Some(50),
        seed: Some(11),
    };
    match load_themis(&path, "Scan_0001", &options).unwrap() {
        LoadedData::Events(hist) => {
            assert_eq!(hist.counts.dim(), (4, 5, 10));
            assert_eq!(hist.total_counts(), 50);
            assert_eq!(hist.edges[2].len(), 11);
            // Corrected times lie within 1000 * 0.5 - 100 ..= 1199 * 0.5 - 100
            assert!(hist.edges[2][0] >= 400.0);
            assert!(hist.edges[2][10] <= 499.5);
        }
        LoadedData::Converted(_) => panic!("raw events loaded as converted data"),
    }
}

#[test]
fn test_load_converted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("themis.h5");
    write_test_file(&path);

    match load_themis(&path, "Scan_0002", &BinningOptions::default()).unwrap() {
        LoadedData::Converted(cube) => {
            assert_eq!(cube.data.dim(), (12, 10, 6));
            assert_eq!(cube.data[[3, 4, 5]], 12.0);
            assert_eq!(cube.x_axis.len(), 12);
            assert!((cube.x_axis[0] + 15.0).abs() < 1e-12);
            assert!((cube.y_axis[9] - 15.0).abs() < 1e-12);
            assert_eq!(cube.energy_axis[0], 5.5);
            assert_eq!(cube.energy_axis[5], 6.5);
        }
        LoadedData::Events(_) => panic!("converted data loaded as events"),
    }
}

#[test]
fn test_unknown_and_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("themis.h5");
    write_test_file(&path);

    match load_themis(&path, "Scan_0003", &BinningOptions::default()) {
        Err(LoadError::UnknownDataKind(dataset, marker)) => {
            assert_eq!(dataset, "Scan_0003");
            assert_eq!(marker, "spectrum");
        }
        other => panic!("unexpected result {other:?}"),
    }
    match load_themis(&path, "Scan_0009", &BinningOptions::default()) {
        Err(LoadError::SourceError(SourceError::MissingDataset(key))) => {
            assert_eq!(key, "Scan_0009")
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn test_list_datasets() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("themis.h5");
    write_test_file(&path);

    let file = ThemisFile::open(&path).unwrap();
    let infos = list_datasets(&file).unwrap();
    assert_eq!(infos.len(), 3);
    assert_eq!(infos[0].name, "Scan_0001");
    assert_eq!(infos[0].lens_mode, "WideAngleMode");
    assert_eq!(infos[0].kinetic_energy, "6.3");
    assert_eq!(infos[0].data_type, "events");
    assert_eq!(infos[0].comment, "Au(111); Fermi surface");
    assert_eq!(infos[1].data_type, "converted");
}

/// Attributes as written by h5py from numpy byte strings: fixed length and NUL padded, with
/// numbers stored as text.
fn write_fixed_string_file(path: &Path, title: &str) {
    let file = File::create(path).unwrap();
    let group = file.create_group("Scan_0001").unwrap();
    write_fixed_attr::<16>(&group, "lensmode", "WideAngleMode");
    write_fixed_attr::<8>(&group, "Kinetic Energy", "6.3");
    write_f64_attr(&group, "Pass Energy", 20.0);
    write_fixed_attr::<2048>(&group, "TITLE", title);

    let events: Vec<DldEvent> = (0..10)
        .map(|i| DldEvent {
            x: i,
            y: 2 * i,
            time: 100 + i,
            hits: 1,
        })
        .collect();
    let table = group
        .new_dataset_builder()
        .with_data(&events)
        .create("events")
        .unwrap();
    write_fixed_attr::<8>(&table, "FIELD_2_FACTOR", "2");
    write_fixed_attr::<8>(&table, "FIELD_2_OFFSET", "bad");
}

#[test]
fn test_fixed_length_string_attributes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixed.h5");
    write_fixed_string_file(&path, "Bi2Se3\nhv = 10.8 eV");

    let file = ThemisFile::open(&path).unwrap();
    let infos = list_datasets(&file).unwrap();
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].lens_mode, "WideAngleMode");
    assert_eq!(infos[0].kinetic_energy, "6.3");
    assert_eq!(infos[0].pass_energy, "20");
    assert_eq!(infos[0].comment, "Bi2Se3; hv = 10.8 eV");
}

#[test]
fn test_long_fixed_length_title_is_cut() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixed.h5");
    let title = "a".repeat(1500);
    write_fixed_string_file(&path, &title);

    let file = ThemisFile::open(&path).unwrap();
    let infos = list_datasets(&file).unwrap();
    assert_eq!(infos[0].comment, "a".repeat(1024));
}

#[test]
fn test_text_calibration_attributes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixed.h5");
    write_fixed_string_file(&path, "");

    let file = ThemisFile::open(&path).unwrap();
    let factor = file.dataset_attr_f64("Scan_0001", "events", "FIELD_2_FACTOR");
    assert_eq!(factor.unwrap(), 2.0);
    match load_themis(&path, "Scan_0001", &BinningOptions::default()) {
        Err(LoadError::SourceError(SourceError::BadAttribute(owner, name, value))) => {
            assert_eq!(owner, "Scan_0001/events");
            assert_eq!(name, "FIELD_2_OFFSET");
            assert_eq!(value, "bad");
        }
        other => panic!("unexpected result {other:?}"),
    }
}
