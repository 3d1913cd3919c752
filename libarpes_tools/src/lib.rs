//! # arpes_tools
//!
//! arpes_tools is a small library of coordinate conversions and file loading helpers for
//! Angle-Resolved Photoemission Spectroscopy (ARPES) data, written in Rust. It targets two
//! setups: a hemispherical analyzer, and the laser-based time-of-flight ARPES setup built
//! around a Themis 1000 analyzer [M. H. Berntsen, O. Götberg, O. Tjernberg, Rev. Sci.
//! Instrum. 82, 095113 (2011)].
//!
//! ## Installation
//!
//! Currently the only method of install is from source, which is laid out below.
//!
//! ### HDF5
//!
//! Before building arpes_tools, HDF5 must be installed. Typically this will be installed
//! using a package manager (homebrew, apt, etc), and the Rust libraries will auto detect the
//! location of the HDF install. If HDF5 lives in a custom location, write the following
//! snippet into the file `.cargo/config.toml` in the repository:
//!
//! ```toml
//! [env]
//! HDF5_DIR="/path/to/my/hdf5/install/"
//!
//! [build]
//! rustflags="-C link-args=-Wl,-rpath,/path/to/my/hdf5/install/lib"
//! ```
//!
//! ### Building & Install
//!
//! To build and install the CLI use `cargo install --path ./arpes_tools_cli` from the top
//! level repository. See the `arpes_tools_cli` docs for its use.
//!
//! ## Conversions
//!
//! The [`convert`] module maps detector angles and kinetic energies to momentum, and Themis
//! flight times to kinetic energies. All conversions come as scalar functions and as
//! ndarray functions, with IEEE semantics for unphysical input (NaN, infinity) rather than
//! errors.
//!
//! ```
//! use libarpes_tools::convert::{angle_to_k, photon_energy_to_fermi_tof};
//!
//! assert_eq!(angle_to_k(0.0, 16.8), 0.0);
//! let tof = photon_energy_to_fermi_tof(10.8, 4.5);
//! assert!(tof > 500.0 && tof < 700.0);
//! ```
//!
//! ## Loading Themis data
//!
//! A Themis HDF5 file holds one group per measurement, each with a single sub-dataset whose
//! name tells what kind of data it is:
//!
//! ```text
//! scan.h5
//! dataset_key - lensmode, Kinetic Energy, Pass Energy, TITLE
//! |---- events(dset) - FIELD_2_FACTOR, FIELD_2_OFFSET
//! dataset_key - lensmode, Kinetic Energy, Pass Energy, TITLE
//! |---- converted(dset) - minimumenergy, maximumenergy, maximumangle
//! ```
//!
//! [`loader::load_themis`] reads either kind. Raw delay-line detector events (x, y, time)
//! are time calibrated, randomly subsampled and histogrammed in 3D; converted data is
//! returned as is together with its angle and energy axes. Anything else is an error.
//!
//! Files are accessed through the [`source::DataSource`] trait, so data already in memory
//! can go through the same loader using [`source::MemorySource`].
//!
//! ## Configuration
//!
//! The CLI reads a YAML configuration describing a load job:
//!
//! ```yml
//! file_path: /path/to/scan.h5
//! dataset: Scan_0001
//! output_path: null
//! binning:
//!   bins: [1024, 1024, 500]
//!   subsample_size: 20000
//!   seed: null
//! ```
//!
//! Setting `subsample_size` to `null` bins every event, which can need a lot of memory.
pub mod binning;
pub mod config;
pub mod constants;
pub mod convert;
pub mod error;
pub mod hdf_writer;
pub mod loader;
pub mod metadata;
pub mod source;
pub mod themis_file;
