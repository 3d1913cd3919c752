//! Physical constants, instrument geometry and the names used in Themis HDF5 files.
//!
//! The SI constants are the CODATA 2018 recommended values (the same values
//! scipy.constants ships), which is what the Themis acquisition software and
//! the lab's analysis scripts assume.

/// Electron rest mass in kg
pub const ELECTRON_MASS: f64 = 9.109_383_701_5e-31;
/// Elementary charge in C. Exact by the 2019 SI definition.
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;
/// Reduced Planck constant in J s
pub const HBAR: f64 = 1.054_571_817e-34;

/// Sample-to-detector flight distance of the Themis 1000 in DriftMode, in m
pub const THEMIS_FLIGHT_DISTANCE: f64 = 880.5e-3;

/// Seconds per nanosecond. Flight times are in ns, same as the Themis acquisition software.
pub const NANOSECOND: f64 = 1e-9;
/// Converts a wavevector in 1/m to 1/Å
pub const INVERSE_METRE_TO_INVERSE_ANGSTROM: f64 = 1e-10;

// Sub-dataset names which mark the data type of a Themis dataset
pub const EVENTS_NAME: &str = "events";
pub const CONVERTED_NAME: &str = "converted";
pub const CONVERSION_NAME: &str = "conversion";

// Raw event table columns
pub const EVENT_X_COLUMN: &str = "x";
pub const EVENT_Y_COLUMN: &str = "y";
pub const EVENT_TIME_COLUMN: &str = "time";

// Attributes on the raw event table
pub const TIME_FACTOR_ATTR: &str = "FIELD_2_FACTOR";
pub const TIME_OFFSET_ATTR: &str = "FIELD_2_OFFSET";

// Attributes on converted data
pub const MINIMUM_ENERGY_ATTR: &str = "minimumenergy";
pub const MAXIMUM_ENERGY_ATTR: &str = "maximumenergy";
pub const MAXIMUM_ANGLE_ATTR: &str = "maximumangle";

// Attributes on each top-level dataset key
pub const LENS_MODE_ATTR: &str = "lensmode";
pub const KINETIC_ENERGY_ATTR: &str = "Kinetic Energy";
pub const PASS_ENERGY_ATTR: &str = "Pass Energy";
pub const TITLE_ATTR: &str = "TITLE";

/// Default number of bins along (x, y, time) when histogramming raw events
pub const DEFAULT_BINS: [usize; 3] = [1024, 1024, 500];
/// Default number of events drawn before histogramming
pub const DEFAULT_SUBSAMPLE_SIZE: usize = 20_000;
