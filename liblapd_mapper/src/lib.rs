//! # lapd_mapper
//!
//! lapd_mapper maps the HDF5 files written by the Large Plasma Device (LaPD) data
//! acquisition system. It walks the file once and builds a normalized description of
//! everything it recognizes: the MSI diagnostics (discharge, gas pressure, heater,
//! interferometer array, magnetic field), the digitizers (SIS 3301, SIS crate) and the
//! control devices (6K Compumotor, NI_XZ, NI_XYZ, N5700_PS, Waveform). Everything it does
//! not recognize is reported as unknown.
//!
//! Downstream readers use the map to know where each quantity lives (dataset paths,
//! compound fields, shapes and dtypes) without knowing the LaPD layout themselves.
//!
//! ## Installation
//!
//! The only method of install is from source.
//!
//! ### HDF5
//!
//! Reading real files needs the `hdf5` feature and an HDF5 installation. Typically this
//! will be installed using a package manager (homebrew, apt, etc), and the Rust libraries
//! will auto detect the location of the HDF install. If HDF5 lives in a custom location,
//! write the following snippet into the file `.cargo/config.toml` in the repository:
//!
//! ```toml
//! [env]
//! HDF5_DIR="/path/to/my/hdf5/install/"
//!
//! [build]
//! rustflags="-C link-args=-Wl,-rpath,/path/to/my/hdf5/install/lib"
//! ```
//!
//! Without the feature the mapping itself still works on a metadata tree built in memory
//! (see [`node`]); only loading from disk is unavailable.
//!
//! ### Building & Install
//!
//! To build and install the CLI use
//! `cargo install --path ./lapd_mapper_cli --features hdf5` from the top level repository.
//!
//! ## Configuration
//!
//! The YAML format of a configuration file is as follows:
//!
//! ```yml
//! hdf_path: /path/to/run.hdf5
//! output_path: /path/to/summaries/
//! silent: false
//! state_patterns:
//!   - control: Waveform
//!     config: waveform_config01
//!     patterns:
//!       - '(?P<AMP>(\bAMP\s)(?P<VAL>(\d+\.\d*|\.\d+|\d+\b)))'
//! ```
//!
//! `output_path` may be `null` (no summary is written), a file, or a directory (the
//! summary is written as `<file stem>_map.yml`). `state_patterns` replaces the default
//! command list patterns of a control device configuration; every pattern must define a
//! named state group and a `VAL` group.
//!
//! ## LaPD HDF5 layout
//!
//! ```text
//! run.hdf5 - LaPD HDF5 software version
//! MSI
//! |---- Discharge
//! |---- Gas pressure
//! |---- Heater
//! |---- Interferometer array
//! |---- Magnetic field
//! Raw data + config - Data run, Description, Investigator, ...
//! |---- SIS 3301
//! |---- SIS crate
//! |---- 6K Compumotor
//! |---- N5700_PS
//! |---- NI_XYZ
//! |---- NI_XZ
//! |---- Waveform
//! ```
pub mod clparse;
pub mod config;
pub mod constants;
pub mod controls;
pub mod digitizers;
pub mod dtype;
pub mod error;
#[cfg(feature = "hdf5")]
pub mod h5_loader;
pub mod mapper;
pub mod mapping;
pub mod msi;
pub mod node;
pub mod process;
pub mod summary;
