//! # trackcore - real-time 6DOF pose transformation pipeline
//!
//! Takes one raw [x, y, z, yaw, pitch, roll] sample per fixed cycle and runs
//! it through:
//! - an optional smoothing filter
//! - per-axis inversion and response curves (with alternate curves)
//! - user-triggered centering
//! - optional rotation-induced translation compensation
//! - output axis remapping
//!
//! then hands the result to an output protocol and keeps a locked snapshot
//! for readers such as a UI. A C FFI is provided for C/C++ hosts.
//!
//! ## Quick Start
//! ```no_run
//! use trackcore::{ChannelProtocol, Mappings, Pipeline, Settings, Tracker};
//! use std::time::Duration;
//!
//! let (protocol, poses) = ChannelProtocol::bounded(256);
//! let pipeline = Pipeline::new(Mappings::identity()).with_protocol(protocol);
//! let source = || -> trackcore::Result<[f64; 6]> { Ok([10.0, 0.0, 0.0, 0.0, 0.0, 0.0]) };
//!
//! let tracker = Tracker::start(pipeline, source, Settings::from_env()).unwrap();
//! tracker.request_center();
//! let pose = poses.recv_timeout(Duration::from_secs(1)).unwrap();
//! println!("out: {:?}", pose);
//! tracker.stop().unwrap();
//! ```

pub mod error;
pub mod types;
pub mod math;
pub mod curve;
pub mod mapping;
pub mod centering;
pub mod io;
pub mod config;
pub mod pipeline;
pub mod tracker;
pub mod ffi;

pub use error::TrackError;
pub use types::*;
pub use curve::{ResponseCurve, Spline};
pub use mapping::{AxisMapping, AxisOptions, Mappings};
pub use io::{ChannelProtocol, ChannelSource, Ewma, Filter, InputSource, Protocol};
pub use config::Settings;
pub use pipeline::{Pipeline, Shared};
pub use tracker::Tracker;

/// Result type alias for trackcore operations.
pub type Result<T> = std::result::Result<T, TrackError>;
