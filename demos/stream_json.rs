//! Run the pipeline on a synthetic head motion and print transformed poses
//! as JSON lines.
//!
//! {"x":0.0210,"y":0.0018,"z":0.0275,"yaw":1.4,"pitch":3.1,"roll":5.2}
//!
//! Usage: cargo run --example stream_json
//! Set TRACKCORE_TCOMP=1 to enable rotation compensation.

use std::io::{self, Write};
use std::time::{Duration, Instant};
use trackcore::{
    Axis, AxisMapping, AxisOptions, ChannelProtocol, Ewma, Mappings, Pipeline, Settings, Spline,
    Tracker,
};

fn main() {
    env_logger::init();

    // Gentle yaw curve, stronger alternate curve when turning left.
    let mut mappings = Mappings::identity();
    *mappings.axis_mut(Axis::Yaw) = AxisMapping::new(
        AxisOptions {
            altp: true,
            ..AxisOptions::identity(Axis::Yaw)
        },
        Box::new(Spline::new(&[(30.0, 45.0), (90.0, 180.0)])),
        Box::new(Spline::new(&[(30.0, 60.0), (90.0, 180.0)])),
    );

    let filter = match Ewma::new(0.3) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Bad filter config: {}", e);
            std::process::exit(1);
        }
    };

    let (protocol, poses) = ChannelProtocol::bounded(1024);
    let pipeline = Pipeline::new(mappings)
        .with_filter(filter)
        .with_protocol(protocol);

    let epoch = Instant::now();
    let source = move || -> trackcore::Result<[f64; 6]> {
        let t = epoch.elapsed().as_secs_f64();
        Ok([
            2.0 * (t * 0.7).sin(),
            0.5 * (t * 1.3).cos(),
            1.0,
            40.0 * (t * 0.5).sin(),
            10.0 * (t * 0.9).sin(),
            5.0 * (t * 0.3).cos(),
        ])
    };

    let tracker = match Tracker::start(pipeline, source, Settings::from_env()) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Failed to start tracker: {}", e);
            std::process::exit(1);
        }
    };

    eprintln!("Streaming JSON for 10s, centering after 1s...");

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut count: u64 = 0;
    let mut centered = false;

    while epoch.elapsed() < Duration::from_secs(10) {
        if !centered && epoch.elapsed() >= Duration::from_secs(1) {
            tracker.request_center();
            centered = true;
        }

        match poses.recv_timeout(Duration::from_secs(1)) {
            Ok(p) => {
                count += 1;
                // every ~10th pose keeps the output readable
                if count % 10 != 1 {
                    continue;
                }
                let _ = writeln!(
                    out,
                    "{{\"x\":{:.4},\"y\":{:.4},\"z\":{:.4},\"yaw\":{:.1},\"pitch\":{:.1},\"roll\":{:.1}}}",
                    p[Axis::X],
                    p[Axis::Y],
                    p[Axis::Z],
                    p[Axis::Yaw],
                    p[Axis::Pitch],
                    p[Axis::Roll],
                );
                let _ = out.flush();
            }
            Err(e) => {
                eprintln!("No pose: {}", e);
                break;
            }
        }
    }

    let elapsed = epoch.elapsed().as_secs_f64();
    match tracker.stop() {
        Ok(_) => eprintln!(
            "Total: {} poses in {:.1}s ({:.1} Hz)",
            count,
            elapsed,
            count as f64 / elapsed
        ),
        Err(e) => eprintln!("Tracker ended with error: {}", e),
    }
}
