//! Collaborator seams: where raw samples come from, the optional smoothing
//! filter, and where transformed poses go.

use crate::types::{Pose, DOF};
use crate::{Result, TrackError};
use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};

/// Raw 6DOF sample provider, polled once per cycle.
///
/// Must return within the cycle budget; a blocking source stalls the loop.
pub trait InputSource: Send {
    fn sample(&mut self) -> Result<[f64; DOF]>;
}

/// Smoothing filter applied to the raw accumulator.
pub trait Filter: Send {
    fn filter(&mut self, input: &Pose) -> Pose;
}

/// Consumer of the transformed pose.
pub trait Protocol: Send {
    fn pose(&mut self, pose: &Pose) -> Result<()>;
}

impl<F> InputSource for F
where
    F: FnMut() -> Result<[f64; DOF]> + Send,
{
    fn sample(&mut self) -> Result<[f64; DOF]> {
        self()
    }
}

/// Input source fed through a channel.
///
/// Each poll drains the queue to the newest sample; with nothing queued the
/// previous sample is repeated.
pub struct ChannelSource {
    receiver: Receiver<[f64; DOF]>,
    last: [f64; DOF],
}

impl ChannelSource {
    pub fn new(receiver: Receiver<[f64; DOF]>) -> ChannelSource {
        ChannelSource {
            receiver,
            last: [0.0; DOF],
        }
    }

    /// Create a bounded channel and the source reading from it.
    pub fn bounded(capacity: usize) -> (Sender<[f64; DOF]>, ChannelSource) {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        (sender, ChannelSource::new(receiver))
    }
}

impl InputSource for ChannelSource {
    fn sample(&mut self) -> Result<[f64; DOF]> {
        let mut fresh = false;
        loop {
            match self.receiver.try_recv() {
                Ok(sample) => {
                    self.last = sample;
                    fresh = true;
                }
                Err(TryRecvError::Empty) => return Ok(self.last),
                Err(TryRecvError::Disconnected) if fresh => return Ok(self.last),
                Err(TryRecvError::Disconnected) => return Err(TrackError::Disconnected),
            }
        }
    }
}

/// Protocol that forwards poses into a bounded channel.
///
/// A full channel drops the pose rather than stalling the cycle.
pub struct ChannelProtocol {
    sender: Sender<Pose>,
}

impl ChannelProtocol {
    pub fn new(sender: Sender<Pose>) -> ChannelProtocol {
        ChannelProtocol { sender }
    }

    pub fn bounded(capacity: usize) -> (ChannelProtocol, Receiver<Pose>) {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        (ChannelProtocol::new(sender), receiver)
    }
}

impl Protocol for ChannelProtocol {
    fn pose(&mut self, pose: &Pose) -> Result<()> {
        match self.sender.try_send(*pose) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                log::trace!("Output channel full, dropping pose");
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(TrackError::Disconnected),
        }
    }
}

/// Exponential moving average over all six components.
#[derive(Debug, Clone)]
pub struct Ewma {
    alpha: f64,
    state: Option<Pose>,
}

impl Ewma {
    /// `alpha` is the weight of the newest sample, in (0, 1].
    pub fn new(alpha: f64) -> Result<Ewma> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(TrackError::InvalidConfig(format!(
                "EWMA alpha must be in (0, 1], got {}",
                alpha
            )));
        }
        Ok(Ewma { alpha, state: None })
    }

    /// Forget the smoothed state; the next input passes through unchanged.
    pub fn reset(&mut self) {
        self.state = None;
    }
}

impl Filter for Ewma {
    fn filter(&mut self, input: &Pose) -> Pose {
        let next = match self.state {
            None => *input,
            Some(prev) => {
                let mut out = prev;
                for i in 0..DOF {
                    out[i] = prev[i] + self.alpha * (input[i] - prev[i]);
                }
                out
            }
        };
        self.state = Some(next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_source_holds_and_drains() {
        let (tx, mut src) = ChannelSource::bounded(8);
        assert_eq!(src.sample().unwrap(), [0.0; DOF]);

        tx.send([1.0; DOF]).unwrap();
        tx.send([2.0; DOF]).unwrap();
        assert_eq!(src.sample().unwrap(), [2.0; DOF]);
        assert_eq!(src.sample().unwrap(), [2.0; DOF]);

        drop(tx);
        assert!(matches!(src.sample(), Err(TrackError::Disconnected)));
    }

    #[test]
    fn test_channel_source_drains_before_disconnect() {
        let (tx, mut src) = ChannelSource::bounded(8);
        tx.send([3.0; DOF]).unwrap();
        drop(tx);
        assert_eq!(src.sample().unwrap(), [3.0; DOF]);
        assert!(src.sample().is_err());
    }

    #[test]
    fn test_channel_protocol_drops_when_full() {
        let (mut proto, rx) = ChannelProtocol::bounded(1);
        proto.pose(&Pose::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0)).unwrap();
        proto.pose(&Pose::new(2.0, 0.0, 0.0, 0.0, 0.0, 0.0)).unwrap();
        assert_eq!(rx.try_recv().unwrap()[0], 1.0);
        assert!(rx.try_recv().is_err());

        drop(rx);
        assert!(matches!(
            proto.pose(&Pose::zero()),
            Err(TrackError::Disconnected)
        ));
    }

    #[test]
    fn test_closure_source() {
        let mut n = 0.0;
        let mut src = move || -> crate::Result<[f64; DOF]> {
            n += 1.0;
            Ok([n, 0.0, 0.0, 0.0, 0.0, 0.0])
        };
        assert_eq!(InputSource::sample(&mut src).unwrap()[0], 1.0);
        assert_eq!(InputSource::sample(&mut src).unwrap()[0], 2.0);
    }

    #[test]
    fn test_ewma() {
        assert!(Ewma::new(0.0).is_err());
        assert!(Ewma::new(1.5).is_err());

        let mut f = Ewma::new(0.5).unwrap();
        let a = f.filter(&Pose::new(10.0, 0.0, 0.0, 0.0, 0.0, 0.0));
        assert_eq!(a[0], 10.0);
        let b = f.filter(&Pose::zero());
        assert_eq!(b[0], 5.0);
        let c = f.filter(&Pose::zero());
        assert_eq!(c[0], 2.5);

        f.reset();
        let d = f.filter(&Pose::new(8.0, 0.0, 0.0, 0.0, 0.0, 0.0));
        assert_eq!(d[0], 8.0);
    }
}
