//! Signal-conditioning front-end for the staged engine shape.
//!
//! The `FrontEnd` trait is the extensibility seam: swap in `DcBlockFrontEnd`
//! (default) or any richer noise/echo suppressor without touching the
//! detector or the pipeline. Internals of a production suppressor are out of
//! scope here; `DcBlockFrontEnd` does the minimum useful conditioning.

use crate::buffering::frame::PcmFrame;
use crate::error::Result;

/// Contract for signal-conditioning front-ends.
///
/// A front-end may buffer internally and emit output at a slower cadence
/// than it is fed (e.g. one conditioned frame per three input frames), but
/// it must never reorder audio.
pub trait FrontEnd: Send + 'static {
    /// Accept one input frame of mono PCM.
    fn provide(&mut self, frame: &[i16]) -> Result<()>;

    /// Drain one pending conditioned frame, oldest first.
    fn fetch(&mut self) -> Option<PcmFrame>;
}

/// DC-blocking high-pass plus a soft noise gate, with a decimated output
/// cadence.
///
/// Keeps a one-pole high-pass (`y[n] = x[n] - x[n-1] + R*y[n-1]`) to strip
/// microphone DC offset. Input frames accumulate until `output_interval` of
/// them have arrived, then one conditioned frame covering the whole window
/// is emitted; windows whose peak stays under the gate threshold are zeroed
/// so the detector is not fed idle-channel hiss.
pub struct DcBlockFrontEnd {
    sample_rate: u32,
    gate_threshold: i16,
    /// Input frames per emitted conditioned frame.
    output_interval: usize,
    frames_accumulated: usize,
    window: Vec<i16>,
    prev_input: f32,
    prev_output: f32,
    queue: std::collections::VecDeque<PcmFrame>,
}

/// Pole for the DC-block filter; ~20 Hz cutoff at 16 kHz.
const DC_POLE: f32 = 0.995;

impl DcBlockFrontEnd {
    /// `gate_threshold` is the peak amplitude below which a window is
    /// considered idle-channel noise and muted. `output_interval` is the
    /// number of fed frames per emitted conditioned frame (clamped to ≥ 1);
    /// the conditioned frame covers all of them.
    pub fn new(sample_rate: u32, gate_threshold: i16, output_interval: usize) -> Self {
        Self {
            sample_rate,
            gate_threshold,
            output_interval: output_interval.max(1),
            frames_accumulated: 0,
            window: Vec::new(),
            prev_input: 0.0,
            prev_output: 0.0,
            queue: std::collections::VecDeque::new(),
        }
    }
}

impl Default for DcBlockFrontEnd {
    fn default() -> Self {
        // One conditioned 30 ms frame per three 10 ms inputs.
        Self::new(16_000, 64, 3)
    }
}

impl FrontEnd for DcBlockFrontEnd {
    fn provide(&mut self, frame: &[i16]) -> Result<()> {
        self.window.reserve(frame.len());
        for &sample in frame {
            let x = sample as f32;
            let y = x - self.prev_input + DC_POLE * self.prev_output;
            self.prev_input = x;
            self.prev_output = y;
            self.window
                .push(y.clamp(i16::MIN as f32, i16::MAX as f32) as i16);
        }

        self.frames_accumulated += 1;
        if self.frames_accumulated < self.output_interval {
            return Ok(());
        }
        self.frames_accumulated = 0;

        let mut conditioned = std::mem::take(&mut self.window);
        let peak = conditioned
            .iter()
            .map(|s| s.unsigned_abs())
            .max()
            .unwrap_or(0);
        if peak < self.gate_threshold.unsigned_abs() {
            conditioned.iter_mut().for_each(|s| *s = 0);
        }

        self.queue
            .push_back(PcmFrame::new(conditioned, self.sample_rate));
        Ok(())
    }

    fn fetch(&mut self) -> Option<PcmFrame> {
        self.queue.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_one_conditioned_frame_per_interval() {
        let mut fe = DcBlockFrontEnd::new(16_000, 0, 3);
        fe.provide(&[500i16; 160]).unwrap();
        assert!(fe.fetch().is_none());
        fe.provide(&[500i16; 160]).unwrap();
        assert!(fe.fetch().is_none());
        fe.provide(&[500i16; 160]).unwrap();

        let out = fe.fetch().expect("third input completes the window");
        assert_eq!(out.samples.len(), 480, "window covers all three inputs");
        assert!(fe.fetch().is_none());

        // The counter restarts for the next window.
        fe.provide(&[500i16; 160]).unwrap();
        assert!(fe.fetch().is_none());
    }

    #[test]
    fn removes_dc_offset() {
        let mut fe = DcBlockFrontEnd::new(16_000, 0, 1);
        // A constant +1000 offset should decay toward zero.
        for _ in 0..20 {
            fe.provide(&[1000i16; 160]).unwrap();
        }
        let mut last = None;
        while let Some(frame) = fe.fetch() {
            last = Some(frame);
        }
        let last = last.expect("front-end should have emitted output");
        let tail_mean: f64 = last.samples[100..]
            .iter()
            .map(|&s| s as f64)
            .sum::<f64>()
            / 60.0;
        assert!(tail_mean.abs() < 50.0, "residual DC mean={tail_mean}");
    }

    #[test]
    fn gate_mutes_idle_channel_noise() {
        let mut fe = DcBlockFrontEnd::new(16_000, 64, 1);
        let noise: Vec<i16> = (0..160).map(|i| if i % 2 == 0 { 3 } else { -3 }).collect();
        fe.provide(&noise).unwrap();
        let out = fe.fetch().expect("one frame pending");
        assert!(out.samples.iter().all(|&s| s == 0));
    }

    #[test]
    fn loud_frames_pass_the_gate() {
        let mut fe = DcBlockFrontEnd::new(16_000, 64, 1);
        let tone: Vec<i16> = (0..160)
            .map(|i| if i % 2 == 0 { 8000 } else { -8000 })
            .collect();
        fe.provide(&tone).unwrap();
        let out = fe.fetch().expect("one frame pending");
        assert!(out.samples.iter().any(|&s| s != 0));
        assert_eq!(out.samples.len(), 160);
    }

    #[test]
    fn output_order_matches_input_order() {
        let mut fe = DcBlockFrontEnd::new(16_000, 0, 1);
        fe.provide(&[10i16; 4]).unwrap();
        fe.provide(&[-10i16; 4]).unwrap();
        let first = fe.fetch().unwrap();
        let second = fe.fetch().unwrap();
        assert!(fe.fetch().is_none());
        assert!(first.samples[0] > second.samples[0]);
    }
}
