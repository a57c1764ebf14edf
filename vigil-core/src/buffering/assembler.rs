//! Re-chunking between the capture grain and the engine grain.
//!
//! The capture callback delivers whatever block size the device driver
//! prefers; the acoustic engine negotiates its own input chunk size at
//! initialization, and the two need not coincide or divide evenly. The
//! assembler buffers partial data and releases only exact engine-sized
//! frames — a short read can therefore never reach `feed()`.

/// Accumulates arbitrarily-sized sample runs and yields fixed-size frames.
///
/// Samples are released strictly in arrival order; nothing is reordered or
/// duplicated.
#[derive(Debug)]
pub struct FrameAssembler {
    frame_len: usize,
    pending: Vec<i16>,
}

impl FrameAssembler {
    /// `frame_len` is the engine-negotiated chunk size in samples.
    /// Callers validate it is non-zero before constructing the assembler.
    pub fn new(frame_len: usize) -> Self {
        Self {
            frame_len,
            pending: Vec::with_capacity(frame_len * 2),
        }
    }

    /// Append captured samples. Never blocks, never drops.
    pub fn push(&mut self, samples: &[i16]) {
        self.pending.extend_from_slice(samples);
    }

    /// Copy the oldest complete frame into `out` and consume it.
    ///
    /// `out.len()` must equal the configured frame length. Returns `false`
    /// when less than one full frame is buffered; the partial remainder is
    /// retained for the next push.
    pub fn take_frame(&mut self, out: &mut [i16]) -> bool {
        debug_assert_eq!(out.len(), self.frame_len);
        if self.pending.len() < self.frame_len {
            return false;
        }
        out.copy_from_slice(&self.pending[..self.frame_len]);
        self.pending.drain(..self.frame_len);
        true
    }

    /// Samples currently buffered short of a full frame boundary.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_input_yields_no_frame() {
        let mut asm = FrameAssembler::new(160);
        let mut out = vec![0i16; 160];
        asm.push(&[1i16; 100]);
        assert!(!asm.take_frame(&mut out));
        assert_eq!(asm.pending_len(), 100);
    }

    #[test]
    fn exact_input_yields_one_frame() {
        let mut asm = FrameAssembler::new(160);
        let mut out = vec![0i16; 160];
        asm.push(&[7i16; 160]);
        assert!(asm.take_frame(&mut out));
        assert_eq!(out, vec![7i16; 160]);
        assert!(!asm.take_frame(&mut out));
        assert_eq!(asm.pending_len(), 0);
    }

    #[test]
    fn accumulation_across_pushes_preserves_order() {
        let mut asm = FrameAssembler::new(4);
        asm.push(&[1, 2, 3]);
        asm.push(&[4, 5, 6, 7, 8, 9]);

        let mut out = vec![0i16; 4];
        assert!(asm.take_frame(&mut out));
        assert_eq!(out, vec![1, 2, 3, 4]);
        assert!(asm.take_frame(&mut out));
        assert_eq!(out, vec![5, 6, 7, 8]);
        assert!(!asm.take_frame(&mut out));
        assert_eq!(asm.pending_len(), 1);
    }

    #[test]
    fn mismatched_grains_lose_nothing() {
        // Capture grain 7, engine grain 5 — no integer relationship.
        let mut asm = FrameAssembler::new(5);
        let mut seen = Vec::new();
        let mut out = vec![0i16; 5];
        let mut next = 0i16;
        for _ in 0..10 {
            let block: Vec<i16> = (0..7)
                .map(|_| {
                    let v = next;
                    next += 1;
                    v
                })
                .collect();
            asm.push(&block);
            while asm.take_frame(&mut out) {
                seen.extend_from_slice(&out);
            }
        }
        // 70 samples in, 14 full frames out, remainder retained.
        assert_eq!(seen, (0..70).collect::<Vec<i16>>());
        assert_eq!(asm.pending_len(), 0);
    }
}
