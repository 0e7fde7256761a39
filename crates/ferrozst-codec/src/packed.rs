//! Packed step results
//!
//! A processing step reports its outcome as one signed 64-bit value:
//!
//! ```text
//!  63        32 31         0
//! +------------+------------+
//! |  consumed  |  produced  |   value >= 0
//! +------------+------------+
//!        -(error code)          value < 0
//! ```
//!
//! Callers never touch the bits directly; [`StepResult::decode`] and
//! [`StepResult::encode`] are the only conversions.

/// Bytes consumed from the input and produced into the output by one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepResult {
    /// Input bytes consumed
    pub consumed: u32,
    /// Output bytes produced
    pub produced: u32,
}

impl StepResult {
    /// Largest input a single step may consume. Keeping the top bit clear
    /// guarantees an encoded success is never mistaken for an error.
    pub const MAX_CONSUMED: u32 = i32::MAX as u32;

    const LOW_MASK: u64 = 0xFFFF_FFFF;

    /// Create a step result
    pub fn new(consumed: u32, produced: u32) -> Self {
        Self { consumed, produced }
    }

    /// A step that neither consumed nor produced anything
    pub fn is_stalled(&self) -> bool {
        self.consumed == 0 && self.produced == 0
    }

    /// Decode a packed value into a step result, or the engine error code
    pub fn decode(raw: i64) -> Result<Self, u64> {
        if raw < 0 {
            return Err(raw.unsigned_abs());
        }
        let bits = raw as u64;
        Ok(Self {
            consumed: (bits >> 32) as u32,
            produced: (bits & Self::LOW_MASK) as u32,
        })
    }

    /// Pack this result; `consumed` must not exceed [`Self::MAX_CONSUMED`]
    pub fn encode(self) -> i64 {
        debug_assert!(self.consumed <= Self::MAX_CONSUMED);
        let bits = (u64::from(self.consumed.min(Self::MAX_CONSUMED)) << 32)
            | u64::from(self.produced);
        bits as i64
    }

    /// Pack an engine error code as a negative status
    pub fn encode_error(code: u64) -> i64 {
        let code = code.clamp(1, i64::MAX as u64);
        -(code as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, StepResult::new(0, 0))]
    #[case(5, StepResult::new(0, 5))]
    #[case(1 << 32, StepResult::new(1, 0))]
    #[case((17 << 32) | 4096, StepResult::new(17, 4096))]
    #[case(0x7FFF_FFFF_FFFF_FFFF, StepResult::new(i32::MAX as u32, u32::MAX))]
    fn test_decode_known_values(#[case] raw: i64, #[case] expected: StepResult) {
        assert_eq!(StepResult::decode(raw), Ok(expected));
    }

    #[rstest]
    #[case(-1, 1)]
    #[case(-70, 70)]
    #[case(i64::MIN + 1, i64::MAX as u64)]
    fn test_decode_errors(#[case] raw: i64, #[case] code: u64) {
        assert_eq!(StepResult::decode(raw), Err(code));
    }

    #[test]
    fn test_produced_high_bit_does_not_sign_extend() {
        // produced = 0x8000_0000 must stay in the low word
        let raw = StepResult::new(2, 0x8000_0000).encode();
        assert!(raw > 0);
        assert_eq!(StepResult::decode(raw), Ok(StepResult::new(2, 0x8000_0000)));
    }

    #[test]
    fn test_stalled() {
        assert!(StepResult::new(0, 0).is_stalled());
        assert!(!StepResult::new(1, 0).is_stalled());
        assert!(!StepResult::new(0, 1).is_stalled());
    }

    proptest! {
        #[test]
        fn test_encode_is_never_negative(consumed in 0..=StepResult::MAX_CONSUMED, produced: u32) {
            let raw = StepResult::new(consumed, produced).encode();
            prop_assert!(raw >= 0);
            prop_assert_eq!(StepResult::decode(raw), Ok(StepResult::new(consumed, produced)));
        }

        #[test]
        fn test_error_codes_survive(code in 1u64..=i64::MAX as u64) {
            prop_assert_eq!(StepResult::decode(StepResult::encode_error(code)), Err(code));
        }
    }
}
