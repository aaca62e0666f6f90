//! Sticky floating-point exception flags.
//!
//! The hardware exception register is process-global, per-thread mutable
//! state. This module never hands that register to callers directly: all
//! access goes through [`Fexcept`], a value-typed snapshot. Mutation of the
//! live register only happens inside the scoped operations here
//! (clear-then-capture, restore-then-test), so callers cannot observe an
//! inconsistent intermediate state.
//!
//! Flag words use a portable bit layout (the `FE_*` constants below) and are
//! translated to the hardware layout at the register boundary: MXCSR on
//! x86_64, FPSR on aarch64. On other targets exception tracking is
//! unavailable and every capture is inert.

/// Division of a finite nonzero value by zero.
pub const FE_DIVBYZERO: u32 = 1 << 0;
/// A result had to be rounded.
pub const FE_INEXACT: u32 = 1 << 1;
/// An operation had no meaningful result (NaN produced).
pub const FE_INVALID: u32 = 1 << 2;
/// A result was too large in magnitude for the type.
pub const FE_OVERFLOW: u32 = 1 << 3;
/// A result was subnormal or zero due to limited range.
pub const FE_UNDERFLOW: u32 = 1 << 4;
/// All five tracked exception flags.
pub const FE_ALL_EXCEPT: u32 = 0x1f;

/// Canonical flag order used for classification and label generation.
///
/// The order is load-bearing: the first single flag found in a flag word
/// decides the label (see [`classify`]).
const HW_FLAGS: [(u32, &str); 5] = [
    (FE_DIVBYZERO, "divide-by-zero"),
    (FE_INEXACT, "inexact"),
    (FE_INVALID, "invalid"),
    (FE_OVERFLOW, "overflow"),
    (FE_UNDERFLOW, "underflow"),
];

/// A snapshot of the sticky floating-point exception flags.
///
/// Captures are plain values: copying or storing them never touches the
/// hardware register. [`Fexcept::any`] and [`Fexcept::label`] restore the
/// capture into the register before testing, mirroring the save/restore
/// discipline required by sticky flag registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fexcept {
    flags: u32,
}

impl Fexcept {
    /// Whether this target exposes sticky exception flags at all.
    pub fn supported() -> bool {
        hw::SUPPORTED
    }

    /// Clears all pending exception flags, then snapshots the now-clear
    /// state. No-op (with an empty snapshot) when tracking is unsupported.
    pub fn clear() -> Self {
        hw::write_flags(0);
        Self {
            flags: hw::read_flags(),
        }
    }

    /// Snapshots the currently sticky flags restricted to `mask`.
    pub fn store(mask: u32) -> Self {
        Self {
            flags: hw::read_flags() & mask & FE_ALL_EXCEPT,
        }
    }

    /// Builds a capture from an explicit flag word. Used to join flag state
    /// collected on other threads, and by tests.
    pub fn from_bits(flags: u32) -> Self {
        Self {
            flags: flags & FE_ALL_EXCEPT,
        }
    }

    /// The portable flag word of this capture.
    pub fn bits(&self) -> u32 {
        self.flags
    }

    /// Restores this capture into the hardware register.
    pub fn restore(&self) {
        hw::write_flags(self.flags);
    }

    /// Restores this capture, then reports whether any flag in `mask` is set.
    pub fn any(&self, mask: u32) -> bool {
        if !hw::SUPPORTED {
            return false;
        }
        self.restore();
        hw::read_flags() & mask != 0
    }

    /// Restores this capture, then renders it as a canonical label.
    ///
    /// Returns `"disabled"` when tracking is unsupported, `"none"` when no
    /// flag is set, and otherwise the first matching rule from the ordered
    /// rule list (see [`classify`]).
    pub fn label(&self) -> String {
        if !hw::SUPPORTED {
            return "disabled".to_string();
        }
        self.restore();
        let word = hw::read_flags() & FE_ALL_EXCEPT;
        classify(word, &HW_FLAGS).unwrap_or_else(|| "none".to_string())
    }
}

/// Classifies a flag word against an ordered, generated rule list.
///
/// Rules are every non-empty combination of `flags`, ordered by size and
/// then lexicographically by flag position; a rule's label joins its flag
/// names with commas. Each rule matches when *any* of its flags is present
/// (disjunctive membership, the way `fetestexcept` tests a mask), so a
/// single-flag rule wins whenever any tracked flag is set and the compound
/// rules are unreachable for tracked words. Both the rule order and the
/// membership test are part of the label contract.
///
/// Returns `None` when no tracked flag is present.
pub(crate) fn classify(word: u32, flags: &[(u32, &'static str)]) -> Option<String> {
    let n = flags.len();
    for size in 1..=n {
        let mut combo: Vec<usize> = (0..size).collect();
        loop {
            let mask = combo.iter().fold(0u32, |m, &i| m | flags[i].0);
            if word & mask != 0 {
                let label: Vec<&str> = combo.iter().map(|&i| flags[i].1).collect();
                return Some(label.join(","));
            }
            if !next_combination(&mut combo, n) {
                break;
            }
        }
    }
    None
}

/// Advances `combo` to the next k-combination of `0..n` in lexicographic
/// order. Returns `false` when the last combination has been passed.
fn next_combination(combo: &mut [usize], n: usize) -> bool {
    let k = combo.len();
    let mut i = k;
    while i > 0 {
        i -= 1;
        if combo[i] < i + n - k {
            combo[i] += 1;
            for j in i + 1..k {
                combo[j] = combo[j - 1] + 1;
            }
            return true;
        }
    }
    false
}

// ─── Hardware register access ────────────────────────────────────────────────
//
// Arch-specific reads and writes of the sticky flag register, translating
// between the portable FE_* layout and the hardware layout. rustc assumes the
// default floating-point environment, so flag state observed here is
// best-effort; the same caveat applies to any fenv-based tool.

#[cfg(target_arch = "x86_64")]
pub(crate) mod hw {
    use super::{FE_DIVBYZERO, FE_INEXACT, FE_INVALID, FE_OVERFLOW, FE_UNDERFLOW};
    use std::arch::asm;

    pub(crate) const SUPPORTED: bool = true;

    // MXCSR exception flag bits.
    const MXCSR_IE: u32 = 1 << 0; // invalid
    const MXCSR_ZE: u32 = 1 << 2; // divide-by-zero
    const MXCSR_OE: u32 = 1 << 3; // overflow
    const MXCSR_UE: u32 = 1 << 4; // underflow
    const MXCSR_PE: u32 = 1 << 5; // inexact
    const MXCSR_FLAGS: u32 = 0x3f; // includes DE (denormal), which is not tracked

    /// Reads the MXCSR control/status register.
    pub(crate) fn read_csr() -> u32 {
        let mut csr: u32 = 0;
        // SAFETY: STMXCSR writes 32 bits to the given memory operand. Rust
        // floating-point arithmetic on x86_64 is SSE-based, so MXCSR is the
        // register holding the sticky flags.
        unsafe {
            asm!("stmxcsr [{}]", in(reg) &mut csr as *mut u32, options(nostack, preserves_flags));
        }
        csr
    }

    /// Writes the MXCSR control/status register.
    pub(crate) fn write_csr(csr: u32) {
        // SAFETY: LDMXCSR loads 32 bits from the given memory operand. All
        // bit patterns produced by masking a previously read MXCSR value are
        // valid.
        unsafe {
            asm!("ldmxcsr [{}]", in(reg) &csr as *const u32, options(nostack, preserves_flags));
        }
    }

    pub(crate) fn read_flags() -> u32 {
        let csr = read_csr();
        let mut flags = 0;
        if csr & MXCSR_ZE != 0 {
            flags |= FE_DIVBYZERO;
        }
        if csr & MXCSR_PE != 0 {
            flags |= FE_INEXACT;
        }
        if csr & MXCSR_IE != 0 {
            flags |= FE_INVALID;
        }
        if csr & MXCSR_OE != 0 {
            flags |= FE_OVERFLOW;
        }
        if csr & MXCSR_UE != 0 {
            flags |= FE_UNDERFLOW;
        }
        flags
    }

    pub(crate) fn write_flags(flags: u32) {
        let mut csr = read_csr() & !MXCSR_FLAGS;
        if flags & FE_DIVBYZERO != 0 {
            csr |= MXCSR_ZE;
        }
        if flags & FE_INEXACT != 0 {
            csr |= MXCSR_PE;
        }
        if flags & FE_INVALID != 0 {
            csr |= MXCSR_IE;
        }
        if flags & FE_OVERFLOW != 0 {
            csr |= MXCSR_OE;
        }
        if flags & FE_UNDERFLOW != 0 {
            csr |= MXCSR_UE;
        }
        write_csr(csr);
    }
}

#[cfg(target_arch = "aarch64")]
pub(crate) mod hw {
    use super::{FE_DIVBYZERO, FE_INEXACT, FE_INVALID, FE_OVERFLOW, FE_UNDERFLOW};
    use std::arch::asm;

    pub(crate) const SUPPORTED: bool = true;

    // FPSR cumulative exception bits.
    const FPSR_IOC: u64 = 1 << 0; // invalid
    const FPSR_DZC: u64 = 1 << 1; // divide-by-zero
    const FPSR_OFC: u64 = 1 << 2; // overflow
    const FPSR_UFC: u64 = 1 << 3; // underflow
    const FPSR_IXC: u64 = 1 << 4; // inexact
    const FPSR_FLAGS: u64 = 0x9f; // includes IDC (input denormal), not tracked

    fn read_fpsr() -> u64 {
        let fpsr: u64;
        // SAFETY: FPSR is readable from EL0 on all AArch64 implementations.
        unsafe {
            asm!("mrs {}, fpsr", out(reg) fpsr, options(nomem, nostack, preserves_flags));
        }
        fpsr
    }

    fn write_fpsr(fpsr: u64) {
        // SAFETY: FPSR is writable from EL0; reserved bits are preserved by
        // only ever modifying the cumulative exception bits.
        unsafe {
            asm!("msr fpsr, {}", in(reg) fpsr, options(nomem, nostack, preserves_flags));
        }
    }

    /// Reads the FPCR control register (rounding mode lives here).
    pub(crate) fn read_fpcr() -> u64 {
        let fpcr: u64;
        // SAFETY: FPCR is readable from EL0.
        unsafe {
            asm!("mrs {}, fpcr", out(reg) fpcr, options(nomem, nostack, preserves_flags));
        }
        fpcr
    }

    /// Writes the FPCR control register.
    pub(crate) fn write_fpcr(fpcr: u64) {
        // SAFETY: FPCR is writable from EL0; callers only modify RMode.
        unsafe {
            asm!("msr fpcr, {}", in(reg) fpcr, options(nomem, nostack, preserves_flags));
        }
    }

    pub(crate) fn read_flags() -> u32 {
        let fpsr = read_fpsr();
        let mut flags = 0;
        if fpsr & FPSR_DZC != 0 {
            flags |= FE_DIVBYZERO;
        }
        if fpsr & FPSR_IXC != 0 {
            flags |= FE_INEXACT;
        }
        if fpsr & FPSR_IOC != 0 {
            flags |= FE_INVALID;
        }
        if fpsr & FPSR_OFC != 0 {
            flags |= FE_OVERFLOW;
        }
        if fpsr & FPSR_UFC != 0 {
            flags |= FE_UNDERFLOW;
        }
        flags
    }

    pub(crate) fn write_flags(flags: u32) {
        let mut fpsr = read_fpsr() & !FPSR_FLAGS;
        if flags & FE_DIVBYZERO != 0 {
            fpsr |= FPSR_DZC;
        }
        if flags & FE_INEXACT != 0 {
            fpsr |= FPSR_IXC;
        }
        if flags & FE_INVALID != 0 {
            fpsr |= FPSR_IOC;
        }
        if flags & FE_OVERFLOW != 0 {
            fpsr |= FPSR_OFC;
        }
        if flags & FE_UNDERFLOW != 0 {
            fpsr |= FPSR_UFC;
        }
        write_fpsr(fpsr);
    }
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
pub(crate) mod hw {
    pub(crate) const SUPPORTED: bool = false;

    pub(crate) fn read_flags() -> u32 {
        0
    }

    pub(crate) fn write_flags(_flags: u32) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hint::black_box;

    #[test]
    fn test_single_flag_labels() {
        if !Fexcept::supported() {
            assert_eq!(Fexcept::from_bits(FE_OVERFLOW).label(), "disabled");
            return;
        }
        assert_eq!(Fexcept::from_bits(FE_DIVBYZERO).label(), "divide-by-zero");
        assert_eq!(Fexcept::from_bits(FE_INEXACT).label(), "inexact");
        assert_eq!(Fexcept::from_bits(FE_INVALID).label(), "invalid");
        assert_eq!(Fexcept::from_bits(FE_OVERFLOW).label(), "overflow");
        assert_eq!(Fexcept::from_bits(FE_UNDERFLOW).label(), "underflow");
    }

    #[test]
    fn test_no_flags_label_is_none() {
        if !Fexcept::supported() {
            return;
        }
        assert_eq!(Fexcept::from_bits(0).label(), "none");
    }

    #[test]
    fn test_priority_collision() {
        // Regression guard for the precedence behavior: when several flags
        // are set, the first single-flag rule in canonical order wins and no
        // compound label is ever produced.
        assert_eq!(
            classify(FE_DIVBYZERO | FE_UNDERFLOW, &HW_FLAGS).unwrap(),
            "divide-by-zero"
        );
        assert_eq!(
            classify(FE_OVERFLOW | FE_UNDERFLOW, &HW_FLAGS).unwrap(),
            "overflow"
        );
        assert_eq!(
            classify(FE_INEXACT | FE_INVALID | FE_UNDERFLOW, &HW_FLAGS).unwrap(),
            "inexact"
        );
    }

    #[test]
    fn test_classify_none() {
        assert_eq!(classify(0, &HW_FLAGS), None);
    }

    #[test]
    fn test_rule_order_is_table_order() {
        // Singles are tried in table order before any compound rule, and a
        // word containing an earlier flag matches the earlier rule.
        let table: [(u32, &'static str); 2] = [(0x100, "a"), (0x200, "b")];
        assert_eq!(classify(0x200, &table).unwrap(), "b");
        assert_eq!(classify(0x300, &table).unwrap(), "a");
    }

    #[test]
    fn test_next_combination_sequence() {
        let mut combo = vec![0usize, 1];
        let mut seen = vec![combo.clone()];
        while next_combination(&mut combo, 4) {
            seen.push(combo.clone());
        }
        assert_eq!(
            seen,
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3]
            ]
        );
    }

    #[test]
    fn test_clear_then_store_roundtrip() {
        if !Fexcept::supported() {
            return;
        }
        let cleared = Fexcept::clear();
        assert_eq!(cleared.bits(), 0);

        // Raise "invalid" at runtime and observe it through a capture.
        let x = black_box(-1.0f64);
        black_box(x.sqrt());
        let capture = Fexcept::store(FE_ALL_EXCEPT);
        assert!(capture.bits() & FE_INVALID != 0);
        assert!(capture.any(FE_INVALID));

        // Restricting the mask drops the flag from the snapshot.
        capture.restore();
        let masked = Fexcept::store(FE_ALL_EXCEPT & !FE_INVALID);
        assert!(masked.bits() & FE_INVALID == 0);

        Fexcept::clear();
    }
}
