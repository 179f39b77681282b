//! The two outside capabilities the shim relies on: the ROM entry point itself
//! and the ability to mask interrupts around a call into it.

use crate::iap::{CommandBlock, ResultBlock};

/// Address of the IAP entry point in the boot ROM. The low bit is set because
/// the routine is Thumb code.
pub const IAP_LOCATION: usize = 0x1fff_1ff1;

type IapFn = unsafe extern "C" fn(command: *const u32, result: *mut u32);

/// Something that can execute an IAP command block.
///
/// On hardware this is [`RomEntry`]. Anything else (a test double, a
/// simulator) only has to fill in `result` the way the ROM would.
pub trait IapEntry {
    fn invoke(&mut self, command: &CommandBlock, result: &mut ResultBlock);
}

/// The IAP routine burned into the boot ROM.
#[derive(Debug)]
pub struct RomEntry {
    _private: (),
}

impl RomEntry {
    /// # Safety
    ///
    /// The caller must be running on an LPC11xx part whose boot ROM provides
    /// the IAP entry point at [`IAP_LOCATION`]. Commands that erase or program
    /// flash must not touch the sectors the running code executes from.
    pub const unsafe fn new() -> Self {
        RomEntry { _private: () }
    }
}

impl IapEntry for RomEntry {
    #[inline(always)]
    fn invoke(&mut self, command: &CommandBlock, result: &mut ResultBlock) {
        // SAFETY: RomEntry only exists on parts that have the ROM routine, and
        // both blocks are large enough for every command the ROM knows.
        unsafe {
            let entryfn: IapFn = core::mem::transmute(IAP_LOCATION);
            entryfn(command.as_ptr(), result.as_mut_ptr());
        }
    }
}

/// Masks interrupts for the duration of a closure.
pub trait Interrupts {
    fn free<R>(&mut self, f: impl FnOnce() -> R) -> R;
}

/// Masks interrupts through PRIMASK.
#[derive(Debug, Default, Clone, Copy)]
pub struct CortexM;

impl Interrupts for CortexM {
    #[inline(always)]
    fn free<R>(&mut self, f: impl FnOnce() -> R) -> R {
        cortex_m::interrupt::free(|_| f())
    }
}

/// Runs the closure as is. For hosts and for code that already runs with
/// interrupts disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unmasked;

impl Interrupts for Unmasked {
    #[inline(always)]
    fn free<R>(&mut self, f: impl FnOnce() -> R) -> R {
        f()
    }
}
