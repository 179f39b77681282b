//! Bindings to the In-Application Programming routines of the LPC11xx boot ROM.
//!
//! The ROM exposes a single entry point that takes a five word command block
//! and fills in a result block. [`Iap`] builds those blocks for every
//! supported command, calls the entry point and hands the ROM's status code
//! back untouched.
//!
//! ```no_run
//! use lpc11xx_iap::Iap;
//!
//! let mut iap = unsafe { Iap::rom(48_000_000) };
//! let erased = iap
//!     .prepare_sectors(3, 3)
//!     .into_result()
//!     .and_then(|_| iap.erase_sectors(3, 3).into_result());
//! assert_eq!(erased, Ok(()));
//! ```

#![cfg_attr(not(test), no_std)]

pub mod entry;
pub mod iap;
pub mod policy;
pub mod status;
pub mod types;

pub use entry::{CortexM, IapEntry, Interrupts, RomEntry, Unmasked};
pub use iap::{CommandBlock, Iap, Opcode, ResultBlock};
pub use policy::InterruptPolicy;
pub use status::IapStatus;
pub use types::{BootCodeVersion, NonBlankWord, PartId, Uid};
