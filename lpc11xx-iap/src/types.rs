use bitfield::bitfield;
use static_assertions::assert_eq_size;

/// Part identification number, as read by [`Iap::read_part_id`](crate::Iap::read_part_id).
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PartId(pub u32);

assert_eq_size!(PartId, u32);

bitfield! {
    /// Boot code version word. The ROM packs the major number in bits 15:8
    /// and the minor number in bits 7:0.
    #[repr(transparent)]
    #[derive(Copy, Clone, Eq, PartialEq, Default)]
    pub struct BootCodeVersion(u32);
    impl Debug;
    u8;
    pub major, _: 15, 8;
    pub minor, _: 7, 0;
}

assert_eq_size!(BootCodeVersion, u32);

impl BootCodeVersion {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        BootCodeVersion(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for BootCodeVersion {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=u8}.{=u8}", self.major(), self.minor())
    }
}

/// 128-bit device serial number, in the word order the ROM returns it.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Uid(pub [u32; 4]);

assert_eq_size!(Uid, [u8; 16]);

impl Uid {
    pub fn words(&self) -> &[u32; 4] {
        &self.0
    }
}

/// First word a blank check found not to be erased.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NonBlankWord {
    pub offset: u32,
    pub contents: u32,
}
