/// Status code found in word 0 of the IAP result block.
///
/// Converting a `u32` into an `IapStatus` and back always yields the original
/// value, so codes the ROM of a particular part defines beyond the ones listed
/// here travel through [`IapStatus::Other`] unchanged.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IapStatus {
    Success,
    InvalidCommand,
    SrcAddrError,
    DstAddrError,
    SrcAddrNotMapped,
    DstAddrNotMapped,
    CountError,
    InvalidSector,
    SectorNotBlank,
    SectorNotPreparedForWriteOperation,
    CompareError,
    Busy,
    /// Also reported by the shim itself when a sector or page range ends
    /// before it starts.
    InvalidParam,
    AddrError,
    AddrNotMapped,
    CmdLocked,
    InvalidCode,
    InvalidBaudRate,
    InvalidStopBit,
    CodeReadProtectionEnabled,
    Other(u32),
}

impl IapStatus {
    #[inline]
    pub fn is_success(self) -> bool {
        self == IapStatus::Success
    }

    /// `Ok(())` on success, the status itself otherwise.
    #[inline]
    pub fn into_result(self) -> Result<(), IapStatus> {
        match self {
            IapStatus::Success => Ok(()),
            status => Err(status),
        }
    }
}

impl From<u32> for IapStatus {
    fn from(code: u32) -> IapStatus {
        match code {
            0 => IapStatus::Success,
            1 => IapStatus::InvalidCommand,
            2 => IapStatus::SrcAddrError,
            3 => IapStatus::DstAddrError,
            4 => IapStatus::SrcAddrNotMapped,
            5 => IapStatus::DstAddrNotMapped,
            6 => IapStatus::CountError,
            7 => IapStatus::InvalidSector,
            8 => IapStatus::SectorNotBlank,
            9 => IapStatus::SectorNotPreparedForWriteOperation,
            10 => IapStatus::CompareError,
            11 => IapStatus::Busy,
            12 => IapStatus::InvalidParam,
            13 => IapStatus::AddrError,
            14 => IapStatus::AddrNotMapped,
            15 => IapStatus::CmdLocked,
            16 => IapStatus::InvalidCode,
            17 => IapStatus::InvalidBaudRate,
            18 => IapStatus::InvalidStopBit,
            19 => IapStatus::CodeReadProtectionEnabled,
            n => IapStatus::Other(n),
        }
    }
}

impl From<IapStatus> for u32 {
    fn from(status: IapStatus) -> u32 {
        match status {
            IapStatus::Success => 0,
            IapStatus::InvalidCommand => 1,
            IapStatus::SrcAddrError => 2,
            IapStatus::DstAddrError => 3,
            IapStatus::SrcAddrNotMapped => 4,
            IapStatus::DstAddrNotMapped => 5,
            IapStatus::CountError => 6,
            IapStatus::InvalidSector => 7,
            IapStatus::SectorNotBlank => 8,
            IapStatus::SectorNotPreparedForWriteOperation => 9,
            IapStatus::CompareError => 10,
            IapStatus::Busy => 11,
            IapStatus::InvalidParam => 12,
            IapStatus::AddrError => 13,
            IapStatus::AddrNotMapped => 14,
            IapStatus::CmdLocked => 15,
            IapStatus::InvalidCode => 16,
            IapStatus::InvalidBaudRate => 17,
            IapStatus::InvalidStopBit => 18,
            IapStatus::CodeReadProtectionEnabled => 19,
            IapStatus::Other(n) => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::IapStatus;

    #[test]
    fn every_code_survives_the_round_trip() {
        for code in (0..64).chain([0x7fff_ffff, u32::MAX]) {
            assert_eq!(u32::from(IapStatus::from(code)), code);
        }
    }

    #[test]
    fn known_codes() {
        assert_eq!(IapStatus::from(0), IapStatus::Success);
        assert_eq!(IapStatus::from(8), IapStatus::SectorNotBlank);
        assert_eq!(IapStatus::from(10), IapStatus::CompareError);
        assert_eq!(IapStatus::from(12), IapStatus::InvalidParam);
        assert_eq!(IapStatus::from(20), IapStatus::Other(20));
    }

    #[test]
    fn into_result() {
        assert_eq!(IapStatus::Success.into_result(), Ok(()));
        assert_eq!(IapStatus::Busy.into_result(), Err(IapStatus::Busy));
        assert!(!IapStatus::Other(0x42).is_success());
    }
}
