use bitflags::bitflags;

use crate::iap::Opcode;

bitflags! {
    /// Commands that run with interrupts masked.
    ///
    /// The default set brackets prepare, part ID, UID and the EEPROM commands
    /// only. Erase, program, blank check, compare, boot version and ISP
    /// re-entry run with interrupts enabled unless the caller opts in.
    pub struct InterruptPolicy: u16 {
        const PREPARE_SECTORS     = 1 << 0;
        const COPY_RAM_TO_FLASH   = 1 << 1;
        const ERASE_SECTORS       = 1 << 2;
        const BLANK_CHECK_SECTORS = 1 << 3;
        const READ_PART_ID        = 1 << 4;
        const READ_BOOT_VERSION   = 1 << 5;
        const COMPARE             = 1 << 6;
        const REINVOKE_ISP        = 1 << 7;
        const READ_UID            = 1 << 8;
        const ERASE_PAGE          = 1 << 9;
        const EEPROM_WRITE        = 1 << 11;
        const EEPROM_READ         = 1 << 12;
    }
}

impl InterruptPolicy {
    #[inline]
    pub fn masks(self, opcode: Opcode) -> bool {
        self.contains(InterruptPolicy::from(opcode))
    }
}

impl Default for InterruptPolicy {
    fn default() -> Self {
        InterruptPolicy::PREPARE_SECTORS
            | InterruptPolicy::READ_PART_ID
            | InterruptPolicy::READ_UID
            | InterruptPolicy::EEPROM_WRITE
            | InterruptPolicy::EEPROM_READ
    }
}

impl From<Opcode> for InterruptPolicy {
    fn from(opcode: Opcode) -> InterruptPolicy {
        match opcode {
            Opcode::PrepareSectors => InterruptPolicy::PREPARE_SECTORS,
            Opcode::CopyRamToFlash => InterruptPolicy::COPY_RAM_TO_FLASH,
            Opcode::EraseSectors => InterruptPolicy::ERASE_SECTORS,
            Opcode::BlankCheckSectors => InterruptPolicy::BLANK_CHECK_SECTORS,
            Opcode::ReadPartId => InterruptPolicy::READ_PART_ID,
            Opcode::ReadBootCodeVersion => InterruptPolicy::READ_BOOT_VERSION,
            Opcode::Compare => InterruptPolicy::COMPARE,
            Opcode::ReinvokeIsp => InterruptPolicy::REINVOKE_ISP,
            Opcode::ReadUid => InterruptPolicy::READ_UID,
            Opcode::ErasePage => InterruptPolicy::ERASE_PAGE,
            Opcode::EepromWrite => InterruptPolicy::EEPROM_WRITE,
            Opcode::EepromRead => InterruptPolicy::EEPROM_READ,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::InterruptPolicy;
    use crate::iap::Opcode;

    #[test]
    fn default_brackets() {
        let policy = InterruptPolicy::default();
        assert!(policy.masks(Opcode::PrepareSectors));
        assert!(policy.masks(Opcode::ReadPartId));
        assert!(policy.masks(Opcode::ReadUid));
        assert!(policy.masks(Opcode::EepromRead));
        assert!(!policy.masks(Opcode::EraseSectors));
        assert!(!policy.masks(Opcode::ErasePage));
        assert!(!policy.masks(Opcode::CopyRamToFlash));
        assert!(!policy.masks(Opcode::ReadBootCodeVersion));
        assert!(!policy.masks(Opcode::Compare));
    }

    #[test]
    fn one_flag_per_opcode() {
        let all = [
            Opcode::PrepareSectors,
            Opcode::CopyRamToFlash,
            Opcode::EraseSectors,
            Opcode::BlankCheckSectors,
            Opcode::ReadPartId,
            Opcode::ReadBootCodeVersion,
            Opcode::Compare,
            Opcode::ReinvokeIsp,
            Opcode::ReadUid,
            Opcode::ErasePage,
            Opcode::EepromWrite,
            Opcode::EepromRead,
        ];
        let mut seen = InterruptPolicy::empty();
        for opcode in all {
            let flag = InterruptPolicy::from(opcode);
            assert_eq!(flag.bits().count_ones(), 1);
            assert!(!seen.intersects(flag));
            seen |= flag;
        }
        assert_eq!(seen, InterruptPolicy::all());
    }
}
