use static_assertions::assert_eq_size;

use crate::entry::{CortexM, IapEntry, Interrupts, RomEntry};
use crate::policy::InterruptPolicy;
use crate::status::IapStatus;
use crate::types::{BootCodeVersion, NonBlankWord, PartId, Uid};

pub const COMMAND_WORDS: usize = 5;
pub const RESULT_WORDS: usize = 5;

/// Word 0 is the opcode, words 1 to 4 are its arguments.
pub type CommandBlock = [u32; COMMAND_WORDS];
/// Word 0 is the status code, the rest is command specific.
pub type ResultBlock = [u32; RESULT_WORDS];

assert_eq_size!(CommandBlock, [u8; 20]);
assert_eq_size!(ResultBlock, [u8; 20]);

#[repr(u32)]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Opcode {
    PrepareSectors = 50,
    CopyRamToFlash = 51,
    EraseSectors = 52,
    BlankCheckSectors = 53,
    ReadPartId = 54,
    ReadBootCodeVersion = 55,
    Compare = 56,
    ReinvokeIsp = 57,
    ReadUid = 58,
    ErasePage = 59,
    EepromWrite = 61,
    EepromRead = 62,
}

assert_eq_size!(Opcode, u32);

impl From<Opcode> for u32 {
    fn from(opcode: Opcode) -> u32 {
        opcode as u32
    }
}

/// Sector and page numbers are inclusive; a range that ends before it starts
/// never reaches the ROM.
#[inline]
fn check_range(opcode: Opcode, start: u32, end: u32) -> Result<(), IapStatus> {
    if end < start {
        #[cfg(feature = "defmt")]
        defmt::debug!("IAP {}: range {}..={} is reversed", opcode, start, end);
        #[cfg(not(feature = "defmt"))]
        let _ = opcode;
        Err(IapStatus::InvalidParam)
    } else {
        Ok(())
    }
}

/// Access to the IAP commands of the boot ROM.
///
/// Every command returns the ROM's status code as is. Nothing is retried: if
/// an erase reports [`IapStatus::SectorNotPreparedForWriteOperation`], it is
/// up to the caller to prepare the sectors again.
///
/// Commands that need the core clock get it in kHz, derived from the
/// frequency given at construction. A wrong value is not detected by the ROM,
/// it just programs or erases with the wrong timing.
pub struct Iap<E, I = CortexM> {
    entry: E,
    interrupts: I,
    policy: InterruptPolicy,
    core_clock_hz: u32,
}

impl Iap<RomEntry, CortexM> {
    /// Shim over the ROM of the running chip.
    ///
    /// # Safety
    ///
    /// See [`RomEntry::new`].
    pub unsafe fn rom(core_clock_hz: u32) -> Self {
        Iap::new(RomEntry::new(), CortexM, core_clock_hz)
    }
}

impl<E: IapEntry, I: Interrupts> Iap<E, I> {
    pub fn new(entry: E, interrupts: I, core_clock_hz: u32) -> Self {
        Iap {
            entry,
            interrupts,
            policy: InterruptPolicy::default(),
            core_clock_hz,
        }
    }

    /// Replaces the set of commands that run with interrupts masked.
    pub fn with_policy(mut self, policy: InterruptPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> InterruptPolicy {
        self.policy
    }

    pub fn core_clock_hz(&self) -> u32 {
        self.core_clock_hz
    }

    /// Must be called whenever the main clock is reconfigured.
    pub fn set_core_clock_hz(&mut self, core_clock_hz: u32) {
        self.core_clock_hz = core_clock_hz;
    }

    pub fn entry(&self) -> &E {
        &self.entry
    }

    pub fn entry_mut(&mut self) -> &mut E {
        &mut self.entry
    }

    pub fn release(self) -> (E, I) {
        (self.entry, self.interrupts)
    }

    #[inline(always)]
    fn clock_khz(&self) -> u32 {
        self.core_clock_hz / 1000
    }

    #[inline(always)]
    fn send_iap_command(&mut self, opcode: Opcode, args: [u32; 4]) -> ResultBlock {
        let [a1, a2, a3, a4] = args;
        let cmd_in: CommandBlock = [opcode.into(), a1, a2, a3, a4];
        let mut cmd_out: ResultBlock = [0; RESULT_WORDS];

        let entry = &mut self.entry;
        if self.policy.masks(opcode) {
            self.interrupts.free(|| entry.invoke(&cmd_in, &mut cmd_out));
        } else {
            entry.invoke(&cmd_in, &mut cmd_out);
        }

        #[cfg(feature = "defmt")]
        defmt::trace!("IAP {} -> {}", opcode, IapStatus::from(cmd_out[0]));

        cmd_out
    }

    fn ranged_command(&mut self, opcode: Opcode, start: u32, end: u32, arg3: u32) -> IapStatus {
        if let Err(status) = check_range(opcode, start, end) {
            return status;
        }
        let cmd_out = self.send_iap_command(opcode, [start, end, arg3, 0]);
        IapStatus::from(cmd_out[0])
    }

    /// Unlocks sectors `start_sector..=end_sector` for the next erase or
    /// program command. The ROM locks them again once that command succeeds.
    pub fn prepare_sectors(&mut self, start_sector: u32, end_sector: u32) -> IapStatus {
        self.ranged_command(Opcode::PrepareSectors, start_sector, end_sector, 0)
    }

    /// Programs `byte_count` bytes from RAM at `ram_src` to flash at
    /// `flash_dst`. The target sectors must have been prepared.
    ///
    /// The ROM expects `flash_dst` on a 256 byte boundary, `ram_src` word
    /// aligned and `byte_count` a multiple of 256; violations come back as a
    /// status code, nothing is checked here.
    ///
    /// # Safety
    ///
    /// `ram_src..ram_src + byte_count` must be readable, and the destination
    /// must not hold code or data the program still relies on.
    pub unsafe fn copy_ram_to_flash(
        &mut self,
        flash_dst: u32,
        ram_src: u32,
        byte_count: u32,
    ) -> IapStatus {
        let clock_khz = self.clock_khz();
        let cmd_out = self.send_iap_command(
            Opcode::CopyRamToFlash,
            [flash_dst, ram_src, byte_count, clock_khz],
        );
        IapStatus::from(cmd_out[0])
    }

    /// Erases sectors `start_sector..=end_sector`, which must have been
    /// prepared.
    pub fn erase_sectors(&mut self, start_sector: u32, end_sector: u32) -> IapStatus {
        let clock_khz = self.clock_khz();
        self.ranged_command(Opcode::EraseSectors, start_sector, end_sector, clock_khz)
    }

    /// Erases 256 byte pages `start_page..=end_page`. The sectors holding
    /// them must have been prepared.
    pub fn erase_page(&mut self, start_page: u32, end_page: u32) -> IapStatus {
        let clock_khz = self.clock_khz();
        self.ranged_command(Opcode::ErasePage, start_page, end_page, clock_khz)
    }

    /// Checks that sectors `start_sector..=end_sector` are erased.
    ///
    /// On [`IapStatus::SectorNotBlank`] the first offending word is stored in
    /// `first_non_blank`. It is left alone for every other status.
    pub fn blank_check_sectors(
        &mut self,
        start_sector: u32,
        end_sector: u32,
        first_non_blank: &mut NonBlankWord,
    ) -> IapStatus {
        if let Err(status) = check_range(Opcode::BlankCheckSectors, start_sector, end_sector) {
            return status;
        }
        let cmd_out = self.send_iap_command(Opcode::BlankCheckSectors, [start_sector, end_sector, 0, 0]);
        let status = IapStatus::from(cmd_out[0]);
        if status == IapStatus::SectorNotBlank {
            *first_non_blank = NonBlankWord {
                offset: cmd_out[1],
                contents: cmd_out[2],
            };
        }
        status
    }

    pub fn read_part_id(&mut self) -> (IapStatus, PartId) {
        let cmd_out = self.send_iap_command(Opcode::ReadPartId, [0; 4]);
        (IapStatus::from(cmd_out[0]), PartId(cmd_out[1]))
    }

    pub fn read_boot_version(&mut self) -> (IapStatus, BootCodeVersion) {
        let cmd_out = self.send_iap_command(Opcode::ReadBootCodeVersion, [0; 4]);
        (
            IapStatus::from(cmd_out[0]),
            BootCodeVersion::from_raw(cmd_out[1]),
        )
    }

    /// Compares `byte_count` bytes at `dst` and `src`. `byte_count` has to be
    /// a multiple of 4.
    ///
    /// On [`IapStatus::CompareError`] the offset of the first mismatch is
    /// stored in `mismatch_offset`, if one was given.
    pub fn compare(
        &mut self,
        dst: u32,
        src: u32,
        byte_count: u32,
        mismatch_offset: Option<&mut u32>,
    ) -> IapStatus {
        let cmd_out = self.send_iap_command(Opcode::Compare, [dst, src, byte_count, 0]);
        let status = IapStatus::from(cmd_out[0]);
        if status == IapStatus::CompareError {
            if let Some(offset) = mismatch_offset {
                *offset = cmd_out[1];
            }
        }
        status
    }

    /// Hands control to the ISP bootloader. On a working part this does not
    /// come back; if it does, whatever the ROM reported is dropped.
    pub fn reinvoke_isp(&mut self) {
        let _ = self.send_iap_command(Opcode::ReinvokeIsp, [0; 4]);
    }

    pub fn read_uid(&mut self) -> (IapStatus, Uid) {
        let cmd_out = self.send_iap_command(Opcode::ReadUid, [0; 4]);
        (
            IapStatus::from(cmd_out[0]),
            Uid([cmd_out[1], cmd_out[2], cmd_out[3], cmd_out[4]]),
        )
    }

    /// Writes `data` to the on-chip EEPROM at `eeprom_addr`.
    pub fn eeprom_write(&mut self, eeprom_addr: u32, data: &[u8]) -> IapStatus {
        let clock_khz = self.clock_khz();
        let cmd_out = self.send_iap_command(
            Opcode::EepromWrite,
            [
                eeprom_addr,
                data.as_ptr() as usize as u32,
                data.len() as u32,
                clock_khz,
            ],
        );
        IapStatus::from(cmd_out[0])
    }

    /// Fills `data` from the on-chip EEPROM starting at `eeprom_addr`.
    pub fn eeprom_read(&mut self, eeprom_addr: u32, data: &mut [u8]) -> IapStatus {
        let clock_khz = self.clock_khz();
        let cmd_out = self.send_iap_command(
            Opcode::EepromRead,
            [
                eeprom_addr,
                data.as_mut_ptr() as usize as u32,
                data.len() as u32,
                clock_khz,
            ],
        );
        IapStatus::from(cmd_out[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Unmasked;

    /// Remembers the last command and answers with a canned result block.
    #[derive(Default)]
    struct Canned {
        commands: Vec<CommandBlock>,
        reply: ResultBlock,
    }

    impl IapEntry for Canned {
        fn invoke(&mut self, command: &CommandBlock, result: &mut ResultBlock) {
            self.commands.push(*command);
            *result = self.reply;
        }
    }

    fn iap(reply: ResultBlock) -> Iap<Canned, Unmasked> {
        Iap::new(
            Canned {
                reply,
                ..Canned::default()
            },
            Unmasked,
            48_000_000,
        )
    }

    #[test]
    fn opcode_values() {
        assert_eq!(u32::from(Opcode::PrepareSectors), 50);
        assert_eq!(u32::from(Opcode::CopyRamToFlash), 51);
        assert_eq!(u32::from(Opcode::EraseSectors), 52);
        assert_eq!(u32::from(Opcode::BlankCheckSectors), 53);
        assert_eq!(u32::from(Opcode::ReadPartId), 54);
        assert_eq!(u32::from(Opcode::ReadBootCodeVersion), 55);
        assert_eq!(u32::from(Opcode::Compare), 56);
        assert_eq!(u32::from(Opcode::ReinvokeIsp), 57);
        assert_eq!(u32::from(Opcode::ReadUid), 58);
        assert_eq!(u32::from(Opcode::ErasePage), 59);
        assert_eq!(u32::from(Opcode::EepromWrite), 61);
        assert_eq!(u32::from(Opcode::EepromRead), 62);
    }

    #[test]
    fn copy_ram_to_flash_layout() {
        let mut iap = iap([0; 5]);
        let status = unsafe { iap.copy_ram_to_flash(0x2000, 0x1000_0100, 0x400) };
        assert_eq!(status, IapStatus::Success);
        assert_eq!(
            iap.entry().commands,
            [[51, 0x2000, 0x1000_0100, 0x400, 48_000]]
        );
    }

    #[test]
    fn copy_ram_to_flash_does_not_check_alignment() {
        let mut iap = iap([u32::from(IapStatus::DstAddrError), 0, 0, 0, 0]);
        let status = unsafe { iap.copy_ram_to_flash(0x2001, 0x1000_0003, 7) };
        assert_eq!(status, IapStatus::DstAddrError);
        assert_eq!(iap.entry().commands.len(), 1);
    }

    #[test]
    fn erase_page_layout() {
        let mut iap = iap([0; 5]);
        assert_eq!(iap.erase_page(16, 31), IapStatus::Success);
        assert_eq!(iap.entry().commands, [[59, 16, 31, 48_000, 0]]);
    }

    #[test]
    fn compare_layout() {
        let mut iap = iap([0; 5]);
        assert_eq!(iap.compare(0x3000, 0x1000_0000, 256, None), IapStatus::Success);
        assert_eq!(iap.entry().commands, [[56, 0x3000, 0x1000_0000, 256, 0]]);
    }

    #[test]
    fn argumentless_commands() {
        let mut iap = iap([0, 0x0000_1234, 0, 0, 0]);
        let (status, part) = iap.read_part_id();
        assert_eq!(status, IapStatus::Success);
        assert_eq!(part, PartId(0x1234));
        iap.read_boot_version();
        iap.read_uid();
        iap.reinvoke_isp();
        assert_eq!(
            iap.entry().commands,
            [[54, 0, 0, 0, 0], [55, 0, 0, 0, 0], [58, 0, 0, 0, 0], [57, 0, 0, 0, 0]]
        );
    }

    #[test]
    fn part_id_is_returned_whatever_the_status() {
        let mut iap = iap([u32::from(IapStatus::Busy), 0x2954_0000, 0, 0, 0]);
        assert_eq!(iap.read_part_id(), (IapStatus::Busy, PartId(0x2954_0000)));
    }

    #[test]
    fn eeprom_layout() {
        let mut iap = iap([0; 5]);
        let mut buf = [0u8; 12];
        assert_eq!(iap.eeprom_read(0x500, &mut buf), IapStatus::Success);
        let read_ptr = buf.as_ptr() as usize as u32;
        let data = [0x5a, 0xa5, 0, 0];
        assert_eq!(iap.eeprom_write(0, &data), IapStatus::Success);
        let write_ptr = data.as_ptr() as usize as u32;
        assert_eq!(
            iap.entry().commands,
            [[62, 0x500, read_ptr, 12, 48_000], [61, 0, write_ptr, 4, 48_000]]
        );
    }

    #[test]
    fn clock_follows_reconfiguration() {
        let mut iap = iap([0; 5]);
        iap.set_core_clock_hz(12_000_000);
        assert_eq!(iap.core_clock_hz(), 12_000_000);
        iap.erase_sectors(0, 0);
        assert_eq!(iap.entry().commands, [[52, 0, 0, 12_000, 0]]);
    }

    #[test]
    fn sub_khz_remainder_is_truncated() {
        let mut iap = iap([0; 5]);
        iap.set_core_clock_hz(12_345_999);
        iap.erase_page(0, 0);
        assert_eq!(iap.entry().commands[0][3], 12_345);
    }
}
