//! CAN frame and table descriptor types shared by every variant.

use embedded_can::{ExtendedId, Id, StandardId};

use crate::common::validation::{self, CANFD_MAX_LEN};
use crate::SafetyResult;

/// Identity of one logical message: its address plus the byte length it is
/// expected to carry on this platform revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId {
    pub addr: u32,
    pub len: u8,
}

impl MessageId {
    pub const fn new(addr: u32, len: u8) -> Self {
        Self { addr, len }
    }
}

/// A received or to-be-transmitted CAN (FD) frame.
///
/// The payload buffer is always 64 bytes; anything past `len` reads as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanPacket {
    addr: u32,
    bus: u8,
    extended: bool,
    len: u8,
    data: [u8; CANFD_MAX_LEN],
}

impl CanPacket {
    /// Build a standard-id frame on `bus`.
    ///
    /// # Errors
    /// Returns `SafetyError::InvalidFrameLength` if `payload` is not a valid
    /// CAN-FD length.
    pub fn new(bus: u8, addr: u32, payload: &[u8]) -> SafetyResult<Self> {
        validation::validate_frame_length(payload.len())?;
        let mut data = [0u8; CANFD_MAX_LEN];
        data[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            addr,
            bus,
            extended: addr > StandardId::MAX.as_raw() as u32,
            len: payload.len() as u8,
            data,
        })
    }

    /// Same frame, seen on another bus
    pub fn on_bus(mut self, bus: u8) -> Self {
        self.bus = bus;
        self
    }

    pub fn addr(&self) -> u32 {
        self.addr
    }

    pub fn bus(&self) -> u8 {
        self.bus
    }

    /// Declared payload length (`GET_LEN`)
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn identity(&self) -> MessageId {
        MessageId::new(self.addr, self.len)
    }

    /// Payload bytes up to the declared length
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len()]
    }

    pub fn payload_mut(&mut self) -> &mut [u8] {
        let len = self.len();
        &mut self.data[..len]
    }

    /// Byte at `index`, zero past the declared length
    pub fn byte(&self, index: usize) -> u8 {
        if index < self.len() {
            self.data[index]
        } else {
            0
        }
    }
}

impl embedded_can::Frame for CanPacket {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        let (addr, extended) = match id.into() {
            Id::Standard(id) => (id.as_raw() as u32, false),
            Id::Extended(id) => (id.as_raw(), true),
        };
        if !validation::is_valid_canfd_length(data.len()) {
            return None;
        }
        let mut frame = CanPacket::new(0, addr, data).ok()?;
        frame.extended = extended;
        Some(frame)
    }

    fn new_remote(_id: impl Into<Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        self.extended
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> Id {
        if self.extended {
            ExtendedId::new(self.addr)
                .map(Id::Extended)
                .unwrap_or(Id::Extended(ExtendedId::MAX))
        } else {
            StandardId::new(self.addr as u16)
                .map(Id::Standard)
                .unwrap_or(Id::Standard(StandardId::MAX))
        }
    }

    fn dlc(&self) -> usize {
        self.len()
    }

    fn data(&self) -> &[u8] {
        self.payload()
    }
}

/// Transmit allow-list entry.
///
/// `check_relay` marks messages the controller replaces on the vehicle side;
/// the harness cross-checks them against relayed traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanMsg {
    pub addr: u32,
    pub bus: u8,
    pub len: u8,
    pub check_relay: bool,
}

impl CanMsg {
    pub const fn new(addr: u32, bus: u8, len: u8, check_relay: bool) -> Self {
        Self {
            addr,
            bus,
            len,
            check_relay,
        }
    }

    pub fn matches(&self, frame: &CanPacket) -> bool {
        self.addr == frame.addr() && self.bus == frame.bus() && self.len as usize == frame.len()
    }
}

/// One receive message definition inside an [`RxCheck`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxMsgDef {
    pub addr: u32,
    pub bus: u8,
    pub len: u8,
    /// Highest rolling counter value; 0 disables the continuity check
    pub max_counter: u8,
    pub ignore_checksum: bool,
    pub ignore_quality_flag: bool,
}

impl RxMsgDef {
    /// Zero-filled slot
    pub const UNUSED: RxMsgDef = RxMsgDef {
        addr: 0,
        bus: 0,
        len: 0,
        max_counter: 0,
        ignore_checksum: false,
        ignore_quality_flag: false,
    };

    pub fn is_unused(&self) -> bool {
        *self == Self::UNUSED
    }

    pub fn identity(&self) -> MessageId {
        MessageId::new(self.addr, self.len)
    }
}

/// Alternate definitions of one safety-relevant receive message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxCheck {
    pub msg: [RxMsgDef; 3],
}

impl RxCheck {
    /// Counter- and checksum-protected message on `bus`, quality flag ignored
    pub const fn counted(addr: u32, bus: u8, len: u8, max_counter: u8) -> Self {
        Self {
            msg: [
                RxMsgDef {
                    addr,
                    bus,
                    len,
                    max_counter,
                    ignore_checksum: false,
                    ignore_quality_flag: true,
                },
                RxMsgDef::UNUSED,
                RxMsgDef::UNUSED,
            ],
        }
    }

    pub fn definitions(&self) -> impl Iterator<Item = &RxMsgDef> {
        self.msg.iter().filter(|def| !def.is_unused())
    }
}
