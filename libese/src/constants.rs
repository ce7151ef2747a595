// libese-rs/libese/src/constants.rs
//! Common protocol constants used across the crate

/// NAD + PCB + LEN
pub const T1_HEADER_LEN: usize = 3;

/// Trailing LRC byte
pub const T1_LRC_LEN: usize = 1;

/// Maximum information field size (IFS) a frame may carry
pub const T1_MAX_INF_LEN: usize = 254;

/// Largest possible wire frame: header + INF + LRC
pub const T1_MAX_FRAME_LEN: usize = T1_HEADER_LEN + T1_MAX_INF_LEN + T1_LRC_LEN;

/// LEN value reserved for "nothing valid was received". Never transmitted.
pub const T1_INVALID_LEN: u8 = 0xFF;

/// R-block category bits
pub const PCB_R_BLOCK: u8 = 0x80;
/// S-block category bits
pub const PCB_S_BLOCK: u8 = 0xC0;
/// Top two bits select I, R or S
pub const PCB_CATEGORY_MASK: u8 = 0xC0;

/// I-block N(S)
pub const PCB_I_SEQ: u8 = 0x40;
/// I-block more-data bit
pub const PCB_I_MORE: u8 = 0x20;

/// R-block N(R)
pub const PCB_R_SEQ: u8 = 0x10;
/// R-block: EDC/parity error
pub const PCB_R_PARITY_ERROR: u8 = 0x01;
/// R-block: other error
pub const PCB_R_OTHER_ERROR: u8 = 0x02;

/// S-block response bit
pub const PCB_S_RESPONSE: u8 = 0x20;
/// S-block subtype bits
pub const PCB_S_TYPE_MASK: u8 = 0x03;
/// S-block subtype: resync
pub const PCB_S_RESYNC: u8 = 0x00;
/// S-block subtype: IFS
pub const PCB_S_IFS: u8 = 0x01;
/// S-block subtype: abort
pub const PCB_S_ABORT: u8 = 0x02;
/// S-block subtype: WTX
pub const PCB_S_WTX: u8 = 0x03;
