pub const BLOCK_NUM_BITS: usize = 64;
pub const LOG_POS_BITS: usize = 32;
pub const FIELD_IDX_BITS: usize = 32;
pub const ADDRESS_BITS: usize = 160;
pub const IS_TOPIC_BITS: usize = 1;
/// Each half of a [crate::HiLo] word
pub const HILO_LIMB_BITS: usize = 128;

/// Number of bytes an address occupies at the low end of a 32-byte word.
pub const ADDRESS_BYTES: usize = 20;
/// Number of leading bytes of a 32-byte word that must be zero for it to hold an address.
pub const ADDRESS_WORD_PADDING_BYTES: usize = 32 - ADDRESS_BYTES;
