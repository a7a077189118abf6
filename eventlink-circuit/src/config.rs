//! Per-deployment constants of a correlation circuit.
//!
//! A [CorrelationConfig] is part of the circuit's identity: changing any value changes the
//! constraints and therefore the verifying key. It is versioned alongside the circuit.
use std::{collections::BTreeSet, fmt, fs::File, path::Path, str::FromStr};

use ethers_core::types::{Address, H256, U256};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::{allocator::AllocationParams, error::ConfigError};

pub const CONFIG_VERSION: u32 = 1;

lazy_static! {
    /// Position manager emitting the liquidity event.
    pub static ref POSITION_MANAGER: Address =
        Address::from_str("0x1b1c77b606d13b09c84d1c7394b96b147bc03147").unwrap();
    /// USDC token contract.
    pub static ref USDC_TOKEN: Address =
        Address::from_str("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48").unwrap();
    pub static ref EVENT_ID_LIQUIDITY: H256 =
        H256::from_str("0xf208f4912782fd25c7f114ca3723a2d5dd6f3bcc3ac8db5af63baa85f711d5ec")
            .unwrap();
    /// `keccak256("Transfer(address,address,uint256)")`
    pub static ref EVENT_ID_TRANSFER: H256 =
        H256::from_str("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef")
            .unwrap();
}

/// Minimum 5000 USDC (6 decimals).
pub const MINIMUM_LIQUIDITY: u64 = 5_000_000_000;

/// Fixed selector of a field slot within the batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldRef {
    pub receipt: usize,
    pub field: usize,
}

impl FieldRef {
    pub const fn new(receipt: usize, field: usize) -> Self {
        Self { receipt, field }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "receipt[{}].field[{}]", self.receipt, self.field)
    }
}

/// The role a field slot plays in the correlated event pair: where in which event of which
/// contract it must have been read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRole {
    pub slot: FieldRef,
    /// `None` leaves the emitting contract unconstrained.
    #[serde(default)]
    pub contract: Option<Address>,
    /// `None` leaves the event signature unconstrained.
    #[serde(default)]
    pub event_id: Option<H256>,
    pub is_topic: bool,
    pub index: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Threshold {
    pub slot: FieldRef,
    /// Inclusive lower bound on the slot's value read as a big-endian `uint256`.
    pub minimum: U256,
}

/// Which values the circuit reveals. The order of the public outputs is fixed:
/// block number, address, amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputLayout {
    /// Receipt slot whose block number is revealed.
    pub block_num: usize,
    /// Field slot whose value is revealed as a 20-byte address.
    pub address: FieldRef,
    /// Field slot whose value is revealed as an opaque 32-byte word.
    pub amount: FieldRef,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationConfig {
    pub version: u32,
    pub allocation: AllocationParams,
    pub roles: Vec<FieldRole>,
    /// Pairs of slots that must be read from the same log.
    pub colocated: Vec<[FieldRef; 2]>,
    /// Pairs of slots that must carry byte-identical values.
    pub linked: Vec<[FieldRef; 2]>,
    pub threshold: Threshold,
    pub outputs: OutputLayout,
}

/// Receipt 0, field 0: the liquidity amount (data word 2 of the liquidity event).
pub const LIQUIDITY_AMOUNT_SLOT: FieldRef = FieldRef::new(0, 0);
/// Receipt 1, field 0: the transfer sender (topic 1 of the Transfer event).
pub const TRANSFER_SENDER_SLOT: FieldRef = FieldRef::new(1, 0);
/// Receipt 1, field 1: the transfer amount (data word 0 of the Transfer event).
pub const TRANSFER_AMOUNT_SLOT: FieldRef = FieldRef::new(1, 1);

impl CorrelationConfig {
    /// The deployed liquidity-provision / USDC-transfer pair.
    pub fn liquidity_transfer() -> Self {
        Self {
            version: CONFIG_VERSION,
            allocation: AllocationParams::LIQUIDITY_TRANSFER,
            roles: vec![
                FieldRole {
                    slot: LIQUIDITY_AMOUNT_SLOT,
                    contract: Some(*POSITION_MANAGER),
                    event_id: Some(*EVENT_ID_LIQUIDITY),
                    is_topic: false,
                    index: 2,
                },
                FieldRole {
                    slot: TRANSFER_SENDER_SLOT,
                    contract: Some(*USDC_TOKEN),
                    event_id: Some(*EVENT_ID_TRANSFER),
                    is_topic: true,
                    index: 1,
                },
                // pinned to the Transfer log through `colocated` rather than by contract and event
                FieldRole {
                    slot: TRANSFER_AMOUNT_SLOT,
                    contract: None,
                    event_id: None,
                    is_topic: false,
                    index: 0,
                },
            ],
            colocated: vec![[TRANSFER_SENDER_SLOT, TRANSFER_AMOUNT_SLOT]],
            linked: vec![[LIQUIDITY_AMOUNT_SLOT, TRANSFER_AMOUNT_SLOT]],
            threshold: Threshold {
                slot: LIQUIDITY_AMOUNT_SLOT,
                minimum: U256::from(MINIMUM_LIQUIDITY),
            },
            outputs: OutputLayout {
                block_num: 0,
                address: TRANSFER_SENDER_SLOT,
                amount: LIQUIDITY_AMOUNT_SLOT,
            },
        }
    }

    /// Moves both the threshold check and the revealed amount to `slot`.
    pub fn with_amount_slot(mut self, slot: FieldRef) -> Self {
        self.threshold.slot = slot;
        self.outputs.amount = slot;
        self
    }

    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_reader(File::open(path)?)?;
        config.validate()?;
        Ok(config)
    }

    /// All slots referenced by any assertion or output.
    pub fn referenced_slots(&self) -> BTreeSet<FieldRef> {
        let mut slots: BTreeSet<FieldRef> = self.roles.iter().map(|role| role.slot).collect();
        slots.extend(self.colocated.iter().chain(&self.linked).flatten());
        slots.extend([self.threshold.slot, self.outputs.address, self.outputs.amount]);
        slots
    }

    /// Checks that every referenced slot fits the allocation and has its location pinned by a role.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                version: self.version,
                supported: CONFIG_VERSION,
            });
        }
        if self.outputs.block_num >= self.allocation.max_receipts {
            return Err(ConfigError::SlotOutOfBounds {
                slot: FieldRef::new(self.outputs.block_num, 0),
            });
        }
        let pinned: BTreeSet<FieldRef> = self.roles.iter().map(|role| role.slot).collect();
        for slot in self.referenced_slots() {
            if !self.allocation.covers(slot) {
                return Err(ConfigError::SlotOutOfBounds { slot });
            }
            if !pinned.contains(&slot) {
                return Err(ConfigError::UnpinnedSlot { slot });
            }
        }
        Ok(())
    }
}
