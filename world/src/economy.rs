//! Resource balance tracking and affordability checks.

use code_defence_core::{Cost, RejectionReason, Resources, Reward};
use thiserror::Error;

/// Reasons a spend request may be refused by the economy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum EconomyError {
    /// The balance does not cover the requested cost.
    #[error("insufficient resources: have {have:?}, need {need:?}")]
    InsufficientResources {
        /// Balance at the time of the request.
        have: Resources,
        /// Cost that was requested.
        need: Cost,
    },
}

impl From<EconomyError> for RejectionReason {
    fn from(error: EconomyError) -> Self {
        match error {
            EconomyError::InsufficientResources { .. } => RejectionReason::InsufficientResources,
        }
    }
}

/// Currency balance plus bounded cpu and memory load.
///
/// Cpu and memory stay within `0..=max` at all times: spends are gated by
/// [`Economy::can_afford`] before anything is mutated and rewards clamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Economy {
    resources: Resources,
    max_cpu: u32,
    max_memory: u32,
}

impl Economy {
    /// Creates an economy with the provided starting balance and ceilings.
    ///
    /// Starting loads above the ceilings are clamped.
    #[must_use]
    pub fn new(initial: Resources, max_cpu: u32, max_memory: u32) -> Self {
        Self {
            resources: Resources::new(
                initial.currency,
                initial.cpu.min(max_cpu),
                initial.memory.min(max_memory),
            ),
            max_cpu,
            max_memory,
        }
    }

    /// Current balance.
    #[must_use]
    pub const fn resources(&self) -> Resources {
        self.resources
    }

    /// Ceiling for cpu usage.
    #[must_use]
    pub const fn max_cpu(&self) -> u32 {
        self.max_cpu
    }

    /// Ceiling for memory usage.
    #[must_use]
    pub const fn max_memory(&self) -> u32 {
        self.max_memory
    }

    /// Reports whether the balance covers the cost without breaching a ceiling.
    #[must_use]
    pub fn can_afford(&self, cost: Cost) -> bool {
        let cpu = u64::from(self.resources.cpu) + u64::from(cost.cpu);
        let memory = u64::from(self.resources.memory) + u64::from(cost.memory);
        self.resources.currency >= cost.currency
            && cpu <= u64::from(self.max_cpu)
            && memory <= u64::from(self.max_memory)
    }

    /// Deducts the cost, returning the new balance.
    pub fn spend(&mut self, cost: Cost) -> Result<Resources, EconomyError> {
        if !self.can_afford(cost) {
            return Err(EconomyError::InsufficientResources {
                have: self.resources,
                need: cost,
            });
        }

        self.resources.currency -= cost.currency;
        self.resources.cpu += cost.cpu;
        self.resources.memory += cost.memory;
        Ok(self.resources)
    }

    /// Deducts currency only, as upgrades do.
    pub fn spend_currency(&mut self, amount: u32) -> Result<Resources, EconomyError> {
        self.spend(Cost::new(amount, 0, 0))
    }

    /// Grants a reward. Currency is uncapped; loads clamp to `0..=max`.
    pub fn apply_reward(&mut self, reward: Reward) -> Resources {
        self.resources.currency = self.resources.currency.saturating_add(reward.currency);
        self.resources.cpu = shift_clamped(self.resources.cpu, reward.cpu, self.max_cpu);
        self.resources.memory = shift_clamped(self.resources.memory, reward.memory, self.max_memory);
        self.resources
    }
}

fn shift_clamped(value: u32, delta: i32, max: u32) -> u32 {
    let shifted = i64::from(value) + i64::from(delta);
    shifted.clamp(0, i64::from(max)) as u32
}
