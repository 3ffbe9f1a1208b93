//! Data manager configuration.

/// Default first identifier handed out by a fresh store.
pub const DEFAULT_ID_FLOOR: i64 = 1000;

/// How sale line items with non-positive quantities are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuantityPolicy {
    /// Quantities are used as given. A negative quantity raises stock and a
    /// zero quantity leaves it unchanged.
    #[default]
    Permissive,
    /// A sale containing a quantity of zero or less is rejected before
    /// anything is written.
    RejectNonPositive,
}

/// Configuration for opening a data manager.
#[derive(Debug, Clone)]
pub struct Config {
    /// First identifier handed out when no counter has been persisted yet.
    pub id_floor: i64,

    /// Prefix prepended to every storage key, for sharing one backend
    /// between several shops.
    pub key_prefix: String,

    /// Whether to remove duplicate records and check integrity on open.
    pub clean_on_open: bool,

    /// Validation applied to sale line item quantities.
    pub quantity_policy: QuantityPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            id_floor: DEFAULT_ID_FLOOR,
            key_prefix: String::new(),
            clean_on_open: true,
            quantity_policy: QuantityPolicy::Permissive,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the first identifier of a fresh store.
    #[must_use]
    pub const fn id_floor(mut self, floor: i64) -> Self {
        self.id_floor = floor;
        self
    }

    /// Sets the storage key prefix.
    #[must_use]
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Sets whether to clean duplicates on open.
    #[must_use]
    pub const fn clean_on_open(mut self, value: bool) -> Self {
        self.clean_on_open = value;
        self
    }

    /// Sets the quantity validation policy for sales.
    #[must_use]
    pub const fn quantity_policy(mut self, policy: QuantityPolicy) -> Self {
        self.quantity_policy = policy;
        self
    }
}
