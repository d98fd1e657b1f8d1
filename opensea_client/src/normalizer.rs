use crate::display::display_amount;
use crate::types::{HistoryEventType, NormalizedEvent, RawMarketEvent};
use tracing::debug;

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// ENS base registrar; mints on this contract are name registrations
pub const ENS_NFT_CONTRACT_ADDRESS: &str = "0x57f1887a8bf19b14fc0df6fd9b2acc9af147ea85";

/// Significant decimals requested for every amount in the activity list
pub const AMOUNT_SIGNIFICANT_DECIMALS: u32 = 5;

const PLACEHOLDER_ACCOUNT: &str = "0x123";
const PLACEHOLDER_TOKEN: &str = "x";
const UNKNOWN_RECEIVER: &str = "????";
const NOT_APPLICABLE_AMOUNT: &str = "0";

/// Turns a raw address into the string shown in the activity list
pub trait AddressResolver: Send + Sync {
    fn display_name(&self, address: &str) -> String;
}

/// Shows addresses unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver;

impl AddressResolver for IdentityResolver {
    fn display_name(&self, address: &str) -> String {
        address.to_string()
    }
}

/// Shortens hex addresses to `0x1234…abcd`; anything else (ENS names,
/// placeholders) passes through
#[derive(Debug, Clone, Copy)]
pub struct AbbreviatingResolver {
    pub leading: usize,
    pub trailing: usize,
}

impl Default for AbbreviatingResolver {
    fn default() -> Self {
        Self {
            leading: 4,
            trailing: 4,
        }
    }
}

impl AddressResolver for AbbreviatingResolver {
    fn display_name(&self, address: &str) -> String {
        let Some(hex) = address.strip_prefix("0x") else {
            return address.to_string();
        };
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) || hex.len() <= self.leading + self.trailing {
            return address.to_string();
        }
        format!(
            "0x{}…{}",
            &hex[..self.leading],
            &hex[hex.len() - self.trailing..]
        )
    }
}

/// Event kinds the activity list understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEventKind {
    Created,
    Successful,
    Transfer,
    Cancelled,
}

impl RawEventKind {
    /// `None` for kinds that are filtered out (offers, bids, approvals, ...)
    pub fn parse(event_type: &str) -> Option<Self> {
        match event_type {
            "created" => Some(RawEventKind::Created),
            "successful" => Some(RawEventKind::Successful),
            "transfer" => Some(RawEventKind::Transfer),
            "cancelled" => Some(RawEventKind::Cancelled),
            _ => None,
        }
    }
}

/// `WETH` is displayed as `ETH`
pub fn canonical_payment_token(symbol: Option<&str>) -> String {
    match symbol {
        Some("WETH") => "ETH".to_string(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn same_address(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Classifies raw marketplace events for one contract into activity records
pub struct EventNormalizer<'a> {
    contract_address: &'a str,
    resolver: &'a dyn AddressResolver,
}

impl<'a> EventNormalizer<'a> {
    pub fn new(contract_address: &'a str, resolver: &'a dyn AddressResolver) -> Self {
        Self {
            contract_address,
            resolver,
        }
    }

    fn is_ens_contract(&self) -> bool {
        same_address(self.contract_address, ENS_NFT_CONTRACT_ADDRESS)
    }

    /// One output per recognized input, in input order
    pub fn normalize_events(&self, events: &[RawMarketEvent]) -> Vec<NormalizedEvent> {
        let normalized: Vec<NormalizedEvent> = events
            .iter()
            .filter_map(|event| self.normalize_event(event))
            .collect();

        debug!(
            "Normalized {} of {} events for contract {}",
            normalized.len(),
            events.len(),
            self.contract_address
        );

        normalized
    }

    /// `None` when the event kind is not shown in the activity list
    pub fn normalize_event(&self, event: &RawMarketEvent) -> Option<NormalizedEvent> {
        let kind = event.event_type.as_deref().and_then(RawEventKind::parse)?;

        let mut normalized = NormalizedEvent {
            created_date: event.created_date.clone().unwrap_or_default(),
            event_type: HistoryEventType::Cancelled,
            from_account: PLACEHOLDER_ACCOUNT.to_string(),
            to_account: PLACEHOLDER_ACCOUNT.to_string(),
            to_account_eth_address: PLACEHOLDER_TOKEN.to_string(),
            list_amount: NOT_APPLICABLE_AMOUNT.to_string(),
            sale_amount: NOT_APPLICABLE_AMOUNT.to_string(),
            payment_token: PLACEHOLDER_TOKEN.to_string(),
        };

        match kind {
            RawEventKind::Transfer => {
                let from_zero = event
                    .from_address()
                    .is_some_and(|from| same_address(from, ZERO_ADDRESS));

                normalized.event_type = match (from_zero, self.is_ens_contract()) {
                    (true, true) => HistoryEventType::EnsRegistration,
                    (true, false) => HistoryEventType::Mint,
                    (false, _) => HistoryEventType::Transfer,
                };

                let receiver = event.to_address().unwrap_or(UNKNOWN_RECEIVER);
                normalized.to_account_eth_address = receiver.to_string();
                normalized.to_account = self.resolver.display_name(receiver);
            }
            RawEventKind::Successful => {
                normalized.event_type = HistoryEventType::Successful;
                normalized.payment_token = canonical_payment_token(event.payment_symbol());
                normalized.sale_amount = display_amount(
                    event.total_price.as_deref(),
                    Some(normalized.payment_token.as_str()),
                    AMOUNT_SIGNIFICANT_DECIMALS,
                );
            }
            RawEventKind::Created => {
                normalized.event_type = HistoryEventType::Created;
                normalized.payment_token = canonical_payment_token(event.payment_symbol());
                normalized.list_amount = display_amount(
                    event.starting_price.as_deref(),
                    Some(normalized.payment_token.as_str()),
                    AMOUNT_SIGNIFICANT_DECIMALS,
                );
            }
            RawEventKind::Cancelled => {
                normalized.event_type = HistoryEventType::Cancelled;
            }
        }

        Some(normalized)
    }
}

/// Convenience wrapper over [`EventNormalizer`]
pub fn normalize_events(
    contract_address: &str,
    events: &[RawMarketEvent],
    resolver: &dyn AddressResolver,
) -> Vec<NormalizedEvent> {
    EventNormalizer::new(contract_address, resolver).normalize_events(events)
}
