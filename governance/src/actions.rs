//! Decodes governance transaction payloads into human-readable records.
//!
//! The selector table is fixed: these are the application-level mutators the
//! governance contract proposes against entity records. Decoding is total:
//! a malformed or unrecognized payload yields a result with no items, never
//! a panic or an error.

use alloy_primitives::{Address, B256, Bytes, FixedBytes, U256, fixed_bytes};
use alloy_sol_types::SolValue;

/// 4-byte function selector.
pub type Selector = FixedBytes<4>;

pub const OPERATION_SWITCH: Selector = fixed_bytes!("9254f59a");
pub const SET_TEXT: Selector = fixed_bytes!("10f13a8c");
pub const MULTICALL: Selector = fixed_bytes!("ac9650d8");
pub const TOGGLE_ROLES: Selector = fixed_bytes!("96393e81");
pub const TOGGLE_CONTRACTS: Selector = fixed_bytes!("e1b09e0a");
pub const MINT_SHARES: Selector = fixed_bytes!("528c198a");
pub const BURN_SHARES: Selector = fixed_bytes!("ee7a7c04");
pub const ADD_ROLE: Selector = fixed_bytes!("a73f7f8a");
pub const REVOKE_ROLE: Selector = fixed_bytes!("208dd1ff");

/// Semantic name for a registered selector.
pub fn action_name(method: Selector) -> Option<&'static str> {
    match method {
        OPERATION_SWITCH => Some("operationSwitch"),
        SET_TEXT => Some("setText"),
        MULTICALL => Some("multicall"),
        TOGGLE_ROLES => Some("toggleRoles"),
        TOGGLE_CONTRACTS => Some("toggleContracts"),
        MINT_SHARES => Some("mintShares"),
        BURN_SHARES => Some("burnShares"),
        ADD_ROLE => Some("addRole"),
        REVOKE_ROLE => Some("revokeRole"),
        _ => None,
    }
}

/// One decoded argument of an action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionItem {
    pub key: String,
    pub value: ActionValue,
    /// Set for share mutations inside a multicall, where the item alone must
    /// identify which method produced it (e.g. `mintShares()`).
    pub method: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionValue {
    Text(String),
    Amount(U256),
}

/// Human-readable form of one governance transaction payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDecodeResult {
    pub name: String,
    pub items: Vec<ActionItem>,
}

/// Decodes a payload given its method selector and ABI-encoded body.
pub fn decode(method: Selector, data: &[u8]) -> ActionDecodeResult {
    let name = action_name(method)
        .map(str::to_string)
        .unwrap_or_else(|| format!("0x{}", hex::encode(method)));

    let items = match method {
        SET_TEXT => decode_set_text(data).into_iter().collect(),
        MULTICALL => decode_multicall(data),
        MINT_SHARES | BURN_SHARES => decode_shares(method, data).into_iter().collect(),
        _ => Vec::new(),
    };

    ActionDecodeResult { name, items }
}

/// `setText(bytes32 node, string key, string value)`. The node hash is not
/// meaningful for display and is discarded.
fn decode_set_text(body: &[u8]) -> Option<ActionItem> {
    let (_node, key, value) = <(B256, String, String)>::abi_decode_params(body).ok()?;
    Some(ActionItem {
        key,
        value: ActionValue::Text(value),
        method: None,
    })
}

/// `mintShares(address,uint256)` / `burnShares(address,uint256)`.
fn decode_shares(method: Selector, body: &[u8]) -> Option<ActionItem> {
    let (account, amount) = <(Address, U256)>::abi_decode_params(body).ok()?;
    let name = action_name(method)?;
    Some(ActionItem {
        key: account.to_string(),
        value: ActionValue::Amount(amount),
        method: Some(format!("{name}()")),
    })
}

/// `multicall(bytes[])`. Each inner call carries its own leading selector,
/// sliced off by byte offset and decoded through the same table. Inner calls
/// with unrecognized selectors are dropped, never an error.
fn decode_multicall(body: &[u8]) -> Vec<ActionItem> {
    let Ok((calls,)) = <(Vec<Bytes>,)>::abi_decode_params(body) else {
        return Vec::new();
    };

    let mut items = Vec::new();
    for call in &calls {
        if call.len() < 4 {
            continue;
        }
        let inner: Selector = FixedBytes::from_slice(&call[..4]);
        let inner_body = &call[4..];
        let item = match inner {
            SET_TEXT => decode_set_text(inner_body),
            MINT_SHARES | BURN_SHARES => decode_shares(inner, inner_body),
            _ => None,
        };
        if let Some(item) = item {
            items.push(item);
        }
    }
    items
}

/// Prefixes ABI-encoded parameters with a selector to form full calldata.
pub fn calldata(method: Selector, params: Vec<u8>) -> Bytes {
    let mut out = Vec::with_capacity(4 + params.len());
    out.extend_from_slice(method.as_slice());
    out.extend(params);
    out.into()
}

pub fn encode_set_text(node: B256, key: &str, value: &str) -> Bytes {
    calldata(
        SET_TEXT,
        (node, key.to_string(), value.to_string()).abi_encode_params(),
    )
}

pub fn encode_mint_shares(to: Address, amount: U256) -> Bytes {
    calldata(MINT_SHARES, (to, amount).abi_encode_params())
}

pub fn encode_burn_shares(from: Address, amount: U256) -> Bytes {
    calldata(BURN_SHARES, (from, amount).abi_encode_params())
}

pub fn encode_multicall(calls: Vec<Bytes>) -> Bytes {
    calldata(MULTICALL, (calls,).abi_encode_params())
}
