//! Method calls and their two on-ledger argument encodings.
//!
//! - [`Encoding::Named`]: `args[0]` is the method name, integers are
//!   big-endian of at most 8 bytes, the pay recipient is the first
//!   foreign account and an optional third argument carries the note.
//! - [`Encoding::Selector`]: `args[0]` is the 4-byte prefix of
//!   `SHA-512/256(signature)`, `uint64` is 8 bytes big-endian, `account`
//!   is a 1-byte index into `[sender, foreign accounts..]` and `string`
//!   is a 2-byte big-endian length followed by UTF-8 bytes.
//!
//! Both decode into the same [`Method`] and run the same contract logic.

use bincode::{Decode, Encode};
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512_256};

use crate::error::AbiError;
use crate::identity::Address;

/// Prefix of every logged method return value.
pub const RETURN_PREFIX: [u8; 4] = [0x15, 0x1f, 0x7c, 0x75];

const CREATE: &str = "create()void";
const DEPOSIT: &str = "deposit(pay)void";
const PAY: &str = "pay(account,uint64,string)void";
const WITHDRAW: &str = "withdraw(uint64)void";
const BALANCE: &str = "balance()uint64";
const GET_OWNER: &str = "get_owner()address";

/// How a method and its arguments are laid out in the call's args.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Encode, Decode)]
pub enum Encoding {
    #[default]
    Named,
    Selector,
}

/// An escrow method invocation with decoded arguments.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(tag = "name", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum Method {
    Create,
    Deposit,
    Pay {
        recipient: Address,
        amount: u64,
        #[cfg_attr(feature = "json", serde(default))]
        note: String,
    },
    Withdraw {
        amount: u64,
    },
    Balance,
    GetOwner,
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Deposit => "deposit",
            Self::Pay { .. } => "pay",
            Self::Withdraw { .. } => "withdraw",
            Self::Balance => "balance",
            Self::GetOwner => "get_owner",
        }
    }

    pub fn signature(&self) -> &'static str {
        match self {
            Self::Create => CREATE,
            Self::Deposit => DEPOSIT,
            Self::Pay { .. } => PAY,
            Self::Withdraw { .. } => WITHDRAW,
            Self::Balance => BALANCE,
            Self::GetOwner => GET_OWNER,
        }
    }

    /// Whether the method only reads state.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::Balance | Self::GetOwner)
    }

    /// Decode the method from raw call arguments, detecting the encoding.
    ///
    /// `accounts` are the call's foreign accounts (the sender is implicit
    /// at index 0).
    pub fn decode(
        args: &[Vec<u8>],
        sender: &Address,
        accounts: &[Address],
    ) -> Result<(Self, Encoding), AbiError> {
        let head = args.first().ok_or(AbiError::MissingMethod)?;

        if let Some(name) = named(head) {
            return decode_named(name, args, accounts).map(|m| (m, Encoding::Named));
        }
        if let Some(signature) = signature_for(head) {
            return decode_selector(signature, args, sender, accounts)
                .map(|m| (m, Encoding::Selector));
        }
        Err(AbiError::UnknownMethod(head.clone()))
    }

    /// Encode into call arguments and foreign accounts.
    ///
    /// # Errors
    ///
    /// [`AbiError::StringTooLong`] when a selector-encoded note does not fit
    /// its `u16` length prefix.
    pub fn encode(&self, encoding: Encoding) -> Result<(Vec<Vec<u8>>, Vec<Address>), AbiError> {
        match encoding {
            Encoding::Named => {
                let mut args = vec![self.name().as_bytes().to_vec()];
                let mut accounts = Vec::new();
                match self {
                    Self::Pay {
                        recipient,
                        amount,
                        note,
                    } => {
                        args.push(amount.to_be_bytes().to_vec());
                        if !note.is_empty() {
                            args.push(note.as_bytes().to_vec());
                        }
                        accounts.push(*recipient);
                    }
                    Self::Withdraw { amount } => args.push(amount.to_be_bytes().to_vec()),
                    _ => {}
                }
                Ok((args, accounts))
            }
            Encoding::Selector => {
                let mut args = vec![selector(self.signature()).to_vec()];
                let mut accounts = Vec::new();
                match self {
                    Self::Pay {
                        recipient,
                        amount,
                        note,
                    } => {
                        accounts.push(*recipient);
                        args.push(vec![1]);
                        args.push(amount.to_be_bytes().to_vec());
                        args.push(encode_string(note)?);
                    }
                    Self::Withdraw { amount } => args.push(amount.to_be_bytes().to_vec()),
                    _ => {}
                }
                Ok((args, accounts))
            }
        }
    }
}

/// Value a read-only method returns.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(untagged))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum ReturnValue {
    Uint(u64),
    Address(Address),
}

impl ReturnValue {
    /// Log line carrying the return value: [`RETURN_PREFIX`] followed by
    /// the encoded value.
    pub fn to_log(&self) -> Vec<u8> {
        let mut log = RETURN_PREFIX.to_vec();
        match self {
            Self::Uint(v) => log.extend_from_slice(&v.to_be_bytes()),
            Self::Address(a) => log.extend_from_slice(a.as_bytes()),
        }
        log
    }

    /// Parse a return log back into a value, if it is one.
    pub fn from_log(log: &[u8]) -> Option<Self> {
        let body = log.strip_prefix(&RETURN_PREFIX[..])?;
        match body.len() {
            8 => body.try_into().ok().map(|b| Self::Uint(u64::from_be_bytes(b))),
            32 => Address::from_slice(body).ok().map(Self::Address),
            _ => None,
        }
    }
}

/// First four bytes of `SHA-512/256(signature)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Sha512_256::digest(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

fn named(head: &[u8]) -> Option<&'static str> {
    ["create", "deposit", "pay", "withdraw", "balance", "get_owner"]
        .into_iter()
        .find(|name| name.as_bytes() == head)
}

fn signature_for(head: &[u8]) -> Option<&'static str> {
    if head.len() != 4 {
        return None;
    }
    [CREATE, DEPOSIT, PAY, WITHDRAW, BALANCE, GET_OWNER]
        .into_iter()
        .find(|sig| selector(sig) == head)
}

fn decode_named(name: &str, args: &[Vec<u8>], accounts: &[Address]) -> Result<Method, AbiError> {
    let method = match name {
        "create" => Method::Create,
        "deposit" => Method::Deposit,
        "balance" => Method::Balance,
        "get_owner" => Method::GetOwner,
        "pay" => {
            let amount = btoi(args.get(1).ok_or(AbiError::MissingArgument("amount"))?)?;
            let recipient = *accounts
                .first()
                .ok_or(AbiError::MissingArgument("recipient"))?;
            let note = match args.get(2) {
                Some(raw) => String::from_utf8(raw.clone()).map_err(|_| AbiError::InvalidString)?,
                None => String::new(),
            };
            Method::Pay {
                recipient,
                amount,
                note,
            }
        }
        "withdraw" => Method::Withdraw {
            amount: btoi(args.get(1).ok_or(AbiError::MissingArgument("amount"))?)?,
        },
        _ => return Err(AbiError::UnknownMethod(name.as_bytes().to_vec())),
    };
    Ok(method)
}

fn decode_selector(
    signature: &str,
    args: &[Vec<u8>],
    sender: &Address,
    accounts: &[Address],
) -> Result<Method, AbiError> {
    let method = match signature {
        CREATE => Method::Create,
        DEPOSIT => Method::Deposit,
        BALANCE => Method::Balance,
        GET_OWNER => Method::GetOwner,
        PAY => {
            let index = match args.get(1).map(Vec::as_slice) {
                Some([i]) => *i,
                _ => return Err(AbiError::MissingArgument("recipient")),
            };
            let recipient = resolve_account(index, sender, accounts)?;
            let amount = uint64(args.get(2).ok_or(AbiError::MissingArgument("amount"))?)?;
            let note = decode_string(args.get(3).ok_or(AbiError::MissingArgument("note"))?)?;
            Method::Pay {
                recipient,
                amount,
                note,
            }
        }
        WITHDRAW => Method::Withdraw {
            amount: uint64(args.get(1).ok_or(AbiError::MissingArgument("amount"))?)?,
        },
        _ => return Err(AbiError::UnknownMethod(selector(signature).to_vec())),
    };
    Ok(method)
}

/// Big-endian bytes to integer; empty is zero, more than 8 bytes fails.
fn btoi(raw: &[u8]) -> Result<u64, AbiError> {
    if raw.len() > 8 {
        return Err(AbiError::InvalidUint(raw.len()));
    }
    Ok(raw.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

fn uint64(raw: &[u8]) -> Result<u64, AbiError> {
    let bytes: [u8; 8] = raw
        .try_into()
        .map_err(|_| AbiError::InvalidUint(raw.len()))?;
    Ok(u64::from_be_bytes(bytes))
}

fn resolve_account(index: u8, sender: &Address, accounts: &[Address]) -> Result<Address, AbiError> {
    match index {
        0 => Ok(*sender),
        i => accounts
            .get(usize::from(i) - 1)
            .copied()
            .ok_or(AbiError::AccountIndex(i)),
    }
}

fn encode_string(s: &str) -> Result<Vec<u8>, AbiError> {
    let len = u16::try_from(s.len()).map_err(|_| AbiError::StringTooLong(s.len()))?;
    let mut out = len.to_be_bytes().to_vec();
    out.extend_from_slice(s.as_bytes());
    Ok(out)
}

fn decode_string(raw: &[u8]) -> Result<String, AbiError> {
    let (len, body) = match raw {
        [hi, lo, body @ ..] => (usize::from(u16::from_be_bytes([*hi, *lo])), body),
        _ => return Err(AbiError::InvalidString),
    };
    if body.len() != len {
        return Err(AbiError::InvalidString);
    }
    String::from_utf8(body.to_vec()).map_err(|_| AbiError::InvalidString)
}
