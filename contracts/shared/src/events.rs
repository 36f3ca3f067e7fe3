use soroban_sdk::{symbol_short, Symbol};

// Access registry events
pub const MEMBER_ADDED: Symbol = symbol_short!("mem_add");
pub const MEMBER_REMOVED: Symbol = symbol_short!("mem_rem");
pub const ADMIN_CHANGED: Symbol = symbol_short!("adm_chg");

// Ledger events (mint/transfer/approve go through the token SDK)
pub const MINTER_SET: Symbol = symbol_short!("minter");
pub const MINTING_FINISHED: Symbol = symbol_short!("mint_done");
pub const LEDGER_DISABLED: Symbol = symbol_short!("disabled");
pub const PROFIT_DEPOSITED: Symbol = symbol_short!("prof_dep");
pub const PROFIT_SETTLED: Symbol = symbol_short!("prof_set");
pub const PROFIT_WITHDRAWN: Symbol = symbol_short!("prof_wd");
pub const KEY_RECOVERED: Symbol = symbol_short!("key_rec");
pub const ROLE_CHANGED: Symbol = symbol_short!("role_chg");

// Sale events
pub const RATE_CHANGED: Symbol = symbol_short!("rate_chg");
pub const RATE_ADMIN_CHANGED: Symbol = symbol_short!("rate_adm");
pub const TOKEN_DISTRIBUTED: Symbol = symbol_short!("tok_dist");
pub const PURCHASED: Symbol = symbol_short!("purchase");
pub const FINALIZED: Symbol = symbol_short!("finalized");
pub const REFUNDED: Symbol = symbol_short!("refunded");
