//! Call-site names recognised by the static heuristics.
//!
//! Matching is done on the last path segment of a callee
//! (`web3.Keypair.generate` -> `generate` with owner `Keypair`), so both
//! JavaScript/TypeScript and Rust client code map onto the same tables.

/// Callees that create or load a signing key. Entries are `owner.method`.
pub const KEY_CONSTRUCTORS: &[&str] = &[
    "Keypair.generate",
    "Keypair.fromSecretKey",
    "Keypair.fromSeed",
    "Keypair.new",
    "Keypair.from_bytes",
    "Keypair.from_base58_string",
    "generateKeyPair",
    "generateKeyPairSigner",
    "createKeyPairSignerFromBytes",
    "read_keypair_file",
];

/// Callees that submit a transaction to the cluster.
pub const SEND_CALLS: &[&str] = &[
    "sendTransaction",
    "sendAndConfirmTransaction",
    "sendRawTransaction",
    "sendAndConfirmRawTransaction",
    "send_transaction",
    "send_and_confirm_transaction",
    "send_and_confirm_transaction_with_spinner",
    "signAndSendTransaction",
];

/// Callees that build a memo instruction.
pub const MEMO_CONSTRUCTORS: &[&str] = &[
    "createMemoInstruction",
    "getAddMemoInstruction",
    "build_memo",
    "MemoInstruction",
];
