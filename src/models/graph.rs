//! Transaction graph: the canonical on-chain model heuristics read

use std::collections::BTreeMap;

use crate::models::transaction::{Address, Transaction};

/// Index of a transaction inside a [`TransactionGraph`]
pub type TxIndex = usize;
/// Index of an address inside a [`TransactionGraph`]
pub type AddressId = usize;

/// Two addresses that signed the same transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoSignEdge {
    /// Lower address id
    pub a: AddressId,
    /// Higher address id
    pub b: AddressId,
    pub tx: TxIndex,
}

/// Immutable set of transactions plus derived adjacency.
///
/// Every address id is derived from the transactions themselves, so every
/// edge endpoint appears in at least one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionGraph {
    target: Option<Address>,
    transactions: Vec<Transaction>,
    addresses: Vec<Address>,
    index: BTreeMap<Address, AddressId>,
    appearances: Vec<Vec<TxIndex>>,
    fee_payments: Vec<Vec<TxIndex>>,
    signings: Vec<Vec<TxIndex>>,
    co_sign_edges: Vec<CoSignEdge>,
}

impl TransactionGraph {
    /// Build the graph. Transactions are ordered by (slot, signature).
    pub fn new(target: Option<Address>, mut transactions: Vec<Transaction>) -> Self {
        transactions.sort_by(|a, b| a.slot.cmp(&b.slot).then_with(|| a.signature.cmp(&b.signature)));

        let mut addresses: Vec<Address> = transactions.iter().flat_map(|tx| tx.addresses()).collect();
        addresses.sort();
        addresses.dedup();
        let index: BTreeMap<Address, AddressId> =
            addresses.iter().enumerate().map(|(id, address)| (*address, id)).collect();

        let mut appearances = vec![Vec::new(); addresses.len()];
        let mut fee_payments = vec![Vec::new(); addresses.len()];
        let mut signings = vec![Vec::new(); addresses.len()];
        let mut co_sign_edges = Vec::new();

        for (tx_index, tx) in transactions.iter().enumerate() {
            for address in tx.addresses() {
                appearances[index[&address]].push(tx_index);
            }
            fee_payments[index[&tx.fee_payer]].push(tx_index);

            let mut signer_ids: Vec<AddressId> = tx.signers.iter().map(|s| index[s]).collect();
            signer_ids.sort_unstable();
            signer_ids.dedup();
            for &id in &signer_ids {
                signings[id].push(tx_index);
            }
            for (i, &a) in signer_ids.iter().enumerate() {
                for &b in &signer_ids[i + 1..] {
                    co_sign_edges.push(CoSignEdge { a, b, tx: tx_index });
                }
            }
        }

        Self {
            target,
            transactions,
            addresses,
            index,
            appearances,
            fee_payments,
            signings,
            co_sign_edges,
        }
    }

    /// Wallet the snapshot was taken for, if the caller named one
    pub fn target(&self) -> Option<&Address> {
        self.target.as_ref()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn transaction(&self, tx: TxIndex) -> &Transaction {
        &self.transactions[tx]
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// All addresses, sorted
    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    pub fn address(&self, id: AddressId) -> &Address {
        &self.addresses[id]
    }

    pub fn address_id(&self, address: &Address) -> Option<AddressId> {
        self.index.get(address).copied()
    }

    /// Transactions referencing the address, ascending
    pub fn appearances(&self, id: AddressId) -> &[TxIndex] {
        &self.appearances[id]
    }

    /// Transactions the address paid fees for, ascending
    pub fn fee_payments(&self, id: AddressId) -> &[TxIndex] {
        &self.fee_payments[id]
    }

    /// Transactions the address signed, ascending
    pub fn signings(&self, id: AddressId) -> &[TxIndex] {
        &self.signings[id]
    }

    /// Co-signer edges in transaction order
    pub fn co_sign_edges(&self) -> &[CoSignEdge] {
        &self.co_sign_edges
    }

    /// Signatures of the given transactions
    pub fn signatures<'a, I>(&'a self, txs: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a TxIndex>,
    {
        txs.into_iter().map(|&tx| self.transactions[tx].signature.clone()).collect()
    }
}
