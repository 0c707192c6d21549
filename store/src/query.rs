//! Transaction queries.

use cosign_types::{Address, Transaction, TransactionStatus};
use serde::{Deserialize, Serialize};

/// Ordering by creation timestamp.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Equality filters over transaction documents.
#[derive(Clone, Debug, Default)]
pub struct TransactionQuery {
    pub wallet: Option<Address>,
    pub nonce: Option<u64>,
    pub status: Option<TransactionStatus>,
    pub order: SortOrder,
    pub limit: Option<usize>,
}

impl TransactionQuery {
    pub fn for_wallet(wallet: Address) -> Self {
        Self {
            wallet: Some(wallet),
            ..Default::default()
        }
    }

    /// Every proposal occupying one nonce slot of one wallet.
    pub fn for_slot(wallet: Address, nonce: u64) -> Self {
        Self {
            wallet: Some(wallet),
            nonce: Some(nonce),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn ordered(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limited(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        self.wallet.map_or(true, |w| tx.wallet_address == w)
            && self.nonce.map_or(true, |n| tx.nonce == n)
            && self.status.map_or(true, |s| tx.status == s)
    }

    /// Sort and truncate an already-filtered result set.
    pub fn finish(&self, mut txs: Vec<Transaction>) -> Vec<Transaction> {
        txs.sort_by(|a, b| {
            let ord = a
                .created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id));
            match self.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
        if let Some(limit) = self.limit {
            txs.truncate(limit);
        }
        txs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosign_types::{
        Action, Bytes, ContractCall, Timestamp, TransactionId, TxHash, U256,
    };

    fn tx(id: u64, created: u64, nonce: u64) -> Transaction {
        Transaction {
            id: TransactionId(id),
            wallet_address: Address::repeat_byte(0xAA),
            nonce,
            action: Action::CloseStream {
                to: Address::repeat_byte(1),
            },
            call: ContractCall {
                to: Address::repeat_byte(0xAA),
                value: U256::ZERO,
                data: Bytes::new(),
            },
            signature_required_hash: TxHash::ZERO,
            signers: Vec::new(),
            status: TransactionStatus::Proposed,
            proposed_by: Address::repeat_byte(1),
            created_at: Timestamp::new(created),
            updated_at: Timestamp::new(created),
            version: 0,
            pending_submission: None,
            execution: None,
        }
    }

    #[test]
    fn orders_by_creation_then_id() {
        let txs = vec![tx(3, 20, 0), tx(1, 10, 0), tx(2, 20, 0)];
        let asc = TransactionQuery::default().finish(txs.clone());
        let ids: Vec<u64> = asc.iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let desc = TransactionQuery::default()
            .ordered(SortOrder::Desc)
            .limited(2)
            .finish(txs);
        let ids: Vec<u64> = desc.iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn slot_query_matches_wallet_and_nonce() {
        let q = TransactionQuery::for_slot(Address::repeat_byte(0xAA), 4);
        assert!(q.matches(&tx(1, 0, 4)));
        assert!(!q.matches(&tx(1, 0, 5)));
        let q = q.with_status(TransactionStatus::Pending);
        assert!(!q.matches(&tx(1, 0, 4)));
    }
}
