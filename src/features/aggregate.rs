//! Per-customer transaction aggregates

use crate::types::transaction::Transaction;
use std::collections::BTreeMap;

/// Summary of one customer's transactions within a batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CustomerAggregate {
    pub customer_id: i64,
    pub total_transaction_amount: f64,
    pub average_transaction_amount: f64,
    pub transaction_count: u64,
}

/// Group a batch by customer, computing the sum and mean of `Amount` and the
/// transaction count. One aggregate per distinct customer, ordered by id.
pub fn aggregate_by_customer(batch: &[Transaction]) -> Vec<CustomerAggregate> {
    let mut groups: BTreeMap<i64, (f64, u64)> = BTreeMap::new();
    for tx in batch {
        let entry = groups.entry(tx.customer_id).or_insert((0.0, 0));
        entry.0 += tx.amount;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|(customer_id, (total, count))| CustomerAggregate {
            customer_id,
            total_transaction_amount: total,
            average_transaction_amount: total / count as f64,
            transaction_count: count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(id: i64, customer: i64, amount: f64) -> Transaction {
        Transaction::new(id, customer, amount, amount / 10.0, "2023-01-01 10:00:00", Some("A"))
    }

    #[test]
    fn test_single_row_degenerates_to_own_amount() {
        let aggregates = aggregate_by_customer(&[tx(1, 3001, 100.0)]);

        assert_eq!(
            aggregates,
            vec![CustomerAggregate {
                customer_id: 3001,
                total_transaction_amount: 100.0,
                average_transaction_amount: 100.0,
                transaction_count: 1,
            }]
        );
    }

    #[test]
    fn test_groups_by_customer() {
        let batch = [
            tx(1, 20, 100.0),
            tx(2, 10, 50.0),
            tx(3, 20, 300.0),
            tx(4, 20, -100.0),
        ];

        let aggregates = aggregate_by_customer(&batch);

        assert_eq!(aggregates.len(), 2);
        assert_eq!(aggregates[0].customer_id, 10);
        assert_eq!(aggregates[0].transaction_count, 1);

        let second = aggregates[1];
        assert_eq!(second.customer_id, 20);
        assert_eq!(second.total_transaction_amount, 300.0);
        assert_eq!(second.average_transaction_amount, 100.0);
        assert_eq!(second.transaction_count, 3);
    }

    #[test]
    fn test_empty_batch() {
        assert!(aggregate_by_customer(&[]).is_empty());
    }
}
