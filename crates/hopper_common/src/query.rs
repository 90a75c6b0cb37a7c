//! Case-insensitive substring search over logged payloads.

use crate::ledger::Ledger;
use crate::record::{canonical_payload, Payload, Record};

/// Records (genesis excluded) whose serialized payload contains `query`,
/// ignoring case, in chain order.
pub fn search_records<'a>(ledger: &'a Ledger, query: &str) -> impl Iterator<Item = &'a Record> + 'a {
    let needle = query.to_lowercase();
    ledger
        .records()
        .iter()
        .skip(1)
        .filter(move |record| {
            canonical_payload(record.payload())
                .to_lowercase()
                .contains(&needle)
        })
}

/// Payloads matching `query`. Call again to restart.
pub fn search<'a>(ledger: &'a Ledger, query: &str) -> impl Iterator<Item = &'a Payload> + 'a {
    search_records(ledger, query).map(Record::payload)
}
