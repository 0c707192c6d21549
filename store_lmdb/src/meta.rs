//! Schema version and id counter kept in the meta database.

use heed::RwTxn;

use crate::{LmdbEnvironment, LmdbError};

/// The schema version that the current code expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";
const NEXT_TX_ID_KEY: &[u8] = b"next_transaction_id";

/// Stamp a fresh database with the current schema version, or refuse to
/// open one written by a newer schema.
pub(crate) fn ensure_schema(store: &LmdbEnvironment) -> Result<(), LmdbError> {
    let mut wtxn = store.env.write_txn()?;
    let stored = match store.meta_db.get(&wtxn, SCHEMA_VERSION_KEY)? {
        Some(bytes) => {
            let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                LmdbError::Serialization("schema_version has unexpected byte length".into())
            })?;
            u32::from_le_bytes(arr)
        }
        None => 0,
    };

    if stored > CURRENT_SCHEMA_VERSION {
        return Err(LmdbError::Heed(format!(
            "database schema version {} is newer than supported version {}",
            stored, CURRENT_SCHEMA_VERSION
        )));
    }
    if stored < CURRENT_SCHEMA_VERSION {
        store.meta_db.put(
            &mut wtxn,
            SCHEMA_VERSION_KEY,
            &CURRENT_SCHEMA_VERSION.to_le_bytes(),
        )?;
        tracing::info!(
            from = stored,
            to = CURRENT_SCHEMA_VERSION,
            "stamped database schema version"
        );
    }
    wtxn.commit()?;
    Ok(())
}

/// Allocate the next transaction id inside an open write transaction.
pub(crate) fn next_transaction_id(
    store: &LmdbEnvironment,
    wtxn: &mut RwTxn,
) -> Result<u64, LmdbError> {
    let next = match store.meta_db.get(&*wtxn, NEXT_TX_ID_KEY)? {
        Some(bytes) => {
            let arr: [u8; 8] = bytes.try_into().map_err(|_| {
                LmdbError::Serialization("transaction id counter has unexpected length".into())
            })?;
            u64::from_be_bytes(arr)
        }
        None => 1,
    };
    store
        .meta_db
        .put(wtxn, NEXT_TX_ID_KEY, &(next + 1).to_be_bytes())?;
    Ok(next)
}
